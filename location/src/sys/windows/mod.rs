//! Windows location source using the WinRT `Geolocator`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use windows::Devices::Geolocation::{
    GeolocationAccessStatus, Geolocator, PositionAccuracy,
};

use crate::{
    Accuracy, Fix, LocationDelegate, LocationError, LocationResult, LocationSource, UpdateConfig,
    timestamp_now,
};

const POLL_INTERVAL: Duration = Duration::from_secs(1);

type SharedDelegate = Arc<Mutex<Option<Arc<dyn LocationDelegate>>>>;

/// A [`LocationSource`] that polls the WinRT `Geolocator` while started.
///
/// WinRT has a push API, but its event handlers outlive any sensible
/// lifetime here; polling one-shot readings on a short cadence keeps the
/// duty-cycle contract identical to the other backends.
pub struct GeolocatorSource {
    delegate: SharedDelegate,
    running: Arc<AtomicBool>,
    config: Arc<Mutex<UpdateConfig>>,
}

impl std::fmt::Debug for GeolocatorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeolocatorSource")
            .field("running", &self.running.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for GeolocatorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GeolocatorSource {
    /// A source that has not started polling yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            delegate: Arc::new(Mutex::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            config: Arc::new(Mutex::new(UpdateConfig::default())),
        }
    }
}

impl LocationSource for GeolocatorSource {
    fn configure(&self, config: UpdateConfig) -> LocationResult<()> {
        *self.config.lock().expect("config mutex poisoned") = config;
        Ok(())
    }

    fn set_delegate(&self, delegate: Arc<dyn LocationDelegate>) {
        *self.delegate.lock().expect("delegate mutex poisoned") = Some(delegate);
    }

    fn start_updates(&self) -> LocationResult<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            // Already polling; re-entry is a no-op.
            return Ok(());
        }

        let running = self.running.clone();
        let delegate = self.delegate.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let reading = {
                    let config = config.lock().expect("config mutex poisoned").clone();
                    read_fix(&config)
                };
                match reading {
                    Ok(fix) => notify_update(&delegate, &[fix]),
                    Err(err) => notify_failure(&delegate, &err),
                }
                futures_timer::Delay::new(POLL_INTERVAL).await;
            }
        });
        Ok(())
    }

    fn stop_updates(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn request_fix(&self) -> LocationResult<()> {
        let delegate = self.delegate.clone();
        let config = self.config.lock().expect("config mutex poisoned").clone();
        tokio::spawn(async move {
            match read_fix(&config) {
                Ok(fix) => notify_update(&delegate, &[fix]),
                Err(err) => notify_failure(&delegate, &err),
            }
        });
        Ok(())
    }
}

fn notify_update(delegate: &SharedDelegate, fixes: &[Fix]) {
    let delegate = delegate.lock().expect("delegate mutex poisoned").clone();
    if let Some(delegate) = delegate {
        delegate.on_update(fixes);
    }
}

fn notify_failure(delegate: &SharedDelegate, error: &LocationError) {
    let delegate = delegate.lock().expect("delegate mutex poisoned").clone();
    if let Some(delegate) = delegate {
        delegate.on_failure(error);
    }
}

fn read_fix(config: &UpdateConfig) -> LocationResult<Fix> {
    let access = Geolocator::RequestAccessAsync()
        .map_err(|e| LocationError::Backend(e.message().to_string()))?
        .get()
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;

    match access {
        GeolocationAccessStatus::Denied => return Err(LocationError::PermissionDenied),
        GeolocationAccessStatus::Allowed => {}
        _ => return Err(LocationError::NotAvailable),
    }

    let geolocator =
        Geolocator::new().map_err(|e| LocationError::Backend(e.message().to_string()))?;
    geolocator
        .SetDesiredAccuracy(position_accuracy(config.accuracy))
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;
    if let Some(meters) = config.distance_filter {
        geolocator
            .SetMovementThreshold(meters)
            .map_err(|e| LocationError::Backend(e.message().to_string()))?;
    }

    let position = geolocator
        .GetGeopositionAsync()
        .map_err(|e| LocationError::Backend(e.message().to_string()))?
        .get()
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;

    let coord = position
        .Coordinate()
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;
    let point = coord
        .Point()
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;
    let pos = point
        .Position()
        .map_err(|e| LocationError::Backend(e.message().to_string()))?;

    let accuracy = coord.Accuracy().ok();

    Ok(Fix {
        latitude: pos.Latitude,
        longitude: pos.Longitude,
        altitude: Some(pos.Altitude),
        floor: None,
        horizontal_accuracy: accuracy,
        timestamp: timestamp_now(),
    })
}

const fn position_accuracy(accuracy: Accuracy) -> PositionAccuracy {
    match accuracy {
        Accuracy::Best | Accuracy::TenMeters => PositionAccuracy::High,
        Accuracy::HundredMeters | Accuracy::Kilometer | Accuracy::Reduced => {
            PositionAccuracy::Default
        }
    }
}
