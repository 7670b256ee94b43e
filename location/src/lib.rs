//! Location source abstraction for geobeacon.
//!
//! This crate defines the seam between the sampling core and whatever
//! produces location fixes: the [`LocationSource`] trait, the [`Fix`]
//! measurement it delivers, and the [`LocationDelegate`] callbacks it
//! delivers them through. Platform backends live in [`sys`] (GeoClue2 on
//! Linux, the WinRT `Geolocator` on Windows); hosts without a built-in
//! backend inject their own `LocationSource` implementation. The
//! [`SimulatedSource`] drives the same seam from scripted fixes.
//!
//! # Usage
//!
//! ```ignore
//! use geobeacon_location::sys;
//!
//! let source = sys::platform_source().await?;
//! source.set_delegate(delegate);
//! source.start_updates()?;
//! ```

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Platform-specific location sources.
pub mod sys;

mod simulated;

pub use simulated::{SimulatedSource, SourceCall};

/// A single location measurement delivered by a [`LocationSource`].
///
/// Fixes are transient: the consumer reads the fields it needs and drops
/// the value. Nothing in this kit retains a history of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Altitude in meters above sea level, if the source can supply it.
    pub altitude: Option<f64>,
    /// Building floor level, if the source can supply it.
    pub floor: Option<i32>,
    /// Horizontal accuracy in meters, if the source can supply it.
    pub horizontal_accuracy: Option<f64>,
    /// Timestamp as Unix epoch milliseconds.
    pub timestamp: u64,
}

impl Fix {
    /// A fix carrying only coordinates, stamped with the current time.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            floor: None,
            horizontal_accuracy: None,
            timestamp: timestamp_now(),
        }
    }

    /// Same fix with an altitude attached.
    #[must_use]
    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    /// Same fix with a floor level attached.
    #[must_use]
    pub fn with_floor(mut self, floor: i32) -> Self {
        self.floor = Some(floor);
        self
    }
}

/// How precisely a source should try to resolve the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Accuracy {
    /// The best fix the hardware can produce.
    #[default]
    Best,
    /// Within roughly ten meters.
    TenMeters,
    /// Within roughly a hundred meters.
    HundredMeters,
    /// Within roughly a kilometer.
    Kilometer,
    /// Coarse, privacy-preserving position.
    Reduced,
}

/// Configuration applied to a source before updates start.
///
/// The defaults mirror what a background beacon wants: best accuracy, no
/// distance filter, updates allowed to continue in the background, and no
/// automatic pausing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// Desired fix accuracy.
    pub accuracy: Accuracy,
    /// Minimum movement in meters between delivered fixes. `None` delivers
    /// every update regardless of distance.
    pub distance_filter: Option<f64>,
    /// Keep delivering updates while the host app is backgrounded.
    pub allow_background: bool,
    /// Let the platform pause updates when it thinks the device is idle.
    pub auto_pause: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::Best,
            distance_filter: None,
            allow_background: true,
            auto_pause: false,
        }
    }
}

/// Errors surfaced by location sources.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    /// Location permission was not granted.
    #[error("location permission denied")]
    PermissionDenied,
    /// Location services are disabled on the device.
    #[error("location services disabled")]
    ServiceDisabled,
    /// The request timed out.
    #[error("location request timed out")]
    Timeout,
    /// No position is available right now.
    #[error("location not available")]
    NotAvailable,
    /// No built-in source exists for this platform.
    #[error("no location source for this platform")]
    Unsupported,
    /// The platform backend reported an error.
    #[error("location backend error: {0}")]
    Backend(String),
}

/// Result alias for location operations.
pub type LocationResult<T> = Result<T, LocationError>;

/// Callbacks a [`LocationSource`] delivers events through.
///
/// Sources guarantee serialized delivery: no two callbacks run
/// concurrently for the same source, so implementations may mutate their
/// own state without extra coordination.
pub trait LocationDelegate: Send + Sync {
    /// One or more fixes arrived, oldest first.
    fn on_update(&self, fixes: &[Fix]);

    /// The source failed to acquire a fix. Informational; sources keep
    /// running after reporting a failure.
    fn on_failure(&self, error: &LocationError);
}

/// A stream of location fixes, duty-cycled by the caller.
///
/// `start_updates` is idempotent: starting an already-started source is a
/// no-op, which is what lets the sampling scheduler re-enable the source
/// on every tick without tracking its state. A fix that is already in
/// flight when `stop_updates` lands is still delivered.
pub trait LocationSource: Send + Sync {
    /// Apply an [`UpdateConfig`] to the underlying hardware.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the configuration.
    fn configure(&self, config: UpdateConfig) -> LocationResult<()>;

    /// Install the delegate that receives fixes and failures.
    fn set_delegate(&self, delegate: Arc<dyn LocationDelegate>);

    /// Begin delivering fixes to the delegate.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot start producing fixes.
    fn start_updates(&self) -> LocationResult<()>;

    /// Stop delivering fixes. Fixes already in flight may still arrive.
    fn stop_updates(&self);

    /// Request a single fix immediately, outside the sampling cadence.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot service the request.
    fn request_fix(&self) -> LocationResult<()>;
}

pub(crate) fn timestamp_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_background_best_accuracy() {
        let config = UpdateConfig::default();
        assert_eq!(config.accuracy, Accuracy::Best);
        assert_eq!(config.distance_filter, None);
        assert!(config.allow_background);
        assert!(!config.auto_pause);
    }

    #[test]
    fn fix_builders_attach_optional_fields() {
        let fix = Fix::new(35.0, 139.0).with_altitude(10.0).with_floor(3);
        assert_eq!(fix.latitude, 35.0);
        assert_eq!(fix.altitude, Some(10.0));
        assert_eq!(fix.floor, Some(3));
        assert_eq!(fix.horizontal_accuracy, None);
    }
}
