//! The beacon tracking service.

use std::fmt;
use std::sync::{Arc, Mutex};

use async_channel::Receiver;
use geobeacon_location::{Fix, LocationDelegate, LocationError, LocationSource, UpdateConfig};
use geobeacon_permission::AuthorizationPrompt;
use geobeacon_report::{PositionReport, ReportSink};
use log::{error, warn};

use crate::scheduler::{SampleConfig, SampleScheduler};
use crate::state::PositionState;

/// Span of the recentred map region, in meters.
pub const REGION_SPAN_METERS: f64 = 200.0;

const EVENT_BUFFER: usize = 256;

/// The map viewport the presentation layer should recenter on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapRegion {
    /// Center latitude in degrees.
    pub center_latitude: f64,
    /// Center longitude in degrees.
    pub center_longitude: f64,
    /// North-south span in meters.
    pub latitudinal_meters: f64,
    /// East-west span in meters.
    pub longitudinal_meters: f64,
}

impl MapRegion {
    fn centered_on(fix: &Fix) -> Self {
        Self {
            center_latitude: fix.latitude,
            center_longitude: fix.longitude,
            latitudinal_meters: REGION_SPAN_METERS,
            longitudinal_meters: REGION_SPAN_METERS,
        }
    }
}

/// Events the tracker publishes for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A fix was applied to the position state.
    FixApplied(Fix),
    /// The map region recentred.
    Recentered(MapRegion),
    /// A report was handed to the sink.
    ReportDispatched(PositionReport),
    /// The source failed to acquire a fix.
    SourceFailure(String),
}

/// Tracker configuration.
#[derive(Default)]
pub struct TrackerConfig {
    /// Sampling cadence.
    pub sample: SampleConfig,
    /// Presentation callback for the authorization check. `None` skips
    /// the prompt (the check itself still runs and logs).
    pub prompt: Option<Arc<dyn AuthorizationPrompt>>,
}

impl fmt::Debug for TrackerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackerConfig")
            .field("sample", &self.sample)
            .field("prompt", &self.prompt.is_some())
            .finish()
    }
}

/// The sampling and reporting loop.
///
/// One instance per process, shared by `Arc`. The tracker installs itself
/// as the source's delegate; fixes mutate the held [`PositionState`] and,
/// whenever both coordinates are non-zero, trigger exactly one report per
/// delivery. Failures are logged and dropped. Nothing here retries.
pub struct BeaconTracker {
    state: Mutex<PositionState>,
    region: Mutex<Option<MapRegion>>,
    source: Arc<dyn LocationSource>,
    sink: Arc<dyn ReportSink>,
    scheduler: SampleScheduler,
    prompt: Option<Arc<dyn AuthorizationPrompt>>,
    events_tx: async_channel::Sender<TrackerEvent>,
    events_rx: Receiver<TrackerEvent>,
}

impl fmt::Debug for BeaconTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeaconTracker")
            .field("state", &self.position())
            .field("region", &self.region())
            .finish()
    }
}

impl BeaconTracker {
    /// Construct the service and begin sampling.
    ///
    /// The source is configured for background beaconing, started
    /// speculatively (even before the authorization check resolves), and
    /// handed to the duty-cycle scheduler. The authorization check runs
    /// once, off the construction path; if the grant is insufficient the
    /// configured prompt is invoked and nothing else happens — the
    /// tracker never blocks on the user's answer.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(
        source: Arc<dyn LocationSource>,
        sink: Arc<dyn ReportSink>,
        config: TrackerConfig,
    ) -> Arc<Self> {
        let (events_tx, events_rx) = async_channel::bounded(EVENT_BUFFER);
        let scheduler = SampleScheduler::start(source.clone(), config.sample);

        let tracker = Arc::new(Self {
            state: Mutex::new(PositionState::new()),
            region: Mutex::new(None),
            source: source.clone(),
            sink,
            scheduler,
            prompt: config.prompt,
            events_tx,
            events_rx,
        });

        if let Err(err) = source.configure(UpdateConfig::default()) {
            warn!("failed to configure location source: {err}");
        }
        source.set_delegate(tracker.clone());
        if let Err(err) = source.start_updates() {
            warn!("failed to start location updates: {err}");
        }
        tracker.authorization_changed();

        tracker
    }

    /// Re-run the authorization check, e.g. after the platform reports an
    /// authorization change. Runs off the caller's path; if the grant is
    /// insufficient the configured prompt fires, and nothing else.
    pub fn authorization_changed(&self) {
        let prompt = self.prompt.clone();
        tokio::spawn(async move {
            let current = geobeacon_permission::status().await;
            if !current.is_sufficient() {
                warn!("location authorization insufficient: {current:?}");
                if let Some(prompt) = prompt {
                    prompt.authorization_insufficient(current);
                }
            }
        });
    }

    /// Snapshot the current position state.
    #[must_use]
    pub fn position(&self) -> PositionState {
        self.state.lock().expect("state mutex poisoned").clone()
    }

    /// The last recentring target, if any fix has arrived.
    #[must_use]
    pub fn region(&self) -> Option<MapRegion> {
        *self.region.lock().expect("region mutex poisoned")
    }

    /// Subscribe to tracker events. When no one drains the feed, new
    /// events are dropped with a warning once the buffer fills.
    #[must_use]
    pub fn events(&self) -> Receiver<TrackerEvent> {
        self.events_rx.clone()
    }

    /// Post the current position to the sink, unconditionally.
    ///
    /// The non-zero-coordinates gate lives in the fix-delivery path, not
    /// here: an explicit call posts whatever the state holds.
    pub fn post_data(&self) {
        let report = self.state.lock().expect("state mutex poisoned").report();
        self.sink.post(&report);
        self.push_event(TrackerEvent::ReportDispatched(report));
    }

    /// Request one immediate fix, bypassing the sampling cadence.
    pub fn request_fix(&self) {
        if let Err(err) = self.source.request_fix() {
            error!("immediate fix request failed: {err}");
        }
    }

    /// Stop the scheduler and the source. In-flight reports are abandoned.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
        self.source.stop_updates();
    }

    fn push_event(&self, event: TrackerEvent) {
        if let Err(err) = self.events_tx.try_send(event) {
            warn!("dropping tracker event: {err}");
        }
    }
}

impl LocationDelegate for BeaconTracker {
    fn on_update(&self, fixes: &[Fix]) {
        // The map recenters on the newest fix of the batch; the reported
        // state takes the first. Divergent, and kept that way.
        if let Some(last) = fixes.last() {
            let region = MapRegion::centered_on(last);
            *self.region.lock().expect("region mutex poisoned") = Some(region);
            self.push_event(TrackerEvent::Recentered(region));
        }

        let Some(first) = fixes.first() else {
            return;
        };
        let should_report = {
            let mut state = self.state.lock().expect("state mutex poisoned");
            state.apply_fix(first);
            state.has_fix()
        };
        self.push_event(TrackerEvent::FixApplied(first.clone()));
        if should_report {
            self.post_data();
        }
    }

    fn on_failure(&self, error: &LocationError) {
        error!("failed to acquire location fix: {error}");
        self.push_event(TrackerEvent::SourceFailure(error.to_string()));
    }
}
