//! End-to-end tests of the sampling/reporting loop against the simulated
//! source and a recording sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use geobeacon_location::{Fix, LocationError, SimulatedSource, SourceCall};
use geobeacon_report::{PositionReport, ReportSink};
use geobeacon_tracker::{BeaconTracker, SampleConfig, TrackerConfig, TrackerEvent};

#[derive(Default)]
struct RecordingSink {
    reports: Mutex<Vec<PositionReport>>,
}

impl RecordingSink {
    fn reports(&self) -> Vec<PositionReport> {
        self.reports.lock().expect("reports mutex poisoned").clone()
    }
}

impl ReportSink for RecordingSink {
    fn post(&self, report: &PositionReport) {
        self.reports
            .lock()
            .expect("reports mutex poisoned")
            .push(report.clone());
    }
}

fn start_tracker() -> (Arc<SimulatedSource>, Arc<RecordingSink>, Arc<BeaconTracker>) {
    let source = Arc::new(SimulatedSource::new());
    let sink = Arc::new(RecordingSink::default());
    let tracker = BeaconTracker::start(source.clone(), sink.clone(), TrackerConfig::default());
    (source, sink, tracker)
}

#[tokio::test]
async fn zero_coordinates_never_report() {
    let (source, sink, tracker) = start_tracker();

    source.emit(&[Fix::new(0.0, 0.0)]);
    source.emit(&[Fix::new(35.0, 0.0)]);
    source.emit(&[Fix::new(0.0, 139.0)]);

    assert!(sink.reports().is_empty());
    tracker.shutdown();
}

#[tokio::test]
async fn valid_fix_reports_exactly_once() {
    let (source, sink, tracker) = start_tracker();

    source.emit(&[Fix::new(35.0, 139.0).with_altitude(10.0)]);

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].latitude, 35.0);
    assert_eq!(reports[0].longitude, 139.0);
    assert_eq!(reports[0].altitude, 10.0);
    assert_eq!(reports[0].floor, 0);
    assert_eq!(reports[0].id, tracker.position().id());
    tracker.shutdown();
}

#[tokio::test]
async fn identical_fixes_are_not_deduplicated() {
    let (source, sink, tracker) = start_tracker();

    let fix = Fix::new(35.0, 139.0);
    source.emit(&[fix.clone()]);
    source.emit(&[fix]);

    let reports = sink.reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0], reports[1]);
    tracker.shutdown();
}

#[tokio::test]
async fn missing_fields_keep_previous_values() {
    let (source, sink, tracker) = start_tracker();

    source.emit(&[Fix::new(35.0, 139.0).with_altitude(10.0).with_floor(4)]);
    source.emit(&[Fix::new(36.0, 140.0)]);

    let reports = sink.reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[1].latitude, 36.0);
    assert_eq!(reports[1].altitude, 10.0);
    assert_eq!(reports[1].floor, 4);
    tracker.shutdown();
}

#[tokio::test]
async fn state_takes_first_fix_region_takes_last() {
    let (source, sink, tracker) = start_tracker();

    let first = Fix::new(35.0, 139.0);
    let last = Fix::new(48.0, 2.0);
    source.emit(&[first, last]);

    // The divergence is deliberate: the reported position and the map
    // recentring come from opposite ends of the batch.
    let position = tracker.position();
    assert_eq!(position.lat(), 35.0);
    assert_eq!(position.lon(), 139.0);

    let region = tracker.region().expect("region recentred");
    assert_eq!(region.center_latitude, 48.0);
    assert_eq!(region.center_longitude, 2.0);
    assert_eq!(region.latitudinal_meters, 200.0);
    assert_eq!(region.longitudinal_meters, 200.0);

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].latitude, 35.0);
    tracker.shutdown();
}

#[tokio::test]
async fn acquisition_failure_changes_nothing() {
    let (source, sink, tracker) = start_tracker();

    source.emit(&[Fix::new(35.0, 139.0)]);
    let before = tracker.position();

    source.fail(&LocationError::NotAvailable);

    assert_eq!(tracker.position(), before);
    assert_eq!(sink.reports().len(), 1);
    tracker.shutdown();
}

#[tokio::test]
async fn events_trace_the_delivery() {
    let (source, _sink, tracker) = start_tracker();
    let events = tracker.events();

    source.emit(&[Fix::new(35.0, 139.0), Fix::new(48.0, 2.0)]);
    source.fail(&LocationError::Timeout);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert_eq!(seen.len(), 4);
    assert!(matches!(&seen[0], TrackerEvent::Recentered(region) if region.center_latitude == 48.0));
    assert!(matches!(&seen[1], TrackerEvent::FixApplied(fix) if fix.latitude == 35.0));
    assert!(matches!(&seen[2], TrackerEvent::ReportDispatched(report) if report.latitude == 35.0));
    assert!(matches!(&seen[3], TrackerEvent::SourceFailure(_)));
    tracker.shutdown();
}

#[tokio::test]
async fn request_fix_reaches_the_source() {
    let (source, _sink, tracker) = start_tracker();

    tracker.request_fix();

    assert!(source.calls().contains(&SourceCall::RequestFix));
    tracker.shutdown();
}

#[tokio::test]
async fn explicit_post_is_unconditional() {
    let (_source, sink, tracker) = start_tracker();

    // No fix yet: the sentinel state still goes out when asked directly.
    tracker.post_data();

    let reports = sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].latitude, 0.0);
    assert_eq!(reports[0].longitude, 0.0);
    tracker.shutdown();
}

#[tokio::test(start_paused = true)]
async fn scheduler_duty_cycles_the_source() {
    let (source, _sink, tracker) = start_tracker();

    // Let the scheduler's first tick run: sensing opens at t = 0.
    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(source.is_sensing());

    // The paired disable lands 5s after the tick.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(!source.is_sensing());

    // Quiet until the next tick at t = 60...
    tokio::time::advance(Duration::from_secs(30)).await;
    assert!(!source.is_sensing());

    // ...which opens the next window, with its own disable at t = 65.
    tokio::time::advance(Duration::from_secs(25)).await;
    assert!(source.is_sensing());
    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(!source.is_sensing());
    tracker.shutdown();
}

#[tokio::test(start_paused = true)]
async fn deferred_disables_are_never_cancelled() {
    let source = Arc::new(SimulatedSource::new());
    let sink = Arc::new(RecordingSink::default());
    // Window longer than the interval: the t=0 disable fires at t=15,
    // inside the window the t=10 tick opened. No cancellation means that
    // disable cuts the newer window short.
    let config = TrackerConfig {
        sample: SampleConfig {
            interval: Duration::from_secs(10),
            window: Duration::from_secs(15),
        },
        prompt: None,
    };
    let tracker = BeaconTracker::start(source.clone(), sink, config);

    tokio::time::advance(Duration::from_millis(1)).await;
    assert!(source.is_sensing());

    // t = 12: re-enabled by the t=10 tick, t=0 disable still pending.
    tokio::time::advance(Duration::from_secs(12)).await;
    assert!(source.is_sensing());

    // t = 15: the stale disable lands and turns sensing off mid-window.
    tokio::time::advance(Duration::from_secs(3)).await;
    assert!(!source.is_sensing());

    // t = 20: the next tick re-enables; t = 25: the t=10 disable lands.
    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(source.is_sensing());
    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(!source.is_sensing());
    tracker.shutdown();
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn sufficient_authorization_skips_the_prompt() {
    struct PromptSpy(AtomicBool);

    impl geobeacon_tracker::AuthorizationPrompt for PromptSpy {
        fn authorization_insufficient(&self, _current: geobeacon_tracker::Authorization) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    let spy = Arc::new(PromptSpy(AtomicBool::new(false)));
    let source = Arc::new(SimulatedSource::new());
    let sink = Arc::new(RecordingSink::default());
    let tracker = BeaconTracker::start(
        source,
        sink,
        TrackerConfig {
            sample: SampleConfig::default(),
            prompt: Some(spy.clone()),
        },
    );

    // Linux grants at the service level, so the prompt must stay silent.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!spy.0.load(Ordering::SeqCst));
    tracker.shutdown();
}
