//! Simulated test binary for geobeacon-tracker.
//!
//! Run with: cargo run -p geobeacon-tracker-test

use std::sync::{Arc, Mutex};
use std::time::Duration;

use geobeacon_location::{Fix, SimulatedSource};
use geobeacon_report::{PositionReport, ReportSink};
use geobeacon_tracker::{BeaconTracker, TrackerConfig, TrackerEvent};

struct PrintingSink {
    posted: Mutex<Vec<PositionReport>>,
}

impl ReportSink for PrintingSink {
    fn post(&self, report: &PositionReport) {
        println!(
            "  -> report: id={} lat={} lon={} alt={} fl={}",
            report.id, report.latitude, report.longitude, report.altitude, report.floor
        );
        self.posted
            .lock()
            .expect("posted mutex poisoned")
            .push(report.clone());
    }
}

#[tokio::main]
async fn main() {
    println!("=== Geobeacon Tracker Test (simulated) ===\n");

    let source = Arc::new(SimulatedSource::new());
    let sink = Arc::new(PrintingSink {
        posted: Mutex::new(Vec::new()),
    });
    let tracker = BeaconTracker::start(source.clone(), sink.clone(), TrackerConfig::default());
    let events = tracker.events();

    println!("Device id: {}\n", tracker.position().id());

    println!("Emitting a fix before any valid coordinates...");
    source.emit(&[Fix::new(0.0, 0.0)]);

    println!("Emitting a valid fix...");
    source.emit(&[Fix::new(35.689506, 139.6917).with_altitude(40.0)]);

    println!("Emitting a two-fix batch (state from first, region from last)...");
    source.emit(&[Fix::new(35.6586, 139.7454).with_floor(2), Fix::new(48.8584, 2.2945)]);

    tokio::time::sleep(Duration::from_millis(100)).await;

    let position = tracker.position();
    println!("\nFinal state:");
    println!("  lat={} lon={} alt={} fl={}", position.lat(), position.lon(), position.alt(), position.fl());

    if let Some(region) = tracker.region() {
        println!(
            "  region center=({}, {}) span={}m",
            region.center_latitude, region.center_longitude, region.latitudinal_meters
        );
    }

    println!("\nEvents:");
    while let Ok(event) = events.try_recv() {
        match event {
            TrackerEvent::FixApplied(fix) => println!("  fix applied: ({}, {})", fix.latitude, fix.longitude),
            TrackerEvent::Recentered(region) => println!(
                "  recentred: ({}, {})",
                region.center_latitude, region.center_longitude
            ),
            TrackerEvent::ReportDispatched(report) => {
                println!("  report dispatched: lat={}", report.latitude);
            }
            TrackerEvent::SourceFailure(err) => println!("  source failure: {err}"),
        }
    }

    let posted = sink.posted.lock().expect("posted mutex poisoned").len();
    println!("\n{posted} report(s) dispatched");

    tracker.shutdown();
}
