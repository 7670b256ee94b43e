//! # Geobeacon
//!
//! A modular kit for duty-cycled location sampling and best-effort beacon
//! reporting.
//!
//! Geobeacon periodically engages the platform location hardware for short
//! sensing windows, keeps the last known position in memory, and reports it
//! to a remote collection endpoint with a fire-and-forget HTTP POST.
//!
//! ## Features
//!
//! Each subsystem lives in its own crate and is enabled by a feature:
//!
//! - `location`: the `LocationSource` abstraction over the platform
//!   location stream, plus the simulated source used for testing.
//! - `permission`: location authorization queries and the prompt callback
//!   consumed by the presentation layer.
//! - `report`: the position report wire format and the HTTP reporter.
//! - `tracker`: the sampling/reporting loop tying everything together
//!   (pulls in the other three).
//!
//! Use the `full` feature to enable everything.
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! geobeacon = { version = "0.1", features = ["tracker"] }
//! ```
//!
//! ```ignore
//! use geobeacon::location::SimulatedSource;
//! use geobeacon::report::Reporter;
//! use geobeacon::tracker::{BeaconTracker, TrackerConfig};
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let source = Arc::new(SimulatedSource::new());
//! let reporter = Arc::new(Reporter::new());
//! let tracker = BeaconTracker::start(source, reporter, TrackerConfig::default());
//! tracker.request_fix();
//! # }
//! ```

#[cfg(feature = "location")]
pub use geobeacon_location as location;

#[cfg(feature = "permission")]
pub use geobeacon_permission as permission;

#[cfg(feature = "report")]
pub use geobeacon_report as report;

#[cfg(feature = "tracker")]
pub use geobeacon_tracker as tracker;
