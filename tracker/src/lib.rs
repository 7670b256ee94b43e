//! The geobeacon sampling and reporting loop.
//!
//! [`BeaconTracker`] ties the kit together: it owns the last-known
//! [`PositionState`], duty-cycles a
//! [`LocationSource`](geobeacon_location::LocationSource) through the
//! [`SampleScheduler`], and hands every valid position to a
//! [`ReportSink`](geobeacon_report::ReportSink). The tracker is an
//! explicit, injectable service — construct it once at process start and
//! share the returned `Arc` with whatever needs to trigger updates.
//!
//! # Usage
//!
//! ```ignore
//! use geobeacon_location::sys;
//! use geobeacon_report::Reporter;
//! use geobeacon_tracker::{BeaconTracker, TrackerConfig};
//! use std::sync::Arc;
//!
//! let source = sys::platform_source().await?;
//! let tracker = BeaconTracker::start(
//!     source,
//!     Arc::new(Reporter::new()),
//!     TrackerConfig::default(),
//! );
//!
//! // The UI's "locate me" button, outside the sampling cadence:
//! tracker.request_fix();
//! ```

mod scheduler;
mod service;
mod state;

pub use scheduler::{SampleConfig, SampleScheduler};
pub use service::{BeaconTracker, MapRegion, TrackerConfig, TrackerEvent, REGION_SPAN_METERS};
pub use state::PositionState;

pub use geobeacon_location::Fix;
pub use geobeacon_permission::{Authorization, AuthorizationPrompt};
pub use geobeacon_report::PositionReport;
