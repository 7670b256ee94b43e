//! Last-known position holder.

use geobeacon_location::Fix;
use geobeacon_report::PositionReport;
use uuid::Uuid;

/// The device's last-known position, plus its stable identity.
///
/// Coordinates default to zero, and `(0, 0)` doubles as the sentinel for
/// "no valid fix yet" — reporting is suppressed until both latitude and
/// longitude are non-zero. Values are never range-checked; whatever the
/// source delivered is what gets held and reported. No history is kept:
/// each fix overwrites the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    device_id: String,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    floor: i32,
}

impl PositionState {
    /// Fresh state with a newly minted device identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::with_device_id(Uuid::new_v4().to_string())
    }

    /// Fresh state with the given device identifier.
    #[must_use]
    pub fn with_device_id(device_id: String) -> Self {
        Self {
            device_id,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            floor: 0,
        }
    }

    /// Stable per-install device identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.device_id
    }

    /// Latitude in degrees; 0 until a fix arrives.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees; 0 until a fix arrives.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.longitude
    }

    /// Altitude in meters; 0 until a fix carries one.
    #[must_use]
    pub const fn alt(&self) -> f64 {
        self.altitude
    }

    /// Building floor level; 0 when unknown.
    #[must_use]
    pub const fn fl(&self) -> i32 {
        self.floor
    }

    /// Overwrite the held position with the fields present in `fix`.
    ///
    /// Each field updates independently: a fix without an altitude or
    /// floor leaves the previous value in place.
    pub fn apply_fix(&mut self, fix: &Fix) {
        self.latitude = fix.latitude;
        self.longitude = fix.longitude;
        if let Some(altitude) = fix.altitude {
            self.altitude = altitude;
        }
        if let Some(floor) = fix.floor {
            self.floor = floor;
        }
    }

    /// Whether a valid fix has been applied.
    #[must_use]
    pub fn has_fix(&self) -> bool {
        self.latitude != 0.0 && self.longitude != 0.0
    }

    /// Snapshot the current position for the wire.
    #[must_use]
    pub fn report(&self) -> PositionReport {
        PositionReport {
            id: self.device_id.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            floor: self.floor,
        }
    }
}

impl Default for PositionState {
    fn default() -> Self {
        Self::new()
    }
}
