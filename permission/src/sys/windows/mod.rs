//! Windows authorization implementation using the WinRT `Geolocator`.
//!
//! `RequestAccessAsync` doubles as both the status query and the prompt:
//! the first call shows the system consent dialog, later calls return the
//! recorded decision. Windows does not distinguish foreground-only from
//! background access, so an allowed grant maps to `Always`.

use windows::Devices::Geolocation::{GeolocationAccessStatus, Geolocator};

use crate::{Authorization, PermissionError};

pub(crate) async fn status() -> Authorization {
    match access_status() {
        Ok(status) => map_status(status),
        Err(_) => Authorization::NotDetermined,
    }
}

pub(crate) async fn request() -> Result<Authorization, PermissionError> {
    access_status().map(map_status)
}

fn access_status() -> Result<GeolocationAccessStatus, PermissionError> {
    Geolocator::RequestAccessAsync()
        .map_err(|e| PermissionError::Unknown(e.message().to_string()))?
        .get()
        .map_err(|e| PermissionError::Unknown(e.message().to_string()))
}

fn map_status(status: GeolocationAccessStatus) -> Authorization {
    match status {
        GeolocationAccessStatus::Allowed => Authorization::Always,
        GeolocationAccessStatus::Denied => Authorization::Denied,
        _ => Authorization::NotDetermined,
    }
}
