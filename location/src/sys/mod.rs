//! Platform-specific location sources.

use std::sync::Arc;

use crate::{LocationResult, LocationSource};

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
pub use linux::GeoClueSource;

#[cfg(target_os = "windows")]
pub use windows::GeolocatorSource;

/// Connect to this platform's built-in location source.
///
/// Platforms without a built-in source (Apple and Android hosts wire the
/// native location stack in through the [`LocationSource`] trait instead)
/// get [`LocationError::Unsupported`](crate::LocationError::Unsupported).
///
/// # Errors
///
/// Returns an error if the platform service cannot be reached.
#[cfg(target_os = "linux")]
pub async fn platform_source() -> LocationResult<Arc<dyn LocationSource>> {
    Ok(Arc::new(linux::GeoClueSource::connect().await?))
}

/// Connect to this platform's built-in location source.
///
/// # Errors
///
/// Returns an error if the platform service cannot be reached.
#[cfg(target_os = "windows")]
pub async fn platform_source() -> LocationResult<Arc<dyn LocationSource>> {
    Ok(Arc::new(windows::GeolocatorSource::new()))
}

/// Connect to this platform's built-in location source.
///
/// # Errors
///
/// Always returns [`LocationError::Unsupported`](crate::LocationError::Unsupported)
/// on this platform.
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub async fn platform_source() -> LocationResult<Arc<dyn LocationSource>> {
    Err(crate::LocationError::Unsupported)
}
