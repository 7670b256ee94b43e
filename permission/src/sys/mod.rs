//! Platform-specific authorization implementations.

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
pub(crate) use linux::{request, status};

#[cfg(target_os = "windows")]
pub(crate) use windows::{request, status};

// Fallback for platforms without a built-in gate: the host app owns the
// native authorization flow and reports through its own LocationSource.
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub(crate) async fn status() -> crate::Authorization {
    crate::Authorization::NotDetermined
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
pub(crate) async fn request() -> Result<crate::Authorization, crate::PermissionError> {
    Err(crate::PermissionError::NotSupported)
}
