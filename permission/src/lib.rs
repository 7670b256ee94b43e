//! Location authorization gate.
//!
//! A background beacon needs always-on location authorization; this crate
//! answers "do we have it" ([`status`]) and "ask the platform for it"
//! ([`request`]). The core checks once at startup and, when the answer is
//! insufficient, hands the problem to the presentation layer through the
//! [`AuthorizationPrompt`] callback. Nothing here blocks on the user:
//! sensing is started speculatively either way.

/// Platform-specific implementations.
pub mod sys;

/// The authorization the platform currently grants for location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authorization {
    /// Location is available at any time, including in the background.
    Always,
    /// Location is available only while the app is in use.
    WhenInUse,
    /// The user denied location access.
    Denied,
    /// Access is restricted by device policy (parental controls and the
    /// like); the user cannot change it.
    Restricted,
    /// The user has not been asked yet.
    NotDetermined,
}

impl Authorization {
    /// Whether this grant is enough for background beaconing.
    #[must_use]
    pub const fn is_sufficient(self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Errors that can occur when requesting authorization.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PermissionError {
    /// This platform has no authorization mechanism to ask.
    #[error("authorization requests not supported on this platform")]
    NotSupported,
    /// The platform reported an error.
    #[error("authorization request failed: {0}")]
    Unknown(String),
}

/// Current authorization state, without prompting the user.
pub async fn status() -> Authorization {
    sys::status().await
}

/// Ask the platform for location authorization.
///
/// If the user has already decided, the current state comes back without a
/// prompt.
///
/// # Errors
///
/// Returns a [`PermissionError`] if the platform cannot service the
/// request.
pub async fn request() -> Result<Authorization, PermissionError> {
    sys::request().await
}

/// Presentation callback invoked when authorization is insufficient.
///
/// Implementations surface whatever UI fits the host app (an alert with a
/// link to system settings, typically). The core never waits for or reads
/// an outcome.
pub trait AuthorizationPrompt: Send + Sync {
    /// The current grant is not enough for background beaconing.
    fn authorization_insufficient(&self, current: Authorization);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_always_is_sufficient() {
        assert!(Authorization::Always.is_sufficient());
        assert!(!Authorization::WhenInUse.is_sufficient());
        assert!(!Authorization::Denied.is_sufficient());
        assert!(!Authorization::Restricted.is_sufficient());
        assert!(!Authorization::NotDetermined.is_sufficient());
    }
}
