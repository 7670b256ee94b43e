//! Linux authorization implementation.
//!
//! There is no per-app location prompt on traditional Linux: GeoClue2
//! gates access at the service level (and sandboxed apps go through
//! portals, which handle their own prompting). From the app's point of
//! view the grant is always in place.

use crate::{Authorization, PermissionError};

pub(crate) async fn status() -> Authorization {
    Authorization::Always
}

pub(crate) async fn request() -> Result<Authorization, PermissionError> {
    Ok(Authorization::Always)
}
