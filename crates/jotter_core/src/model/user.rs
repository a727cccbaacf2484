//! Cached identity of the signed-in user.

use serde::{Deserialize, Serialize};

/// Identity mirrored from the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Provider-issued identity token.
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}
