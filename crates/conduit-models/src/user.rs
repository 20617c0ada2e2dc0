use serde::{Deserialize, Serialize};

/// Account view returned by the auth endpoints; `token` is the JWT the
/// client should present on subsequent requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub token: String,
}

/// Public view of another user, relative to the viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    pub following: bool,
}
