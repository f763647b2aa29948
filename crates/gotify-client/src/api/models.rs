//! Gotify REST API response types.

use serde::{Deserialize, Serialize};

/// An application registered on the server (`GET /application`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub description: String,
}

/// The user owning the client token (`GET /current/user`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub admin: bool,
}
