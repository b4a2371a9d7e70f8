use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::store::users::User;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Process state: the open workspace, its memoized connection, and at most
/// one authenticated identity (one desktop user per sidecar process).
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub current_user: Option<User>,
}
