use serde_json::Value;

use crate::auth::Role;
use crate::ipc::error::err;
use crate::ipc::types::AppState;
use crate::store::users::User;

pub fn str_param(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Absent key and explicit null are both "not provided".
pub fn opt_str_param(params: &Value, key: &str) -> Option<String> {
    str_param(params, key)
}

pub fn bool_param(params: &Value, key: &str) -> Option<bool> {
    params.get(key).and_then(|v| v.as_bool())
}

/// Session gate: the caller must be logged in. Err is a ready-to-send
/// envelope so handlers can `return` it directly.
pub fn require_user(state: &AppState, id: &str) -> Result<User, Value> {
    state
        .current_user
        .clone()
        .ok_or_else(|| err(id, "not_logged_in", "log in first", None))
}

/// Role gate on top of the session gate.
pub fn require_role(state: &AppState, id: &str, role: Role) -> Result<User, Value> {
    let user = require_user(state, id)?;
    if user.role != role.as_str() {
        return Err(err(
            id,
            "forbidden",
            format!("{} account required", role.as_str()),
            None,
        ));
    }
    Ok(user)
}
