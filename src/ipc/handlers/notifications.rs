use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::notifications;
use serde_json::json;

fn handle_push(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_user(state, &req.id) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(user_id) = helpers::str_param(&req.params, "userId") else {
        return err(&req.id, "bad_params", "missing userId", None);
    };
    let Some(message) = helpers::str_param(&req.params, "message") else {
        return err(&req.id, "bad_params", "missing message", None);
    };
    match notifications::push(conn, &user_id, &message) {
        Ok(notification) => ok(&req.id, json!({ "notification": notification })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user = match helpers::require_user(state, &req.id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match notifications::list_for_user(conn, &user.id) {
        Ok(list) => ok(&req.id, json!({ "notifications": list })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_unseen_count(state: &mut AppState, req: &Request) -> serde_json::Value {
    let user = match helpers::require_user(state, &req.id) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match notifications::unseen_count(conn, &user.id) {
        Ok(count) => ok(&req.id, json!({ "unseen": count })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_mark_seen(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_user(state, &req.id) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(notification_id) = helpers::str_param(&req.params, "notificationId") else {
        return err(&req.id, "bad_params", "missing notificationId", None);
    };
    match notifications::mark_seen(conn, &notification_id) {
        Ok(()) => ok(&req.id, json!({ "seen": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_user(state, &req.id) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(notification_id) = helpers::str_param(&req.params, "notificationId") else {
        return err(&req.id, "bad_params", "missing notificationId", None);
    };
    match notifications::delete(conn, &notification_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "notifications.push" => Some(handle_push(state, req)),
        "notifications.list" => Some(handle_list(state, req)),
        "notifications.unseenCount" => Some(handle_unseen_count(state, req)),
        "notifications.markSeen" => Some(handle_mark_seen(state, req)),
        "notifications.delete" => Some(handle_delete(state, req)),
        _ => None,
    }
}
