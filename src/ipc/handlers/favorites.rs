use crate::auth::Role;
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::favorites;
use serde_json::json;

fn handle_add(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match favorites::add(conn, &student.id, &course_id) {
        Ok(()) => ok(&req.id, json!({ "favorited": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_remove(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match favorites::remove(conn, &student.id, &course_id) {
        Ok(()) => ok(&req.id, json!({ "removed": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match favorites::list_by_student(conn, &student.id) {
        Ok(list) => ok(&req.id, json!({ "favorites": list })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_is_favorite(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match favorites::is_favorite(conn, &student.id, &course_id) {
        Ok(flag) => ok(&req.id, json!({ "favorite": flag })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "favorites.add" => Some(handle_add(state, req)),
        "favorites.remove" => Some(handle_remove(state, req)),
        "favorites.list" => Some(handle_list(state, req)),
        "favorites.isFavorite" => Some(handle_is_favorite(state, req)),
        _ => None,
    }
}
