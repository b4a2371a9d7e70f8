use crate::auth::{self, Role, SignUpRequest};
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_sign_up(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    let Some(name) = helpers::str_param(&req.params, "name") else {
        return err(&req.id, "bad_params", "missing name", None);
    };
    let Some(matricule) = helpers::str_param(&req.params, "matricule") else {
        return err(&req.id, "bad_params", "missing matricule", None);
    };
    let Some(role_raw) = helpers::str_param(&req.params, "role") else {
        return err(&req.id, "bad_params", "missing role", None);
    };
    let Some(role) = Role::parse(&role_raw) else {
        return err(&req.id, "bad_params", "role must be student or teacher", None);
    };
    let Some(password) = helpers::str_param(&req.params, "password") else {
        return err(&req.id, "bad_params", "missing password", None);
    };
    let level = helpers::opt_str_param(&req.params, "level");

    let sign_up = SignUpRequest {
        name,
        matricule,
        role,
        level,
        password,
    };
    match auth::sign_up(conn, &sign_up) {
        Ok(user) => ok(&req.id, json!({ "user": user })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(matricule) = helpers::str_param(&req.params, "matricule") else {
        return err(&req.id, "bad_params", "missing matricule", None);
    };
    let Some(password) = helpers::str_param(&req.params, "password") else {
        return err(&req.id, "bad_params", "missing password", None);
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };

    match auth::login(conn, &matricule, &password) {
        Ok(user) => {
            let resp = ok(&req.id, json!({ "user": user }));
            state.current_user = Some(user);
            resp
        }
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let was_logged_in = state.current_user.take().is_some();
    ok(&req.id, json!({ "wasLoggedIn": was_logged_in }))
}

fn handle_current_user(state: &mut AppState, req: &Request) -> serde_json::Value {
    match state.current_user.as_ref() {
        Some(user) => ok(&req.id, json!({ "user": user })),
        None => ok(&req.id, json!({ "user": null })),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.signUp" => Some(handle_sign_up(state, req)),
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.currentUser" => Some(handle_current_user(state, req)),
        _ => None,
    }
}
