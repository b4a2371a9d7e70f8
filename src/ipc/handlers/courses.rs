use crate::auth::Role;
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::courses::{self, CourseDraft};
use serde_json::json;

fn draft_from_params(req: &Request) -> Result<CourseDraft, serde_json::Value> {
    let Some(title) = helpers::str_param(&req.params, "title") else {
        return Err(err(&req.id, "bad_params", "missing title", None));
    };
    if title.trim().is_empty() {
        return Err(err(&req.id, "bad_params", "title must not be empty", None));
    }
    let Some(description) = helpers::str_param(&req.params, "description") else {
        return Err(err(&req.id, "bad_params", "missing description", None));
    };
    Ok(CourseDraft {
        title: title.trim().to_string(),
        description,
        comment: helpers::opt_str_param(&req.params, "comment"),
        attachment_path: helpers::opt_str_param(&req.params, "attachmentPath"),
        target_level: helpers::opt_str_param(&req.params, "targetLevel"),
    })
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let teacher = match helpers::require_role(state, &req.id, Role::Teacher) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let draft = match draft_from_params(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match courses::create(conn, &teacher.id, &draft) {
        Ok(course) => ok(&req.id, json!({ "course": course })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let teacher = match helpers::require_role(state, &req.id, Role::Teacher) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match courses::get(conn, &course_id) {
        Ok(Some(existing)) if existing.teacher_id != teacher.id => {
            return err(&req.id, "forbidden", "course belongs to another teacher", None);
        }
        Ok(Some(_)) => {}
        Ok(None) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return fail(&req.id, &e),
    }
    let draft = match draft_from_params(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match courses::update(conn, &course_id, &draft) {
        Ok(course) => ok(&req.id, json!({ "course": course })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let teacher = match helpers::require_role(state, &req.id, Role::Teacher) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match courses::get(conn, &course_id) {
        Ok(Some(existing)) if existing.teacher_id != teacher.id => {
            return err(&req.id, "forbidden", "course belongs to another teacher", None);
        }
        Ok(Some(_)) => {}
        Ok(None) => return err(&req.id, "not_found", "course not found", None),
        Err(e) => return fail(&req.id, &e),
    }
    match courses::delete(conn, &course_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match courses::get(conn, &course_id) {
        Ok(Some(course)) => ok(&req.id, json!({ "course": course })),
        Ok(None) => err(&req.id, "not_found", "course not found", None),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_list_by_teacher(state: &mut AppState, req: &Request) -> serde_json::Value {
    let teacher = match helpers::require_role(state, &req.id, Role::Teacher) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match courses::list_by_teacher(conn, &teacher.id) {
        Ok(list) => ok(&req.id, json!({ "courses": list })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_list_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    // Students always carry a level; enforced at signup.
    let Some(level) = student.level.as_deref() else {
        return err(&req.id, "forbidden", "student account has no level", None);
    };
    match courses::list_for_level(conn, level) {
        Ok(list) => ok(&req.id, json!({ "courses": list })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "courses.create" => Some(handle_create(state, req)),
        "courses.update" => Some(handle_update(state, req)),
        "courses.delete" => Some(handle_delete(state, req)),
        "courses.get" => Some(handle_get(state, req)),
        "courses.listByTeacher" => Some(handle_list_by_teacher(state, req)),
        "courses.listForStudent" => Some(handle_list_for_student(state, req)),
        _ => None,
    }
}
