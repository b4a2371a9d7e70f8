use crate::auth::Role;
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::practical_works::{self, PracticalWorkDraft};
use crate::store::submissions::{self, AssignmentKind};
use serde_json::json;

fn draft_from_params(req: &Request) -> Result<PracticalWorkDraft, serde_json::Value> {
    let Some(title) = helpers::str_param(&req.params, "title") else {
        return Err(err(&req.id, "bad_params", "missing title", None));
    };
    if title.trim().is_empty() {
        return Err(err(&req.id, "bad_params", "title must not be empty", None));
    }
    let Some(description) = helpers::str_param(&req.params, "description") else {
        return Err(err(&req.id, "bad_params", "missing description", None));
    };
    Ok(PracticalWorkDraft {
        title: title.trim().to_string(),
        description,
        comment: helpers::opt_str_param(&req.params, "comment"),
        attachment_path: helpers::opt_str_param(&req.params, "attachmentPath"),
        target_level: helpers::opt_str_param(&req.params, "targetLevel"),
        deadline: helpers::opt_str_param(&req.params, "deadline"),
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
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    let draft = match draft_from_params(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match practical_works::create(conn, &course_id, &teacher.id, &draft) {
        Ok(pw) => ok(&req.id, json!({ "practicalWork": pw })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(pw_id) = helpers::str_param(&req.params, "practicalWorkId") else {
        return err(&req.id, "bad_params", "missing practicalWorkId", None);
    };
    let draft = match draft_from_params(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match practical_works::update(conn, &pw_id, &draft) {
        Ok(pw) => ok(&req.id, json!({ "practicalWork": pw })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(pw_id) = helpers::str_param(&req.params, "practicalWorkId") else {
        return err(&req.id, "bad_params", "missing practicalWorkId", None);
    };
    match practical_works::delete(conn, &pw_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(pw_id) = helpers::str_param(&req.params, "practicalWorkId") else {
        return err(&req.id, "bad_params", "missing practicalWorkId", None);
    };
    match practical_works::get(conn, &pw_id) {
        Ok(Some(pw)) => ok(&req.id, json!({ "practicalWork": pw })),
        Ok(None) => err(&req.id, "not_found", "practical work not found", None),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_list_by_course(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    match practical_works::list_by_course(conn, &course_id) {
        Ok(list) => ok(&req.id, json!({ "practicalWorks": list })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_submit(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(pw_id) = helpers::str_param(&req.params, "practicalWorkId") else {
        return err(&req.id, "bad_params", "missing practicalWorkId", None);
    };
    let content = helpers::opt_str_param(&req.params, "content");
    let file_path = helpers::opt_str_param(&req.params, "filePath");
    match submissions::submit(
        conn,
        AssignmentKind::PracticalWork,
        &pw_id,
        &student.id,
        content.as_deref(),
        file_path.as_deref(),
    ) {
        Ok(submission) => ok(&req.id, json!({ "submission": submission })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_submissions_by_work(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(pw_id) = helpers::str_param(&req.params, "practicalWorkId") else {
        return err(&req.id, "bad_params", "missing practicalWorkId", None);
    };
    match submissions::list_by_assignment(conn, AssignmentKind::PracticalWork, &pw_id) {
        Ok(list) => ok(&req.id, json!({ "submissions": list })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_submissions_by_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match submissions::list_by_student(conn, AssignmentKind::PracticalWork, &student.id) {
        Ok(list) => ok(&req.id, json!({ "submissions": list })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "practicalWorks.create" => Some(handle_create(state, req)),
        "practicalWorks.update" => Some(handle_update(state, req)),
        "practicalWorks.delete" => Some(handle_delete(state, req)),
        "practicalWorks.get" => Some(handle_get(state, req)),
        "practicalWorks.listByCourse" => Some(handle_list_by_course(state, req)),
        "practicalWorks.submit" => Some(handle_submit(state, req)),
        "practicalWorks.submissionsByWork" => Some(handle_submissions_by_work(state, req)),
        "practicalWorks.submissionsByStudent" => Some(handle_submissions_by_student(state, req)),
        _ => None,
    }
}
