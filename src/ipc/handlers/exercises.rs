use crate::auth::Role;
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::exercises::{self, ExerciseDraft};
use crate::store::submissions::{self, AssignmentKind};
use serde_json::json;

fn draft_from_params(req: &Request) -> Result<ExerciseDraft, serde_json::Value> {
    let Some(title) = helpers::str_param(&req.params, "title") else {
        return Err(err(&req.id, "bad_params", "missing title", None));
    };
    if title.trim().is_empty() {
        return Err(err(&req.id, "bad_params", "title must not be empty", None));
    }
    let Some(description) = helpers::str_param(&req.params, "description") else {
        return Err(err(&req.id, "bad_params", "missing description", None));
    };
    Ok(ExerciseDraft {
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
    let Some(course_id) = helpers::str_param(&req.params, "courseId") else {
        return err(&req.id, "bad_params", "missing courseId", None);
    };
    let draft = match draft_from_params(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match exercises::create(conn, &course_id, &teacher.id, &draft) {
        Ok(exercise) => ok(&req.id, json!({ "exercise": exercise })),
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
    let Some(exercise_id) = helpers::str_param(&req.params, "exerciseId") else {
        return err(&req.id, "bad_params", "missing exerciseId", None);
    };
    let draft = match draft_from_params(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match exercises::update(conn, &exercise_id, &draft) {
        Ok(exercise) => ok(&req.id, json!({ "exercise": exercise })),
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
    let Some(exercise_id) = helpers::str_param(&req.params, "exerciseId") else {
        return err(&req.id, "bad_params", "missing exerciseId", None);
    };
    match exercises::delete(conn, &exercise_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(exercise_id) = helpers::str_param(&req.params, "exerciseId") else {
        return err(&req.id, "bad_params", "missing exerciseId", None);
    };
    match exercises::get(conn, &exercise_id) {
        Ok(Some(exercise)) => ok(&req.id, json!({ "exercise": exercise })),
        Ok(None) => err(&req.id, "not_found", "exercise not found", None),
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
    match exercises::list_by_course(conn, &course_id) {
        Ok(list) => ok(&req.id, json!({ "exercises": list })),
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
    let Some(exercise_id) = helpers::str_param(&req.params, "exerciseId") else {
        return err(&req.id, "bad_params", "missing exerciseId", None);
    };
    let content = helpers::opt_str_param(&req.params, "content");
    let file_path = helpers::opt_str_param(&req.params, "filePath");
    match submissions::submit(
        conn,
        AssignmentKind::Exercise,
        &exercise_id,
        &student.id,
        content.as_deref(),
        file_path.as_deref(),
    ) {
        Ok(submission) => ok(&req.id, json!({ "submission": submission })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_submissions_by_exercise(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(exercise_id) = helpers::str_param(&req.params, "exerciseId") else {
        return err(&req.id, "bad_params", "missing exerciseId", None);
    };
    match submissions::list_by_assignment(conn, AssignmentKind::Exercise, &exercise_id) {
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
    match submissions::list_by_student(conn, AssignmentKind::Exercise, &student.id) {
        Ok(list) => ok(&req.id, json!({ "submissions": list })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "exercises.create" => Some(handle_create(state, req)),
        "exercises.update" => Some(handle_update(state, req)),
        "exercises.delete" => Some(handle_delete(state, req)),
        "exercises.get" => Some(handle_get(state, req)),
        "exercises.listByCourse" => Some(handle_list_by_course(state, req)),
        "exercises.submit" => Some(handle_submit(state, req)),
        "exercises.submissionsByExercise" => Some(handle_submissions_by_exercise(state, req)),
        "exercises.submissionsByStudent" => Some(handle_submissions_by_student(state, req)),
        _ => None,
    }
}
