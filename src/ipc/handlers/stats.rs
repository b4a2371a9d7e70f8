use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::stats;
use serde_json::json;

fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match stats::overview(conn) {
        Ok(overview) => ok(&req.id, json!({ "overview": overview })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_progress(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(kind) = helpers::str_param(&req.params, "kind") else {
        return err(&req.id, "bad_params", "missing kind", None);
    };
    let Some(assignment_id) = helpers::str_param(&req.params, "assignmentId") else {
        return err(&req.id, "bad_params", "missing assignmentId", None);
    };

    let submitted = match kind.as_str() {
        "exercise" => stats::distinct_exercise_submitters(conn, &assignment_id),
        "practicalWork" => stats::distinct_practical_work_submitters(conn, &assignment_id),
        "quiz" => stats::distinct_quiz_takers(conn, &assignment_id),
        _ => {
            return err(
                &req.id,
                "bad_params",
                "kind must be one of: exercise, practicalWork, quiz",
                None,
            )
        }
    };
    let submitted = match submitted {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    match stats::assignment_progress(conn, submitted) {
        Ok(progress) => ok(&req.id, json!({ "progress": progress })),
        Err(e) => fail(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "stats.overview" => Some(handle_overview(state, req)),
        "stats.progress" => Some(handle_progress(state, req)),
        _ => None,
    }
}
