use crate::auth::Role;
use crate::ipc::error::{err, fail, ok};
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::store::quizzes::{self, QuizDraft};
use crate::store::results::{self, AnswerChoice};
use serde_json::json;

fn draft_from_params(req: &Request) -> Result<QuizDraft, serde_json::Value> {
    let Some(title) = helpers::str_param(&req.params, "title") else {
        return Err(err(&req.id, "bad_params", "missing title", None));
    };
    if title.trim().is_empty() {
        return Err(err(&req.id, "bad_params", "title must not be empty", None));
    }
    let Some(description) = helpers::str_param(&req.params, "description") else {
        return Err(err(&req.id, "bad_params", "missing description", None));
    };
    Ok(QuizDraft {
        title: title.trim().to_string(),
        description,
        comment: helpers::opt_str_param(&req.params, "comment"),
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
    match quizzes::create(conn, &course_id, &teacher.id, &draft) {
        Ok(quiz) => ok(&req.id, json!({ "quiz": quiz })),
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
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    let draft = match draft_from_params(req) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match quizzes::update(conn, &quiz_id, &draft) {
        Ok(quiz) => ok(&req.id, json!({ "quiz": quiz })),
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
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    match quizzes::delete(conn, &quiz_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    match quizzes::get(conn, &quiz_id) {
        Ok(Some(quiz)) => ok(&req.id, json!({ "quiz": quiz })),
        Ok(None) => err(&req.id, "not_found", "quiz not found", None),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_detail(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    match quizzes::detail(conn, &quiz_id) {
        Ok(detail) => ok(&req.id, json!({ "quiz": detail })),
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
    match quizzes::list_by_course(conn, &course_id) {
        Ok(list) => ok(&req.id, json!({ "quizzes": list })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_question_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    let Some(text) = helpers::str_param(&req.params, "text") else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    match quizzes::add_question(conn, &quiz_id, &text) {
        Ok(question) => ok(&req.id, json!({ "question": question })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_question_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(question_id) = helpers::str_param(&req.params, "questionId") else {
        return err(&req.id, "bad_params", "missing questionId", None);
    };
    let Some(text) = helpers::str_param(&req.params, "text") else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    match quizzes::update_question(conn, &question_id, &text) {
        Ok(()) => ok(&req.id, json!({ "updated": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_question_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(question_id) = helpers::str_param(&req.params, "questionId") else {
        return err(&req.id, "bad_params", "missing questionId", None);
    };
    match quizzes::delete_question(conn, &question_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_answer_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(question_id) = helpers::str_param(&req.params, "questionId") else {
        return err(&req.id, "bad_params", "missing questionId", None);
    };
    let Some(text) = helpers::str_param(&req.params, "text") else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    let is_correct = helpers::bool_param(&req.params, "isCorrect").unwrap_or(false);
    match quizzes::add_answer(conn, &question_id, &text, is_correct) {
        Ok(answer) => ok(&req.id, json!({ "answer": answer })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_answer_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(answer_id) = helpers::str_param(&req.params, "answerId") else {
        return err(&req.id, "bad_params", "missing answerId", None);
    };
    let Some(text) = helpers::str_param(&req.params, "text") else {
        return err(&req.id, "bad_params", "missing text", None);
    };
    let Some(is_correct) = helpers::bool_param(&req.params, "isCorrect") else {
        return err(&req.id, "bad_params", "missing isCorrect", None);
    };
    match quizzes::update_answer(conn, &answer_id, &text, is_correct) {
        Ok(()) => ok(&req.id, json!({ "updated": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_answer_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(answer_id) = helpers::str_param(&req.params, "answerId") else {
        return err(&req.id, "bad_params", "missing answerId", None);
    };
    match quizzes::delete_answer(conn, &answer_id) {
        Ok(()) => ok(&req.id, json!({ "deleted": true })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_has_taken(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    match results::has_student_taken_quiz(conn, &quiz_id, &student.id) {
        Ok(taken) => ok(&req.id, json!({ "taken": taken })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_submit_attempt(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    let Some(raw_answers) = req.params.get("answers") else {
        return err(&req.id, "bad_params", "missing answers", None);
    };
    let answers: Vec<AnswerChoice> = match serde_json::from_value(raw_answers.clone()) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "bad_params", format!("invalid answers: {e}"), None),
    };
    let is_completed = helpers::bool_param(&req.params, "isCompleted").unwrap_or(true);

    match results::submit_attempt(conn, &quiz_id, &student.id, &answers, is_completed) {
        Ok(result) => ok(&req.id, json!({ "result": result })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_results_by_quiz(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = helpers::require_role(state, &req.id, Role::Teacher) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    match results::list_by_quiz(conn, &quiz_id) {
        Ok(list) => ok(&req.id, json!({ "results": list })),
        Err(e) => fail(&req.id, &e),
    }
}

fn handle_result_for_student(state: &mut AppState, req: &Request) -> serde_json::Value {
    let student = match helpers::require_role(state, &req.id, Role::Student) {
        Ok(u) => u,
        Err(resp) => return resp,
    };
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(quiz_id) = helpers::str_param(&req.params, "quizId") else {
        return err(&req.id, "bad_params", "missing quizId", None);
    };
    let result = match results::get_for_student(conn, &quiz_id, &student.id) {
        Ok(v) => v,
        Err(e) => return fail(&req.id, &e),
    };
    match result {
        Some(result) => {
            let answers = match results::list_answers(conn, &result.id) {
                Ok(v) => v,
                Err(e) => return fail(&req.id, &e),
            };
            ok(&req.id, json!({ "result": result, "answers": answers }))
        }
        None => ok(&req.id, json!({ "result": null, "answers": [] })),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "quizzes.create" => Some(handle_create(state, req)),
        "quizzes.update" => Some(handle_update(state, req)),
        "quizzes.delete" => Some(handle_delete(state, req)),
        "quizzes.get" => Some(handle_get(state, req)),
        "quizzes.detail" => Some(handle_detail(state, req)),
        "quizzes.listByCourse" => Some(handle_list_by_course(state, req)),
        "quizzes.hasTaken" => Some(handle_has_taken(state, req)),
        "quizzes.submitAttempt" => Some(handle_submit_attempt(state, req)),
        "quizzes.resultsByQuiz" => Some(handle_results_by_quiz(state, req)),
        "quizzes.resultForStudent" => Some(handle_result_for_student(state, req)),
        "questions.create" => Some(handle_question_create(state, req)),
        "questions.update" => Some(handle_question_update(state, req)),
        "questions.delete" => Some(handle_question_delete(state, req)),
        "answers.create" => Some(handle_answer_create(state, req)),
        "answers.update" => Some(handle_answer_update(state, req)),
        "answers.delete" => Some(handle_answer_delete(state, req)),
        _ => None,
    }
}
