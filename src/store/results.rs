use crate::error::{is_unique_violation, StoreError};
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: String,
    pub quiz_id: String,
    pub student_id: String,
    pub score: f64,
    pub is_completed: bool,
    pub submitted_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAnswer {
    pub id: String,
    pub quiz_result_id: String,
    pub question_id: String,
    pub selected_answer_id: Option<String>,
    pub is_correct: bool,
}

/// One answered question in an attempt. A null selection means the student
/// left the question blank.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerChoice {
    pub question_id: String,
    pub selected_answer_id: Option<String>,
}

fn result_from_row(row: &Row) -> rusqlite::Result<QuizResult> {
    Ok(QuizResult {
        id: row.get(0)?,
        quiz_id: row.get(1)?,
        student_id: row.get(2)?,
        score: row.get(3)?,
        is_completed: row.get(4)?,
        submitted_at: row.get(5)?,
    })
}

fn student_answer_from_row(row: &Row) -> rusqlite::Result<StudentAnswer> {
    Ok(StudentAnswer {
        id: row.get(0)?,
        quiz_result_id: row.get(1)?,
        question_id: row.get(2)?,
        selected_answer_id: row.get(3)?,
        is_correct: row.get(4)?,
    })
}

const RESULT_COLUMNS: &str = "id, quiz_id, student_id, score, is_completed, submitted_at";

/// Advisory pre-check for the UI. The hard guarantee is the
/// UNIQUE(quiz_id, student_id) constraint enforced at insert time.
pub fn has_student_taken_quiz(
    conn: &Connection,
    quiz_id: &str,
    student_id: &str,
) -> Result<bool, StoreError> {
    let row: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM quiz_results WHERE quiz_id = ? AND student_id = ?",
            [quiz_id, student_id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(row.is_some())
}

/// Commits one quiz attempt atomically: the result row plus the whole answer
/// batch, or nothing. Every answer row is validated against the quiz before
/// insertion; the score is derived inside the same transaction as the percent
/// of correct answers.
pub fn submit_attempt(
    conn: &Connection,
    quiz_id: &str,
    student_id: &str,
    answers: &[AnswerChoice],
    is_completed: bool,
) -> Result<QuizResult, StoreError> {
    if super::quizzes::get(conn, quiz_id)?.is_none() {
        return Err(StoreError::NotFound("quiz"));
    }

    let tx = conn.unchecked_transaction()?;

    let result_id = Uuid::new_v4().to_string();
    let submitted_at = now_rfc3339();
    tx.execute(
        "INSERT INTO quiz_results(id, quiz_id, student_id, score, is_completed, submitted_at)
         VALUES(?, ?, ?, 0.0, ?, ?)",
        (&result_id, quiz_id, student_id, is_completed, &submitted_at),
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::conflict("quiz already attempted by this student")
        } else {
            StoreError::Db(e)
        }
    })?;

    let mut correct_count: usize = 0;
    for choice in answers {
        // The question must belong to the quiz being attempted.
        let in_quiz: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM questions WHERE id = ? AND quiz_id = ?",
                [choice.question_id.as_str(), quiz_id],
                |r| r.get(0),
            )
            .optional()?;
        if in_quiz.is_none() {
            return Err(StoreError::invalid(
                "answer references a question outside this quiz",
            ));
        }

        // Correctness is derived from the stored flag; a blank selection and
        // a selection pointing outside the question both count as incorrect,
        // but a foreign answer id is a validation error, not a wrong answer.
        let is_correct = match choice.selected_answer_id.as_deref() {
            None => false,
            Some(answer_id) => {
                let flag: Option<bool> = tx
                    .query_row(
                        "SELECT is_correct FROM answers WHERE id = ? AND question_id = ?",
                        [answer_id, choice.question_id.as_str()],
                        |r| r.get(0),
                    )
                    .optional()?;
                match flag {
                    Some(v) => v,
                    None => {
                        return Err(StoreError::invalid(
                            "selected answer does not belong to the question",
                        ))
                    }
                }
            }
        };
        if is_correct {
            correct_count += 1;
        }

        let inserted = tx.execute(
            "INSERT INTO student_answers(id, quiz_result_id, question_id,
                                         selected_answer_id, is_correct)
             VALUES(?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                &result_id,
                &choice.question_id,
                &choice.selected_answer_id,
                is_correct,
            ),
        )?;
        if inserted != 1 {
            return Err(StoreError::invalid("answer row was not persisted"));
        }
    }

    let score = if answers.is_empty() {
        0.0
    } else {
        100.0 * correct_count as f64 / answers.len() as f64
    };
    tx.execute(
        "UPDATE quiz_results SET score = ? WHERE id = ?",
        (score, &result_id),
    )?;

    tx.commit()?;

    Ok(QuizResult {
        id: result_id,
        quiz_id: quiz_id.to_string(),
        student_id: student_id.to_string(),
        score,
        is_completed,
        submitted_at,
    })
}

pub fn list_by_quiz(conn: &Connection, quiz_id: &str) -> Result<Vec<QuizResult>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RESULT_COLUMNS} FROM quiz_results
         WHERE quiz_id = ?
         ORDER BY submitted_at DESC"
    ))?;
    let results = stmt
        .query_map([quiz_id], result_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(results)
}

pub fn get_for_student(
    conn: &Connection,
    quiz_id: &str,
    student_id: &str,
) -> Result<Option<QuizResult>, StoreError> {
    let result = conn
        .query_row(
            &format!(
                "SELECT {RESULT_COLUMNS} FROM quiz_results
                 WHERE quiz_id = ? AND student_id = ?"
            ),
            [quiz_id, student_id],
            result_from_row,
        )
        .optional()?;
    Ok(result)
}

pub fn list_answers(
    conn: &Connection,
    quiz_result_id: &str,
) -> Result<Vec<StudentAnswer>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, quiz_result_id, question_id, selected_answer_id, is_correct
         FROM student_answers
         WHERE quiz_result_id = ?
         ORDER BY rowid ASC",
    )?;
    let answers = stmt
        .query_map([quiz_result_id], student_answer_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(answers)
}
