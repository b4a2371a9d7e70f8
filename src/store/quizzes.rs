use crate::error::StoreError;
use crate::store::now_rfc3339;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: String,
    pub course_id: String,
    pub teacher_id: String,
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub target_level: Option<String>,
    pub created_at: String,
}

#[derive(Debug)]
pub struct QuizDraft {
    pub title: String,
    pub description: String,
    pub comment: Option<String>,
    pub target_level: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub quiz_id: String,
    pub text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub text: String,
    pub is_correct: bool,
}

/// A question with its answers, assembled in memory for the quiz-taking UI.
/// Never persisted as a nested structure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<QuestionDetail>,
}

fn quiz_from_row(row: &Row) -> rusqlite::Result<Quiz> {
    Ok(Quiz {
        id: row.get(0)?,
        course_id: row.get(1)?,
        teacher_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        comment: row.get(5)?,
        target_level: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn question_from_row(row: &Row) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get(0)?,
        quiz_id: row.get(1)?,
        text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn answer_from_row(row: &Row) -> rusqlite::Result<Answer> {
    Ok(Answer {
        id: row.get(0)?,
        question_id: row.get(1)?,
        text: row.get(2)?,
        is_correct: row.get(3)?,
    })
}

const QUIZ_COLUMNS: &str =
    "id, course_id, teacher_id, title, description, comment, target_level, created_at";

pub fn create(
    conn: &Connection,
    course_id: &str,
    teacher_id: &str,
    draft: &QuizDraft,
) -> Result<Quiz, StoreError> {
    if super::courses::get(conn, course_id)?.is_none() {
        return Err(StoreError::NotFound("course"));
    }
    let quiz = Quiz {
        id: Uuid::new_v4().to_string(),
        course_id: course_id.to_string(),
        teacher_id: teacher_id.to_string(),
        title: draft.title.clone(),
        description: draft.description.clone(),
        comment: draft.comment.clone(),
        target_level: draft.target_level.clone(),
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO quizzes(id, course_id, teacher_id, title, description, comment,
                             target_level, created_at)
         VALUES(?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &quiz.id,
            &quiz.course_id,
            &quiz.teacher_id,
            &quiz.title,
            &quiz.description,
            &quiz.comment,
            &quiz.target_level,
            &quiz.created_at,
        ),
    )?;
    Ok(quiz)
}

pub fn update(conn: &Connection, id: &str, draft: &QuizDraft) -> Result<Quiz, StoreError> {
    let changed = conn.execute(
        "UPDATE quizzes
         SET title = ?, description = ?, comment = ?, target_level = ?
         WHERE id = ?",
        (
            &draft.title,
            &draft.description,
            &draft.comment,
            &draft.target_level,
            id,
        ),
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("quiz"));
    }
    get(conn, id)?.ok_or(StoreError::NotFound("quiz"))
}

pub fn get(conn: &Connection, id: &str) -> Result<Option<Quiz>, StoreError> {
    let quiz = conn
        .query_row(
            &format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?"),
            [id],
            quiz_from_row,
        )
        .optional()?;
    Ok(quiz)
}

pub fn list_by_course(conn: &Connection, course_id: &str) -> Result<Vec<Quiz>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {QUIZ_COLUMNS} FROM quizzes
         WHERE course_id = ?
         ORDER BY created_at DESC"
    ))?;
    let quizzes = stmt
        .query_map([course_id], quiz_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quizzes)
}

pub fn delete(conn: &Connection, id: &str) -> Result<(), StoreError> {
    if get(conn, id)?.is_none() {
        return Err(StoreError::NotFound("quiz"));
    }
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM student_answers
         WHERE quiz_result_id IN (SELECT id FROM quiz_results WHERE quiz_id = ?)",
        [id],
    )?;
    tx.execute("DELETE FROM quiz_results WHERE quiz_id = ?", [id])?;
    tx.execute(
        "DELETE FROM answers
         WHERE question_id IN (SELECT id FROM questions WHERE quiz_id = ?)",
        [id],
    )?;
    tx.execute("DELETE FROM questions WHERE quiz_id = ?", [id])?;
    tx.execute("DELETE FROM quizzes WHERE id = ?", [id])?;
    tx.commit()?;
    Ok(())
}

pub fn add_question(conn: &Connection, quiz_id: &str, text: &str) -> Result<Question, StoreError> {
    if get(conn, quiz_id)?.is_none() {
        return Err(StoreError::NotFound("quiz"));
    }
    let question = Question {
        id: Uuid::new_v4().to_string(),
        quiz_id: quiz_id.to_string(),
        text: text.to_string(),
        created_at: now_rfc3339(),
    };
    conn.execute(
        "INSERT INTO questions(id, quiz_id, text, created_at) VALUES(?, ?, ?, ?)",
        (
            &question.id,
            &question.quiz_id,
            &question.text,
            &question.created_at,
        ),
    )?;
    Ok(question)
}

pub fn update_question(conn: &Connection, id: &str, text: &str) -> Result<(), StoreError> {
    let changed = conn.execute("UPDATE questions SET text = ? WHERE id = ?", (text, id))?;
    if changed == 0 {
        return Err(StoreError::NotFound("question"));
    }
    Ok(())
}

pub fn delete_question(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM student_answers WHERE question_id = ?",
        [id],
    )?;
    tx.execute("DELETE FROM answers WHERE question_id = ?", [id])?;
    let changed = tx.execute("DELETE FROM questions WHERE id = ?", [id])?;
    if changed == 0 {
        return Err(StoreError::NotFound("question"));
    }
    tx.commit()?;
    Ok(())
}

pub fn list_questions(conn: &Connection, quiz_id: &str) -> Result<Vec<Question>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, quiz_id, text, created_at FROM questions
         WHERE quiz_id = ?
         ORDER BY created_at ASC",
    )?;
    let questions = stmt
        .query_map([quiz_id], question_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(questions)
}

pub fn add_answer(
    conn: &Connection,
    question_id: &str,
    text: &str,
    is_correct: bool,
) -> Result<Answer, StoreError> {
    let exists: Option<i64> = conn
        .query_row("SELECT 1 FROM questions WHERE id = ?", [question_id], |r| {
            r.get(0)
        })
        .optional()?;
    if exists.is_none() {
        return Err(StoreError::NotFound("question"));
    }
    let answer = Answer {
        id: Uuid::new_v4().to_string(),
        question_id: question_id.to_string(),
        text: text.to_string(),
        is_correct,
    };
    conn.execute(
        "INSERT INTO answers(id, question_id, text, is_correct) VALUES(?, ?, ?, ?)",
        (
            &answer.id,
            &answer.question_id,
            &answer.text,
            answer.is_correct,
        ),
    )?;
    Ok(answer)
}

pub fn update_answer(
    conn: &Connection,
    id: &str,
    text: &str,
    is_correct: bool,
) -> Result<(), StoreError> {
    let changed = conn.execute(
        "UPDATE answers SET text = ?, is_correct = ? WHERE id = ?",
        (text, is_correct, id),
    )?;
    if changed == 0 {
        return Err(StoreError::NotFound("answer"));
    }
    Ok(())
}

pub fn delete_answer(conn: &Connection, id: &str) -> Result<(), StoreError> {
    let tx = conn.unchecked_transaction()?;
    // Attempts that picked this answer keep their row; the choice is gone.
    tx.execute(
        "UPDATE student_answers SET selected_answer_id = NULL WHERE selected_answer_id = ?",
        [id],
    )?;
    let changed = tx.execute("DELETE FROM answers WHERE id = ?", [id])?;
    if changed == 0 {
        return Err(StoreError::NotFound("answer"));
    }
    tx.commit()?;
    Ok(())
}

pub fn list_answers(conn: &Connection, question_id: &str) -> Result<Vec<Answer>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, question_id, text, is_correct FROM answers
         WHERE question_id = ?
         ORDER BY rowid ASC",
    )?;
    let answers = stmt
        .query_map([question_id], answer_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(answers)
}

pub fn detail(conn: &Connection, quiz_id: &str) -> Result<QuizDetail, StoreError> {
    let quiz = get(conn, quiz_id)?.ok_or(StoreError::NotFound("quiz"))?;
    let mut questions = Vec::new();
    for question in list_questions(conn, quiz_id)? {
        let answers = list_answers(conn, &question.id)?;
        questions.push(QuestionDetail { question, answers });
    }
    Ok(QuizDetail { quiz, questions })
}
