use crate::error::StoreError;
use rusqlite::Connection;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub students: i64,
    pub teachers: i64,
    pub courses: i64,
    pub exercises: i64,
    pub practical_works: i64,
    pub quizzes: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentProgress {
    pub submitted: i64,
    pub total_students: i64,
    pub percent: f64,
}

/// Share of the student body that submitted, as a percentage. Defined as 0
/// for an empty (or nonsensical) student body rather than dividing by zero.
pub fn progress_percent(submitted: i64, total_students: i64) -> f64 {
    if total_students <= 0 {
        return 0.0;
    }
    100.0 * submitted as f64 / total_students as f64
}

pub fn total_students(conn: &Connection) -> Result<i64, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'student'",
        [],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn overview(conn: &Connection) -> Result<Overview, StoreError> {
    let count = |sql: &str| -> Result<i64, StoreError> {
        Ok(conn.query_row(sql, [], |r| r.get(0))?)
    };
    Ok(Overview {
        students: count("SELECT COUNT(*) FROM users WHERE role = 'student'")?,
        teachers: count("SELECT COUNT(*) FROM users WHERE role = 'teacher'")?,
        courses: count("SELECT COUNT(*) FROM courses")?,
        exercises: count("SELECT COUNT(*) FROM exercises")?,
        practical_works: count("SELECT COUNT(*) FROM practical_works")?,
        quizzes: count("SELECT COUNT(*) FROM quizzes")?,
    })
}

/// Distinct submitters only: a student resubmitting counts once.
pub fn distinct_exercise_submitters(
    conn: &Connection,
    exercise_id: &str,
) -> Result<i64, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(DISTINCT student_id) FROM exercise_submissions WHERE exercise_id = ?",
        [exercise_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn distinct_practical_work_submitters(
    conn: &Connection,
    practical_work_id: &str,
) -> Result<i64, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(DISTINCT student_id) FROM practical_work_submissions
         WHERE practical_work_id = ?",
        [practical_work_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn distinct_quiz_takers(conn: &Connection, quiz_id: &str) -> Result<i64, StoreError> {
    let count = conn.query_row(
        "SELECT COUNT(DISTINCT student_id) FROM quiz_results WHERE quiz_id = ?",
        [quiz_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn assignment_progress(
    conn: &Connection,
    submitted: i64,
) -> Result<AssignmentProgress, StoreError> {
    let total = total_students(conn)?;
    Ok(AssignmentProgress {
        submitted,
        total_students: total,
        percent: progress_percent(submitted, total),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_students_means_zero_percent() {
        assert_eq!(progress_percent(0, 0), 0.0);
        assert_eq!(progress_percent(5, 0), 0.0);
        assert_eq!(progress_percent(1, -3), 0.0);
    }

    #[test]
    fn ratio_is_exact() {
        assert_eq!(progress_percent(1, 4), 25.0);
        assert_eq!(progress_percent(3, 4), 75.0);
        assert_eq!(progress_percent(4, 4), 100.0);
        assert_eq!(progress_percent(1, 3), 100.0 / 3.0);
    }
}
