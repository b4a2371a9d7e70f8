use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

pub const DB_FILE: &str = "campus.sqlite3";

/// Sample matricules eligible for registration. Seeded on first open and
/// back-filled if individual rows were removed; existing rows are never
/// duplicated or overwritten.
const SEED_VALID_MATRICULES: &[(&str, &str)] = &[
    ("UNST00000001", "student"),
    ("UNST00000002", "student"),
    ("UNST00000003", "student"),
    ("UNST00000004", "student"),
    ("UNST00000005", "student"),
    ("UNTE00000001", "teacher"),
    ("UNTE00000002", "teacher"),
];

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;
    // Bounded waiting on a locked database instead of failing immediately.
    conn.busy_timeout(Duration::from_secs(5))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS users(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            matricule TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL,
            level TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS valid_matricules(
            matricule TEXT PRIMARY KEY,
            role TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS courses(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            comment TEXT,
            attachment_path TEXT,
            teacher_id TEXT NOT NULL,
            target_level TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_courses_teacher ON courses(teacher_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exercises(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            teacher_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            comment TEXT,
            attachment_path TEXT,
            target_level TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exercises_course ON exercises(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS practical_works(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            teacher_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            comment TEXT,
            attachment_path TEXT,
            target_level TEXT,
            deadline TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_practical_works_course ON practical_works(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quizzes(
            id TEXT PRIMARY KEY,
            course_id TEXT NOT NULL,
            teacher_id TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            comment TEXT,
            target_level TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY(course_id) REFERENCES courses(id),
            FOREIGN KEY(teacher_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quizzes_course ON quizzes(course_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS questions(
            id TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL,
            text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(quiz_id) REFERENCES quizzes(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_questions_quiz ON questions(quiz_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS answers(
            id TEXT PRIMARY KEY,
            question_id TEXT NOT NULL,
            text TEXT NOT NULL,
            is_correct INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(question_id) REFERENCES questions(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS exercise_submissions(
            id TEXT PRIMARY KEY,
            exercise_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            content TEXT,
            file_path TEXT,
            submitted_at TEXT NOT NULL,
            FOREIGN KEY(exercise_id) REFERENCES exercises(id),
            FOREIGN KEY(student_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exercise_submissions_exercise
         ON exercise_submissions(exercise_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_exercise_submissions_student
         ON exercise_submissions(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS practical_work_submissions(
            id TEXT PRIMARY KEY,
            practical_work_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            content TEXT,
            file_path TEXT,
            submitted_at TEXT NOT NULL,
            FOREIGN KEY(practical_work_id) REFERENCES practical_works(id),
            FOREIGN KEY(student_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pw_submissions_pw
         ON practical_work_submissions(practical_work_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_pw_submissions_student
         ON practical_work_submissions(student_id)",
        [],
    )?;

    // One completed attempt per (quiz, student) is a storage-level rule,
    // not just an application-level pre-check.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS quiz_results(
            id TEXT PRIMARY KEY,
            quiz_id TEXT NOT NULL,
            student_id TEXT NOT NULL,
            score REAL NOT NULL,
            is_completed INTEGER NOT NULL,
            submitted_at TEXT NOT NULL,
            UNIQUE(quiz_id, student_id),
            FOREIGN KEY(quiz_id) REFERENCES quizzes(id),
            FOREIGN KEY(student_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quiz_results_quiz ON quiz_results(quiz_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quiz_results_student ON quiz_results(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS student_answers(
            id TEXT PRIMARY KEY,
            quiz_result_id TEXT NOT NULL,
            question_id TEXT NOT NULL,
            selected_answer_id TEXT,
            is_correct INTEGER NOT NULL,
            FOREIGN KEY(quiz_result_id) REFERENCES quiz_results(id),
            FOREIGN KEY(question_id) REFERENCES questions(id),
            FOREIGN KEY(selected_answer_id) REFERENCES answers(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_student_answers_result
         ON student_answers(quiz_result_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS notifications(
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            message TEXT NOT NULL,
            seen INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES users(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS favorite_courses(
            student_id TEXT NOT NULL,
            course_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY(student_id, course_id),
            FOREIGN KEY(student_id) REFERENCES users(id),
            FOREIGN KEY(course_id) REFERENCES courses(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_favorite_courses_course
         ON favorite_courses(course_id)",
        [],
    )?;

    seed_valid_matricules(&conn)?;

    Ok(conn)
}

fn seed_valid_matricules(conn: &Connection) -> anyhow::Result<()> {
    let mut stmt =
        conn.prepare("INSERT OR IGNORE INTO valid_matricules(matricule, role) VALUES(?, ?)")?;
    for (matricule, role) in SEED_VALID_MATRICULES {
        stmt.execute((matricule, role))?;
    }
    Ok(())
}
