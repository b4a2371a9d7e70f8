use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_campusd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn campusd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn error_code(v: &serde_json::Value) -> &str {
    assert_eq!(v.get("ok").and_then(|o| o.as_bool()), Some(false));
    v.get("error")
        .and_then(|e| e.get("code"))
        .and_then(|c| c.as_str())
        .expect("error code")
}

fn result_field<'a>(v: &'a serde_json::Value, key: &str) -> &'a serde_json::Value {
    assert_eq!(
        v.get("ok").and_then(|o| o.as_bool()),
        Some(true),
        "expected success, got {v}"
    );
    v.get("result").and_then(|r| r.get(key)).expect("result field")
}

fn signup_and_login(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    matricule: &str,
    role: &str,
    level: Option<&str>,
) {
    let mut params = json!({
        "name": matricule,
        "matricule": matricule,
        "role": role,
        "password": "pw"
    });
    if let Some(level) = level {
        params["level"] = json!(level);
    }
    let signed = request(stdin, reader, "su", "auth.signUp", params);
    assert_eq!(signed.get("ok").and_then(|o| o.as_bool()), Some(true));
    let logged = request(
        stdin,
        reader,
        "li",
        "auth.login",
        json!({ "matricule": matricule, "password": "pw" }),
    );
    assert_eq!(logged.get("ok").and_then(|o| o.as_bool()), Some(true));
}

#[test]
fn course_lifecycle_with_ownership() {
    let workspace = temp_dir("campusd-courses");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    // Nothing works before a workspace is selected.
    let early = request(
        &mut stdin,
        &mut reader,
        "0",
        "auth.signUp",
        json!({
            "name": "Prof",
            "matricule": "UNTE00000001",
            "role": "teacher",
            "password": "pw"
        }),
    );
    assert_eq!(error_code(&early), "no_workspace");

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Writes require a logged-in teacher.
    let anon = request(
        &mut stdin,
        &mut reader,
        "2",
        "courses.create",
        json!({ "title": "Anon", "description": "x" }),
    );
    assert_eq!(error_code(&anon), "not_logged_in");

    signup_and_login(&mut stdin, &mut reader, "UNTE00000001", "teacher", None);
    let created = request(
        &mut stdin,
        &mut reader,
        "3",
        "courses.create",
        json!({ "title": "Algorithms", "description": "Sorting and graphs" }),
    );
    let course = result_field(&created, "course");
    let course_id = course.get("id").and_then(|i| i.as_str()).expect("id").to_string();
    assert_eq!(course.get("title").and_then(|t| t.as_str()), Some("Algorithms"));

    let updated = request(
        &mut stdin,
        &mut reader,
        "4",
        "courses.update",
        json!({
            "courseId": course_id,
            "title": "Algorithms II",
            "description": "Sorting, graphs, flows",
            "comment": "Revised for the spring term"
        }),
    );
    assert_eq!(
        result_field(&updated, "course")
            .get("title")
            .and_then(|t| t.as_str()),
        Some("Algorithms II")
    );

    let listed = request(
        &mut stdin,
        &mut reader,
        "5",
        "courses.listByTeacher",
        json!({}),
    );
    assert_eq!(
        result_field(&listed, "courses").as_array().map(Vec::len),
        Some(1)
    );

    // Another teacher may read the course but not touch it.
    let _ = request(&mut stdin, &mut reader, "6", "auth.logout", json!({}));
    signup_and_login(&mut stdin, &mut reader, "UNTE00000002", "teacher", None);
    let read = request(
        &mut stdin,
        &mut reader,
        "7",
        "courses.get",
        json!({ "courseId": course_id }),
    );
    assert_eq!(read.get("ok").and_then(|o| o.as_bool()), Some(true));
    let foreign_update = request(
        &mut stdin,
        &mut reader,
        "8",
        "courses.update",
        json!({ "courseId": course_id, "title": "Hijack", "description": "x" }),
    );
    assert_eq!(error_code(&foreign_update), "forbidden");
    let foreign_delete = request(
        &mut stdin,
        &mut reader,
        "9",
        "courses.delete",
        json!({ "courseId": course_id }),
    );
    assert_eq!(error_code(&foreign_delete), "forbidden");

    // A student cannot author courses at all.
    let _ = request(&mut stdin, &mut reader, "10", "auth.logout", json!({}));
    signup_and_login(&mut stdin, &mut reader, "UNST00000001", "student", Some("L1"));
    let student_create = request(
        &mut stdin,
        &mut reader,
        "11",
        "courses.create",
        json!({ "title": "Nope", "description": "x" }),
    );
    assert_eq!(error_code(&student_create), "forbidden");

    // The owner deletes; the course and its children are gone.
    let _ = request(&mut stdin, &mut reader, "12", "auth.logout", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "auth.login",
        json!({ "matricule": "UNTE00000001", "password": "pw" }),
    );
    let exercise = request(
        &mut stdin,
        &mut reader,
        "14",
        "exercises.create",
        json!({
            "courseId": course_id,
            "title": "Heapsort by hand",
            "description": "Trace the heap"
        }),
    );
    let exercise_id = result_field(&exercise, "exercise")
        .get("id")
        .and_then(|i| i.as_str())
        .expect("exercise id")
        .to_string();

    let deleted = request(
        &mut stdin,
        &mut reader,
        "15",
        "courses.delete",
        json!({ "courseId": course_id }),
    );
    assert_eq!(deleted.get("ok").and_then(|o| o.as_bool()), Some(true));

    let gone = request(
        &mut stdin,
        &mut reader,
        "16",
        "courses.get",
        json!({ "courseId": course_id }),
    );
    assert_eq!(error_code(&gone), "not_found");
    let orphan = request(
        &mut stdin,
        &mut reader,
        "17",
        "exercises.get",
        json!({ "exerciseId": exercise_id }),
    );
    assert_eq!(error_code(&orphan), "not_found");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn students_see_their_level_plus_untargeted_courses() {
    let workspace = temp_dir("campusd-course-levels");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    signup_and_login(&mut stdin, &mut reader, "UNTE00000001", "teacher", None);
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "courses.create",
        json!({ "title": "L1 Analysis", "description": "x", "targetLevel": "L1" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "courses.create",
        json!({ "title": "M1 Compilers", "description": "x", "targetLevel": "M1" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "4",
        "courses.create",
        json!({ "title": "Study skills", "description": "open to everyone" }),
    );
    let _ = request(&mut stdin, &mut reader, "5", "auth.logout", json!({}));

    signup_and_login(&mut stdin, &mut reader, "UNST00000001", "student", Some("M1"));
    let visible = request(
        &mut stdin,
        &mut reader,
        "6",
        "courses.listForStudent",
        json!({}),
    );
    let titles: Vec<&str> = result_field(&visible, "courses")
        .as_array()
        .expect("courses")
        .iter()
        .map(|c| c.get("title").and_then(|t| t.as_str()).expect("title"))
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"M1 Compilers"));
    assert!(titles.contains(&"Study skills"));
    assert!(!titles.contains(&"L1 Analysis"));

    drop(stdin);
    let _ = child.wait();
}
