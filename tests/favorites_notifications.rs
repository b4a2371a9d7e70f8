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

/// Creates a teacher with one course plus a logged-in student; returns
/// (course_id, student_id).
fn seed_course_and_student(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
) -> (String, String) {
    let _ = request(
        stdin,
        reader,
        "f1",
        "auth.signUp",
        json!({
            "name": "Prof",
            "matricule": "UNTE00000001",
            "role": "teacher",
            "password": "pw"
        }),
    );
    let _ = request(
        stdin,
        reader,
        "f2",
        "auth.login",
        json!({ "matricule": "UNTE00000001", "password": "pw" }),
    );
    let course = request(
        stdin,
        reader,
        "f3",
        "courses.create",
        json!({ "title": "Linear algebra", "description": "Vectors and matrices" }),
    );
    let course_id = result_field(&course, "course")
        .get("id")
        .and_then(|i| i.as_str())
        .expect("course id")
        .to_string();
    let _ = request(stdin, reader, "f4", "auth.logout", json!({}));

    let student = request(
        stdin,
        reader,
        "f5",
        "auth.signUp",
        json!({
            "name": "Amina",
            "matricule": "UNST00000001",
            "role": "student",
            "level": "L1",
            "password": "pw"
        }),
    );
    let student_id = result_field(&student, "user")
        .get("id")
        .and_then(|i| i.as_str())
        .expect("student id")
        .to_string();
    let _ = request(
        stdin,
        reader,
        "f6",
        "auth.login",
        json!({ "matricule": "UNST00000001", "password": "pw" }),
    );
    (course_id, student_id)
}

#[test]
fn favorites_are_per_student_and_single() {
    let workspace = temp_dir("campusd-favorites");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let (course_id, _) = seed_course_and_student(&mut stdin, &mut reader);

    let before = request(
        &mut stdin,
        &mut reader,
        "2",
        "favorites.isFavorite",
        json!({ "courseId": course_id }),
    );
    assert_eq!(result_field(&before, "favorite").as_bool(), Some(false));

    let added = request(
        &mut stdin,
        &mut reader,
        "3",
        "favorites.add",
        json!({ "courseId": course_id }),
    );
    assert_eq!(added.get("ok").and_then(|o| o.as_bool()), Some(true));

    let dup = request(
        &mut stdin,
        &mut reader,
        "4",
        "favorites.add",
        json!({ "courseId": course_id }),
    );
    assert_eq!(error_code(&dup), "conflict");

    let unknown = request(
        &mut stdin,
        &mut reader,
        "5",
        "favorites.add",
        json!({ "courseId": "no-such-course" }),
    );
    assert_eq!(error_code(&unknown), "not_found");

    let after = request(
        &mut stdin,
        &mut reader,
        "6",
        "favorites.isFavorite",
        json!({ "courseId": course_id }),
    );
    assert_eq!(result_field(&after, "favorite").as_bool(), Some(true));

    let listed = request(&mut stdin, &mut reader, "7", "favorites.list", json!({}));
    let favorites = result_field(&listed, "favorites").as_array().expect("list");
    assert_eq!(favorites.len(), 1);
    assert_eq!(
        favorites[0]
            .get("course")
            .and_then(|c| c.get("title"))
            .and_then(|t| t.as_str()),
        Some("Linear algebra")
    );
    assert!(favorites[0].get("favoritedAt").and_then(|t| t.as_str()).is_some());

    let removed = request(
        &mut stdin,
        &mut reader,
        "8",
        "favorites.remove",
        json!({ "courseId": course_id }),
    );
    assert_eq!(removed.get("ok").and_then(|o| o.as_bool()), Some(true));
    let gone = request(
        &mut stdin,
        &mut reader,
        "9",
        "favorites.remove",
        json!({ "courseId": course_id }),
    );
    assert_eq!(error_code(&gone), "not_found");

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn notification_feed_and_unseen_counter() {
    let workspace = temp_dir("campusd-notifications");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let (_, student_id) = seed_course_and_student(&mut stdin, &mut reader);

    let blank = request(
        &mut stdin,
        &mut reader,
        "2",
        "notifications.push",
        json!({ "userId": student_id, "message": "   " }),
    );
    assert_eq!(error_code(&blank), "validation_failed");

    let nobody = request(
        &mut stdin,
        &mut reader,
        "3",
        "notifications.push",
        json!({ "userId": "no-such-user", "message": "hello" }),
    );
    assert_eq!(error_code(&nobody), "not_found");

    let first = request(
        &mut stdin,
        &mut reader,
        "4",
        "notifications.push",
        json!({ "userId": student_id, "message": "New exercise posted" }),
    );
    let first_id = result_field(&first, "notification")
        .get("id")
        .and_then(|i| i.as_str())
        .expect("notification id")
        .to_string();
    let _ = request(
        &mut stdin,
        &mut reader,
        "5",
        "notifications.push",
        json!({ "userId": student_id, "message": "Deadline moved to Friday" }),
    );

    let unseen = request(
        &mut stdin,
        &mut reader,
        "6",
        "notifications.unseenCount",
        json!({}),
    );
    assert_eq!(result_field(&unseen, "unseen").as_i64(), Some(2));

    let seen = request(
        &mut stdin,
        &mut reader,
        "7",
        "notifications.markSeen",
        json!({ "notificationId": first_id }),
    );
    assert_eq!(seen.get("ok").and_then(|o| o.as_bool()), Some(true));
    let unseen = request(
        &mut stdin,
        &mut reader,
        "8",
        "notifications.unseenCount",
        json!({}),
    );
    assert_eq!(result_field(&unseen, "unseen").as_i64(), Some(1));

    let listed = request(&mut stdin, &mut reader, "9", "notifications.list", json!({}));
    let feed = result_field(&listed, "notifications").as_array().expect("feed");
    assert_eq!(feed.len(), 2);

    let deleted = request(
        &mut stdin,
        &mut reader,
        "10",
        "notifications.delete",
        json!({ "notificationId": first_id }),
    );
    assert_eq!(deleted.get("ok").and_then(|o| o.as_bool()), Some(true));
    let twice = request(
        &mut stdin,
        &mut reader,
        "11",
        "notifications.delete",
        json!({ "notificationId": first_id }),
    );
    assert_eq!(error_code(&twice), "not_found");

    drop(stdin);
    let _ = child.wait();
}
