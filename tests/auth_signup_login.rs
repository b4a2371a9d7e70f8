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

#[test]
fn signup_then_login_with_allowlisted_matricule() {
    let workspace = temp_dir("campusd-auth");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Lowercase input is normalized before storage.
    let created = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.signUp",
        json!({
            "name": "Amina",
            "matricule": "unst00000001",
            "role": "student",
            "level": "L2",
            "password": "p@ss1"
        }),
    );
    assert_eq!(created.get("ok").and_then(|o| o.as_bool()), Some(true));
    let user = created.get("result").and_then(|r| r.get("user")).expect("user");
    assert_eq!(
        user.get("matricule").and_then(|m| m.as_str()),
        Some("UNST00000001")
    );
    assert_eq!(user.get("role").and_then(|r| r.as_str()), Some("student"));
    assert_eq!(user.get("level").and_then(|l| l.as_str()), Some("L2"));
    assert!(user.get("passwordHash").is_none(), "hash must never leave the store");

    // Matricules are single-use, whatever the password or role.
    let dup = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.signUp",
        json!({
            "name": "Imposter",
            "matricule": "UNST00000001",
            "role": "student",
            "level": "L1",
            "password": "other"
        }),
    );
    assert_eq!(error_code(&dup), "conflict");

    let login = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.login",
        json!({ "matricule": "UNST00000001", "password": "p@ss1" }),
    );
    assert_eq!(login.get("ok").and_then(|o| o.as_bool()), Some(true));
    assert_eq!(
        login
            .get("result")
            .and_then(|r| r.get("user"))
            .and_then(|u| u.get("name"))
            .and_then(|n| n.as_str()),
        Some("Amina")
    );

    let current = request(&mut stdin, &mut reader, "5", "auth.currentUser", json!({}));
    assert_eq!(
        current
            .get("result")
            .and_then(|r| r.get("user"))
            .and_then(|u| u.get("matricule"))
            .and_then(|m| m.as_str()),
        Some("UNST00000001")
    );

    let _ = request(&mut stdin, &mut reader, "6", "auth.logout", json!({}));
    let after = request(&mut stdin, &mut reader, "7", "auth.currentUser", json!({}));
    assert!(after
        .get("result")
        .and_then(|r| r.get("user"))
        .expect("user field")
        .is_null());

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn login_failures_are_uniform() {
    let workspace = temp_dir("campusd-auth-fail");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.signUp",
        json!({
            "name": "Amina",
            "matricule": "UNST00000001",
            "role": "student",
            "level": "L1",
            "password": "p@ss1"
        }),
    );

    let wrong_password = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.login",
        json!({ "matricule": "UNST00000001", "password": "wrong" }),
    );
    let unknown = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.login",
        json!({ "matricule": "UNST77777777", "password": "p@ss1" }),
    );

    // Wrong password and unknown matricule are indistinguishable.
    assert_eq!(error_code(&wrong_password), "auth_failed");
    assert_eq!(error_code(&unknown), "auth_failed");
    assert_eq!(
        wrong_password.get("error").and_then(|e| e.get("message")),
        unknown.get("error").and_then(|e| e.get("message"))
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn signup_gates_reject_before_any_write() {
    let workspace = temp_dir("campusd-auth-gates");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // Not on the allowlist.
    let absent = request(
        &mut stdin,
        &mut reader,
        "2",
        "auth.signUp",
        json!({
            "name": "Nobody",
            "matricule": "UNST99999999",
            "role": "student",
            "level": "L1",
            "password": "x"
        }),
    );
    assert_eq!(error_code(&absent), "validation_failed");

    // Student-prefixed matricule declared as teacher.
    let mismatch = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.signUp",
        json!({
            "name": "Prof",
            "matricule": "UNST00000002",
            "role": "teacher",
            "password": "x"
        }),
    );
    assert_eq!(error_code(&mismatch), "validation_failed");

    // Malformed matricule.
    let malformed = request(
        &mut stdin,
        &mut reader,
        "4",
        "auth.signUp",
        json!({
            "name": "Odd",
            "matricule": "UN5T0001",
            "role": "student",
            "level": "L1",
            "password": "x"
        }),
    );
    assert_eq!(error_code(&malformed), "validation_failed");

    // Students need a level; teachers must not carry one.
    let no_level = request(
        &mut stdin,
        &mut reader,
        "5",
        "auth.signUp",
        json!({
            "name": "Amina",
            "matricule": "UNST00000001",
            "role": "student",
            "password": "x"
        }),
    );
    assert_eq!(error_code(&no_level), "validation_failed");

    let teacher_level = request(
        &mut stdin,
        &mut reader,
        "6",
        "auth.signUp",
        json!({
            "name": "Prof",
            "matricule": "UNTE00000001",
            "role": "teacher",
            "level": "M2",
            "password": "x"
        }),
    );
    assert_eq!(error_code(&teacher_level), "validation_failed");

    // None of the rejected signups consumed the matricule.
    let valid = request(
        &mut stdin,
        &mut reader,
        "7",
        "auth.signUp",
        json!({
            "name": "Amina",
            "matricule": "UNST00000001",
            "role": "student",
            "level": "L1",
            "password": "p@ss1"
        }),
    );
    assert_eq!(valid.get("ok").and_then(|o| o.as_bool()), Some(true));

    drop(stdin);
    let _ = child.wait();
}
