//! CLI integration tests running scripts through the `promptsql` binary.

use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::tempdir;

fn promptsql() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_promptsql"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn describe_script_as_json() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("describe.sql");
    std::fs::write(
        &sql_path,
        "create database proj;\n\
         CREATE MODEL proj.test_describe_model PREDICT answer USING\n\
           engine = 'langchain',\n\
           prompt_template = 'Answer the user in a useful way: {{question}}',\n\
           openai_api_key = 'sk-not-a-real-key';\n\
         DESCRIBE proj.test_describe_model;\n",
    )
    .expect("write sql");

    let output = promptsql()
        .args(["--wait", "-f", "json", sql_path.to_str().expect("sql path")])
        .output()
        .expect("run CLI");

    assert!(
        output.status.success(),
        "CLI should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");

    let results = report["results"].as_array().expect("results array");
    assert_eq!(results.len(), 3);
    assert_eq!(results[1]["rows"][0]["status"], "complete");
    assert_eq!(results[2]["statement"], "DESCRIBE");
    assert!(!results[2]["rows"].as_array().expect("rows").is_empty());
    assert!(!stdout.contains("sk-not-a-real-key"));
}

#[test]
fn reads_stdin_and_prints_table() {
    let mut child = promptsql()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn CLI");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"CREATE DATABASE proj; SHOW DATABASES;")
        .expect("write stdin");

    let output = child.wait_with_output().expect("run CLI");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("SHOW DATABASES (<stdin>)"), "{stdout}");
    assert!(stdout.contains("mindsdb"));
    assert!(stdout.contains("proj"));
}

#[test]
fn statement_failure_exits_one() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("fail.sql");
    std::fs::write(&sql_path, "SELECT answer FROM proj.missing WHERE question = 'hi';")
        .expect("write sql");

    let output = promptsql()
        .arg(sql_path.to_str().expect("sql path"))
        .output()
        .expect("run CLI");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("project 'proj' does not exist"), "{stderr}");
}

#[test]
fn parse_error_exits_one() {
    let dir = tempdir().expect("temp dir");
    let sql_path = dir.path().join("bad.sql");
    std::fs::write(&sql_path, "CREATE MODEL proj.m USING engine = 'langchain';")
        .expect("write sql");

    let output = promptsql()
        .arg(sql_path.to_str().expect("sql path"))
        .output()
        .expect("run CLI");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("PREDICT"), "{stderr}");
}

#[test]
fn missing_file_exits_66() {
    let output = promptsql()
        .arg("/nonexistent/script.sql")
        .output()
        .expect("run CLI");
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn invalid_config_exits_66() {
    let dir = tempdir().expect("temp dir");
    let config_path = dir.path().join("engine.json");
    std::fs::write(&config_path, "not json").expect("write config");
    let sql_path = dir.path().join("ok.sql");
    std::fs::write(&sql_path, "SHOW DATABASES;").expect("write sql");

    let output = promptsql()
        .args([
            "--config",
            config_path.to_str().expect("config path"),
            sql_path.to_str().expect("sql path"),
        ])
        .output()
        .expect("run CLI");
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn config_sets_default_project() {
    let dir = tempdir().expect("temp dir");
    let config_path = dir.path().join("engine.json");
    std::fs::write(&config_path, r#"{"defaultProject": "sandbox"}"#).expect("write config");
    let sql_path = dir.path().join("ok.sql");
    std::fs::write(&sql_path, "SHOW DATABASES;").expect("write sql");

    let output = promptsql()
        .args([
            "-c",
            config_path.to_str().expect("config path"),
            "-f",
            "json",
            "--compact",
            sql_path.to_str().expect("sql path"),
        ])
        .output()
        .expect("run CLI");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#""database":"sandbox""#), "{stdout}");
}

#[test]
fn prints_config_schema() {
    let output = promptsql()
        .arg("--config-schema")
        .output()
        .expect("run CLI");
    assert!(output.status.success());
    let schema: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("schema is JSON");
    assert!(schema["properties"]["defaultModel"].is_object());
}
