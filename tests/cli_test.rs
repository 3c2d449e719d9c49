//! CLI Integration Tests
//!
//! Run the `builtio` binary in an isolated home directory, against a mock
//! API where a request is needed.

#![allow(deprecated)] // Allow deprecated cargo_bin for now

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The binary, isolated from the caller's environment and credentials.
fn builtio(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("builtio").unwrap();
    cmd.current_dir(home.path()).env("HOME", home.path());
    for var in [
        "BUILT_APPLICATION_API_KEY",
        "BUILT_MASTER_KEY",
        "BUILT_AUTHTOKEN",
        "BUILT_HOST",
        "BUILT_API_VERSION",
        "BUILT_TIMEOUT",
        "BUILT_DEBUG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    builtio(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("classes"))
        .stdout(predicate::str::contains("--api-key"));
}

#[test]
fn missing_api_key_fails() {
    let home = TempDir::new().unwrap();
    builtio(&home)
        .arg("app")
        .assert()
        .failure()
        .stderr(predicate::str::contains("application_api_key is required"));
}

#[tokio::test(flavor = "multi_thread")]
async fn app_prints_application_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/applications/myapp"))
        .and(header("application_api_key", "blt_cli_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "application": {"uid": "blt_app", "name": "Demo"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let home = TempDir::new().unwrap();
    builtio(&home)
        .args(["--host", uri.as_str(), "--api-key", "blt_cli_key", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""name": "Demo""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn api_key_from_credentials_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/classes/person"))
        .and(header("application_api_key", "blt_file_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "class": {"uid": "person", "title": "Person"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let dir = home.path().join(".built");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("credentials.json"),
        r#"{"application_api_key": "blt_file_key"}"#,
    )
    .unwrap();

    let uri = server.uri();
    builtio(&home)
        .args(["--host", uri.as_str(), "class", "person"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""title": "Person""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn query_with_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/classes/person/objects"))
        .and(query_param("query", r#"{"age":30,"active":true}"#))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objects": [{"uid": "blt1", "age": 30}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let home = TempDir::new().unwrap();
    builtio(&home)
        .args([
            "--host",
            uri.as_str(),
            "--api-key",
            "blt_cli_key",
            "query",
            "person",
            "--where",
            "age=30",
            "--where",
            "active=true",
            "--limit",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""uid": "blt1""#));
}

#[tokio::test(flavor = "multi_thread")]
async fn api_error_exits_with_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/classes/person/objects/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_code": 141,
            "error_message": "Object not found"
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let home = TempDir::new().unwrap();
    builtio(&home)
        .args([
            "--host",
            uri.as_str(),
            "--api-key",
            "blt_cli_key",
            "object",
            "person",
            "missing",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Object not found"));
}
