//! Integration tests for the session lifecycle against a mock server.

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a temp SEALDROP_HOME directory for test isolation.
fn temp_home() -> TempDir {
    TempDir::new().expect("create temp sealdrop home")
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Reads the persisted token out of the home dir, if any.
fn persisted_token(home: &TempDir) -> Option<String> {
    let raw = fs::read_to_string(home.path().join("credentials.json")).ok()?;
    let json: serde_json::Value = serde_json::from_str(&raw).ok()?;
    json.get("token")
        .and_then(serde_json::Value::as_str)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Pre-seeds a persisted token, as a previous login would have.
fn seed_token(home: &TempDir, token: &str) {
    fs::write(
        home.path().join("credentials.json"),
        json!({ "token": token }).to_string(),
    )
    .unwrap();
}

/// Login with valid credentials stores the token and reports the user.
/// Server returns `{token: "t1", user: {id: 1, username: "alice"}}`.
#[tokio::test]
async fn test_login_success_persists_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_partial_json(json!({
            "email": "alice",
            "password": "Secret123",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t1",
            "user": { "id": 1, "username": "alice" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args([
            "--server",
            &server.uri(),
            "login",
            "--email",
            "alice",
            "--password",
            "Secret123",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as alice"));

    assert_eq!(persisted_token(&home), Some("t1".to_string()));
}

/// Rejected credentials surface the server's message and persist nothing.
#[tokio::test]
async fn test_login_rejected() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args([
            "--server",
            &server.uri(),
            "login",
            "--email",
            "alice",
            "--password",
            "wrong",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid credentials"));

    assert_eq!(persisted_token(&home), None);
}

/// A second-factor signal issues no token and tells the caller to resubmit
/// with a one-time code.
#[tokio::test]
async fn test_login_second_factor_required() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "mfa_required": true })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args([
            "--server",
            &server.uri(),
            "login",
            "--email",
            "alice",
            "--password",
            "Secret123",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--code"));

    assert_eq!(persisted_token(&home), None);
}

/// Resubmitting with --code forwards the mfa_code field.
#[tokio::test]
async fn test_login_with_code_sends_mfa_field() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_partial_json(json!({ "mfa_code": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t2",
            "user": { "id": 1, "username": "alice" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args([
            "--server",
            &server.uri(),
            "login",
            "--email",
            "alice",
            "--password",
            "Secret123",
            "--code",
            "123456",
        ])
        .assert()
        .success();

    assert_eq!(persisted_token(&home), Some("t2".to_string()));
}

/// Register creates the account and chains an automatic login.
#[tokio::test]
async fn test_register_signs_in() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Registration successful",
            "user": { "id": 2, "email": "bob@example.com" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_partial_json(json!({ "email": "bob@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "t3",
            "user": { "id": 2, "username": "bob" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args([
            "--server",
            &server.uri(),
            "register",
            "--username",
            "bob",
            "--email",
            "bob@example.com",
            "--password",
            "Secret123",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Account created"));

    assert_eq!(persisted_token(&home), Some("t3".to_string()));
}

/// When creation succeeds but the automatic login fails, the surfaced error
/// is the compound-specific message and nothing is persisted.
#[tokio::test]
async fn test_register_created_but_login_failed() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Registration successful",
            "user": { "id": 2, "email": "bob@example.com" },
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args([
            "--server",
            &server.uri(),
            "register",
            "--username",
            "bob",
            "--email",
            "bob@example.com",
            "--password",
            "Secret123",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Registration successful but login failed",
        ));

    assert_eq!(persisted_token(&home), None);
}

/// whoami validates the persisted token, attaching it as a bearer credential.
#[tokio::test]
async fn test_whoami_validates_with_bearer_token() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    seed_token(&home, "t1");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/validate/"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": { "id": 1, "username": "alice", "email": "alice@example.com" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args(["--server", &server.uri(), "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as alice"));
}

/// A failed validation clears the persisted token and drops to anonymous.
#[tokio::test]
async fn test_whoami_invalid_token_clears_credentials() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    seed_token(&home, "stale");
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/auth/validate/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Token is invalid or expired",
            "code": "token_not_valid",
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args(["--server", &server.uri(), "whoami"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sealdrop login"));

    assert_eq!(persisted_token(&home), None);
}

/// Logout clears the persisted token without touching the network.
#[tokio::test]
async fn test_logout_clears_token() {
    let home = temp_home();
    seed_token(&home, "t1");

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out."));

    assert_eq!(persisted_token(&home), None);
}

/// whoami without a persisted token reports anonymous without dispatching.
#[tokio::test]
async fn test_whoami_not_signed_in() {
    let home = temp_home();

    cargo_bin_cmd!("sealdrop")
        .env("SEALDROP_HOME", home.path())
        .args(["--server", "http://127.0.0.1:9", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in."));
}
