use jsonwebtoken::{EncodingKey, Header};
use std::path::Path;
use std::process::Command;

fn realize(store: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_realize"));
    command
        .env("REALIZE_STORE_DIR", store)
        .env("REALIZE_CONFIG_PATH", store.join("config.json"))
        .env_remove("REALIZE_GEMINI_API_KEY")
        .env_remove("REALIZE_GOOGLE_CLIENT_ID")
        .env_remove("RUST_LOG");
    command
}

fn identity_token() -> String {
    let claims = serde_json::json!({
        "name": "佐藤 健太",
        "email": "sato@example.com",
        "picture": "https://example.com/sato.png",
        "aud": "client-123.apps.example",
    });
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"widget"),
    )
    .unwrap()
}

#[test]
fn dashboard_commands_require_sign_in() {
    let store = tempfile::tempdir().unwrap();

    let output = realize(store.path())
        .args(["member", "list"])
        .output()
        .expect("failed to run member list");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: unauthorized - not signed in"));
}

#[test]
fn login_persists_the_user_across_runs() {
    let store = tempfile::tempdir().unwrap();

    let output = realize(store.path())
        .args(["login", "--credential", &identity_token()])
        .env("REALIZE_GOOGLE_CLIENT_ID", "client-123.apps.example")
        .output()
        .expect("failed to run login");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Signed in as 佐藤 健太 <sato@example.com>"));
    assert!(store.path().join("realize-user.json").exists());

    let output = realize(store.path())
        .args(["whoami", "--json"])
        .output()
        .expect("failed to run whoami");

    assert!(output.status.success());
    let user: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(user["email"], "sato@example.com");
    assert_eq!(user["picture"], "https://example.com/sato.png");
}

#[test]
fn login_is_disabled_without_client_id() {
    let store = tempfile::tempdir().unwrap();

    let output = realize(store.path())
        .args(["login", "--credential", &identity_token()])
        .output()
        .expect("failed to run login");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: unauthorized - sign-in is not configured"));
    assert!(!store.path().join("realize-user.json").exists());
}

#[test]
fn logout_forgets_the_stored_user() {
    let store = tempfile::tempdir().unwrap();
    let user = serde_json::json!({
        "name": "鈴木 優子",
        "email": "suzuki@example.com",
        "picture": "",
    });
    std::fs::write(
        store.path().join("realize-user.json"),
        serde_json::to_string(&user).unwrap(),
    )
    .unwrap();

    let output = realize(store.path())
        .arg("logout")
        .output()
        .expect("failed to run logout");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Signed out"));
    assert!(!store.path().join("realize-user.json").exists());

    let output = realize(store.path())
        .arg("whoami")
        .output()
        .expect("failed to run whoami");
    assert!(!output.status.success());
}
