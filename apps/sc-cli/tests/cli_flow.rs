// cli_flow.rs — End-to-end runs of the `sc` binary against temp files.
//
// Flow:
//   1. Write a conductor.toml and a session.json
//   2. `sc plan` → prints the plan, leaves the file alone
//   3. `sc apply` → edits under the policy, file rewritten
//   4. `sc apply` with a missing required key → fails, file untouched

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

const CONFIG: &str = r#"
[profiles.default]
skip = ["flash"]

[profiles.strict]
skip = ["flash"]

[profiles.strict.ensure]
user_id = 0

[handlers.dashboard]
save = ["cart"]
"#;

fn sc(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sc"))
        .arg("--config")
        .arg(dir.join("conductor.toml"))
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap()
}

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("conductor.toml"), CONFIG).unwrap();
    let session = json!({
        "cart": ["apple"],
        "flash": "saved!",
        "stale": true,
        "_csrf": "token"
    });
    fs::write(
        dir.path().join("session.json"),
        serde_json::to_string_pretty(&session).unwrap(),
    )
    .unwrap();
    dir
}

fn read_session(dir: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(dir.join("session.json")).unwrap()).unwrap()
}

#[test]
fn plan_reports_without_writing() {
    let dir = setup();
    let before = read_session(dir.path());

    let out = sc(dir.path(), &["plan", "--session", "session.json", "--handler", "dashboard"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let plan: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(plan["mode"], json!("reset"));
    assert_eq!(plan["remove"], json!(["stale"]));
    assert_eq!(plan["hide"], json!(["flash"]));
    assert_eq!(plan["reserved"], json!(["_csrf"]));
    assert_eq!(read_session(dir.path()), before);
}

#[test]
fn apply_edits_under_policy() {
    let dir = setup();

    let out = sc(
        dir.path(),
        &[
            "apply",
            "--session",
            "session.json",
            "--handler",
            "dashboard",
            "--set",
            "cart=[\"apple\",\"pear\"]",
            "--set",
            "flash=overwritten",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let report: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["trace"]["restored"], json!(["flash"]));

    let session = read_session(dir.path());
    assert_eq!(
        session,
        json!({
            "cart": ["apple", "pear"],
            "flash": "saved!",
            "_csrf": "token"
        })
    );
}

#[test]
fn destroy_override_from_command_line() {
    let dir = setup();

    let out = sc(dir.path(), &["apply", "--session", "session.json", "--destroy", "stale"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let session = read_session(dir.path());
    assert_eq!(
        session,
        json!({
            "cart": ["apple"],
            "flash": "saved!",
            "_csrf": "token"
        })
    );
}

#[test]
fn missing_required_key_fails_and_leaves_file() {
    let dir = setup();
    let before = read_session(dir.path());

    let out = sc(
        dir.path(),
        &["apply", "--session", "session.json", "--profile", "strict", "--set", "x=1"],
    );
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("user_id"));
    assert_eq!(read_session(dir.path()), before);
}

#[test]
fn insert_defaults_fills_missing_key() {
    let dir = setup();

    let out = sc(
        dir.path(),
        &[
            "apply",
            "--session",
            "session.json",
            "--profile",
            "strict",
            "--insert-defaults",
        ],
    );
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let session = read_session(dir.path());
    assert_eq!(session["user_id"], json!(0));
    assert_eq!(session["flash"], json!("saved!"));
    assert!(session.get("cart").is_none());
}

#[test]
fn profile_show_prints_json() {
    let dir = setup();

    let out = sc(dir.path(), &["profile", "show", "strict"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let profile: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(profile["skip"], json!(["flash"]));
    assert_eq!(profile["ensure"], json!({"user_id": 0}));
}

#[test]
fn unknown_profile_is_an_error() {
    let dir = setup();
    let out = sc(dir.path(), &["profile", "show", "admin"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("admin"));
}
