use std::path::Path;
use std::process::{Command, Output};

fn realize(store: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_realize"));
    command
        .env("REALIZE_STORE_DIR", store)
        .env("REALIZE_CONFIG_PATH", store.join("config.json"))
        .env_remove("REALIZE_GEMINI_API_KEY")
        .env_remove("RUST_LOG");
    command
}

fn signed_in_store() -> tempfile::TempDir {
    let store = tempfile::tempdir().unwrap();
    let user = serde_json::json!({
        "name": "佐藤 健太",
        "email": "sato@example.com",
        "picture": "https://example.com/sato.png",
    });
    std::fs::write(
        store.path().join("realize-user.json"),
        serde_json::to_string(&user).unwrap(),
    )
    .unwrap();
    store
}

fn run(store: &Path, args: &[&str]) -> Output {
    realize(store)
        .args(args)
        .output()
        .expect("failed to run realize")
}

fn run_json(store: &Path, args: &[&str]) -> serde_json::Value {
    let output = run(store, args);
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn stored(store: &Path, key: &str) -> serde_json::Value {
    let content = std::fs::read_to_string(store.join(format!("{key}.json"))).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn first_run_seeds_every_collection() {
    let store = signed_in_store();

    let members = run_json(store.path(), &["member", "list", "--json"]);

    assert_eq!(members.as_array().unwrap().len(), 4);
    assert_eq!(members[1]["status"], "In a Meeting");
    for key in [
        "realize-members",
        "realize-tasks",
        "realize-timetables",
        "realize-announcements",
        "realize-schedule",
    ] {
        assert!(store.path().join(format!("{key}.json")).exists(), "{key}");
    }
    let schedule = stored(store.path(), "realize-schedule");
    assert!(schedule[0]["start"].as_str().unwrap().contains('T'));
    assert_eq!(schedule[1]["isAllDay"], true);
}

#[test]
fn member_added_then_listed() {
    let store = signed_in_store();

    let added = run_json(store.path(), &["member", "add", "伊藤 翼", "--json"]);
    let id = added["id"].as_str().unwrap().to_string();

    let members = run_json(store.path(), &["member", "list", "--json"]);
    assert_eq!(members.as_array().unwrap().len(), 5);
    assert_eq!(members[4]["name"], "伊藤 翼");
    assert_eq!(members[4]["status"], "Available");

    let timetable = run_json(store.path(), &["timetable", "show", &id, "--json"]);
    assert_eq!(timetable["memberId"], id.as_str());
    assert_eq!(timetable["timetable"].as_array().unwrap().len(), 0);
}

#[test]
fn member_delete_removes_tasks_and_timetable() {
    let store = signed_in_store();

    let output = run(store.path(), &["member", "delete", "3"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Deleted member: 高橋 涼介 (3)"));

    let tasks = stored(store.path(), "realize-tasks");
    assert!(tasks.as_array().unwrap().iter().all(|task| task["memberId"] != "3"));
    let timetables = stored(store.path(), "realize-timetables");
    assert!(
        timetables
            .as_array()
            .unwrap()
            .iter()
            .all(|entry| entry["memberId"] != "3")
    );
}

#[test]
fn member_edit_sets_status() {
    let store = signed_in_store();

    let member = run_json(
        store.path(),
        &["member", "edit", "4", "--status", "out-of-office", "--json"],
    );

    assert_eq!(member["status"], "Out of Office");
    assert_eq!(member["name"], "田中 美咲");
}

#[test]
fn task_toggle_persists() {
    let store = signed_in_store();

    let task = run_json(store.path(), &["task", "toggle", "t1", "--json"]);
    assert_eq!(task["completed"], true);

    let tasks = stored(store.path(), "realize-tasks");
    assert_eq!(tasks[0]["id"], "t1");
    assert_eq!(tasks[0]["completed"], true);
}

#[test]
fn unknown_ids_and_blank_input_are_rejected() {
    let store = signed_in_store();

    let output = run(store.path(), &["task", "toggle", "t404"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: not_found"));

    let output = run(store.path(), &["member", "add", "   "]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input - name is required"));
}

#[test]
fn corrupt_collection_falls_back_to_defaults() {
    let store = signed_in_store();
    std::fs::write(store.path().join("realize-members.json"), "not json").unwrap();

    let output = run(store.path(), &["member", "list", "--json"]);

    assert!(output.status.success());
    let members: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(members.as_array().unwrap().len(), 4);
    assert!(String::from_utf8_lossy(&output.stderr).contains("realize-members"));
    assert_eq!(stored(store.path(), "realize-members"), members);
}

#[test]
fn timetable_slot_can_be_set() {
    let store = signed_in_store();

    let output = run(store.path(), &["timetable", "set", "1", "2", "subject", "Chemistry"]);
    assert!(output.status.success());

    let entry = run_json(store.path(), &["timetable", "show", "1", "--json"]);
    assert_eq!(entry["timetable"][1]["subject"], "Chemistry");
    assert_eq!(entry["timetable"][1]["period"], "2");

    let output = run(store.path(), &["timetable", "delete-slot", "1", "0"]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: invalid_input"));
}

#[test]
fn announcement_edit_keeps_unchanged_fields() {
    let store = signed_in_store();

    let updated = run_json(
        store.path(),
        &["announcement", "edit", "a1", "--type", "important", "--json"],
    );

    assert_eq!(updated["type"], "Important");
    assert_eq!(updated["title"], "職員会議のお知らせ");
}

#[test]
fn events_are_added_and_listed_by_start() {
    let store = signed_in_store();

    let added = run_json(
        store.path(),
        &[
            "event",
            "add",
            "Open Campus",
            "--start-date",
            "2099-06-20",
            "--all-day",
            "--json",
        ],
    );
    assert_eq!(added["isAllDay"], true);
    assert!(added["id"].as_str().unwrap().starts_with('e'));

    let events = run_json(store.path(), &["event", "list", "--json"]);
    let events = events.as_array().unwrap();
    assert_eq!(events.len(), 6);
    assert_eq!(events[5]["title"], "Open Campus");

    let output = run(store.path(), &["event", "add", "No date"]);
    assert!(String::from_utf8_lossy(&output.stderr).contains("start date is required"));
}
