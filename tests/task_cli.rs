mod support;

use predicates::str::contains;
use serde_json::Value;

use support::TestData;

fn error_envelope(data: &TestData, args: &[&str], code: i32) -> Value {
    let output = data
        .cmd()
        .args(args)
        .arg("--json")
        .assert()
        .code(code)
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("error json")
}

fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .expect("array")
        .iter()
        .map(|entry| entry.as_str().expect("string").to_string())
        .collect()
}

#[test]
fn add_records_all_fields() {
    let data = TestData::new();

    let value = data.json(&[
        "add",
        "  Buy milk  ",
        "--priority",
        "high",
        "--description",
        "two litres",
        "--due",
        "2025-03-01",
        "--tag",
        "shopping",
        "--tag",
        "errands",
    ]);
    let task = &value["data"];

    assert_eq!(task["title"], "Buy milk");
    assert_eq!(task["status"], "pending");
    assert_eq!(task["priority"], "high");
    assert_eq!(task["description"], "two litres");
    assert_eq!(task["dueDate"], 1_740_787_200_000_i64);
    assert_eq!(strings(&task["tags"]), vec!["shopping", "errands"]);
    assert_eq!(task["createdAt"], task["updatedAt"]);
}

#[test]
fn add_rejects_invalid_titles() {
    let data = TestData::new();

    data.cmd()
        .args(["add", "   "])
        .assert()
        .code(2)
        .stderr(contains("error:"));

    let long = "x".repeat(101);
    let value = error_envelope(&data, &["add", &long], 2);
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "user_error");

    assert!(data.primary().is_none());
}

#[test]
fn add_uses_configured_default_priority() {
    let data = TestData::new();
    data.write_file("config.toml", "[tasks]\ndefault_priority = \"low\"\n");

    let value = data.json(&["add", "Water plants"]);
    assert_eq!(value["data"]["priority"], "low");

    let value = data.json(&["add", "Pay rent", "-p", "high"]);
    assert_eq!(value["data"]["priority"], "high");
}

#[test]
fn show_accepts_unique_prefix() {
    let data = TestData::new();
    let id = data.add(&["Read book"]);

    let value = data.json(&["show", &id[..8]]);
    assert_eq!(value["data"]["id"], id.as_str());
    assert_eq!(value["data"]["title"], "Read book");
}

#[test]
fn unknown_id_is_user_error() {
    let data = TestData::new();
    data.add(&["Something"]);

    let value = error_envelope(&data, &["show", "no-such-task"], 2);
    assert_eq!(value["error"]["details"]["id"], "no-such-task");
    assert_eq!(value["next_steps"][0], "todo list --all");

    data.cmd().args(["toggle", "no-such-task"]).assert().code(2);
}

#[test]
fn ambiguous_prefix_is_rejected() {
    let data = TestData::new();
    let snapshot = data.write_file(
        "snapshot.json",
        r#"{
  "items": [
    {"id": "abc1", "title": "One", "status": "pending", "priority": "low",
     "createdAt": 1700000000000, "updatedAt": 1700000000000},
    {"id": "abc2", "title": "Two", "status": "pending", "priority": "low",
     "createdAt": 1700000000000, "updatedAt": 1700000000000}
  ],
  "version": 1,
  "lastSync": 1700000000000
}"#,
    );
    data.cmd().arg("import").arg(&snapshot).assert().success();

    data.cmd()
        .args(["show", "abc"])
        .assert()
        .code(2)
        .stderr(contains("ambiguous"));

    let value = data.json(&["show", "abc2"]);
    assert_eq!(value["data"]["title"], "Two");
}

#[test]
fn edit_changes_and_clears_fields() {
    let data = TestData::new();
    let id = data.add(&["Draft", "-d", "first pass", "-t", "writing", "--due", "2025-01-10"]);

    let value = data.json(&["edit", &id, "--title", "Final draft", "--priority", "high"]);
    assert_eq!(value["data"]["title"], "Final draft");
    assert_eq!(value["data"]["priority"], "high");
    assert_eq!(value["data"]["description"], "first pass");

    let value = data.json(&[
        "edit",
        &id,
        "--clear-description",
        "--clear-due",
        "--clear-tags",
    ]);
    let task = value["data"].as_object().expect("task object");
    assert!(!task.contains_key("description"));
    assert!(!task.contains_key("dueDate"));
    assert!(!task.contains_key("tags"));
    assert!(task["updatedAt"].as_i64() >= task["createdAt"].as_i64());
}

#[test]
fn edit_without_changes_is_rejected() {
    let data = TestData::new();
    let id = data.add(&["Unchanged"]);

    data.cmd()
        .args(["edit", &id])
        .assert()
        .code(2)
        .stderr(contains("nothing to change"));
}

#[test]
fn rejected_edit_leaves_task_untouched() {
    let data = TestData::new();
    let id = data.add(&["Keep me", "-p", "low"]);

    data.cmd()
        .args(["edit", &id, "--priority", "high", "--title", ""])
        .assert()
        .code(2);

    let value = data.json(&["show", &id]);
    assert_eq!(value["data"]["title"], "Keep me");
    assert_eq!(value["data"]["priority"], "low");
}

#[test]
fn status_and_toggle() {
    let data = TestData::new();
    let id = data.add(&["Laundry"]);

    let value = data.json(&["status", &id, "in-progress"]);
    assert_eq!(value["data"]["status"], "in-progress");

    let value = data.json(&["toggle", &id]);
    assert_eq!(value["data"]["status"], "completed");

    let value = data.json(&["toggle", &id]);
    assert_eq!(value["data"]["status"], "pending");

    data.cmd()
        .args(["status", &id, "blocked"])
        .assert()
        .code(2)
        .stderr(contains("unknown status"));
}

#[test]
fn rm_requires_confirmation() {
    let data = TestData::new();
    let id = data.add(&["Old task"]);

    let value = error_envelope(&data, &["rm", &id], 3);
    assert_eq!(value["error"]["kind"], "policy_blocked");

    let value = data.json(&["rm", &id, "--yes"]);
    assert_eq!(value["data"]["id"], id.as_str());

    data.cmd().args(["show", &id]).assert().code(2);
}

#[test]
fn rm_without_confirmation_when_disabled() {
    let data = TestData::new();
    data.write_file("config.toml", "[tasks]\nconfirm_delete = false\n");
    let id = data.add(&["Disposable"]);

    data.cmd().args(["rm", &id]).assert().success();
    assert_eq!(data.json(&["list"])["data"]["total"], 0);
}

#[test]
fn list_groups_by_status() {
    let data = TestData::new();
    let pending = data.add(&["Pending one"]);
    let active = data.add(&["Active one"]);
    let done = data.add(&["Done one"]);
    data.json(&["status", &active, "in-progress"]);
    data.json(&["toggle", &done]);

    let value = data.json(&["list"]);
    let groups = value["data"]["groups"].as_array().expect("groups");
    let labels: Vec<_> = groups.iter().map(|group| group["label"].clone()).collect();
    assert_eq!(labels, vec!["In Progress", "Pending", "Completed"]);
    assert_eq!(groups[0]["tasks"][0]["id"], active.as_str());
    assert_eq!(groups[1]["tasks"][0]["id"], pending.as_str());
    assert_eq!(groups[2]["tasks"][0]["id"], done.as_str());
    assert_eq!(value["data"]["total"], 3);
}

#[test]
fn list_hides_completed_when_configured() {
    let data = TestData::new();
    data.write_file("config.toml", "[tasks]\nshow_completed = false\n");
    data.add(&["Open"]);
    let done = data.add(&["Closed"]);
    data.json(&["toggle", &done]);

    assert_eq!(data.json(&["list"])["data"]["total"], 1);
    assert_eq!(data.json(&["list", "--all"])["data"]["total"], 2);
    assert_eq!(
        data.json(&["list", "--status", "completed"])["data"]["total"],
        1
    );
}

#[test]
fn list_filters_by_priority_and_tag() {
    let data = TestData::new();
    let first = data.add(&["Alpha", "-p", "high", "-t", "work"]);
    data.add(&["Beta", "-p", "low", "-t", "work"]);
    data.add(&["Gamma", "-p", "high"]);

    let value = data.json(&["list", "--priority", "high", "--tag", "work"]);
    assert_eq!(value["data"]["total"], 1);
    assert_eq!(value["data"]["tasks"][0]["id"], first.as_str());
    assert!(value["data"].get("groups").is_none());

    let value = data.json(&["list", "--group-by", "none"]);
    assert_eq!(value["data"]["total"], 3);
    assert!(value["data"].get("groups").is_none());
}

#[test]
fn search_is_case_insensitive() {
    let data = TestData::new();
    data.add(&["Call Mom"]);
    data.add(&["Groceries", "-d", "mom's favourite tea"]);
    data.add(&["Dentist", "-t", "MOMENTUM"]);
    data.add(&["Unrelated"]);

    let value = data.json(&["search", "MOM"]);
    assert_eq!(value["data"]["total"], 3);

    let value = data.json(&["search", ""]);
    assert_eq!(value["data"]["total"], 4);
}

#[test]
fn tags_are_sorted_and_unique() {
    let data = TestData::new();
    data.add(&["One", "-t", "work", "-t", "urgent"]);
    data.add(&["Two", "-t", "home", "-t", "work"]);
    data.add(&["Three"]);

    let value = data.json(&["tags"]);
    assert_eq!(strings(&value["data"]["tags"]), vec!["home", "urgent", "work"]);
}

#[test]
fn stats_counts_by_status_and_priority() {
    let data = TestData::new();
    data.add(&["A", "-p", "high"]);
    let b = data.add(&["B", "-p", "low"]);
    data.json(&["toggle", &b]);

    let value = data.json(&["stats"]);
    let stats = &value["data"];
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["byStatus"]["pending"], 1);
    assert_eq!(stats["byStatus"]["inProgress"], 0);
    assert_eq!(stats["byStatus"]["completed"], 1);
    assert_eq!(stats["byPriority"]["high"], 1);
    assert_eq!(stats["byPriority"]["medium"], 0);
    assert_eq!(stats["byPriority"]["low"], 1);
}

#[test]
fn clear_completed_removes_only_completed() {
    let data = TestData::new();
    let keep = data.add(&["Keep"]);
    for title in ["Done 1", "Done 2"] {
        let id = data.add(&[title]);
        data.json(&["toggle", &id]);
    }

    let value = data.json(&["clear-completed"]);
    assert_eq!(value["data"]["removed"], 2);

    let value = data.json(&["list"]);
    assert_eq!(value["data"]["total"], 1);
    assert_eq!(value["data"]["tasks"][0]["id"], keep.as_str());

    let value = data.json(&["clear-completed"]);
    assert_eq!(value["data"]["removed"], 0);
}
