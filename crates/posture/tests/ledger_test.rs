use std::path::{Path, PathBuf};
use std::process::Command;

use serde_json::Value;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Run generate-poam in `dir` and return the ledger it wrote.
fn generate(dir: &Path, document: &Path, scan: &Path) -> Value {
    let output = Command::new(env!("CARGO_BIN_EXE_posture"))
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg(document)
        .arg("generate-poam")
        .arg("--scan")
        .arg(scan)
        .output()
        .expect("failed to run posture generate-poam");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "generate-poam failed: stdout={stdout}, stderr={stderr}"
    );
    assert!(stdout.contains("Generated POA&M saved to"), "{stdout}");

    let generated: Vec<PathBuf> = std::fs::read_dir(dir.join("docs"))
        .expect("docs directory should exist")
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(generated.len(), 1, "{generated:?}");
    let name = generated[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("generated_poam_") && name.ends_with(".json"), "{name}");

    let content = std::fs::read_to_string(&generated[0]).unwrap();
    serde_json::from_str(&content).unwrap()
}

fn items(poam: &Value) -> &Vec<Value> {
    poam["plan-of-action-and-milestones"]["poam-items"]
        .as_array()
        .expect("poam-items should be a list")
}

fn status(item: &Value) -> &str {
    item["status"].as_str().unwrap_or("open")
}

#[test]
fn test_first_merge_creates_one_item() {
    // Given an empty ledger and a scan with 19506 (high) and 10287 (informational)
    // When generate-poam runs at the default minimum severity
    // Then exactly one open item exists, for 19506
    let dir = tempfile::tempdir().unwrap();
    let poam = generate(
        dir.path(),
        &fixture("empty_poam.json"),
        &fixture("scan_week1.nessus"),
    );

    let items = items(&poam);
    assert_eq!(items.len(), 1, "{items:?}");
    let item = &items[0];
    assert_eq!(item["related-findings"]["plugin_id"], "19506");
    assert_eq!(item["related-findings"]["host"], "web01");
    assert_eq!(item["related-findings"]["severity"], 3);
    assert_eq!(item["title"], "TLS Weak Cipher Suites");
    assert_eq!(status(item), "open");
    assert_eq!(item["uuid"].as_str().unwrap().len(), 36);
    assert_ne!(
        poam["plan-of-action-and-milestones"]["metadata"]["last-modified"],
        "2025-10-01T00:00:00Z"
    );
}

#[test]
fn test_second_merge_closes_and_opens() {
    // Given the ledger from the first merge
    // When a scan arrives where 19506 is gone and 10287 is now medium
    // Then 19506 is completed with its identifier kept and 10287 is a new open item
    let first_dir = tempfile::tempdir().unwrap();
    let first = generate(
        first_dir.path(),
        &fixture("empty_poam.json"),
        &fixture("scan_week1.nessus"),
    );
    let original_uuid = items(&first)[0]["uuid"].clone();

    let second_dir = tempfile::tempdir().unwrap();
    let ledger = second_dir.path().join("ledger.json");
    std::fs::write(&ledger, serde_json::to_string_pretty(&first).unwrap()).unwrap();
    let second = generate(second_dir.path(), &ledger, &fixture("scan_week2.nessus"));

    let items = items(&second);
    assert_eq!(items.len(), 2, "{items:?}");

    let opened = &items[0];
    assert_eq!(opened["related-findings"]["plugin_id"], "10287");
    assert_eq!(opened["related-findings"]["severity"], 2);
    assert_eq!(status(opened), "open");

    let closed = &items[1];
    assert_eq!(closed["related-findings"]["plugin_id"], "19506");
    assert_eq!(status(closed), "completed");
    assert_eq!(closed["uuid"], original_uuid);
}

#[test]
fn test_merge_preserves_manual_edits() {
    // Given a ledger with an in-progress item, a hand-written item, and a completed item
    // When the scan still reports the in-progress finding
    // Then every item survives and the in-progress item keeps its status and remarks
    let dir = tempfile::tempdir().unwrap();
    let poam = generate(dir.path(), &fixture("poam.json"), &fixture("scan_week1.nessus"));

    let items = items(&poam);
    assert_eq!(items.len(), 3, "{items:?}");
    assert_eq!(items[0]["uuid"], "a1");
    assert_eq!(status(&items[0]), "in-progress");
    assert_eq!(items[0]["remarks"], "Change request CR-42 scheduled.");

    let hand_written = items.iter().find(|i| i["uuid"] == "a2").unwrap();
    assert!(hand_written.get("status").is_none());
    let closed = items.iter().find(|i| i["uuid"] == "a3").unwrap();
    assert_eq!(status(closed), "completed");

    assert_eq!(
        poam["plan-of-action-and-milestones"]["risks"][0]["title"],
        "Unpatched TLS library"
    );
}

#[test]
fn test_merge_is_idempotent_across_runs() {
    let first_dir = tempfile::tempdir().unwrap();
    let first = generate(first_dir.path(), &fixture("poam.json"), &fixture("scan_week1.nessus"));

    let second_dir = tempfile::tempdir().unwrap();
    let ledger = second_dir.path().join("ledger.json");
    std::fs::write(&ledger, serde_json::to_string(&first).unwrap()).unwrap();
    let second = generate(second_dir.path(), &ledger, &fixture("scan_week1.nessus"));

    assert_eq!(items(&first), items(&second));
}

#[test]
fn test_ssp_input_seeds_new_ledger() {
    // Given an SSP and no existing poam.json in the working directory
    // When generate-poam runs
    // Then a new POA&M carries the SSP title and first system id
    let dir = tempfile::tempdir().unwrap();
    let poam = generate(dir.path(), &fixture("ssp.json"), &fixture("scan_week1.nessus"));

    let body = &poam["plan-of-action-and-milestones"];
    assert_eq!(body["metadata"]["title"], "POA&M for Acme Cloud Platform");
    assert_eq!(body["system-id"]["id"], "F00000001");
    assert_eq!(items(&poam).len(), 1);
}

#[test]
fn test_ssp_input_merges_into_configured_ledger() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::copy(fixture("poam.json"), dir.path().join("existing.json")).unwrap();
    std::fs::write(
        dir.path().join(".posture.toml"),
        "[ledger]\npath = \"existing.json\"\n",
    )
    .unwrap();

    let poam = generate(dir.path(), &fixture("ssp.json"), &fixture("scan_week1.nessus"));

    let items = items(&poam);
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["uuid"], "a1");
    assert_eq!(
        poam["plan-of-action-and-milestones"]["metadata"]["title"],
        "POA&M for Acme Cloud Platform"
    );
}

#[test]
fn test_min_severity_from_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(".posture.toml"),
        "[ledger]\nmin_severity = \"info\"\n",
    )
    .unwrap();

    let poam = generate(
        dir.path(),
        &fixture("empty_poam.json"),
        &fixture("scan_week1.nessus"),
    );
    let ids: Vec<&str> = items(&poam)
        .iter()
        .map(|i| i["related-findings"]["plugin_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["19506", "10287"]);
}

#[test]
fn test_merge_tolerates_untracked_status_and_finding_references() {
    // Given a ledger with a risk-accepted item and an item referencing assessment findings
    // When a scan without either plugin is merged
    // Then the risk-accepted item is closed and the referenced item is carried unchanged
    let dir = tempfile::tempdir().unwrap();
    let poam = generate(
        dir.path(),
        &fixture("poam_oscal.json"),
        &fixture("scan_week1.nessus"),
    );

    let items = items(&poam);
    assert_eq!(items.len(), 3, "{items:?}");
    assert_eq!(items[0]["related-findings"]["plugin_id"], "19506");

    let accepted = items.iter().find(|i| i["uuid"] == "b1").unwrap();
    assert_eq!(status(accepted), "completed");

    let referenced = items.iter().find(|i| i["uuid"] == "b2").unwrap();
    assert_eq!(referenced["related-findings"][0]["finding-uuid"], "f-1");
    assert!(referenced.get("status").is_none());
}

#[test]
fn test_monthly_report_tolerates_untracked_status() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_posture"))
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg(fixture("poam_oscal.json"))
        .arg("monthly-report")
        .arg("--scan")
        .arg(fixture("scan_week1.nessus"))
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "{stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Monthly report generated:"));
}

#[test]
fn test_missing_scan_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_posture"))
        .current_dir(dir.path())
        .arg(fixture("empty_poam.json"))
        .arg("generate-poam")
        .arg("--scan")
        .arg(dir.path().join("nope.nessus"))
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "{stderr}");
    assert!(stderr.contains("file not found"), "{stderr}");
    assert!(!dir.path().join("docs").exists());
}

#[test]
fn test_malformed_scan_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let scan = dir.path().join("bad.nessus");
    std::fs::write(&scan, "<NessusClientData_v2><Report>").unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_posture"))
        .current_dir(dir.path())
        .arg(fixture("empty_poam.json"))
        .arg("generate-poam")
        .arg("--scan")
        .arg(&scan)
        .output()
        .unwrap();

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "{stderr}");
    assert!(stderr.contains("invalid format"), "{stderr}");
}
