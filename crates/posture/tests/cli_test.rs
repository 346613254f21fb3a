use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn posture(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_posture"));
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn run(dir: &Path, file: &Path, command: &str) -> Output {
    posture(dir)
        .arg(file)
        .arg(command)
        .output()
        .expect("failed to run posture")
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[test]
fn test_roles_lists_key_roles() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ssp.json"), "roles");
    let stdout = text(&output.stdout);

    assert!(output.status.success(), "stderr={}", text(&output.stderr));
    assert!(stdout.contains("The System Owner is: Jane Smith"), "{stdout}");
    assert!(stdout.contains("The Lead Developer is: Raj Patel"));
    assert!(stdout.contains("The Lead Engineer is: Lee Chen"));
    assert!(stdout.contains("The Public Affairs Office Lead is: Maria Lopez"));
}

#[test]
fn test_roles_on_poam_is_not_applicable() {
    // Given a POA&M document
    // When the SSP-only roles operation is requested
    // Then nothing is printed to stdout, the outcome is reported, and the run succeeds
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("poam.json"), "roles");
    let stderr = text(&output.stderr);

    assert_eq!(output.status.code(), Some(0), "stderr={stderr}");
    assert!(output.stdout.is_empty(), "stdout={}", text(&output.stdout));
    assert!(stderr.contains("not applicable"), "{stderr}");
    assert!(stderr.contains("POA&M"), "{stderr}");
}

#[test]
fn test_unknown_command_lists_valid_names() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ssp.json"), "rolez");
    let stderr = text(&output.stderr);

    assert_eq!(output.status.code(), Some(2), "stderr={stderr}");
    assert!(stderr.contains("roles"), "{stderr}");
    assert!(stderr.contains("generate-poam"), "{stderr}");
    assert!(stderr.contains("monthly-report"), "{stderr}");
}

#[test]
fn test_merge_command_without_scan_is_usage_error() {
    // Given a primary path that does not exist
    // When generate-poam is requested without --scan
    // Then the missing scan is reported before the primary file is touched
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &dir.path().join("missing.json"), "generate-poam");
    let stderr = text(&output.stderr);

    assert_eq!(output.status.code(), Some(1), "stderr={stderr}");
    assert!(stderr.contains("--scan"), "{stderr}");
    assert!(!stderr.contains("file not found"), "{stderr}");
    assert!(!dir.path().join("docs").exists());
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &dir.path().join("nope.json"), "roles");
    let stderr = text(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("file not found"), "{stderr}");
}

#[test]
fn test_invalid_json_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ \"system-security-plan\": ").unwrap();
    let output = run(dir.path(), &path, "roles");
    let stderr = text(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("invalid format"), "{stderr}");
    assert!(stderr.contains("invalid JSON"), "{stderr}");
}

#[test]
fn test_unrecognized_document_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.json");
    std::fs::write(&path, r#"{"catalog": {"metadata": {}}}"#).unwrap();
    let output = run(dir.path(), &path, "metadata");
    let stderr = text(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr.contains("does not appear to be a valid OSCAL document"),
        "{stderr}"
    );
}

#[test]
fn test_ambiguous_document_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ambiguous.json"), "metadata");
    let stderr = text(&output.stderr);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("ambiguous"), "{stderr}");
}

#[test]
fn test_components_listing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ssp.json"), "components");
    let stdout = text(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Description: web01 application host"));
    assert!(stdout.contains("  ipv4-address: 10.0.0.5 (primary)"));
    assert!(stdout.contains("    version: 4.2.0"));
}

#[test]
fn test_controls_listing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ssp.json"), "controls");
    let stdout = text(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Moderate baseline implementation."));
    assert!(stdout.contains("ac-2"));
    assert!(stdout.contains("au-2"));
    assert!(stdout.contains("    - ac-2_prm_1: 90 days"));
}

#[test]
fn test_security_levels_listing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ssp.json"), "security-levels");
    let stdout = text(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Availability: low"));
    assert!(stdout.contains("Confidentiality: low (Adjusted to moderate)"));
    assert!(stdout.contains("Justification: Contains PII."));
}

#[test]
fn test_user_privileges_listing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ssp.json"), "user-privileges");
    let stdout = text(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Platform Operator"));
    assert!(stdout.contains("- System Administrator"));
    assert!(stdout.contains("  * rotate credentials"));
}

#[test]
fn test_poams_listing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("poam.json"), "poams");
    let stdout = text(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Total number of POAM items: 3"));
    assert!(stdout.contains("  Title: Stale service accounts"));
}

#[test]
fn test_activities_listing() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("sap.json"), "activities");
    let stdout = text(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("The 3PAO is: Coalfire 3PAO"));
    assert!(stdout.contains("Activity #2:"));
    assert!(stdout.contains(" Description: External network testing"));
}

#[test]
fn test_metadata_works_for_every_kind() {
    let dir = tempfile::tempdir().unwrap();
    for (file, title) in [
        ("ssp.json", "Acme Cloud Platform"),
        ("poam.json", "Acme Cloud Platform"),
        ("sap.json", "Acme Annual Assessment"),
    ] {
        let output = run(dir.path(), &fixture(file), "metadata");
        let stdout = text(&output.stdout);
        assert!(output.status.success(), "{file}: {}", text(&output.stderr));
        assert!(stdout.contains(&format!("Title: {title}")), "{file}: {stdout}");
        assert!(stdout.contains("OSCAL Version: 1.1.2"));
    }
}

#[test]
fn test_sap_operation_on_ssp_is_not_applicable() {
    let dir = tempfile::tempdir().unwrap();
    let output = run(dir.path(), &fixture("ssp.json"), "activities");

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(text(&output.stderr).contains("not applicable"));
}

#[test]
fn test_explicit_malformed_config_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "[ledger\n").unwrap();
    let output = posture(dir.path())
        .arg(fixture("ssp.json"))
        .arg("roles")
        .arg("--config")
        .arg(&config)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(text(&output.stderr).contains("custom.toml"));
}
