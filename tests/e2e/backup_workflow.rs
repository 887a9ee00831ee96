//! E2E Scenario: Backup and restore
//!
//! Export the collection, wipe it, restore from the file, then merge a
//! second backup that overlaps the first.

use super::fixture::E2EFixture;

#[test]
fn test_export_clear_and_restore() {
    let mut fixture = E2EFixture::new("backup_restore");

    fixture.log_step("Create records");
    fixture.robot(&["add", "Acme", "--date", "2024-06-01", "--status", "in-progress"]);
    fixture.robot(&["add", "Globex", "--date", "2024-06-02", "--notes", "referral"]);
    fixture.robot(&["add", "Initech", "--date", "2024-06-03", "--status", "ghosted"]);

    fixture.log_step("Export to a file");
    let backup = fixture.temp_dir.path().join("backup.json");
    let exported = fixture.robot(&["export", "--output", backup.to_str().unwrap()]);
    assert_eq!(exported["count"], 3);
    fixture.checkpoint("exported");

    fixture.log_step("Clear requires approval");
    let refused = fixture.run_jt(&["clear"]);
    assert!(!refused.success);
    fixture.assert_output_contains(&refused, "--approve");
    fixture.robot(&["clear", "--approve"]);
    assert_eq!(fixture.robot(&["list"])["total"], 0);

    fixture.log_step("Restore from the backup");
    let restored = fixture.robot(&["import", backup.to_str().unwrap()]);
    assert_eq!(restored["added"], 3);
    assert_eq!(restored["total"], 3);
    let ghosted = fixture.robot(&["list", "--status", "ghosted"]);
    assert_eq!(ghosted["count"], 1);
    assert_eq!(ghosted["records"][0]["companyName"], "Initech");

    fixture.log_step("Merge an overlapping backup");
    let second = fixture.write_file(
        "second.json",
        r#"[{"id": 42, "company": "Hooli", "dateApplied": "2024-06-04", "requirements": "Go"}]"#,
    );
    let merged = fixture.robot(&["import", second.to_str().unwrap()]);
    assert_eq!(merged["added"], 1);
    assert_eq!(merged["total"], 4);
    let again = fixture.robot(&["import", second.to_str().unwrap()]);
    assert_eq!(again["added"], 0);
    assert_eq!(again["skipped"], 1);

    fixture.log_step("Stats over the restored set");
    let stats = fixture.robot(&["stats", "--today", "2024-06-04"]);
    assert_eq!(stats["total"], 4);
    fixture.checkpoint("restored");

    fixture.generate_report();
}
