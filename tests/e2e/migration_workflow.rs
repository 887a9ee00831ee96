//! E2E Scenario: Switching the primary backend
//!
//! Records saved in the local cache move into the database the first time
//! the database is the primary, attachments included.

use super::fixture::E2EFixture;

#[test]
fn test_local_records_migrate_into_database() {
    let mut fixture = E2EFixture::new("local_to_database");
    let resume = fixture.write_file("resume.txt", "ten years of shipping software");

    fixture.log_step("Add records with the local cache as primary");
    let first = fixture.robot(&[
        "add",
        "Acme",
        "--position",
        "Engineer",
        "--attach",
        resume.to_str().unwrap(),
    ]);
    let id = first["id"].as_i64().unwrap().to_string();
    fixture.robot(&["add", "Globex", "--status", "rejected"]);
    assert!(fixture.root.join("local/applications.json").exists());
    assert!(!fixture.db_path().exists());
    fixture.checkpoint("local_only");

    fixture.log_step("Switch the primary to the database");
    fixture.set_env("JT_STORAGE_PRIMARY", "database");
    let listed = fixture.robot(&["list"]);
    assert_eq!(listed["total"], 2);
    fixture.verify_db_state(
        |db| {
            db.query_row::<i64, _, _>("SELECT COUNT(*) FROM applications", [], |r| r.get(0))
                .map(|n| n == 2)
                .unwrap_or(false)
        },
        "both records migrated",
    );
    fixture.checkpoint("migrated");

    fixture.log_step("Migration is recorded once");
    let status = fixture.robot(&["sync", "--status"]);
    assert_eq!(status["primary"], "database");
    assert_eq!(status["state"]["last_startup"]["migrated_from"], "local");
    fixture.robot(&["list"]);
    let again = fixture.robot(&["sync", "--status"]);
    assert_eq!(again["state"]["last_startup"]["source"], "database");
    assert!(again["state"]["last_startup"]["migrated_from"].is_null());

    fixture.log_step("Attachment survives the move");
    let out_dir = fixture.temp_dir.path().join("attachments");
    let shown = fixture.robot(&["show", &id, "--save-attachments", out_dir.to_str().unwrap()]);
    let saved = shown["saved"][0].as_str().unwrap();
    assert_eq!(
        std::fs::read_to_string(saved).unwrap(),
        "ten years of shipping software"
    );

    fixture.generate_report();
}
