use std::cell::RefCell;
use std::rc::Rc;

use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use jt::storage::firestore::{APPLICATIONS, CHUNKS, MemoryDocumentStore};
use jt::storage::{Backend, BackendKind, Database, FirestoreBackend, GistBackend, LocalCache};
use jt::store::RecordStore;
use jt::sync::{Resolution, SyncEngine};
use jt::test_utils::{record, record_with_attachment, sorted};

const KEY: &str = "jobApplications";

fn local(dir: &TempDir) -> LocalCache {
    LocalCache::open(dir.path(), KEY).unwrap()
}

fn database(dir: &TempDir) -> Database {
    Database::open(dir.path().join("jt.db")).unwrap()
}

fn shared_store() -> (Rc<RefCell<MemoryDocumentStore>>, Box<dyn Backend>) {
    let docs = Rc::new(RefCell::new(MemoryDocumentStore::new()));
    let backend = FirestoreBackend::new(Box::new(Rc::clone(&docs)), 64);
    (docs, Box::new(backend))
}

#[test]
fn empty_database_migrates_from_local_cache() {
    let dir = TempDir::new().unwrap();
    let seeded = vec![record(1, "Acme"), record_with_attachment(2, "Globex", 300)];
    local(&dir).save_all(&seeded).unwrap();

    let mut engine = SyncEngine::new(
        Box::new(database(&dir)),
        vec![Box::new(local(&dir))],
        None,
    );
    let report = engine.startup();

    assert_eq!(report.migrated_from, Some(BackendKind::Local));
    assert_eq!(report.source, BackendKind::Local);
    assert_eq!(report.resolution, Resolution::NoRemote);
    assert_eq!(sorted(report.records), sorted(seeded.clone()));

    // A second startup reads straight from the database.
    let mut reopened = SyncEngine::new(Box::new(database(&dir)), vec![], None);
    let again = reopened.startup();
    assert_eq!(again.source, BackendKind::Database);
    assert!(again.migrated_from.is_none());
    assert_eq!(sorted(again.records), sorted(seeded));
}

#[test]
fn remote_with_more_records_replaces_local() {
    let server = MockServer::start();
    let remote_records = vec![record(1, "A"), record(2, "B"), record(3, "C")];
    let content = serde_json::to_string(&remote_records).unwrap();
    server.mock(|when, then| {
        when.method(GET).path("/gists/g1");
        then.status(200).json_body(json!({
            "files": { "data.json": { "content": content } }
        }));
    });

    let dir = TempDir::new().unwrap();
    local(&dir).save_all(&[record(9, "Only")]).unwrap();
    let gist = GistBackend::new(&server.base_url(), "g1", "data.json", "tok", 5).unwrap();

    let mut engine = SyncEngine::new(Box::new(local(&dir)), vec![], Some(Box::new(gist)));
    let report = engine.startup();

    assert_eq!(report.resolution, Resolution::RemoteWon);
    assert_eq!(report.source, BackendKind::Gist);
    assert_eq!(report.local_count, Some(1));
    assert_eq!(report.remote_count, Some(3));
    assert_eq!(sorted(local(&dir).load_all().unwrap()), remote_records);
}

#[test]
fn local_with_more_records_is_pushed_with_chunks() {
    let dir = TempDir::new().unwrap();
    let mine = vec![
        record(1, "A"),
        record(2, "B"),
        record_with_attachment(3, "C", 200),
    ];
    local(&dir).save_all(&mine).unwrap();

    let (docs, remote) = shared_store();
    remote_seed(&docs, &[record(7, "Old")]);

    let mut engine = SyncEngine::new(Box::new(local(&dir)), vec![], Some(remote));
    let report = engine.startup();

    assert_eq!(report.resolution, Resolution::LocalPushed);
    assert_eq!(docs.borrow().count(APPLICATIONS), 3);
    assert_eq!(docs.borrow().count(CHUNKS), 4);

    let mut check = FirestoreBackend::new(Box::new(Rc::clone(&docs)), 64);
    assert_eq!(sorted(check.load_all().unwrap()), mine);
}

#[test]
fn equal_counts_keep_local_and_write_nothing() {
    let dir = TempDir::new().unwrap();
    let mine = vec![record(1, "Mine"), record(2, "Also mine")];
    local(&dir).save_all(&mine).unwrap();

    let (docs, remote) = shared_store();
    remote_seed(&docs, &[record(5, "Theirs"), record(6, "Also theirs")]);

    let mut engine = SyncEngine::new(Box::new(local(&dir)), vec![], Some(remote));
    let report = engine.startup();

    assert_eq!(report.resolution, Resolution::Tie);
    assert_eq!(report.records, mine);
    assert_eq!(local(&dir).load_all().unwrap(), mine);
    let mut check = FirestoreBackend::new(Box::new(Rc::clone(&docs)), 64);
    let theirs: Vec<String> = check
        .load_all()
        .unwrap()
        .into_iter()
        .map(|r| r.company_name)
        .collect();
    assert_eq!(theirs, ["Theirs", "Also theirs"]);
}

#[test]
fn unreachable_remote_keeps_local_and_warns() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gists/g1");
        then.status(500).body("unavailable");
    });

    let dir = TempDir::new().unwrap();
    local(&dir).save_all(&[record(1, "Acme")]).unwrap();
    let gist = GistBackend::new(&server.base_url(), "g1", "data.json", "tok", 5).unwrap();

    let mut engine = SyncEngine::new(Box::new(local(&dir)), vec![], Some(Box::new(gist)));
    let report = engine.startup();

    assert_eq!(report.resolution, Resolution::RemoteUnavailable);
    assert_eq!(report.count, 1);
    assert!(report.warnings.iter().any(|w| w.starts_with("gist unavailable")));
}

#[test]
fn failed_remote_write_is_a_warning_not_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gists/g1");
        then.status(200).json_body(json!({ "files": {} }));
    });
    let patch = server.mock(|when, then| {
        when.method(PATCH).path("/gists/g1");
        then.status(502).body("bad gateway");
    });

    let dir = TempDir::new().unwrap();
    let gist = GistBackend::new(&server.base_url(), "g1", "data.json", "tok", 5).unwrap();
    let engine = SyncEngine::new(Box::new(local(&dir)), vec![], Some(Box::new(gist)));
    let (mut store, startup) = RecordStore::with_engine(engine, dir.path());
    assert_eq!(startup.resolution, Resolution::BothEmpty);

    let (id, report) = store.add_at(record(0, "Acme"), 1_700_000_000_000).unwrap();
    patch.assert();
    assert!(report.primary_error().is_none());
    assert_eq!(report.warnings().len(), 1);
    assert!(!report.all_ok());
    assert_eq!(local(&dir).load_all().unwrap()[0].id, id);
}

fn remote_seed(docs: &Rc<RefCell<MemoryDocumentStore>>, records: &[jt::core::Record]) {
    let mut seeder = FirestoreBackend::new(Box::new(Rc::clone(docs)), 64);
    seeder.save_all(records).unwrap();
}
