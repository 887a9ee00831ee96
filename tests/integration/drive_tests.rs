use httpmock::prelude::*;
use serde_json::json;

use jt::core::Record;
use jt::storage::drive::{file_query, folder_query};
use jt::storage::{Backend, DriveBackend};

const FOLDER: &str = "Job-Tracker-Data";
const FILE: &str = "applications.json";

fn backend(server: &MockServer) -> DriveBackend {
    DriveBackend::new(&server.base_url(), "tok", FOLDER, FILE, 5).unwrap()
}

fn sample() -> Vec<Record> {
    serde_json::from_value(json!([
        {"id": 1, "companyName": "Acme", "dateApplied": "2024-02-01", "status": "ghosted"}
    ]))
    .unwrap()
}

#[test]
fn load_finds_folder_and_file_then_downloads() {
    let server = MockServer::start();
    let folder = server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", folder_query(FOLDER))
            .header("authorization", "Bearer tok");
        then.status(200).json_body(json!({ "files": [{ "id": "fold1", "name": FOLDER }] }));
    });
    let file = server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", file_query(FILE, "fold1"));
        then.status(200).json_body(json!({ "files": [{ "id": "file1", "name": FILE }] }));
    });
    let download = server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files/file1")
            .query_param("alt", "media");
        then.status(200).json_body(json!({
            "applications": sample(),
            "lastUpdated": "2024-02-03T00:00:00Z",
            "version": "2.0"
        }));
    });

    let records = backend(&server).load_all().unwrap();
    folder.assert();
    file.assert();
    download.assert();
    assert_eq!(records, sample());
}

#[test]
fn load_creates_missing_folder_and_returns_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", folder_query(FOLDER));
        then.status(200).json_body(json!({ "files": [] }));
    });
    let create = server.mock(|when, then| {
        when.method(POST).path("/drive/v3/files");
        then.status(200).json_body(json!({ "id": "newfold" }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", file_query(FILE, "newfold"));
        then.status(200).json_body(json!({ "files": [] }));
    });

    assert!(backend(&server).load_all().unwrap().is_empty());
    create.assert();
}

#[test]
fn save_uploads_media_to_existing_file() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", folder_query(FOLDER));
        then.status(200).json_body(json!({ "files": [{ "id": "fold1" }] }));
    });
    server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/files")
            .query_param("q", file_query(FILE, "fold1"));
        then.status(200).json_body(json!({ "files": [{ "id": "file1" }] }));
    });
    let upload = server.mock(|when, then| {
        when.method(PATCH)
            .path("/upload/drive/v3/files/file1")
            .query_param("uploadType", "media")
            .header("authorization", "Bearer tok");
        then.status(200).json_body(json!({ "id": "file1" }));
    });

    backend(&server).save_all(&sample()).unwrap();
    upload.assert();
}

#[test]
fn storage_quota_parses_string_numbers() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/drive/v3/about")
            .query_param("fields", "storageQuota");
        then.status(200).json_body(json!({
            "storageQuota": { "limit": "16106127360", "usage": "1024" }
        }));
    });
    let quota = backend(&server).storage_quota().unwrap();
    assert_eq!(quota.limit, Some(16_106_127_360));
    assert_eq!(quota.usage, 1024);

    let usage = backend(&server).usage().unwrap().unwrap();
    assert_eq!(usage.bytes_used, Some(1024));
    assert_eq!(usage.bytes_limit, Some(16_106_127_360));
    assert!(usage.records.is_none());
}
