use httpmock::prelude::*;
use serde_json::json;

use jt::JtError;
use jt::core::Record;
use jt::storage::{Backend, GistBackend};

const FILE: &str = "job-applications-data.json";

fn backend(server: &MockServer) -> GistBackend {
    GistBackend::new(&server.base_url(), "abc123", FILE, "tok", 5).unwrap()
}

fn sample() -> Vec<Record> {
    serde_json::from_value(json!([
        {"id": 2, "companyName": "Globex", "dateApplied": "2024-02-02", "status": "selected"},
        {"id": 1, "companyName": "Acme", "dateApplied": "2024-02-01"}
    ]))
    .unwrap()
}

#[test]
fn load_reads_envelope_from_named_file() {
    let server = MockServer::start();
    let content = serde_json::to_string(&json!({
        "applications": sample(),
        "lastUpdated": "2024-02-03T00:00:00Z"
    }))
    .unwrap();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/gists/abc123")
            .header("authorization", "Bearer tok");
        then.status(200).json_body(json!({
            "files": { FILE: { "content": content, "truncated": false } }
        }));
    });

    let records = backend(&server).load_all().unwrap();
    mock.assert();
    assert_eq!(records, sample());
}

#[test]
fn load_follows_raw_url_when_truncated() {
    let server = MockServer::start();
    let raw = server.mock(|when, then| {
        when.method(GET).path("/raw/data.json");
        then.status(200)
            .body(serde_json::to_string(&sample()).unwrap());
    });
    let gist = server.mock(|when, then| {
        when.method(GET).path("/gists/abc123");
        then.status(200).json_body(json!({
            "files": { FILE: {
                "content": "[{\"id\": 1",
                "truncated": true,
                "raw_url": server.url("/raw/data.json")
            } }
        }));
    });

    let records = backend(&server).load_all().unwrap();
    gist.assert();
    raw.assert();
    assert_eq!(records.len(), 2);
}

#[test]
fn missing_file_loads_empty() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gists/abc123");
        then.status(200).json_body(json!({ "files": {} }));
    });
    assert!(backend(&server).load_all().unwrap().is_empty());
}

#[test]
fn missing_gist_is_unavailable() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gists/abc123");
        then.status(404).body("Not Found");
    });
    assert!(matches!(
        backend(&server).load_all(),
        Err(JtError::StorageUnavailable { .. })
    ));
}

#[test]
fn rejected_token_is_auth_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/gists/abc123");
        then.status(401).body("Bad credentials");
    });
    let err = backend(&server).load_all().unwrap_err();
    assert!(matches!(err, JtError::Auth { .. }));
}

#[test]
fn save_patches_the_data_file() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(PATCH)
            .path("/gists/abc123")
            .header("authorization", "Bearer tok");
        then.status(200).json_body(json!({ "id": "abc123" }));
    });
    backend(&server).save_all(&sample()).unwrap();
    mock.assert();
}

#[test]
fn failed_save_is_write_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(PATCH).path("/gists/abc123");
        then.status(500).body("boom");
    });
    let err = backend(&server).save_all(&sample()).unwrap_err();
    assert!(matches!(err, JtError::StorageWrite { ref backend, .. } if backend == "gist"));
}
