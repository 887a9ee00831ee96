use httpmock::prelude::*;
use serde_json::json;

use jt::JtError;
use jt::core::Record;
use jt::storage::firestore::DocumentStore;
use jt::storage::{Backend, FirestoreBackend, FirestoreClient};

const DOCS: &str = "/projects/demo/databases/jobs/documents";

fn client(server: &MockServer) -> FirestoreClient {
    FirestoreClient::new(&server.base_url(), "demo", "jobs", "tok", 5).unwrap()
}

fn backend(server: &MockServer) -> FirestoreBackend {
    FirestoreBackend::new(Box::new(client(server)), 1024)
}

fn rest_doc(collection: &str, id: &str, raw: &str) -> serde_json::Value {
    json!({
        "name": format!("projects/demo/databases/jobs/documents/{collection}/{id}"),
        "fields": { "json": { "stringValue": raw } }
    })
}

fn stored(order: usize, id: i64, company: &str) -> String {
    json!({
        "order": order,
        "record": { "id": id, "companyName": company, "dateApplied": "2024-04-01" }
    })
    .to_string()
}

#[test]
fn load_orders_records_by_saved_position() {
    let server = MockServer::start();
    let list = server.mock(|when, then| {
        when.method(GET)
            .path(format!("{DOCS}/applications"))
            .query_param("pageSize", "300")
            .header("authorization", "Bearer tok");
        then.status(200).json_body(json!({
            "documents": [
                rest_doc("applications", "5", &stored(1, 5, "Second")),
                rest_doc("applications", "9", &stored(0, 9, "First")),
            ]
        }));
    });

    let records = backend(&server).load_all().unwrap();
    list.assert();
    let companies: Vec<&str> = records.iter().map(|r| r.company_name.as_str()).collect();
    assert_eq!(companies, ["First", "Second"]);
}

#[test]
fn save_writes_records_removes_stale_and_updates_summary() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{DOCS}/applications"));
        then.status(200).json_body(json!({
            "documents": [rest_doc("applications", "9", &stored(0, 9, "Gone"))]
        }));
    });
    server.mock(|when, then| {
        when.method(GET).path(format!("{DOCS}/attachment_chunks"));
        then.status(200).json_body(json!({}));
    });
    let put = server.mock(|when, then| {
        when.method(PATCH).path(format!("{DOCS}/applications/1"));
        then.status(200).json_body(json!({}));
    });
    let delete = server.mock(|when, then| {
        when.method(DELETE).path(format!("{DOCS}/applications/9"));
        then.status(200).json_body(json!({}));
    });
    let summary = server.mock(|when, then| {
        when.method(PATCH).path(format!("{DOCS}/meta/summary"));
        then.status(200).json_body(json!({}));
    });

    let records: Vec<Record> = serde_json::from_value(json!([
        { "id": 1, "companyName": "Acme", "dateApplied": "2024-04-02" }
    ]))
    .unwrap();
    backend(&server).save_all(&records).unwrap();

    put.assert();
    delete.assert();
    summary.assert();
}

#[test]
fn rejected_token_fails_load_with_auth_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{DOCS}/applications"));
        then.status(403).body("PERMISSION_DENIED");
    });
    let err = backend(&server).load_all().unwrap_err();
    assert!(matches!(err, JtError::Auth { ref backend, .. } if backend == "firestore"));
}

#[test]
fn missing_documents_read_as_absent() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path(format!("{DOCS}/meta/summary"));
        then.status(404).json_body(json!({ "error": { "code": 404 } }));
    });
    server.mock(|when, then| {
        when.method(DELETE).path(format!("{DOCS}/applications/404"));
        then.status(404).body("");
    });

    let mut client = client(&server);
    assert!(client.get("meta", "summary").unwrap().is_none());
    client.delete("applications", "404").unwrap();
    assert!(backend(&server).summary().unwrap().is_none());
    assert!(backend(&server).usage().unwrap().is_none());
}
