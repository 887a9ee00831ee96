//! Integration tests: cloud backends against a mock HTTP server, and
//! startup sync across real local backends.

mod drive_tests;
mod firestore_tests;
mod gist_tests;
mod sync_tests;
