//! E2E test suite entry point.

mod backup_workflow;
mod fixture;
mod migration_workflow;
