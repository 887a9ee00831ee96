//! Property tests.

mod collection_tests;
mod storage_tests;
mod strategies;
