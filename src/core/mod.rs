//! Record types and the logic that operates on whole collections

pub mod collection;
pub mod import;
pub mod record;
pub mod stats;

pub use collection::{Collection, MergeOutcome, StatusFilter};
pub use import::{ImportMode, ImportOutcome};
pub use record::{Attachment, Record, RecordPatch, Status};
pub use stats::Stats;
