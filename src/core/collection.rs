//! The in-memory record collection and its mutations.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::record::{Record, RecordPatch, Status};
use crate::error::{JtError, Result};

/// Ordered set of records, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection {
    records: Vec<Record>,
}

/// Status filter used by `list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "all" => Self::All,
            other => Self::Only(Status::from(other)),
        }
    }

    fn matches(&self, status: &Status) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == status,
        }
    }
}

/// Counts from a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    pub added: usize,
    pub skipped: usize,
}

impl Collection {
    #[must_use]
    pub const fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Identifier for a record created at `now_ms`, bumped past any
    /// existing identifier if the clock would collide.
    pub fn next_id(&self, now_ms: i64) -> Result<i64> {
        let max = self.records.iter().map(|r| r.id).max().unwrap_or(0);
        if now_ms > max {
            return Ok(now_ms);
        }
        max.checked_add(1).ok_or_else(|| {
            JtError::InvalidRecord(format!(
                "no identifier left after {max}; remove or re-import the record with that id"
            ))
        })
    }

    /// Insert at the front with a fresh identifier and return it.
    pub fn add(&mut self, mut record: Record, now_ms: i64) -> Result<i64> {
        record.id = self.next_id(now_ms)?;
        record.validate()?;
        let id = record.id;
        self.records.insert(0, record);
        Ok(id)
    }

    /// Edit a record in place; its identifier and position are kept.
    pub fn update(&mut self, id: i64, patch: RecordPatch) -> Result<&Record> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or(JtError::RecordNotFound(id))?;
        let mut edited = record.clone();
        edited.apply(patch);
        edited.validate()?;
        *record = edited;
        Ok(record)
    }

    pub fn remove(&mut self, id: i64) -> Result<Record> {
        let index = self
            .records
            .iter()
            .position(|record| record.id == id)
            .ok_or(JtError::RecordNotFound(id))?;
        Ok(self.records.remove(index))
    }

    /// Swap the whole set.
    pub fn replace(&mut self, records: Vec<Record>) {
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Append records whose identifier is not already present.
    /// Existing records always win.
    pub fn merge(&mut self, incoming: Vec<Record>) -> MergeOutcome {
        let mut seen: HashSet<i64> = self.records.iter().map(|r| r.id).collect();
        let mut outcome = MergeOutcome {
            added: 0,
            skipped: 0,
        };
        for record in incoming {
            if seen.insert(record.id) {
                self.records.push(record);
                outcome.added += 1;
            } else {
                outcome.skipped += 1;
            }
        }
        outcome
    }

    /// Case-insensitive company substring plus status match.
    #[must_use]
    pub fn filter(&self, search: &str, status: &StatusFilter) -> Vec<&Record> {
        let needle = search.trim().to_lowercase();
        self.records
            .iter()
            .filter(|record| {
                needle.is_empty() || record.company_display().to_lowercase().contains(&needle)
            })
            .filter(|record| status.matches(&record.status))
            .collect()
    }

    /// SHA-256 over the serialized collection, used to detect changes.
    pub fn digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.records)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

/// First duplicate identifier in `records`, if any.
#[must_use]
pub fn first_duplicate_id(records: &[Record]) -> Option<i64> {
    let mut seen = HashSet::with_capacity(records.len());
    records.iter().map(|r| r.id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::record;

    #[test]
    fn add_inserts_newest_first() {
        let mut collection = Collection::default();
        collection.add(record(0, "Acme"), 1_000).unwrap();
        collection.add(record(0, "Globex"), 2_000).unwrap();
        assert_eq!(collection.records()[0].company_name, "Globex");
        assert_eq!(collection.records()[0].id, 2_000);
    }

    #[test]
    fn add_bumps_colliding_id() {
        let mut collection = Collection::new(vec![record(5_000, "Acme")]);
        let id = collection.add(record(0, "Globex"), 5_000).unwrap();
        assert_eq!(id, 5_001);
        // a clock that went backwards also gets a fresh id
        let id = collection.add(record(0, "Initech"), 10).unwrap();
        assert_eq!(id, 5_002);
    }

    #[test]
    fn add_fails_when_ids_are_exhausted() {
        let mut collection = Collection::new(vec![record(i64::MAX, "Acme")]);
        let err = collection
            .add(record(0, "Globex"), 1_700_000_000_000)
            .unwrap_err();
        assert!(matches!(err, JtError::InvalidRecord(_)));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn add_rejects_missing_company() {
        let mut collection = Collection::default();
        assert!(collection.add(record(0, ""), 1).is_err());
        assert!(collection.is_empty());
    }

    #[test]
    fn update_keeps_identifier() {
        let mut collection = Collection::new(vec![record(1, "Acme"), record(2, "Globex")]);
        let updated = collection
            .update(
                2,
                RecordPatch {
                    status: Some(Status::Rejected),
                    ..RecordPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.id, 2);
        assert_eq!(collection.records()[1].status, Status::Rejected);
    }

    #[test]
    fn update_missing_is_not_found() {
        let mut collection = Collection::default();
        assert!(matches!(
            collection.update(3, RecordPatch::default()),
            Err(JtError::RecordNotFound(3))
        ));
    }

    #[test]
    fn remove_deletes_record() {
        let mut collection = Collection::new(vec![record(1, "Acme"), record(2, "Globex")]);
        let removed = collection.remove(1).unwrap();
        assert_eq!(removed.company_name, "Acme");
        assert_eq!(collection.len(), 1);
        assert!(collection.remove(1).is_err());
    }

    #[test]
    fn merge_keeps_existing_and_appends_new() {
        let mut collection = Collection::new(vec![record(1, "Acme"), record(2, "Globex")]);
        let outcome = collection.merge(vec![record(2, "Changed"), record(3, "Initech")]);
        assert_eq!(outcome, MergeOutcome { added: 1, skipped: 1 });
        assert_eq!(collection.len(), 3);
        assert_eq!(collection.get(2).unwrap().company_name, "Globex");
        assert_eq!(collection.records()[2].id, 3);
    }

    #[test]
    fn filter_by_search_and_status() {
        let mut selected = record(2, "Globex Corp");
        selected.status = Status::Selected;
        let collection = Collection::new(vec![record(1, "Acme"), selected, record(3, "globex labs")]);

        let hits = collection.filter("GLOBEX", &StatusFilter::All);
        assert_eq!(hits.len(), 2);

        let hits = collection.filter("globex", &StatusFilter::parse("selected"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 2);

        assert_eq!(collection.filter("", &StatusFilter::parse("all")).len(), 3);
    }

    #[test]
    fn digest_changes_with_content() {
        let mut collection = Collection::new(vec![record(1, "Acme")]);
        let before = collection.digest().unwrap();
        assert_eq!(before, collection.digest().unwrap());
        collection.merge(vec![record(2, "Globex")]);
        assert_ne!(before, collection.digest().unwrap());
    }

    #[test]
    fn duplicate_ids_are_found() {
        assert_eq!(first_duplicate_id(&[record(1, "a"), record(2, "b")]), None);
        assert_eq!(
            first_duplicate_id(&[record(1, "a"), record(2, "b"), record(1, "c")]),
            Some(1)
        );
    }
}
