use std::collections::HashSet;

use proptest::prelude::*;

use jt::core::import::{ImportMode, apply_import, parse_backup};
use jt::core::{Collection, Status};

use super::strategies::{arb_records, arb_status};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn merge_adds_only_unseen_identifiers(
        existing in arb_records(12),
        incoming in arb_records(12),
    ) {
        let existing_ids: HashSet<i64> = existing.iter().map(|r| r.id).collect();
        let overlap = incoming.iter().filter(|r| existing_ids.contains(&r.id)).count();

        let mut collection = Collection::new(existing.clone());
        let outcome = apply_import(&mut collection, incoming.clone(), ImportMode::Merge);

        prop_assert_eq!(outcome.added, incoming.len() - overlap);
        prop_assert_eq!(outcome.skipped, overlap);
        prop_assert_eq!(outcome.total, existing.len() + incoming.len() - overlap);
        // Existing records keep their position and content.
        prop_assert_eq!(&collection.records()[..existing.len()], &existing[..]);
    }

    #[test]
    fn replace_import_yields_exactly_the_backup(
        existing in arb_records(8),
        incoming in arb_records(8),
    ) {
        let mut collection = Collection::new(existing);
        let outcome = apply_import(&mut collection, incoming.clone(), ImportMode::Replace);
        prop_assert_eq!(outcome.total, incoming.len());
        prop_assert_eq!(collection.records(), &incoming[..]);
    }

    #[test]
    fn exported_backup_parses_back(records in arb_records(10)) {
        let raw = serde_json::to_string_pretty(&records).unwrap();
        prop_assert_eq!(parse_backup(&raw).unwrap(), records);
    }

    #[test]
    fn status_wire_value_is_preserved(status in arb_status()) {
        let json = serde_json::to_string(&status).unwrap();
        let back: Status = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.as_str(), status.as_str());
        prop_assert_eq!(Status::from(status.as_str()), status);
    }

    #[test]
    fn digest_changes_with_content(records in arb_records(6)) {
        prop_assume!(!records.is_empty());
        let collection = Collection::new(records.clone());
        let mut changed = records;
        changed[0].notes.push('!');
        prop_assert_ne!(collection.digest().unwrap(), Collection::new(changed).digest().unwrap());
    }
}
