use proptest::prelude::*;
use tempfile::TempDir;

use jt::storage::chunk::{externalize, group_by_parent, internalize, reassemble, split};
use jt::storage::firestore::MemoryDocumentStore;
use jt::storage::{Backend, Database, FirestoreBackend, LocalCache};
use jt::test_utils::sorted;

use super::strategies::{arb_records, arb_records_with_shared_attachment_ids};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn split_then_reassemble_is_identity(payload in "\\PC{0,600}", chunk_size in 1usize..128) {
        let chunks = split("att", &payload, chunk_size).unwrap();
        for chunk in &chunks {
            // A slice only exceeds the size when it is one wide character.
            prop_assert!(chunk.data.len() <= chunk_size || chunk.data.chars().count() == 1);
        }
        let mut shuffled = chunks;
        shuffled.reverse();
        prop_assert_eq!(reassemble("att", shuffled).unwrap(), payload);
    }

    #[test]
    fn document_store_preserves_records(records in arb_records(8), chunk_size in 16usize..256) {
        let mut backend = FirestoreBackend::new(Box::new(MemoryDocumentStore::new()), chunk_size);
        backend.save_all(&records).unwrap();
        prop_assert_eq!(backend.load_all().unwrap(), records);
    }

    #[test]
    fn shared_attachment_ids_do_not_collide(
        records in arb_records_with_shared_attachment_ids(6),
        chunk_size in 16usize..128,
    ) {
        let mut backend = FirestoreBackend::new(Box::new(MemoryDocumentStore::new()), chunk_size);
        backend.save_all(&records).unwrap();
        prop_assert_eq!(backend.load_all().unwrap(), records);
    }

    #[test]
    fn externalized_records_fit_the_budget(
        records in arb_records_with_shared_attachment_ids(1),
        budget in 200usize..1_500,
    ) {
        let record = &records[0];
        let (stored, moved) = externalize(record, usize::MAX, budget).unwrap();
        let inline_left = stored.files.iter().any(|f| !f.data.is_empty());
        let size = serde_json::to_string(&stored).unwrap().len();
        // Either it fits or there is nothing left to move out.
        prop_assert!(size <= budget || !inline_left);

        let positions: Vec<usize> = moved.iter().map(|m| m.position).collect();
        let mut grouped = group_by_parent(moved.into_iter().flat_map(|m| m.chunks).collect());
        let mut restored = stored;
        internalize(&mut restored, &positions, &mut grouped).unwrap();
        prop_assert_eq!(&restored, record);
    }

    #[test]
    fn local_backends_preserve_records(records in arb_records(8)) {
        let dir = TempDir::new().unwrap();
        let mut cache = LocalCache::open(dir.path(), "applications").unwrap();
        let mut db = Database::open(dir.path().join("jt.db")).unwrap();

        cache.save_all(&records).unwrap();
        db.save_all(&records).unwrap();

        prop_assert_eq!(cache.load_all().unwrap(), records.clone());
        prop_assert_eq!(sorted(db.load_all().unwrap()), sorted(records));
    }
}
