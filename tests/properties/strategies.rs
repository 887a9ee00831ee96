use chrono::NaiveDate;
use proptest::prelude::*;

use jt::core::{Record, Status};
use jt::test_utils::attachment;

pub fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Applied),
        Just(Status::InProgress),
        Just(Status::Selected),
        Just(Status::Rejected),
        Just(Status::RejectedInRounds),
        "[a-z]{3,10}(-[a-z]{2,6})?".prop_map(|raw| Status::from(raw.as_str())),
    ]
}

pub fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (2020i32..2027, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

pub fn arb_record(id: i64) -> impl Strategy<Value = Record> {
    (
        "[A-Za-z][A-Za-z0-9 &.-]{0,30}",
        prop::option::of("[A-Za-z ]{1,20}"),
        arb_date(),
        arb_status(),
        ".{0,80}",
        prop::option::of(0usize..400),
    )
        .prop_map(move |(company, position, date, status, notes, payload)| {
            let mut record = Record::new(id, company, date);
            record.position = position;
            record.status = status;
            record.notes = notes;
            if let Some(len) = payload {
                record.files.push(attachment(&format!("att-{id}"), len));
            }
            record
        })
}

/// Up to `max` records with distinct identifiers.
pub fn arb_records(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_set(1i64..10_000_000, 0..=max)
        .prop_flat_map(|ids| ids.into_iter().map(arb_record).collect::<Vec<_>>())
}

/// Records whose attachments all reuse the same few ids, as files picked
/// from one folder tend to.
pub fn arb_records_with_shared_attachment_ids(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::btree_set(1i64..10_000_000, 1..=max).prop_flat_map(|ids| {
        ids.into_iter()
            .map(|id| {
                prop::collection::vec((prop::sample::select(vec!["cv", "letter"]), 0usize..300), 0..4)
                    .prop_map(move |files| {
                        let mut record = Record::new(
                            id,
                            format!("Company {id}"),
                            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                        );
                        record.files = files
                            .into_iter()
                            .map(|(name, len)| attachment(name, len))
                            .collect();
                        record
                    })
            })
            .collect::<Vec<_>>()
    })
}
