//! Shared test utilities for jt.

pub mod fixtures;

use chrono::{DateTime, NaiveDate, Utc};

use crate::core::{Attachment, Record};

/// A minimal record applied on 2024-01-15.
#[must_use]
pub fn record(id: i64, company: &str) -> Record {
    record_on(id, company, "2024-01-15")
}

/// A minimal record applied on `date` (`YYYY-MM-DD`).
///
/// # Panics
/// If `date` is not a valid date.
#[must_use]
pub fn record_on(id: i64, company: &str, date: &str) -> Record {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("test date must be YYYY-MM-DD");
    Record::new(id, company, date)
}

/// A record carrying one attachment whose base64 payload is exactly
/// `payload_len` characters.
#[must_use]
pub fn record_with_attachment(id: i64, company: &str, payload_len: usize) -> Record {
    let mut rec = record(id, company);
    rec.files.push(attachment(&format!("att-{id}"), payload_len));
    rec
}

/// An attachment with a deterministic payload of `payload_len` characters.
#[must_use]
pub fn attachment(id: &str, payload_len: usize) -> Attachment {
    let alphabet = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let data: String = (0..payload_len)
        .map(|i| char::from(alphabet[i % alphabet.len()]))
        .collect();
    Attachment {
        id: id.to_string(),
        name: format!("{id}.pdf"),
        mime_type: "application/pdf".to_string(),
        size: (payload_len as u64 / 4) * 3,
        uploaded_at: fixed_time(),
        data,
    }
}

/// A stable timestamp for fixtures.
///
/// # Panics
/// Never; the literal is valid RFC 3339.
#[must_use]
pub fn fixed_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc)
}

/// Sort by identifier so sets from different backends compare equal.
#[must_use]
pub fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by_key(|r| r.id);
    records
}
