//! Attachment chunking for backends with a per-document size ceiling.
//!
//! A payload larger than the chunk size is cut into ordered slices. Each
//! slice records its parent attachment, its index, the chunk count, the
//! full payload length and a SHA-256 of the full payload, so reassembly
//! can detect a missing, duplicated or corrupted slice.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::{Attachment, Record};
use crate::error::{JtError, Result};

/// One slice of an attachment payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub parent_id: String,
    pub index: usize,
    pub total: usize,
    /// Byte length of the whole payload
    pub total_len: usize,
    /// Hex SHA-256 of the whole payload
    pub checksum: String,
    pub data: String,
}

impl Chunk {
    /// Document identifier; zero-padded so lexical order matches index order.
    #[must_use]
    pub fn doc_id(&self) -> String {
        chunk_doc_id(&self.parent_id, self.index)
    }
}

#[must_use]
pub fn chunk_doc_id(parent_id: &str, index: usize) -> String {
    format!("{parent_id}_{index:05}")
}

#[must_use]
pub fn checksum(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

/// Split `payload` into slices of at most `chunk_size` bytes, never
/// cutting a UTF-8 character.
pub fn split(parent_id: &str, payload: &str, chunk_size: usize) -> Result<Vec<Chunk>> {
    if chunk_size == 0 {
        return Err(JtError::Config("chunk size must be positive".to_string()));
    }

    let mut pieces = Vec::with_capacity(payload.len().div_ceil(chunk_size).max(1));
    let mut rest = payload;
    while !rest.is_empty() {
        let mut cut = chunk_size.min(rest.len());
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // A single character wider than the chunk size.
            cut = rest
                .char_indices()
                .nth(1)
                .map_or(rest.len(), |(idx, _)| idx);
        }
        let (head, tail) = rest.split_at(cut);
        pieces.push(head);
        rest = tail;
    }
    if pieces.is_empty() {
        pieces.push("");
    }

    let total = pieces.len();
    let sum = checksum(payload);
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, data)| Chunk {
            parent_id: parent_id.to_string(),
            index,
            total,
            total_len: payload.len(),
            checksum: sum.clone(),
            data: data.to_string(),
        })
        .collect())
}

/// Put the slices of one attachment back together, in index order.
pub fn reassemble(parent_id: &str, mut chunks: Vec<Chunk>) -> Result<String> {
    let integrity = |reason: String| JtError::ChunkIntegrity {
        attachment_id: parent_id.to_string(),
        reason,
    };

    if chunks.is_empty() {
        return Err(integrity("no chunks stored".to_string()));
    }
    chunks.sort_by_key(|chunk| chunk.index);

    let expected = chunks[0].total;
    let total_len = chunks[0].total_len;
    let sum = chunks[0].checksum.clone();

    if chunks.len() != expected {
        return Err(integrity(format!(
            "expected {expected} chunks, found {}",
            chunks.len()
        )));
    }

    let mut payload = String::with_capacity(total_len);
    for (position, chunk) in chunks.iter().enumerate() {
        if chunk.parent_id != parent_id {
            return Err(integrity(format!(
                "chunk {} belongs to '{}'",
                chunk.index, chunk.parent_id
            )));
        }
        if chunk.index != position {
            return Err(integrity(format!("chunk {position} is missing")));
        }
        if chunk.total != expected || chunk.total_len != total_len || chunk.checksum != sum {
            return Err(integrity(format!(
                "chunk {} disagrees with chunk 0 about the payload",
                chunk.index
            )));
        }
        payload.push_str(&chunk.data);
    }

    if payload.len() != total_len {
        return Err(integrity(format!(
            "reassembled {} bytes, expected {total_len}",
            payload.len()
        )));
    }
    if checksum(&payload) != sum {
        return Err(integrity("checksum mismatch".to_string()));
    }
    Ok(payload)
}

/// Chunk group name for the attachment at `position` in record `record_id`.
///
/// Attachment ids are free text and need not be unique across records, so
/// the group is keyed by record and position, with a short hash of the
/// attachment id to catch a reordered file list. The result is safe to use
/// as a document id.
#[must_use]
pub fn parent_key(record_id: i64, position: usize, attachment_id: &str) -> String {
    let digest = checksum(attachment_id);
    format!("{record_id}-{position}-{}", &digest[..12])
}

/// Attachment payload moved out of its record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Externalized {
    /// Index into the record's `files`
    pub position: usize,
    pub parent_id: String,
    pub chunks: Vec<Chunk>,
}

/// Strip payloads from `record` until it fits, returning the record as it
/// should be stored plus the chunks to store beside it.
///
/// Every payload over `chunk_size` is moved out. If the serialized record
/// is still larger than `max_record_bytes`, the largest remaining inline
/// payloads are moved out too, one at a time, until it fits or none are
/// left.
pub fn externalize(
    record: &Record,
    chunk_size: usize,
    max_record_bytes: usize,
) -> Result<(Record, Vec<Externalized>)> {
    let mut stored = record.clone();
    let mut moved = Vec::new();

    for position in 0..stored.files.len() {
        if stored.files[position].data.len() > chunk_size {
            moved.push(move_out(&mut stored, position, chunk_size)?);
        }
    }

    while serde_json::to_string(&stored)?.len() > max_record_bytes {
        let largest = stored
            .files
            .iter()
            .enumerate()
            .filter(|(_, file)| !file.data.is_empty())
            .max_by_key(|(_, file)| file.data.len())
            .map(|(position, _)| position);
        let Some(position) = largest else {
            break;
        };
        moved.push(move_out(&mut stored, position, chunk_size)?);
    }

    moved.sort_by_key(|m| m.position);
    Ok((stored, moved))
}

fn move_out(stored: &mut Record, position: usize, chunk_size: usize) -> Result<Externalized> {
    let record_id = stored.id;
    let file = &mut stored.files[position];
    let parent_id = parent_key(record_id, position, &file.id);
    let chunks = split(&parent_id, &file.data, chunk_size)?;
    file.data.clear();
    Ok(Externalized {
        position,
        parent_id,
        chunks,
    })
}

/// Refill the payloads at the `chunked` positions from `chunks_by_parent`.
pub fn internalize(
    record: &mut Record,
    chunked: &[usize],
    chunks_by_parent: &mut BTreeMap<String, Vec<Chunk>>,
) -> Result<()> {
    let record_id = record.id;
    for &position in chunked {
        let file: &mut Attachment = record.files.get_mut(position).ok_or_else(|| {
            JtError::ChunkIntegrity {
                attachment_id: format!("#{position}"),
                reason: format!("record {record_id} has no attachment at that position"),
            }
        })?;
        let parent_id = parent_key(record_id, position, &file.id);
        let chunks = chunks_by_parent.remove(&parent_id).unwrap_or_default();
        let attachment_id = file.id.clone();
        file.data = reassemble(&parent_id, chunks).map_err(|err| match err {
            JtError::ChunkIntegrity { reason, .. } => JtError::ChunkIntegrity {
                attachment_id,
                reason: format!("record {record_id}: {reason}"),
            },
            other => other,
        })?;
    }
    Ok(())
}

/// Group a flat list of chunks by parent attachment.
#[must_use]
pub fn group_by_parent(chunks: Vec<Chunk>) -> BTreeMap<String, Vec<Chunk>> {
    let mut grouped: BTreeMap<String, Vec<Chunk>> = BTreeMap::new();
    for chunk in chunks {
        grouped.entry(chunk.parent_id.clone()).or_default().push(chunk);
    }
    grouped
}
