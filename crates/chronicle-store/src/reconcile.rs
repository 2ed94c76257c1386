//! Reconciliation of an incoming event against a stored one.
//!
//! Two policies, both pure — they build and return a new record rather than
//! mutating either input, and a conflict means nothing gets written:
//!
//! - [`merge`] combines field-by-field: earliest start, latest end,
//!   concatenated descriptions, overlaid detail URLs, unioned tags.
//!   Reserved ids must agree.
//! - [`update`] is last-write-wins: every field set on the incoming record
//!   overwrites the stored one wholesale.

use chronicle_core::Event;

use crate::errors::{Result, StoreError};

/// Merge `incoming` into `existing`, returning the combined record.
///
/// Field policies:
/// - `start_time` → the earlier of the two; `end_time` → the later.
/// - `description` → existing trimmed + `"\n"` + incoming trimmed, skipped
///   when the incoming text is empty or already contained in the existing
///   text.
/// - `detail_urls` → key-wise overlay, incoming wins per key.
/// - `tags` → per-key union: whole list adopted for new keys, values not
///   already present appended in order.
/// - `id` / `source_id` / `parent_id` → must be equal when both are set.
///
/// # Errors
///
/// [`StoreError::MergeConflict`] when a reserved id field differs between
/// the two records.
pub fn merge(existing: &Event, incoming: &Event) -> Result<Event> {
    if existing.id != incoming.id {
        return Err(StoreError::MergeConflict("id".into()));
    }

    let mut merged = existing.clone();
    merged.source_id = merge_reserved_id(
        "source_id",
        existing.source_id.clone(),
        incoming.source_id.clone(),
    )?;
    merged.parent_id = merge_reserved_id(
        "parent_id",
        existing.parent_id.clone(),
        incoming.parent_id.clone(),
    )?;

    merged.start_time = existing.start_time.min(incoming.start_time);
    merged.end_time = existing.end_time.max(incoming.end_time);

    merged.description = match (&existing.description, &incoming.description) {
        (None, Some(incoming_text)) => Some(incoming_text.clone()),
        (Some(existing_text), Some(incoming_text)) => {
            let head = existing_text.trim();
            let tail = incoming_text.trim();
            if !tail.is_empty() && !head.contains(tail) {
                Some(format!("{head}\n{tail}"))
            } else {
                Some(existing_text.clone())
            }
        }
        (existing_description, None) => existing_description.clone(),
    };

    for (label, url) in &incoming.detail_urls {
        let _ = merged.detail_urls.insert(label.clone(), url.clone());
    }

    for (key, values) in &incoming.tags {
        match merged.tags.get_mut(key) {
            None => {
                let _ = merged.tags.insert(key.clone(), values.clone());
            }
            Some(existing_values) => {
                for value in values {
                    if !existing_values.contains(value) {
                        existing_values.push(value.clone());
                    }
                }
            }
        }
    }

    Ok(merged)
}

fn merge_reserved_id(
    field: &'static str,
    existing: Option<String>,
    incoming: Option<String>,
) -> Result<Option<String>> {
    match (existing, incoming) {
        (None, incoming) => Ok(incoming),
        (existing, None) => Ok(existing),
        (Some(a), Some(b)) if a == b => Ok(Some(a)),
        (Some(_), Some(_)) => Err(StoreError::MergeConflict(field.into())),
    }
}

/// Overwrite `existing` with every field set on `incoming`.
///
/// No sub-merging: lists and maps are replaced, not unioned — `tags` is
/// always replaced since the map is always present on a record. The
/// incoming record is re-validated before anything is applied.
pub fn update(existing: &Event, incoming: &Event) -> Result<Event> {
    incoming.validate()?;

    let mut updated = existing.clone();
    updated.id = incoming.id.clone();
    if incoming.source_id.is_some() {
        updated.source_id = incoming.source_id.clone();
    }
    if incoming.parent_id.is_some() {
        updated.parent_id = incoming.parent_id.clone();
    }
    updated.start_time = incoming.start_time;
    updated.end_time = incoming.end_time;
    if incoming.description.is_some() {
        updated.description = incoming.description.clone();
    }
    if !incoming.detail_urls.is_empty() {
        updated.detail_urls = incoming.detail_urls.clone();
    }
    updated.tags = incoming.tags.clone();

    Ok(updated)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
