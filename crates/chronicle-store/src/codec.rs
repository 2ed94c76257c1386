//! Bidirectional mapping between the public event record and the stored
//! document.
//!
//! The flat `"key:value"` tag list is a denormalization: free-form
//! attributes and the reserved `source_id`/`parent_id` fields all share one
//! generic tag index. This module is the only place the two forms meet —
//! for valid domain values, `decode(encode(event))` reproduces every field
//! of the record (`update_time` exists only on the document).

use std::collections::BTreeMap;

use chrono::Utc;

use chronicle_core::{time, Event, EventId};

use crate::doc::EventDoc;
use crate::errors::{Result, StoreError};

/// Transform the public record into the stored document.
///
/// Free-form tags flatten to `"key:value"` entries (map order, so emission
/// is deterministic for a given record); non-empty reserved id fields are
/// appended after them as synthesized entries. `update_time` is stamped
/// fresh on every encode — every write carries a new write time.
#[must_use]
pub fn encode(event: &Event) -> EventDoc {
    let mut tags = Vec::new();
    for (key, values) in &event.tags {
        for value in values {
            tags.push(format!("{key}:{value}"));
        }
    }
    for (key, value) in [
        ("source_id", event.source_id.as_deref()),
        ("parent_id", event.parent_id.as_deref()),
    ] {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            tags.push(format!("{key}:{value}"));
        }
    }

    EventDoc {
        id: event.id.as_str().to_owned(),
        tags,
        time: vec![event.start_time, event.end_time],
        detail_urls: if event.detail_urls.is_empty() {
            None
        } else {
            Some(event.detail_urls.clone())
        },
        description: event.description.clone(),
        update_time: Utc::now(),
    }
}

/// Transform a stored document back into the public record.
///
/// Each tag entry splits on the **first** colon. Reserved keys are promoted
/// to their fields — the last occurrence wins if an entry is duplicated.
/// Free-form values keep their encounter order and are not deduplicated.
///
/// # Errors
///
/// [`StoreError::InvalidTagFormat`] for a tag entry with no colon (key and
/// value cannot be recovered, so dropping it would silently corrupt data);
/// [`StoreError::InvalidTimeArray`] for a time array longer than two.
pub fn decode(doc: &EventDoc) -> Result<Event> {
    let mut event = Event::new();
    event.id = EventId::from(doc.id.as_str());

    match doc.time[..] {
        [] => {}
        [point] => {
            event.start_time = time::truncate_millis(point);
            event.end_time = event.start_time;
        }
        [start, end] => {
            event.start_time = time::truncate_millis(start);
            event.end_time = time::truncate_millis(end);
        }
        _ => return Err(StoreError::InvalidTimeArray(doc.time.len())),
    }

    let mut tags: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in &doc.tags {
        let (key, value) = entry
            .split_once(':')
            .ok_or_else(|| StoreError::InvalidTagFormat(entry.clone()))?;
        match key {
            "source_id" => event.source_id = Some(value.to_owned()),
            "parent_id" => event.parent_id = Some(value.to_owned()),
            _ => tags.entry(key.to_owned()).or_default().push(value.to_owned()),
        }
    }
    event.tags = tags;

    event.detail_urls = doc.detail_urls.clone().unwrap_or_default();
    event.description = doc.description.clone();

    Ok(event)
}

/// Decode a document that may be absent.
///
/// A missing document decodes to a default record (fresh id, "now"
/// timestamps, no tags) — decoding never fails on missing input.
pub fn decode_optional(doc: Option<&EventDoc>) -> Result<Event> {
    match doc {
        Some(doc) => decode(doc),
        None => Ok(Event::new()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};

    fn at(secs_offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 12, 10, 25, 0).unwrap()
            + chrono::Duration::seconds(secs_offset)
    }

    fn sample_event() -> Event {
        let mut event = Event::new();
        event.id = EventId::from("evt-1");
        event.source_id = Some("src-1".into());
        event.parent_id = Some("parent-1".into());
        event.start_time = at(0);
        event.end_time = at(60);
        event.description = Some("web tier deployment".into());
        let _ = event
            .detail_urls
            .insert("graphite".into(), "http://graphite".into());
        let _ = event.tags.insert(
            "author".into(),
            vec!["a@example.com".into(), "b@example.com".into()],
        );
        let _ = event.tags.insert("status".into(), vec!["success".into()]);
        event
    }

    fn empty_doc(id: &str) -> EventDoc {
        EventDoc {
            id: id.to_owned(),
            tags: Vec::new(),
            time: Vec::new(),
            detail_urls: None,
            description: None,
            update_time: Utc::now(),
        }
    }

    #[test]
    fn encode_flattens_tags_and_appends_reserved_ids() {
        let doc = encode(&sample_event());
        assert_eq!(
            doc.tags,
            vec![
                "author:a@example.com",
                "author:b@example.com",
                "status:success",
                "source_id:src-1",
                "parent_id:parent-1",
            ]
        );
    }

    #[test]
    fn encode_emits_reserved_ids_exactly_once() {
        let doc = encode(&sample_event());
        let parent_entries = doc
            .tags
            .iter()
            .filter(|t| t.starts_with("parent_id:"))
            .count();
        assert_eq!(parent_entries, 1);
    }

    #[test]
    fn encode_skips_empty_reserved_ids() {
        let mut event = Event::new();
        event.source_id = Some(String::new());
        let doc = encode(&event);
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn encode_emits_both_timestamps() {
        let event = sample_event();
        let doc = encode(&event);
        assert_eq!(doc.time, vec![event.start_time, event.end_time]);
    }

    #[test]
    fn encode_stamps_a_fresh_update_time() {
        let before = Utc::now();
        let doc = encode(&sample_event());
        assert!(doc.update_time >= before);
    }

    #[test]
    fn encode_omits_unset_optionals() {
        let doc = encode(&Event::new());
        assert!(doc.detail_urls.is_none());
        assert!(doc.description.is_none());
    }

    #[test]
    fn round_trip_reproduces_every_field() {
        let event = sample_event();
        let back = decode(&encode(&event)).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn decode_splits_on_first_colon_only() {
        let mut doc = empty_doc("evt-1");
        doc.tags = vec!["link:http://host:8080/path".into()];
        let event = decode(&doc).unwrap();
        assert_eq!(event.tags["link"], vec!["http://host:8080/path"]);
    }

    #[test]
    fn decode_promotes_reserved_keys() {
        let mut doc = empty_doc("evt-1");
        doc.tags = vec!["source_id:src-1".into(), "parent_id:parent-1".into()];
        let event = decode(&doc).unwrap();
        assert_eq!(event.source_id.as_deref(), Some("src-1"));
        assert_eq!(event.parent_id.as_deref(), Some("parent-1"));
        assert!(event.tags.is_empty());
    }

    #[test]
    fn decode_duplicate_reserved_entry_last_wins() {
        let mut doc = empty_doc("evt-1");
        doc.tags = vec!["parent_id:first".into(), "parent_id:second".into()];
        let event = decode(&doc).unwrap();
        assert_eq!(event.parent_id.as_deref(), Some("second"));
    }

    #[test]
    fn decode_keeps_duplicate_values_and_order() {
        let mut doc = empty_doc("evt-1");
        doc.tags = vec!["status:retry".into(), "status:retry".into(), "status:ok".into()];
        let event = decode(&doc).unwrap();
        assert_eq!(event.tags["status"], vec!["retry", "retry", "ok"]);
    }

    #[test]
    fn decode_rejects_tag_without_colon() {
        let mut doc = empty_doc("evt-1");
        doc.tags = vec!["no-separator".into()];
        assert!(matches!(
            decode(&doc),
            Err(StoreError::InvalidTagFormat(t)) if t == "no-separator"
        ));
    }

    #[test]
    fn decode_empty_time_array_leaves_defaults() {
        let before = time::now_millis();
        let event = decode(&empty_doc("evt-1")).unwrap();
        assert!(event.start_time >= before);
        assert_eq!(event.id.as_str(), "evt-1");
    }

    #[test]
    fn decode_single_time_collapses_to_point_event() {
        let mut doc = empty_doc("evt-1");
        doc.time = vec![at(0)];
        let event = decode(&doc).unwrap();
        assert_eq!(event.start_time, at(0));
        assert_eq!(event.end_time, at(0));
    }

    #[test]
    fn decode_rejects_three_timestamps() {
        let mut doc = empty_doc("evt-1");
        doc.time = vec![at(0), at(1), at(2)];
        assert!(matches!(decode(&doc), Err(StoreError::InvalidTimeArray(3))));
    }

    #[test]
    fn decode_missing_document_yields_default_record() {
        let event = decode_optional(None).unwrap();
        assert!(!event.id.as_str().is_empty());
        assert!(event.tags.is_empty());
    }

    #[test]
    fn decode_present_document_passes_through() {
        let event = sample_event();
        let doc = encode(&event);
        assert_eq!(decode_optional(Some(&doc)).unwrap(), event);
    }
}
