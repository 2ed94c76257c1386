//! The persisted document shape.
//!
//! This is the raw storage representation — not the public API type.
//! Conversion to and from [`chronicle_core::Event`] happens exclusively in
//! the [`crate::codec`] module; nothing else touches both forms.

use chrono::{DateTime, Utc};

/// One stored document, a denormalized encoding of a single event record.
///
/// `tags` is a flat list of `"key:value"` strings, including synthesized
/// `"source_id:<v>"` / `"parent_id:<v>"` entries for the reserved id fields.
/// `time` holds `[start, end]` (one element means start == end, empty means
/// unset). `update_time` is the server-assigned stamp of the last write —
/// it has no counterpart on the public record.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDoc {
    /// Document key (the event record's id).
    pub id: String,
    /// Flat `"key:value"` tag list.
    pub tags: Vec<String>,
    /// Zero, one, or two timestamps: `[start, end]`.
    pub time: Vec<DateTime<Utc>>,
    /// Label → URL links, when present.
    pub detail_urls: Option<std::collections::BTreeMap<String, String>>,
    /// Free-text description, when present.
    pub description: Option<String>,
    /// When this document was last written. Full precision.
    pub update_time: DateTime<Utc>,
}
