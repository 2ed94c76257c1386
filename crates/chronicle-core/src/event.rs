//! The public event record and the traversal tree node.
//!
//! An event tracks a change (a deployment, an operational action) with a
//! fixed set of reserved fields plus a free-form `tags` map for whatever
//! else the emitting system wants to attach:
//!
//! ```json
//! {
//!    "id": "333f1f77bcf86cd799439011",
//!    "source_id": "222f1f77bcf86cd799439011",
//!    "parent_id": "111f1f77bcf86cd799439011",
//!    "start_time": "2024-05-12T10:25:00.000Z",
//!    "end_time": "2024-05-12T10:26:00.000Z",
//!    "description": "web tier deployment",
//!    "detail_urls": {"graphite": "http://graphite"},
//!    "tags": {
//!       "type": ["deploy/deploy_all"],
//!       "author": ["someone@example.com"],
//!       "environment": ["candidate"],
//!       "status": ["success"]
//!    }
//! }
//! ```
//!
//! `source_id` names the ultimate origin of a chain, `parent_id` the
//! immediate predecessor — together they make events form implicit trees.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::EventId;
use crate::time;

/// Length cap for ids, reserved string fields, and tag values.
pub const MAX_VALUE_CHARS: usize = 100;

/// Tag keys that map to reserved fields and may never appear in `tags`.
pub const RESERVED_TAG_KEYS: [&str; 2] = ["source_id", "parent_id"];

/// A change event.
///
/// `id` is generated when absent; both timestamps default to "now" and are
/// always held at millisecond precision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier, generated (UUID v4) if not supplied.
    #[serde(default)]
    pub id: EventId,

    /// Id of the ultimate origin event of this chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,

    /// Id of the immediate predecessor event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// When the change began. Millisecond precision, UTC.
    #[serde(with = "time::utc_millis", default = "time::now_millis")]
    pub start_time: DateTime<Utc>,

    /// When the change finished. Millisecond precision, UTC.
    #[serde(with = "time::utc_millis", default = "time::now_millis")]
    pub end_time: DateTime<Utc>,

    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Label → URL links to dashboards, logs, etc.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub detail_urls: BTreeMap<String, String>,

    /// Free-form attributes: key → set of string values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, Vec<String>>,
}

impl Event {
    /// A fresh event: new id, both timestamps "now", no tags.
    #[must_use]
    pub fn new() -> Self {
        let now = time::now_millis();
        Self {
            id: EventId::new(),
            source_id: None,
            parent_id: None,
            start_time: now,
            end_time: now,
            description: None,
            detail_urls: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Check every domain constraint.
    ///
    /// - id non-empty, ≤ 100 chars
    /// - `source_id` / `parent_id` ≤ 100 chars
    /// - tag keys never `"None"` and never a reserved field name
    /// - tag values never `"None"`, ≤ 100 chars
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        check_len("id", self.id.as_str())?;
        if let Some(source_id) = &self.source_id {
            check_len("source_id", source_id)?;
        }
        if let Some(parent_id) = &self.parent_id {
            check_len("parent_id", parent_id)?;
        }
        for (key, values) in &self.tags {
            if key == "None" {
                return Err(ValidationError::NoneTagKey);
            }
            if RESERVED_TAG_KEYS.contains(&key.as_str()) {
                return Err(ValidationError::ReservedTagKey(key.clone()));
            }
            for value in values {
                if value == "None" {
                    return Err(ValidationError::NoneTagValue);
                }
                check_len("tag value", value)?;
            }
        }
        Ok(())
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

fn check_len(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > MAX_VALUE_CHARS {
        return Err(ValidationError::ValueTooLong { field });
    }
    Ok(())
}

/// A node in a reconstructed descendant tree.
///
/// Built fresh per traversal and owned entirely by the requesting caller;
/// nothing here is persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventNode {
    /// The event at this node.
    pub event: Event,
    /// Direct children, in discovery order. Empty for leaves.
    #[serde(default)]
    pub children: Vec<EventNode>,
}

impl EventNode {
    /// A childless node wrapping `event`.
    #[must_use]
    pub fn new(event: Event) -> Self {
        Self {
            event,
            children: Vec::new(),
        }
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
