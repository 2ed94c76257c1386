//! Table and index creation for the event collection.
//!
//! One `events` table holds the stored documents (JSON columns plus a
//! denormalized `time_sort` column — the first `time` element — for range
//! filters and ordering). The `event_tags` mirror table carries one row per
//! tag entry so superset queries hit an index instead of scanning JSON.
//!
//! `init_schema` is idempotent and runs in full at startup; there is no
//! versioned migration machinery.

use rusqlite::Connection;
use tracing::debug;

use crate::errors::Result;

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS events (
  id          TEXT PRIMARY KEY,
  tags        TEXT NOT NULL DEFAULT '[]',
  time        TEXT NOT NULL DEFAULT '[]',
  time_sort   TEXT,
  detail_urls TEXT,
  description TEXT,
  update_time TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS event_tags (
  event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
  tag      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_event_tags_tag   ON event_tags(tag);
CREATE INDEX IF NOT EXISTS idx_event_tags_event ON event_tags(event_id);
CREATE INDEX IF NOT EXISTS idx_events_time      ON events(time_sort);
CREATE INDEX IF NOT EXISTS idx_events_update    ON events(update_time);
";

/// Create the event collection tables and indexes if they don't exist.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    debug!("event collection schema ready");
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
