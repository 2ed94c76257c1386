//! Event collection repository — document-level SQL operations.
//!
//! Every write replaces the full document for an id; there are no partial
//! field updates. The `event_tags` mirror is rewritten on each write inside
//! the caller's transaction, so tag queries and document state never drift.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use chronicle_core::time;

use crate::doc::EventDoc;
use crate::errors::Result;

const COLUMNS: &str = "id, tags, time, detail_urls, description, update_time";

/// Filter and paging options for [`EventRepo::query`].
///
/// `use_update_time` selects the write-stamp column for range filters and
/// ordering instead of the event's own (start-derived) time. A negative
/// `limit` means unbounded.
#[derive(Debug)]
pub struct QueryFilter<'a> {
    /// Documents must carry every one of these tag entries.
    pub tags_all: Option<&'a [String]>,
    /// Inclusive lower bound on the selected time column.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the selected time column.
    pub to: Option<DateTime<Utc>>,
    /// Filter and sort on `update_time` instead of event time.
    pub use_update_time: bool,
    /// Maximum rows to return; negative for no limit.
    pub limit: i64,
    /// Rows to skip before returning.
    pub offset: i64,
}

impl Default for QueryFilter<'_> {
    fn default() -> Self {
        Self {
            tags_all: None,
            from: None,
            to: None,
            use_update_time: false,
            limit: -1,
            offset: 0,
        }
    }
}

/// Event repository — stateless, every method takes `&Connection`.
pub struct EventRepo;

impl EventRepo {
    /// Replace the document stored under `doc.id` in full.
    ///
    /// With `upsert`, inserts when absent; otherwise an absent id matches
    /// zero rows and the call is a silent no-op. Returns the number of rows
    /// written. The tag mirror is rewritten whenever the document is.
    pub fn replace(conn: &Connection, doc: &EventDoc, upsert: bool) -> Result<usize> {
        let tags_json = serde_json::to_string(&doc.tags)?;
        let time_json = serde_json::to_string(
            &doc.time.iter().map(time::to_rfc3339_millis).collect::<Vec<_>>(),
        )?;
        let time_sort = doc.time.first().map(time::to_rfc3339_millis);
        let detail_urls_json = doc
            .detail_urls
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let update_time = time::to_rfc3339_micros(&doc.update_time);

        let changed = if upsert {
            conn.execute(
                "INSERT INTO events (id, tags, time, time_sort, detail_urls, description, update_time)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                   tags = excluded.tags,
                   time = excluded.time,
                   time_sort = excluded.time_sort,
                   detail_urls = excluded.detail_urls,
                   description = excluded.description,
                   update_time = excluded.update_time",
                params![
                    doc.id,
                    tags_json,
                    time_json,
                    time_sort,
                    detail_urls_json,
                    doc.description,
                    update_time
                ],
            )?
        } else {
            conn.execute(
                "UPDATE events SET tags = ?2, time = ?3, time_sort = ?4,
                   detail_urls = ?5, description = ?6, update_time = ?7
                 WHERE id = ?1",
                params![
                    doc.id,
                    tags_json,
                    time_json,
                    time_sort,
                    detail_urls_json,
                    doc.description,
                    update_time
                ],
            )?
        };

        if changed > 0 {
            let _ = conn.execute(
                "DELETE FROM event_tags WHERE event_id = ?1",
                params![doc.id],
            )?;
            let mut stmt =
                conn.prepare("INSERT INTO event_tags (event_id, tag) VALUES (?1, ?2)")?;
            for tag in &doc.tags {
                let _ = stmt.execute(params![doc.id, tag])?;
            }
        }

        Ok(changed)
    }

    /// Fetch a single document by id.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<EventDoc>> {
        let raw = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM events WHERE id = ?1"),
                params![id],
                Self::map_row,
            )
            .optional()?;
        raw.map(doc_from_row).transpose()
    }

    /// Fetch all documents carrying the given tag entry, most recent event
    /// time first.
    pub fn get_by_tag(conn: &Connection, tag: &str) -> Result<Vec<EventDoc>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM events
             WHERE EXISTS (SELECT 1 FROM event_tags t
                           WHERE t.event_id = events.id AND t.tag = ?1)
             ORDER BY time_sort DESC"
        ))?;
        let rows = stmt
            .query_map(params![tag], Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(doc_from_row).collect()
    }

    /// Query documents by tag superset and time range, ordered by the
    /// selected time column descending.
    pub fn query(conn: &Connection, filter: &QueryFilter<'_>) -> Result<Vec<EventDoc>> {
        let time_col = if filter.use_update_time {
            "update_time"
        } else {
            "time_sort"
        };

        let mut conds: Vec<String> = Vec::new();
        let mut bind: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(tags) = filter.tags_all {
            // Duplicates in the requested list would break the COUNT match.
            let uniq: BTreeSet<&str> = tags.iter().map(String::as_str).collect();
            if !uniq.is_empty() {
                let start = bind.len() + 1;
                let placeholders: Vec<String> =
                    (start..start + uniq.len()).map(|i| format!("?{i}")).collect();
                conds.push(format!(
                    "(SELECT COUNT(DISTINCT t.tag) FROM event_tags t
                      WHERE t.event_id = events.id AND t.tag IN ({})) = {}",
                    placeholders.join(", "),
                    uniq.len()
                ));
                for tag in uniq {
                    bind.push(Box::new(tag.to_owned()));
                }
            }
        }
        if let Some(from) = filter.from {
            bind.push(Box::new(format_bound(&from, filter.use_update_time)));
            conds.push(format!("{time_col} >= ?{}", bind.len()));
        }
        if let Some(to) = filter.to {
            bind.push(Box::new(format_bound(&to, filter.use_update_time)));
            conds.push(format!("{time_col} < ?{}", bind.len()));
        }

        let mut sql = format!("SELECT {COLUMNS} FROM events");
        if !conds.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conds.join(" AND "));
        }
        bind.push(Box::new(filter.limit));
        bind.push(Box::new(filter.offset));
        sql.push_str(&format!(
            " ORDER BY {time_col} DESC LIMIT ?{} OFFSET ?{}",
            bind.len() - 1,
            bind.len()
        ));

        let mut stmt = conn.prepare(&sql)?;
        let bind_refs: Vec<&dyn rusqlite::types::ToSql> =
            bind.iter().map(Box::as_ref).collect();
        let rows = stmt
            .query_map(bind_refs.as_slice(), Self::map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(doc_from_row).collect()
    }

    /// Delete a single document. Returns the number of rows removed;
    /// the tag mirror cascades.
    pub fn delete(conn: &Connection, id: &str) -> Result<usize> {
        let changed = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
        Ok(changed)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            id: row.get(0)?,
            tags: row.get(1)?,
            time: row.get(2)?,
            detail_urls: row.get(3)?,
            description: row.get(4)?,
            update_time: row.get(5)?,
        })
    }
}

/// Raw database row before JSON columns are expanded.
struct RawRow {
    id: String,
    tags: String,
    time: String,
    detail_urls: Option<String>,
    description: Option<String>,
    update_time: String,
}

fn doc_from_row(raw: RawRow) -> Result<EventDoc> {
    let tags: Vec<String> = serde_json::from_str(&raw.tags)?;
    let time_strings: Vec<String> = serde_json::from_str(&raw.time)?;
    let time = time_strings
        .iter()
        .map(|s| time::parse_rfc3339(s))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let detail_urls = raw
        .detail_urls
        .as_deref()
        .map(serde_json::from_str)
        .transpose()?;
    Ok(EventDoc {
        id: raw.id,
        tags,
        time,
        detail_urls,
        description: raw.description,
        update_time: time::parse_rfc3339(&raw.update_time)?,
    })
}

/// Range bounds compare lexicographically against the stored column, so
/// each is formatted at that column's precision.
fn format_bound(bound: &DateTime<Utc>, use_update_time: bool) -> String {
    if use_update_time {
        time::to_rfc3339_micros(bound)
    } else {
        time::to_rfc3339_millis(&time::truncate_millis(*bound))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
