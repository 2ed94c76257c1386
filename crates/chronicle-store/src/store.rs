//! High-level `EventStore` API.
//!
//! Owns the connection pool and is the only consumer of the codec: records
//! are encoded at the write boundary and decoded at the read boundary.
//! Every write replaces the stored document in full — there are no partial
//! update semantics at this layer.

use chrono::{DateTime, Utc};
use tracing::debug;

use chronicle_core::Event;

use crate::codec;
use crate::doc::EventDoc;
use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::sqlite::event_repo::{EventRepo, QueryFilter};
use crate::sqlite::schema::init_schema;

/// Query parameters for [`EventStore::find`].
#[derive(Clone, Debug)]
pub struct FindQuery {
    /// Require the stored tag list to contain all of these entries.
    pub tags: Option<Vec<String>>,
    /// Inclusive lower bound on the selected time field.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the selected time field.
    pub to: Option<DateTime<Utc>>,
    /// Select the write stamp instead of the event's own time.
    pub use_update_time: bool,
    /// Page size; `0` means unbounded. Negative is rejected.
    pub count: i64,
    /// 1-based page number. Values below 1 are rejected.
    pub page: i64,
}

impl Default for FindQuery {
    fn default() -> Self {
        Self {
            tags: None,
            from: None,
            to: None,
            use_update_time: false,
            count: 100,
            page: 1,
        }
    }
}

/// A forward-only sequence of decoded events.
///
/// Bound to the single query call that produced it: rows were fetched by
/// that call, decoding happens lazily as the cursor is consumed. To read
/// the sequence again, issue the query again — cursors are not reusable
/// handles.
pub struct EventCursor {
    docs: std::vec::IntoIter<EventDoc>,
}

impl EventCursor {
    fn new(docs: Vec<EventDoc>) -> Self {
        Self {
            docs: docs.into_iter(),
        }
    }

    /// Decode every remaining document, failing on the first bad one.
    pub fn collect_events(self) -> Result<Vec<Event>> {
        self.collect()
    }
}

impl Iterator for EventCursor {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        self.docs.next().map(|doc| codec::decode(&doc))
    }
}

/// Event persistence over a pooled `SQLite` collection.
pub struct EventStore {
    pool: ConnectionPool,
}

impl EventStore {
    /// Wrap an existing connection pool. The schema must already exist.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Open a file-backed store, creating the schema if needed.
    pub fn open(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = connection::new_file(path, config)?;
        let conn = pool.get()?;
        init_schema(&conn)?;
        drop(conn);
        Ok(Self::new(pool))
    }

    /// An in-memory store with the schema initialized (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = connection::new_in_memory()?;
        let conn = pool.get()?;
        init_schema(&conn)?;
        drop(conn);
        Ok(Self::new(pool))
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    /// Encode and upsert-replace the record under its own id.
    pub fn save(&self, event: &Event) -> Result<usize> {
        let doc = codec::encode(event);
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let written = EventRepo::replace(&tx, &doc, true)?;
        tx.commit()?;
        debug!(id = %doc.id, "event saved");
        Ok(written)
    }

    /// Fetch and decode a single event.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] when no document exists for `id`.
    pub fn find_by_id(&self, id: &str) -> Result<Event> {
        let conn = self.conn()?;
        let doc = EventRepo::get_by_id(&conn, id)?
            .ok_or_else(|| StoreError::NotFound(id.to_owned()))?;
        codec::decode(&doc)
    }

    /// Encode and replace the document stored under `id`.
    ///
    /// With `insert`, performs an upsert; otherwise an absent id is a
    /// silent no-op at this layer — callers decide whether that is an
    /// error. Returns the number of rows written.
    pub fn update_by_id(&self, id: &str, event: &Event, insert: bool) -> Result<usize> {
        let mut doc = codec::encode(event);
        doc.id = id.to_owned();
        let conn = self.conn()?;
        let tx = conn.unchecked_transaction()?;
        let written = EventRepo::replace(&tx, &doc, insert)?;
        tx.commit()?;
        debug!(id, written, "event updated");
        Ok(written)
    }

    /// All events whose tag list contains `"parent_id:<id>"`, most recent
    /// event time first. Each call issues a fresh query.
    pub fn find_by_parent_id(&self, id: &str) -> Result<EventCursor> {
        let conn = self.conn()?;
        let docs = EventRepo::get_by_tag(&conn, &format!("parent_id:{id}"))?;
        Ok(EventCursor::new(docs))
    }

    /// Query events, ordered by the selected time field descending.
    ///
    /// # Errors
    ///
    /// [`StoreError::InvalidArgument`] for a negative `count` or a `page`
    /// below 1.
    pub fn find(&self, query: &FindQuery) -> Result<EventCursor> {
        if query.count < 0 {
            return Err(StoreError::InvalidArgument(
                "count must be greater than or equal to zero".into(),
            ));
        }
        if query.page < 1 {
            return Err(StoreError::InvalidArgument(
                "page must be greater than or equal to one".into(),
            ));
        }

        let filter = QueryFilter {
            tags_all: query.tags.as_deref(),
            from: query.from,
            to: query.to,
            use_update_time: query.use_update_time,
            // count 0 means unbounded; offset still pages by count.
            limit: if query.count == 0 { -1 } else { query.count },
            offset: (query.page - 1).saturating_mul(query.count),
        };

        let conn = self.conn()?;
        let docs = EventRepo::query(&conn, &filter)?;
        Ok(EventCursor::new(docs))
    }

    /// Delete by id. True iff exactly one document was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let removed = EventRepo::delete(&conn, id)?;
        debug!(id, removed, "event delete");
        Ok(removed == 1)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
