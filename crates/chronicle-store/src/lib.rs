//! # chronicle-store
//!
//! Event persistence and graph-reconstruction engine with a `SQLite`
//! backend.
//!
//! - **[`codec`]**: bidirectional mapping between the public record and the
//!   flat stored document (`"key:value"` tag list + time array)
//! - **[`store`]**: [`EventStore`] — save, lookup, replace, tag/time
//!   queries with pagination, delete
//! - **[`graph`]**: parent-chain [`graph::trace`] and descendant
//!   [`graph::tree`] reconstruction with cycle and depth protection
//! - **[`reconcile`]**: [`reconcile::merge`] and [`reconcile::update`]
//!   conflict-resolution policies
//! - **[`sqlite`]**: `rusqlite` facade — connection pool, schema, and the
//!   document repository

#![deny(unsafe_code)]

pub mod codec;
pub mod doc;
pub mod errors;
pub mod graph;
pub mod reconcile;
pub mod sqlite;
pub mod store;

pub use doc::EventDoc;
pub use errors::{Result, StoreError};
pub use graph::MAX_TRACE_DEPTH;
pub use sqlite::{init_schema, ConnectionConfig, ConnectionPool};
pub use store::{EventCursor, EventStore, FindQuery};
