//! `SQLite` backend for the event collection.
//!
//! - **[`connection`]**: `r2d2` connection pool with WAL mode, foreign keys,
//!   and performance pragmas applied to every connection.
//! - **[`schema`]**: idempotent table and index creation for the single
//!   `events` document collection and its tag mirror.
//! - **[`event_repo`]**: stateless repository — each method takes
//!   `&Connection` and executes SQL. No shared mutable state.

pub mod connection;
pub mod event_repo;
pub mod schema;

pub use connection::{new_file, new_in_memory, ConnectionConfig, ConnectionPool, PooledConnection};
pub use event_repo::{EventRepo, QueryFilter};
pub use schema::init_schema;
