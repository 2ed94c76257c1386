//! # chronicle-server
//!
//! Axum HTTP layer for the chronicle change-event tracker.
//!
//! Exposes the event engine as a small REST surface under `/api/v1/event`:
//! lookup, children, parent-chain trace, impact tree, filtered listing,
//! create (PUT), merge/update reconciliation (POST), and delete. Routing
//! and marshaling only — all semantics live in `chronicle-store`.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod routes;
pub mod server;

pub use config::{load_config, ChronicleConfig, ServerConfig, StorageConfig};
pub use error::ApiError;
pub use server::{router, AppState};
