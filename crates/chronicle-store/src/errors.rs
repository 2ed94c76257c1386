//! Error types for the event store subsystem.
//!
//! [`StoreError`] is the primary error type returned by all store, graph,
//! and reconciliation operations. Driver errors propagate unchanged via
//! `#[from]` — this layer applies no retry policy of its own.

use thiserror::Error;

/// Errors that can occur during event store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A stored timestamp failed to parse.
    #[error("timestamp parse error: {0}")]
    Timestamp(#[from] chrono::ParseError),

    /// Lookup by id found no document.
    #[error("event not found: {0}")]
    NotFound(String),

    /// A query argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A stored tag entry has no `:` separator — key and value cannot
    /// be recovered, so the document is rejected rather than corrupted.
    #[error("malformed tag entry (no ':' separator): {0:?}")]
    InvalidTagFormat(String),

    /// A stored time array holds more than two entries.
    #[error("time array holds {0} entries, at most 2 allowed")]
    InvalidTimeArray(usize),

    /// Reserved fields clashed during a merge. Nothing is written.
    #[error("merge not possible: reserved keys have clashing values ({0})")]
    MergeConflict(String),

    /// The record violated a domain constraint.
    #[error("invalid event: {0}")]
    Validation(#[from] chronicle_core::ValidationError),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_display() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn not_found_display() {
        let err = StoreError::NotFound("evt-456".into());
        assert_eq!(err.to_string(), "event not found: evt-456");
    }

    #[test]
    fn invalid_argument_display() {
        let err = StoreError::InvalidArgument("count must be >= 0".into());
        assert_eq!(err.to_string(), "invalid argument: count must be >= 0");
    }

    #[test]
    fn invalid_tag_format_display() {
        let err = StoreError::InvalidTagFormat("no-separator".into());
        assert!(err.to_string().contains("no-separator"));
    }

    #[test]
    fn invalid_time_array_display() {
        let err = StoreError::InvalidTimeArray(3);
        assert_eq!(err.to_string(), "time array holds 3 entries, at most 2 allowed");
    }

    #[test]
    fn merge_conflict_display() {
        let err = StoreError::MergeConflict("source_id".into());
        assert!(err.to_string().contains("reserved keys have clashing values"));
    }

    #[test]
    fn from_rusqlite_error() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn from_serde_error() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: StoreError = serde_err.into();
        assert!(matches!(err, StoreError::Serde(_)));
    }

    #[test]
    fn from_validation_error() {
        let err: StoreError = chronicle_core::ValidationError::EmptyId.into();
        assert!(matches!(err, StoreError::Validation(_)));
    }
}
