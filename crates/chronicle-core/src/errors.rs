//! Domain validation errors.

use thiserror::Error;

/// A record violated a domain constraint.
///
/// Raised before any persistence happens; an invalid record is never
/// partially written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The event id is empty.
    #[error("event id must not be empty")]
    EmptyId,

    /// A reserved string field or tag value exceeded the length cap.
    #[error("{field} must not exceed 100 characters")]
    ValueTooLong {
        /// Which field carried the oversized value.
        field: &'static str,
    },

    /// A tag key was the literal string `"None"`.
    #[error("tag keys must not be the literal string \"None\"")]
    NoneTagKey,

    /// A tag value was the literal string `"None"`.
    #[error("tag values must not be the literal string \"None\"")]
    NoneTagValue,

    /// A tag key collided with a reserved field name.
    #[error("tag key {0:?} is reserved and stored separately")]
    ReservedTagKey(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
