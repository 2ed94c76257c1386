//! # chronicle-core
//!
//! Domain model for the chronicle change-event tracker.
//!
//! - **[`Event`]**: the public event record — reserved fields plus a
//!   free-form tag map
//! - **[`EventNode`]**: ephemeral tree node produced by graph traversal
//! - **[`EventId`]**: branded ID newtype, UUID v4 when generated
//! - **[`time`]**: millisecond-precision UTC timestamp handling
//! - **[`ValidationError`]**: domain constraint violations

#![deny(unsafe_code)]

pub mod errors;
pub mod event;
pub mod ids;
pub mod time;

pub use errors::ValidationError;
pub use event::{Event, EventNode, MAX_VALUE_CHARS, RESERVED_TAG_KEYS};
pub use ids::EventId;
