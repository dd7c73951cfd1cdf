//! Wire boundary for fieldcare sync.
//!
//! This crate provides **wire models** and **format helpers** for the JSON resources exchanged
//! with the server:
//! - [`Resource`], a keyed JSON object with typed accessors for scalars, dates and foreign keys
//! - [`ResourcePage`], one page of resources as delivered by the server (bare list or HAL
//!   envelope)
//! - date/timestamp parsing and ISO formatting
//!
//! This crate does no store lookups and knows nothing about entity semantics; it only reads and
//! writes the wire shape.

pub mod dates;
pub mod page;
pub mod resource;

pub use dates::{format_iso_date, format_iso_timestamp, parse_date, parse_timestamp};
pub use page::ResourcePage;
pub use resource::Resource;

/// Errors returned by the `fieldcare-wire` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid date in field {field}: '{value}'")]
    InvalidDate { field: String, value: String },

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] fieldcare_uuid::UuidError),
}

/// Type alias for Results that can fail with a [`WireError`].
pub type WireResult<T> = Result<T, WireError>;
