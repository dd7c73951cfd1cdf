//! Entity identifier utilities.
//!
//! Every persisted fieldcare entity carries a `uuid` that is unique within its entity type and
//! immutable once created.
//!
//! Locally originated entities (drafts, new registrations, concept answers added on device) get a
//! *canonical* identifier: **36 lowercase hexadecimal characters with hyphens** in the
//! `8-4-4-4-12` layout, exactly what `Uuid::new_v4().hyphenated().to_string()` produces.
//!
//! Identifiers that arrive from the server are kept verbatim. The server is the authority for
//! those values, so the client must never rewrite them; it only requires them to be non-empty.
//!
//! This crate provides:
//! - [`EntityUuid`], a wrapper that keeps the identifier text and knows whether it is canonical.
//! - Strict parsing ([`EntityUuid::parse`]) for locally supplied identifiers and lenient
//!   acceptance ([`EntityUuid::from_wire`]) for wire identifiers.
//!
//! ## Canonical form
//! - Length: 36
//! - Hyphens at byte offsets 8, 13, 18 and 23
//! - All other characters: `0-9` and `a-f`
//! - Example: `550e8400-e29b-41d4-a716-446655440000`

mod service;

pub use service::{EntityUuid, Uuid};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum UuidError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type UuidResult<T> = Result<T, UuidError>;
