//! # fieldcare core
//!
//! Domain model and sync engine for the fieldcare offline data-capture client.
//!
//! This crate contains the entity model and the pure operations on it:
//! - building entities from server resources and producing resources to send back
//!   ([`lifecycle`])
//! - resolving parent references and adding children to the collections their parents own
//!   ([`association`], [`merge`])
//! - applying whole sync pages to a store ([`sync`])
//! - domain behaviour: observations, form ordering and validation, concept ranges, ages
//!
//! **No storage or transport**: the device store sits behind [`store::EntityStore`]; fetching
//! pages from the server is the caller's concern.

pub mod age;
pub mod association;
pub mod collection;
pub mod config;
pub mod constants;
pub mod entities;
pub mod entity_ref;
pub mod error;
pub mod lifecycle;
pub mod mapper;
pub mod merge;
pub mod observation;
pub mod store;
pub mod sync;
pub mod validation;

pub use config::CoreConfig;
pub use error::{AssociationError, CoreError, CoreResult};
pub use sync::{apply_page, PageSummary};
