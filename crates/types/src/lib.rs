//! Shared discriminators for the fieldcare domain model.
//!
//! - [`EntityType`] names every independently persisted entity and carries the static
//!   association tables the sync engine consults (which parents a child refers to, and which
//!   collections a parent owns).
//! - [`ConceptDataType`] is the data type of a concept, used to choose how an observation value
//!   is interpreted.

mod datatype;
mod entity_type;

pub use datatype::ConceptDataType;
pub use entity_type::{ChildAssociation, EntityType};

/// Errors raised when parsing discriminator names.
#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    /// The name does not match any known entity type
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    /// The name does not match any known concept data type
    #[error("unknown concept data type: {0}")]
    UnknownDataType(String),
}

/// Type alias for Results that can fail with a [`TypesError`].
pub type TypesResult<T> = Result<T, TypesError>;
