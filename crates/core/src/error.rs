use fieldcare_types::EntityType;
use fieldcare_wire::WireError;

/// A child resource names a parent that is not (yet) in the store.
///
/// The identity of the failure is the `(child_type, parent_type)` pair; [`AssociationError::code`]
/// renders it as `"<Child>-<Parent>-Association"`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{child_type}{{uuid='{child_uuid}'}} is unable to find {parent_type}{{uuid='{}'}}",
    .parent_uuid.as_deref().unwrap_or("null")
)]
pub struct AssociationError {
    pub child_type: EntityType,
    pub parent_type: EntityType,
    pub child_uuid: String,
    /// `None` when the child resource carries no value for the foreign key.
    pub parent_uuid: Option<String>,
}

impl AssociationError {
    pub fn new(
        child_type: EntityType,
        parent_type: EntityType,
        child_uuid: impl Into<String>,
        parent_uuid: Option<String>,
    ) -> Self {
        Self {
            child_type,
            parent_type,
            child_uuid: child_uuid.into(),
            parent_uuid,
        }
    }

    /// Stable error code, e.g. `"ProgramEnrolment-Individual-Association"`.
    pub fn code(&self) -> String {
        format!("{}-{}-Association", self.child_type, self.parent_type)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Association(#[from] AssociationError),
    #[error("{child} not supported by {parent}")]
    UnsupportedChild {
        child: EntityType,
        parent: EntityType,
    },
    #[error("{0} records are not delivered by sync")]
    NotSyncable(EntityType),
    #[error("failed to map {entity_type} record at {path}: {message}")]
    Mapping {
        entity_type: EntityType,
        path: String,
        message: String,
    },
    #[error("failed to serialize {entity_type}: {source}")]
    Serialization {
        entity_type: EntityType,
        #[source]
        source: serde_json::Error,
    },
    #[error("wire error: {0}")]
    Wire(#[from] WireError),
    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error(
        "forward reference chain for {entity_type}{{uuid='{uuid}'}} exceeds depth {depth}"
    )]
    ForwardReferenceDepth {
        entity_type: EntityType,
        uuid: String,
        depth: usize,
    },
}

impl From<fieldcare_uuid::UuidError> for CoreError {
    fn from(err: fieldcare_uuid::UuidError) -> Self {
        CoreError::Wire(WireError::InvalidUuid(err))
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
