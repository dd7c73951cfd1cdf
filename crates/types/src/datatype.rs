use crate::TypesError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Data type of a concept.
///
/// The wire and store spelling is the variant name (`"Coded"`, `"DateTime"`, `"NA"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptDataType {
    Date,
    DateTime,
    Time,
    Duration,
    Coded,
    Numeric,
    Boolean,
    Text,
    Notes,
    NA,
    Image,
    Video,
    Audio,
    Id,
    Location,
    Subject,
    PhoneNumber,
    GroupAffiliation,
    QuestionGroup,
}

impl ConceptDataType {
    /// Every data type, in declaration order.
    pub const ALL: [ConceptDataType; 19] = [
        ConceptDataType::Date,
        ConceptDataType::DateTime,
        ConceptDataType::Time,
        ConceptDataType::Duration,
        ConceptDataType::Coded,
        ConceptDataType::Numeric,
        ConceptDataType::Boolean,
        ConceptDataType::Text,
        ConceptDataType::Notes,
        ConceptDataType::NA,
        ConceptDataType::Image,
        ConceptDataType::Video,
        ConceptDataType::Audio,
        ConceptDataType::Id,
        ConceptDataType::Location,
        ConceptDataType::Subject,
        ConceptDataType::PhoneNumber,
        ConceptDataType::GroupAffiliation,
        ConceptDataType::QuestionGroup,
    ];

    /// Returns the wire name of this data type.
    pub fn as_str(self) -> &'static str {
        match self {
            ConceptDataType::Date => "Date",
            ConceptDataType::DateTime => "DateTime",
            ConceptDataType::Time => "Time",
            ConceptDataType::Duration => "Duration",
            ConceptDataType::Coded => "Coded",
            ConceptDataType::Numeric => "Numeric",
            ConceptDataType::Boolean => "Boolean",
            ConceptDataType::Text => "Text",
            ConceptDataType::Notes => "Notes",
            ConceptDataType::NA => "NA",
            ConceptDataType::Image => "Image",
            ConceptDataType::Video => "Video",
            ConceptDataType::Audio => "Audio",
            ConceptDataType::Id => "Id",
            ConceptDataType::Location => "Location",
            ConceptDataType::Subject => "Subject",
            ConceptDataType::PhoneNumber => "PhoneNumber",
            ConceptDataType::GroupAffiliation => "GroupAffiliation",
            ConceptDataType::QuestionGroup => "QuestionGroup",
        }
    }

    /// Coded and Subject concepts both hold answer uuids.
    pub fn is_coded_like(self) -> bool {
        matches!(self, ConceptDataType::Coded | ConceptDataType::Subject)
    }

    pub fn is_media(self) -> bool {
        matches!(
            self,
            ConceptDataType::Image | ConceptDataType::Video | ConceptDataType::Audio
        )
    }

    pub fn is_question_group(self) -> bool {
        self == ConceptDataType::QuestionGroup
    }
}

impl fmt::Display for ConceptDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConceptDataType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConceptDataType::ALL
            .iter()
            .copied()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| TypesError::UnknownDataType(s.to_owned()))
    }
}
