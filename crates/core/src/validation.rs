//! Field validation results.
//!
//! Validation never fails with an error: each check produces a [`ValidationResult`] carrying the
//! key of the field it checked and, on failure, a message key for the UI to translate.

use serde::{Deserialize, Serialize};

/// Message key for a required value that is missing.
pub const EMPTY_VALIDATION_MESSAGE: &str = "emptyValidationMessage";

/// Outcome of validating one field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub success: bool,
    pub form_identifier: String,
    pub message_key: Option<String>,
}

impl ValidationResult {
    pub fn successful(form_identifier: impl Into<String>) -> Self {
        Self {
            success: true,
            form_identifier: form_identifier.into(),
            message_key: None,
        }
    }

    pub fn failure(form_identifier: impl Into<String>, message_key: impl Into<String>) -> Self {
        Self {
            success: false,
            form_identifier: form_identifier.into(),
            message_key: Some(message_key.into()),
        }
    }

    /// Fails with [`EMPTY_VALIDATION_MESSAGE`] when `value` is absent or blank.
    pub fn for_empty(value: Option<&str>, form_identifier: impl Into<String>) -> Self {
        match value {
            Some(v) if !v.trim().is_empty() => Self::successful(form_identifier),
            _ => Self::failure(form_identifier, EMPTY_VALIDATION_MESSAGE),
        }
    }
}

/// True when every result succeeded.
pub fn all_successful(results: &[ValidationResult]) -> bool {
    results.iter().all(|r| r.success)
}
