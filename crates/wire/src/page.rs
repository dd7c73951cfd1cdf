//! Pages of resources.
//!
//! The server delivers resources in pages. Two shapes are accepted:
//! - a bare JSON array of resources
//! - a HAL envelope: `{"_embedded": {"<name>": [...]}, "page": {...}, "_links": {...}}`
//!
//! An envelope with no `_embedded` member is an empty page (Spring HAL omits the member when
//! there is nothing to embed).

use crate::resource::Resource;
use crate::{WireError, WireResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// One page of resources, in delivery order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourcePage {
    resources: Vec<Resource>,
}

impl ResourcePage {
    pub fn new(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    /// Parse a page from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidJson`] if the text is not JSON, or [`WireError::Translation`]
    /// (with the path of the offending element) if it does not have a page shape.
    pub fn parse(json_text: &str) -> WireResult<Self> {
        let value: Value = serde_json::from_str(json_text)?;
        Self::from_value(value)
    }

    /// Interpret an already-parsed JSON value as a page.
    ///
    /// This uses `serde_path_to_error` so that a malformed element is reported with its
    /// position (for example `_embedded.individual[3]`).
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Translation`] if the value is neither an array of objects nor a HAL
    /// envelope.
    pub fn from_value(value: Value) -> WireResult<Self> {
        match value {
            Value::Array(_) => {
                let resources: Vec<Resource> = deserialize_with_path(value)?;
                Ok(Self { resources })
            }
            Value::Object(_) => {
                let wire: HalPageWire = deserialize_with_path(value)?;
                // Embedded lists are concatenated in name order.
                let resources = wire.embedded.into_values().flatten().collect();
                Ok(Self { resources })
            }
            other => Err(WireError::Translation(format!(
                "page must be an array or a HAL object, got: {other}"
            ))),
        }
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn into_resources(self) -> Vec<Resource> {
        self.resources
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Finds the resource in this page with the given uuid.
    pub fn find_by_uuid(&self, uuid: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.uuid_str() == Some(uuid))
    }
}

impl<'a> IntoIterator for &'a ResourcePage {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.iter()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Deserialize)]
struct HalPageWire {
    #[serde(rename = "_embedded", default)]
    embedded: BTreeMap<String, Vec<Resource>>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn deserialize_with_path<T>(value: Value) -> WireResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        let source = err.into_inner();
        let path = if path.is_empty() || path == "." {
            "<root>"
        } else {
            path.as_str()
        };
        WireError::Translation(format!("page schema mismatch at {path}: {source}"))
    })
}
