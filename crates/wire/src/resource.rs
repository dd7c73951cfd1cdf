//! A single wire resource.
//!
//! Resources are keyed JSON objects. Scalars are read leniently: a field that is absent, `null`
//! or of an unexpected type reads as `None`. Dates are the exception: a date field that is
//! present but unparseable is an error, since silently dropping it would lose clinical data.
//!
//! Foreign keys are read with [`Resource::uuid_for`], which understands every encoding the server
//! produces.

use crate::dates::{parse_date, parse_timestamp};
use crate::{WireError, WireResult};
use chrono::{DateTime, NaiveDate, Utc};
use fieldcare_uuid::EntityUuid;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A keyed JSON object received from, or sent to, the server.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(Map<String, Value>);

impl From<Map<String, Value>> for Resource {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Resource> for Value {
    fn from(resource: Resource) -> Self {
        Value::Object(resource.0)
    }
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value, which must be an object.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidInput`] for any non-object value.
    pub fn from_value(value: Value) -> WireResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(WireError::InvalidInput(format!(
                "resource must be a JSON object, got: {other}"
            ))),
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Returns the raw value of `field`, treating `null` as absent.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Sets `field`, replacing any previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Sets `field` when `value` is present, and to `null` otherwise.
    pub fn insert_opt<V: Into<Value>>(&mut self, field: impl Into<String>, value: Option<V>) -> &mut Self {
        let value = value.map(Into::into).unwrap_or(Value::Null);
        self.0.insert(field.into(), value);
        self
    }

    /// The resource's own identifier.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MissingField`] if `uuid` is absent or not a string, and
    /// [`WireError::InvalidUuid`] if it is blank.
    pub fn uuid(&self) -> WireResult<EntityUuid> {
        let raw = self
            .str_field("uuid")
            .ok_or_else(|| WireError::MissingField("uuid".into()))?;
        Ok(EntityUuid::from_wire(raw)?)
    }

    /// The resource's own identifier as text, if present.
    pub fn uuid_str(&self) -> Option<&str> {
        self.str_field("uuid")
    }

    /// Extract the identifier named by a foreign-key field.
    ///
    /// Checked in order:
    /// 1. a direct string: `"individualUUID": "…"`
    /// 2. a sub-object under the field name: `"individualUUID": {"uuid": "…"}`
    /// 3. a sub-object under the role name (the field without its `UUID` suffix):
    ///    `"individual": {"uuid": "…"}`
    /// 4. a HAL link: `"_links": {"individualUUID": {"href": "…"}}`
    ///
    /// Blank values are treated as absent.
    pub fn uuid_for(&self, field: &str) -> Option<EntityUuid> {
        self.raw_uuid_for(field)
            .and_then(|raw| EntityUuid::from_wire(raw).ok())
    }

    fn raw_uuid_for(&self, field: &str) -> Option<&str> {
        match self.get(field) {
            Some(Value::String(s)) => return Some(s.as_str()),
            Some(Value::Object(obj)) => {
                if let Some(Value::String(s)) = obj.get("uuid") {
                    return Some(s.as_str());
                }
            }
            _ => {}
        }

        if let Some(role) = role_name(field) {
            if let Some(Value::Object(obj)) = self.get(role) {
                if let Some(Value::String(s)) = obj.get("uuid") {
                    return Some(s.as_str());
                }
            }
        }

        self.get("_links")
            .and_then(|links| links.get(field))
            .and_then(|link| link.get("href"))
            .and_then(Value::as_str)
    }

    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    pub fn string_field(&self, field: &str) -> Option<String> {
        self.str_field(field).map(str::to_owned)
    }

    pub fn bool_field(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Reads a number, accepting numeric strings as well.
    pub fn f64_field(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn i64_field(&self, field: &str) -> Option<i64> {
        match self.get(field)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// The soft-delete flag; absent means not voided.
    pub fn voided(&self) -> bool {
        self.bool_field("voided").unwrap_or(false)
    }

    /// Reads an optional calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidDate`] if the field is present but unparseable.
    pub fn date_field(&self, field: &str) -> WireResult<Option<NaiveDate>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => parse_date(s)
                .map(Some)
                .ok_or_else(|| invalid_date(field, s)),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(|dt| Some(dt.date_naive()))
                .ok_or_else(|| invalid_date(field, &n.to_string())),
            Some(other) => Err(invalid_date(field, &other.to_string())),
        }
    }

    /// Reads an optional timestamp.
    ///
    /// Numbers are read as epoch milliseconds.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::InvalidDate`] if the field is present but unparseable.
    pub fn timestamp_field(&self, field: &str) -> WireResult<Option<DateTime<Utc>>> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => parse_timestamp(s)
                .map(Some)
                .ok_or_else(|| invalid_date(field, s)),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(Some)
                .ok_or_else(|| invalid_date(field, &n.to_string())),
            Some(other) => Err(invalid_date(field, &other.to_string())),
        }
    }

    /// Reads a mandatory calendar date.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MissingField`] if absent and [`WireError::InvalidDate`] if
    /// unparseable.
    pub fn required_date(&self, field: &str) -> WireResult<NaiveDate> {
        self.date_field(field)?
            .ok_or_else(|| WireError::MissingField(field.to_owned()))
    }

    /// Reads a mandatory timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MissingField`] if absent and [`WireError::InvalidDate`] if
    /// unparseable.
    pub fn required_timestamp(&self, field: &str) -> WireResult<DateTime<Utc>> {
        self.timestamp_field(field)?
            .ok_or_else(|| WireError::MissingField(field.to_owned()))
    }

    /// Reads a mandatory string.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::MissingField`] if absent or not a string.
    pub fn required_str(&self, field: &str) -> WireResult<&str> {
        self.str_field(field)
            .ok_or_else(|| WireError::MissingField(field.to_owned()))
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

/// `individualUUID` -> `individual`, `individualAUUID` -> `individualA`.
fn role_name(field: &str) -> Option<&str> {
    field
        .strip_suffix("UUID")
        .or_else(|| field.strip_suffix("Uuid"))
        .filter(|role| !role.is_empty())
}

fn invalid_date(field: &str, value: &str) -> WireError {
    WireError::InvalidDate {
        field: field.to_owned(),
        value: value.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resource(value: Value) -> Resource {
        Resource::from_value(value).expect("object resource")
    }

    #[test]
    fn uuid_for_reads_direct_string() {
        let r = resource(json!({"uuid": "e1", "individualUUID": "i1"}));
        assert_eq!(r.uuid_for("individualUUID").expect("fk"), "i1");
    }

    #[test]
    fn uuid_for_reads_sub_object_under_field_name() {
        let r = resource(json!({"individualUUID": {"uuid": "i2"}}));
        assert_eq!(r.uuid_for("individualUUID").expect("fk"), "i2");
    }

    #[test]
    fn uuid_for_reads_role_sub_object() {
        let r = resource(json!({"individual": {"uuid": "i3", "name": "x"}}));
        assert_eq!(r.uuid_for("individualUUID").expect("fk"), "i3");
    }

    #[test]
    fn uuid_for_reads_hal_link() {
        let r = resource(json!({"_links": {"individualUUID": {"href": "i4"}}}));
        assert_eq!(r.uuid_for("individualUUID").expect("fk"), "i4");
    }

    #[test]
    fn uuid_for_treats_blank_and_null_as_absent() {
        let r = resource(json!({"individualUUID": "", "genderUUID": null}));
        assert!(r.uuid_for("individualUUID").is_none());
        assert!(r.uuid_for("genderUUID").is_none());
        assert!(r.uuid_for("programUUID").is_none());
    }

    #[test]
    fn uuid_is_required() {
        let err = resource(json!({"name": "x"})).uuid().expect_err("should fail");
        assert!(matches!(err, WireError::MissingField(f) if f == "uuid"));
    }

    #[test]
    fn voided_defaults_to_false() {
        assert!(!resource(json!({})).voided());
        assert!(resource(json!({"voided": true})).voided());
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let r = resource(json!({"a": 1.5, "b": "2.5", "c": "x", "d": 7}));
        assert_eq!(r.f64_field("a"), Some(1.5));
        assert_eq!(r.f64_field("b"), Some(2.5));
        assert_eq!(r.f64_field("c"), None);
        assert_eq!(r.i64_field("d"), Some(7));
    }

    #[test]
    fn unparseable_date_is_an_error() {
        let r = resource(json!({"dateOfBirth": "not a date"}));
        match r.date_field("dateOfBirth") {
            Err(WireError::InvalidDate { field, value }) => {
                assert_eq!(field, "dateOfBirth");
                assert_eq!(value, "not a date");
            }
            other => panic!("expected InvalidDate, got {other:?}"),
        }
    }

    #[test]
    fn absent_optional_date_is_none() {
        let r = resource(json!({"dateOfBirth": null}));
        assert_eq!(r.date_field("dateOfBirth").expect("optional"), None);
        assert!(matches!(
            r.required_date("dateOfBirth"),
            Err(WireError::MissingField(_))
        ));
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Resource::from_value(json!([1, 2])).is_err());
    }
}
