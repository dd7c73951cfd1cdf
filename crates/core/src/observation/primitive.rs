use chrono::{DateTime, Utc};
use fieldcare_types::ConceptDataType;
use fieldcare_wire::dates::{format_iso_timestamp, parse_date, parse_timestamp, start_of_day};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Interpreted form of a primitive observation.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveAnswer {
    Number(f64),
    Timestamp(DateTime<Utc>),
    /// Kept exactly as received.
    Raw(Value),
}

/// A scalar observation value, interpreted according to its concept's data type.
///
/// The raw `value` is what is stored; `answer` is derived from it on construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "PrimitiveValueWire")]
pub struct PrimitiveValue {
    value: Value,
    datatype: ConceptDataType,
    #[serde(skip)]
    answer: PrimitiveAnswer,
}

#[derive(Deserialize)]
struct PrimitiveValueWire {
    value: Value,
    datatype: ConceptDataType,
}

impl From<PrimitiveValueWire> for PrimitiveValue {
    fn from(wire: PrimitiveValueWire) -> Self {
        PrimitiveValue::new(wire.value, wire.datatype)
    }
}

impl Default for PrimitiveAnswer {
    fn default() -> Self {
        PrimitiveAnswer::Raw(Value::Null)
    }
}

impl PrimitiveValue {
    pub fn new(value: Value, datatype: ConceptDataType) -> Self {
        let answer = interpret(&value, datatype);
        Self {
            value,
            datatype,
            answer,
        }
    }

    pub fn raw(&self) -> &Value {
        &self.value
    }

    pub fn datatype(&self) -> ConceptDataType {
        self.datatype
    }

    pub fn answer(&self) -> &PrimitiveAnswer {
        &self.answer
    }

    /// The answer as a number, when it has a numeric reading.
    pub fn as_f64(&self) -> Option<f64> {
        match &self.answer {
            PrimitiveAnswer::Number(n) => Some(*n),
            PrimitiveAnswer::Raw(Value::Number(n)) => n.as_f64(),
            PrimitiveAnswer::Raw(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.answer {
            PrimitiveAnswer::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    pub fn get_value(&self) -> Value {
        match &self.answer {
            PrimitiveAnswer::Number(n) => Number::from_f64(*n).map_or(Value::Null, Value::Number),
            PrimitiveAnswer::Timestamp(ts) => Value::String(format_iso_timestamp(*ts)),
            PrimitiveAnswer::Raw(v) => v.clone(),
        }
    }

    pub fn to_resource(&self) -> Value {
        self.get_value()
    }

    pub fn clone_for_edit(&self) -> Self {
        PrimitiveValue::new(self.value.clone(), self.datatype)
    }
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn interpret(value: &Value, datatype: ConceptDataType) -> PrimitiveAnswer {
    match (datatype, value) {
        (ConceptDataType::Numeric, Value::String(s)) => {
            if keeps_trailing_digits(s) {
                PrimitiveAnswer::Raw(value.clone())
            } else {
                s.trim()
                    .parse()
                    .map(PrimitiveAnswer::Number)
                    .unwrap_or_else(|_| PrimitiveAnswer::Raw(value.clone()))
            }
        }
        (ConceptDataType::DateTime, Value::String(s)) => parse_timestamp(s)
            .map(PrimitiveAnswer::Timestamp)
            .unwrap_or_else(|| PrimitiveAnswer::Raw(value.clone())),
        (ConceptDataType::DateTime, Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(PrimitiveAnswer::Timestamp)
            .unwrap_or_else(|| PrimitiveAnswer::Raw(value.clone())),
        (ConceptDataType::Date, Value::String(s)) => parse_date(s)
            .and_then(start_of_day)
            .map(PrimitiveAnswer::Timestamp)
            .unwrap_or_else(|| PrimitiveAnswer::Raw(value.clone())),
        _ => PrimitiveAnswer::Raw(value.clone()),
    }
}

/// Numeric text being typed (`"5."`, `"5.0"`, `"50"`) must not be normalised away.
fn keeps_trailing_digits(s: &str) -> bool {
    s.ends_with('.') || s.ends_with('0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_strings_with_trailing_zero_or_dot_are_preserved() {
        for raw in ["5.0", "5.00", "50", "5."] {
            let v = PrimitiveValue::new(json!(raw), ConceptDataType::Numeric);
            assert_eq!(v.get_value(), json!(raw), "{raw}");
        }
    }

    #[test]
    fn other_numeric_strings_parse() {
        let v = PrimitiveValue::new(json!("5.3"), ConceptDataType::Numeric);
        assert_eq!(v.answer(), &PrimitiveAnswer::Number(5.3));
        assert_eq!(v.get_value(), json!(5.3));

        let unparseable = PrimitiveValue::new(json!("abc"), ConceptDataType::Numeric);
        assert_eq!(unparseable.get_value(), json!("abc"));
    }

    #[test]
    fn json_numbers_stay_numbers() {
        let v = PrimitiveValue::new(json!(42), ConceptDataType::Numeric);
        assert_eq!(v.get_value(), json!(42));
        assert_eq!(v.as_f64(), Some(42.0));
    }

    #[test]
    fn datetime_and_date_are_parsed() {
        let dt = PrimitiveValue::new(json!("2024-03-05T10:15:00Z"), ConceptDataType::DateTime);
        assert_eq!(dt.get_value(), json!("2024-03-05T10:15:00.000Z"));

        let d = PrimitiveValue::new(json!("2024-03-05T10:15:00Z"), ConceptDataType::Date);
        assert_eq!(d.get_value(), json!("2024-03-05T00:00:00.000Z"));
    }

    #[test]
    fn text_passes_through() {
        let v = PrimitiveValue::new(json!("hello"), ConceptDataType::Text);
        assert_eq!(v.to_resource(), json!("hello"));
    }

    #[test]
    fn deserialising_recomputes_answer() {
        let v: PrimitiveValue =
            serde_json::from_value(json!({"value": "7.5", "datatype": "Numeric"}))
                .expect("deserialize");
        assert_eq!(v.as_f64(), Some(7.5));
        assert_eq!(
            serde_json::to_value(&v).expect("serialize"),
            json!({"value": "7.5", "datatype": "Numeric"})
        );
    }
}
