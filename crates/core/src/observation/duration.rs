use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
}

impl DurationUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            DurationUnit::Years => "years",
            DurationUnit::Months => "months",
            DurationUnit::Weeks => "weeks",
            DurationUnit::Days => "days",
            DurationUnit::Hours => "hours",
            DurationUnit::Minutes => "minutes",
        }
    }

    fn singular(self) -> &'static str {
        let plural = self.as_str();
        &plural[..plural.len() - 1]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duration {
    pub duration_value: f64,
    pub duration_unit: DurationUnit,
}

impl Duration {
    pub fn new(duration_value: f64, duration_unit: DurationUnit) -> Self {
        Self {
            duration_value,
            duration_unit,
        }
    }

    fn to_value(self) -> Value {
        json!({
            "durationValue": self.duration_value,
            "durationUnit": self.duration_unit.as_str(),
        })
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = if self.duration_value == 1.0 {
            self.duration_unit.singular()
        } else {
            self.duration_unit.as_str()
        };
        write!(f, "{} {}", self.duration_value, unit)
    }
}

/// A duration made of several unit parts, e.g. 2 years 3 months.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeDuration {
    #[serde(default)]
    pub durations: Vec<Duration>,
}

impl CompositeDuration {
    pub fn new(durations: Vec<Duration>) -> Self {
        Self { durations }
    }

    /// Reads `{"durations": [...]}`; anything else yields an empty duration.
    pub fn from_obs(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    pub fn find(&self, unit: DurationUnit) -> Option<&Duration> {
        self.durations.iter().find(|d| d.duration_unit == unit)
    }

    pub fn get_value(&self) -> Value {
        let durations: Vec<Value> = self.durations.iter().map(|d| d.to_value()).collect();
        json!({ "durations": durations })
    }

    pub fn to_resource(&self) -> Value {
        self.get_value()
    }

    pub fn clone_for_edit(&self) -> Self {
        self.clone()
    }
}

impl fmt::Display for CompositeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, duration) in self.durations.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{duration}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_wire_shape() {
        let d = CompositeDuration::from_obs(&json!({
            "durations": [
                {"durationValue": 2, "durationUnit": "years"},
                {"durationValue": 1, "durationUnit": "months"}
            ]
        }));
        assert_eq!(d.durations.len(), 2);
        assert_eq!(d.to_string(), "2 years 1 month");
        assert_eq!(d.find(DurationUnit::Months).map(|m| m.duration_value), Some(1.0));
    }

    #[test]
    fn malformed_input_degrades_to_empty() {
        assert!(CompositeDuration::from_obs(&json!("3 weeks")).is_empty());
        assert!(CompositeDuration::from_obs(&json!({"durations": [{"durationUnit": "eons"}]})).is_empty());
    }

    #[test]
    fn resource_round_trips() {
        let d = CompositeDuration::new(vec![Duration::new(3.0, DurationUnit::Weeks)]);
        assert_eq!(CompositeDuration::from_obs(&d.to_resource()), d);
    }
}
