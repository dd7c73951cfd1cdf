use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneNumber {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub skip_verification: bool,
}

impl PhoneNumber {
    pub fn new(phone_number: impl Into<String>, verified: bool, skip_verification: bool) -> Self {
        Self {
            phone_number: phone_number.into(),
            verified,
            skip_verification,
        }
    }

    /// Reads `{"phoneNumber", "verified", "skipVerification"}`; a bare string is an unverified
    /// number.
    pub fn from_obs(value: &Value) -> Self {
        match value {
            Value::String(s) => PhoneNumber::new(s.clone(), false, false),
            other => serde_json::from_value(other.clone()).unwrap_or_default(),
        }
    }

    pub fn is_verification_required(&self) -> bool {
        !self.skip_verification && !self.verified
    }

    pub fn get_value(&self) -> Value {
        Value::String(self.phone_number.clone())
    }

    /// The skip flag is local only and is not sent.
    pub fn to_resource(&self) -> Value {
        json!({"phoneNumber": self.phone_number, "verified": self.verified})
    }

    pub fn clone_for_edit(&self) -> Self {
        self.clone()
    }
}
