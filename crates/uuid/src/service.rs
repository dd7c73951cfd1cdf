//! Internal implementation of entity identifiers.

use crate::{UuidError, UuidResult};
use std::borrow::Borrow;
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Identifier of a persisted entity.
///
/// The wrapper stores the identifier text exactly as it was supplied. Once constructed it is
/// guaranteed to be non-empty; whether it is also canonical can be checked with
/// [`EntityUuid::is_canonical`].
///
/// # Construction
/// - [`EntityUuid::new`] generates a fresh canonical identifier for locally created entities.
/// - [`EntityUuid::parse`] validates an identifier that must already be canonical.
/// - [`EntityUuid::from_wire`] accepts any non-empty identifier received from the server.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityUuid(String);

impl Default for EntityUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityUuid {
    /// Generates a new identifier in canonical hyphenated form.
    ///
    /// Follows RFC 4122 version 4.
    pub fn new() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Validates and wraps an identifier that must already be canonical.
    ///
    /// Uppercase, unhyphenated and braced forms are rejected rather than normalised.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if Self::is_canonical(input) {
            return Ok(Self(input.to_owned()));
        }
        Err(UuidError::InvalidInput(format!(
            "UUID must be 36 lowercase hex characters in 8-4-4-4-12 layout, got: '{}'",
            input
        )))
    }

    /// Wraps an identifier received over the wire.
    ///
    /// The value is kept verbatim. Only empty or whitespace-only values are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is blank.
    pub fn from_wire(input: &str) -> UuidResult<Self> {
        if input.trim().is_empty() {
            return Err(UuidError::InvalidInput(
                "entity identifier cannot be empty".into(),
            ));
        }
        Ok(Self(input.to_owned()))
    }

    /// Returns true if `input` is a canonical hyphenated lowercase UUID.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 36
            && input.bytes().enumerate().all(|(i, b)| match i {
                8 | 13 | 18 | 23 => b == b'-',
                _ => matches!(b, b'0'..=b'9' | b'a'..=b'f'),
            })
    }

    /// Returns true if this identifier is in canonical form.
    pub fn canonical(&self) -> bool {
        Self::is_canonical(&self.0)
    }

    /// Returns the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the parsed `uuid::Uuid`, when the identifier is canonical.
    pub fn uuid(&self) -> Option<Uuid> {
        if self.canonical() {
            Uuid::parse_str(&self.0).ok()
        } else {
            None
        }
    }
}

impl fmt::Display for EntityUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntityUuid {
    type Err = UuidError;

    /// Equivalent to [`EntityUuid::parse`]; requires canonical form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityUuid::parse(s)
    }
}

impl AsRef<str> for EntityUuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for EntityUuid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for EntityUuid {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for EntityUuid {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EntityUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EntityUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EntityUuid::from_wire(&s).map_err(serde::de::Error::custom)
    }
}
