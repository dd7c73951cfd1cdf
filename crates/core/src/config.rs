//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the sync context. Library code never reads environment variables itself; the
//! binary reads them and hands the raw values to [`CoreConfig::from_env_values`].

use crate::constants::{
    DEFAULT_FORWARD_REFERENCE_DEPTH, DEFAULT_MAX_AGE_YEARS, FORWARD_REFERENCE_DEPTH_ENV,
    MAX_AGE_YEARS_ENV,
};
use crate::{CoreError, CoreResult};
use std::str::FromStr;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    max_age_years: u32,
    forward_reference_depth: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            max_age_years: DEFAULT_MAX_AGE_YEARS,
            forward_reference_depth: DEFAULT_FORWARD_REFERENCE_DEPTH,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if either value is zero.
    pub fn new(max_age_years: u32, forward_reference_depth: usize) -> CoreResult<Self> {
        if max_age_years == 0 {
            return Err(CoreError::InvalidInput(
                "max_age_years must be greater than zero".into(),
            ));
        }
        if forward_reference_depth == 0 {
            return Err(CoreError::InvalidInput(
                "forward_reference_depth must be greater than zero".into(),
            ));
        }

        Ok(Self {
            max_age_years,
            forward_reference_depth,
        })
    }

    /// Build a configuration from optional raw values, as read from
    /// `FIELDCARE_MAX_AGE_YEARS` and `FIELDCARE_FORWARD_REFERENCE_DEPTH`.
    ///
    /// `None` or blank values fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if a value is present but not a positive integer.
    pub fn from_env_values(
        max_age_years: Option<String>,
        forward_reference_depth: Option<String>,
    ) -> CoreResult<Self> {
        let max_age_years =
            parse_env_value(MAX_AGE_YEARS_ENV, max_age_years, DEFAULT_MAX_AGE_YEARS)?;
        let forward_reference_depth = parse_env_value(
            FORWARD_REFERENCE_DEPTH_ENV,
            forward_reference_depth,
            DEFAULT_FORWARD_REFERENCE_DEPTH,
        )?;
        Self::new(max_age_years, forward_reference_depth)
    }

    pub fn max_age_years(&self) -> u32 {
        self.max_age_years
    }

    pub fn forward_reference_depth(&self) -> usize {
        self.forward_reference_depth
    }
}

fn parse_env_value<T: FromStr>(name: &str, value: Option<String>, default: T) -> CoreResult<T> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(default),
        Some(v) => v.parse::<T>().map_err(|_| {
            CoreError::InvalidInput(format!("{name} must be a positive integer, got: '{v}'"))
        }),
    }
}
