//! Constants used throughout the fieldcare core crate.

/// Default maximum age accepted for a date of birth.
pub const DEFAULT_MAX_AGE_YEARS: u32 = 120;

/// Default bound on forward-reference recursion within one page.
pub const DEFAULT_FORWARD_REFERENCE_DEPTH: usize = 16;

/// Environment variable overriding [`DEFAULT_MAX_AGE_YEARS`].
pub const MAX_AGE_YEARS_ENV: &str = "FIELDCARE_MAX_AGE_YEARS";

/// Environment variable overriding [`DEFAULT_FORWARD_REFERENCE_DEPTH`].
pub const FORWARD_REFERENCE_DEPTH_ENV: &str = "FIELDCARE_FORWARD_REFERENCE_DEPTH";

/// Standard "Other" answer concept; always listed after ordinary answers.
pub const OTHER_CONCEPT_UUID: &str = "05ea583c-51d2-412d-ad00-06c432ffe538";

/// Standard "None" answer concept; always listed after ordinary answers.
pub const NONE_CONCEPT_UUID: &str = "ebda5e05-a995-43ca-ad1a-30af3b937539";

/// Sort position given to the standard answers.
pub const STANDARD_ANSWER_ORDER: f64 = 99999.0;

/// `EntitySyncStatus.entityName` of the form sync bookkeeping row.
pub const FORM_SYNC_ENTITY_NAME: &str = "Form";
