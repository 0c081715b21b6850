// crates/nexus-router-core/src/core/time.rs
// ============================================================================
// Module: Nexus Router Time Model
// Description: RFC 3339 UTC timestamps for runs and events.
// Purpose: Provide a stable, lexicographically ordered wire form for time.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! Timestamps are RFC 3339 strings in UTC, computed by stores at write time.
//! Because every value uses the same fixed layout, string comparison agrees
//! with chronological ordering, which is what the `since` filter and the
//! `created_at DESC` listing rely on. Timestamps are monotonic per run but
//! need not be monotonic globally.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Timestamp construction or parsing errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum TimestampError {
    /// Formatting the current instant failed.
    #[error("timestamp format error: {0}")]
    Format(String),
    /// The value is not a valid RFC 3339 timestamp.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
}

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// RFC 3339 UTC timestamp with a stable wire form.
///
/// # Invariants
/// - The inner string is valid RFC 3339 in UTC when produced by [`Timestamp::now_utc`].
/// - Values read back from storage are carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Captures the current instant as an RFC 3339 UTC timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Format`] when the instant cannot be
    /// rendered, which indicates a platform clock fault.
    pub fn now_utc() -> Result<Self, TimestampError> {
        let rendered = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| TimestampError::Format(err.to_string()))?;
        Ok(Self(rendered))
    }

    /// Wraps an existing RFC 3339 string without validation.
    #[must_use]
    pub fn from_wire(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parses and validates an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Parse`] when the value is not RFC 3339.
    pub fn parse(value: &str) -> Result<Self, TimestampError> {
        OffsetDateTime::parse(value, &Rfc3339)
            .map_err(|err| TimestampError::Parse(err.to_string()))?;
        Ok(Self(value.to_string()))
    }

    /// Returns the timestamp as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
