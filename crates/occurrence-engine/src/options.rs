//! Expansion configuration and the parsers for its string inputs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{EngineError, Result};

/// Upper bound on instances generated for one template when neither an
/// occurrence count nor an end date stops expansion sooner.
pub const DEFAULT_MAX_INSTANCES: u32 = 500;

/// Settings shared by every expansion call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpandOptions {
    /// Zone in which calendar days and the template's time of day are interpreted.
    pub timezone: Tz,
    pub dst_policy: DstPolicy,
    pub max_instances: u32,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            dst_policy: DstPolicy::default(),
            max_instances: DEFAULT_MAX_INSTANCES,
        }
    }
}

impl ExpandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_dst_policy(mut self, dst_policy: DstPolicy) -> Self {
        self.dst_policy = dst_policy;
        self
    }

    pub fn with_max_instances(mut self, max_instances: u32) -> Self {
        self.max_instances = max_instances;
        self
    }
}

/// Parse an IANA zone name such as `"America/Chicago"`.
///
/// # Errors
/// Returns `EngineError::InvalidTimezone` for unknown names.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| EngineError::InvalidTimezone(name.to_string()))
}

/// Parse a calendar date.
///
/// Accepts `YYYY-MM-DD`, or an RFC 3339 timestamp whose written date is used.
///
/// # Errors
/// Returns `EngineError::InvalidDate` when neither form matches.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.date_naive())
        .map_err(|_| EngineError::InvalidDate(s.to_string()))
}

/// Parse an instant.
///
/// Accepts RFC 3339 (with offset) or a naive `YYYY-MM-DDTHH:MM:SS`, which is
/// interpreted as UTC.
///
/// # Errors
/// Returns `EngineError::InvalidDateTime` when neither form matches.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|_| EngineError::InvalidDateTime(s.to_string()))
}
