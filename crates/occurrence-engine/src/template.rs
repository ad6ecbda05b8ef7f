//! Stored event definitions as they arrive from the events API.
//!
//! Deserialization is lenient on purpose: upstream rows may be incomplete, and
//! a bad timestamp must cost the template its occurrences, not fail the whole
//! batch.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::options::{parse_date, parse_datetime};

/// Cadence of a repeating event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepeatType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    /// Any other stored value. Expands with a weekly unit.
    Unrecognized,
}

impl RepeatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatType::Daily => "daily",
            RepeatType::Weekly => "weekly",
            RepeatType::Monthly => "monthly",
            RepeatType::Yearly => "yearly",
            RepeatType::Unrecognized => "unrecognized",
        }
    }
}

impl FromStr for RepeatType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "daily" => RepeatType::Daily,
            "weekly" => RepeatType::Weekly,
            "monthly" => RepeatType::Monthly,
            "yearly" => RepeatType::Yearly,
            _ => RepeatType::Unrecognized,
        })
    }
}

impl fmt::Display for RepeatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RepeatType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RepeatType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(s.parse().unwrap_or(RepeatType::Unrecognized))
    }
}

/// A stored, possibly repeating, event definition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTemplate {
    #[serde(deserialize_with = "de::id")]
    pub id: String,

    #[serde(default, deserialize_with = "de::string_or_null")]
    pub name: String,

    /// Anchor of the first occurrence. `None` when missing or unparseable.
    #[serde(default, alias = "start_time", deserialize_with = "de::datetime")]
    pub start_time: Option<DateTime<Utc>>,

    /// End of the first occurrence; every occurrence keeps the same duration.
    #[serde(
        default,
        alias = "end_time",
        deserialize_with = "de::datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<DateTime<Utc>>,

    /// Last calendar day on which an occurrence may fall.
    #[serde(
        default,
        alias = "end_date",
        deserialize_with = "de::date",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<NaiveDate>,

    #[serde(default, alias = "is_repeat", deserialize_with = "de::bool_or_null")]
    pub is_repeat: bool,

    #[serde(
        default,
        alias = "repeat_type",
        deserialize_with = "de::repeat_type",
        skip_serializing_if = "Option::is_none"
    )]
    pub repeat_type: Option<RepeatType>,

    /// Number of repetitions.
    #[serde(default, deserialize_with = "de::count", skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<i64>,

    /// Weekdays, 0 = Sunday through 6 = Saturday, in stored order.
    #[serde(
        default,
        alias = "days_of_week",
        deserialize_with = "de::weekdays",
        skip_serializing_if = "Option::is_none"
    )]
    pub days_of_week: Option<Vec<u8>>,

    /// Remaining fields, carried through to every occurrence unchanged.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl EventTemplate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    /// Make the template repeat `count` times with the given cadence.
    pub fn repeating(mut self, repeat_type: Option<RepeatType>, count: Option<i64>) -> Self {
        self.is_repeat = true;
        self.repeat_type = repeat_type;
        self.occurrence = count;
        self
    }

    pub fn with_end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    pub fn with_days_of_week(mut self, days: impl Into<Vec<u8>>) -> Self {
        self.days_of_week = Some(days.into());
        self
    }

    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Whether the template expands through a repeat rule at all.
    ///
    /// A present but non-positive count disables repetition; an absent count
    /// does not.
    pub fn repeats(&self) -> bool {
        self.is_repeat && !matches!(self.occurrence, Some(n) if n <= 0)
    }
}

/// Parse a JSON array of templates, or a single template object.
///
/// # Errors
/// Returns `EngineError::Json` when the input is not valid template JSON.
pub fn templates_from_json(json: &str) -> Result<Vec<EventTemplate>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let templates = match value {
        serde_json::Value::Array(_) => serde_json::from_value(value)?,
        other => vec![serde_json::from_value(other)?],
    };
    Ok(templates)
}

mod de {
    use super::*;
    use serde_json::Value;

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number id, got {}",
                other
            ))),
        }
    }

    /// A string field, or `None` with a warning when the value has another type.
    fn lenient_string(value: Value, field: &str) -> Option<String> {
        match value {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => {
                tracing::warn!(field, value = %other, "ignoring value of unexpected type");
                None
            }
        }
    }

    pub fn string_or_null<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
        Ok(lenient_string(Value::deserialize(d)?, "name").unwrap_or_default())
    }

    /// Booleans, plus the `0`/`1` and `"true"`/`"false"` forms some rows carry.
    pub fn bool_or_null<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<bool, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Bool(b) => b,
            Value::Null => false,
            Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
            Value::String(s) => s.trim().eq_ignore_ascii_case("true"),
            other => {
                tracing::warn!(value = %other, "ignoring non-boolean repeat flag");
                false
            }
        })
    }

    pub fn datetime<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
        let raw = lenient_string(Value::deserialize(d)?, "timestamp");
        Ok(raw.and_then(|s| match parse_datetime(&s) {
            Ok(dt) => Some(dt),
            Err(e) => {
                tracing::warn!(value = %s, error = %e, "ignoring unparseable timestamp");
                None
            }
        }))
    }

    pub fn date<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<NaiveDate>, D::Error> {
        let raw = lenient_string(Value::deserialize(d)?, "endDate");
        Ok(raw
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| match parse_date(&s) {
                Ok(date) => Some(date),
                Err(e) => {
                    tracing::warn!(value = %s, error = %e, "ignoring unparseable end date");
                    None
                }
            }))
    }

    pub fn repeat_type<'de, D: Deserializer<'de>>(
        d: D,
    ) -> std::result::Result<Option<RepeatType>, D::Error> {
        let raw = lenient_string(Value::deserialize(d)?, "repeatType");
        Ok(raw
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse().unwrap_or(RepeatType::Unrecognized)))
    }

    /// Keeps entries that fit a `u8`; range checks against 0..=6 happen at expansion.
    pub fn weekdays<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Vec<u8>>, D::Error> {
        let raw = match Value::deserialize(d)? {
            Value::Array(values) => Some(values),
            Value::Null => None,
            other => {
                tracing::warn!(value = %other, "ignoring non-array weekdays");
                None
            }
        };
        Ok(raw.map(|values| {
            values
                .into_iter()
                .filter_map(|v| {
                    let day = match &v {
                        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
                        Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    };
                    if day.is_none() {
                        tracing::warn!(value = %v, "ignoring non-numeric weekday");
                    }
                    day
                })
                .collect()
        }))
    }

    /// Counts arrive as numbers, numeric strings, or null.
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }
}
