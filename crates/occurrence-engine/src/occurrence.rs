//! Concrete, dated materializations of an [`EventTemplate`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::template::{EventTemplate, RepeatType};

/// One occurrence of a template, computed for display and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventOccurrence {
    pub id: String,
    /// Id of the template this occurrence was expanded from.
    pub original_event_id: String,
    pub name: String,
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub is_recurring_instance: bool,
    /// 1-based position in the expansion sequence.
    pub occurrence_number: u32,
    /// Rule that produced this occurrence; `None` for a one-off event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_type: Option<RepeatType>,
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl EventOccurrence {
    /// The single occurrence of a non-repeating template.
    pub(crate) fn single(template: &EventTemplate, start_time: DateTime<Utc>) -> Self {
        Self {
            id: template.id.clone(),
            original_event_id: template.id.clone(),
            name: template.name.clone(),
            start_time,
            end_time: template.end_time,
            is_recurring_instance: false,
            occurrence_number: 1,
            repeat_type: None,
            details: carried_details(template),
        }
    }

    /// An expanded instance of a repeating template.
    pub(crate) fn instance(
        template: &EventTemplate,
        id: String,
        start_time: DateTime<Utc>,
        occurrence_number: u32,
        repeat_type: RepeatType,
    ) -> Self {
        let duration = match (template.start_time, template.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        };
        Self {
            id,
            original_event_id: template.id.clone(),
            name: template.name.clone(),
            start_time,
            end_time: duration.map(|d| start_time + d),
            is_recurring_instance: true,
            occurrence_number,
            repeat_type: Some(repeat_type),
            details: carried_details(template),
        }
    }
}

/// Keys an occurrence writes itself; template details never shadow them.
const OCCURRENCE_KEYS: [&str; 8] = [
    "id",
    "originalEventId",
    "name",
    "startTime",
    "endTime",
    "isRecurringInstance",
    "occurrenceNumber",
    "repeatType",
];

fn carried_details(template: &EventTemplate) -> serde_json::Map<String, serde_json::Value> {
    template
        .details
        .iter()
        .filter(|(key, _)| !OCCURRENCE_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
