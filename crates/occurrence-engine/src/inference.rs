//! Repeat-type fallback for templates stored before the cadence was recorded.
//!
//! This is a compatibility shim for legacy rows, not a scheduling rule. The
//! current time is passed in so results are reproducible.

use chrono::{DateTime, Utc};

use crate::template::{EventTemplate, RepeatType};

const DAILY_NAME_HINTS: [&str; 3] = ["daily", "practice", "training"];

/// Guess the cadence of a repeating template that has no stored repeat type.
///
/// Rules, first match wins:
/// 1. name mentions "daily", "practice" or "training" → daily
/// 2. 30 or more occurrences → daily
/// 3. 12 to 24 occurrences → monthly
/// 4. 2 or fewer occurrences → yearly
/// 5. 3 to 6 occurrences → daily if the event started at most 14 days before
///    `now` or repeats at least 5 times, otherwise weekly
/// 6. weekly
///
/// An absent count is treated as 0.
pub fn infer_repeat_type(template: &EventTemplate, now: DateTime<Utc>) -> RepeatType {
    let name = template.name.to_lowercase();
    if DAILY_NAME_HINTS.iter().any(|hint| name.contains(hint)) {
        return RepeatType::Daily;
    }

    let count = template.occurrence.unwrap_or(0);
    match count {
        30.. => RepeatType::Daily,
        12..=24 => RepeatType::Monthly,
        ..=2 => RepeatType::Yearly,
        3..=6 => match template.start_time {
            Some(start) if (now - start).num_days() <= 14 => RepeatType::Daily,
            Some(_) if count >= 5 => RepeatType::Daily,
            Some(_) => RepeatType::Weekly,
            None => RepeatType::Weekly,
        },
        _ => RepeatType::Weekly,
    }
}

/// The stored repeat type, or the inferred one when none is stored.
pub fn effective_repeat_type(template: &EventTemplate, now: DateTime<Utc>) -> RepeatType {
    match template.repeat_type {
        Some(repeat_type) => repeat_type,
        None => {
            let inferred = infer_repeat_type(template, now);
            tracing::debug!(
                template_id = %template.id,
                occurrence = ?template.occurrence,
                inferred = %inferred,
                "repeat type missing, inferred from legacy heuristic"
            );
            inferred
        }
    }
}
