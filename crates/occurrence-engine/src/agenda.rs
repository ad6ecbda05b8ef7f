//! Day-by-day agenda across many templates, as a calendar month or list view
//! renders it.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::clock::{Clock, FixedClock};
use crate::expander::occurrences_between;
use crate::occurrence::EventOccurrence;
use crate::options::ExpandOptions;
use crate::template::EventTemplate;

/// Occurrences of all `templates` in `[from, to]`, keyed by calendar day.
///
/// Each day is sorted by start time, then id. Days with nothing on them are
/// omitted. The clock is read once, so every template sees the same "now".
pub fn agenda(
    templates: &[EventTemplate],
    from: NaiveDate,
    to: NaiveDate,
    options: &ExpandOptions,
    clock: &dyn Clock,
) -> BTreeMap<NaiveDate, Vec<EventOccurrence>> {
    let snapshot = FixedClock(clock.now());
    let mut days: BTreeMap<NaiveDate, Vec<EventOccurrence>> = BTreeMap::new();

    for template in templates {
        for occurrence in occurrences_between(template, from, to, options, &snapshot) {
            let day = occurrence
                .start_time
                .with_timezone(&options.timezone)
                .date_naive();
            days.entry(day).or_default().push(occurrence);
        }
    }

    for occurrences in days.values_mut() {
        occurrences.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    days
}
