//! Template expansion -- turns a stored event definition into the concrete
//! occurrences that fall on a calendar day or within a range of days.
//!
//! Calendar days and the template's time of day are interpreted in the
//! calendar zone from [`ExpandOptions`]; month and year steps clamp to the
//! last day of shorter months and are always measured from the first
//! occurrence, never chained.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};

use crate::clock::Clock;
use crate::dst::resolve_local;
use crate::inference::effective_repeat_type;
use crate::occurrence::EventOccurrence;
use crate::options::ExpandOptions;
use crate::template::{EventTemplate, RepeatType};

/// Occurrences of `template` whose calendar day is `target`.
///
/// Returns an empty list when the template has no start time. Output is in
/// generation order and never repeats an id.
pub fn occurrences_on_date(
    template: &EventTemplate,
    target: NaiveDate,
    options: &ExpandOptions,
    clock: &dyn Clock,
) -> Vec<EventOccurrence> {
    occurrences_between(template, target, target, options, clock)
}

/// Occurrences of `template` whose calendar day lies in `[from, to]`.
///
/// Expands the template once for the whole range. For every day `d` in the
/// range, the occurrences on `d` are exactly those [`occurrences_on_date`]
/// returns for `d`, in the same order.
pub fn occurrences_between(
    template: &EventTemplate,
    from: NaiveDate,
    to: NaiveDate,
    options: &ExpandOptions,
    clock: &dyn Clock,
) -> Vec<EventOccurrence> {
    if from > to {
        return Vec::new();
    }

    let Some(start) = template.start_time else {
        tracing::debug!(template_id = %template.id, "skipping template without start time");
        return Vec::new();
    };
    let local_start = start.with_timezone(&options.timezone).naive_local();

    if !template.repeats() {
        let day = local_start.date();
        return if from <= day && day <= to {
            vec![EventOccurrence::single(template, start)]
        } else {
            Vec::new()
        };
    }

    let repeat_type = effective_repeat_type(template, clock.now());
    let expansion = Expansion {
        template,
        options,
        repeat_type,
        local_start,
        limit: instance_limit(template.occurrence, options.max_instances),
        from,
        to,
    };

    let occurrences = match (repeat_type, weekdays(template)) {
        (RepeatType::Weekly, Some(days)) => expansion.by_weekdays(&days),
        _ => expansion.by_fixed_unit(),
    };

    tracing::trace!(
        template_id = %template.id,
        repeat_type = %repeat_type,
        %from,
        %to,
        matched = occurrences.len(),
        "expanded template"
    );

    occurrences
}

/// Number of instances a template may generate before any end date applies.
///
/// A stored count is honored in full; `max_instances` only bounds templates
/// that repeat without one.
fn instance_limit(occurrence: Option<i64>, max_instances: u32) -> u32 {
    match occurrence {
        Some(n) => u32::try_from(n).unwrap_or(u32::MAX),
        None => max_instances,
    }
}

/// Valid weekdays in stored order, without repeats. `None` when there are none.
fn weekdays(template: &EventTemplate) -> Option<Vec<u8>> {
    let stored = template.days_of_week.as_ref()?;
    let mut days = Vec::with_capacity(stored.len());
    for &day in stored {
        if day > 6 {
            tracing::warn!(template_id = %template.id, day, "ignoring weekday outside 0..=6");
            continue;
        }
        if !days.contains(&day) {
            days.push(day);
        }
    }
    (!days.is_empty()).then_some(days)
}

struct Expansion<'a> {
    template: &'a EventTemplate,
    options: &'a ExpandOptions,
    repeat_type: RepeatType,
    local_start: NaiveDateTime,
    limit: u32,
    from: NaiveDate,
    to: NaiveDate,
}

impl Expansion<'_> {
    fn past_end_date(&self, day: NaiveDate) -> bool {
        self.template.end_date.is_some_and(|end| day > end)
    }

    fn in_window(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// `start + i * unit` for i in 0..limit, stopping after the end date.
    fn by_fixed_unit(&self) -> Vec<EventOccurrence> {
        let mut occurrences = Vec::new();

        for index in 0..self.limit {
            let Some(local) = step(self.local_start, self.repeat_type, index) else {
                break;
            };
            let day = local.date();
            if self.past_end_date(day) || day > self.to {
                break;
            }
            if day < self.from {
                continue;
            }
            let Some(start_time) =
                resolve_local(local, self.options.timezone, self.options.dst_policy)
            else {
                continue;
            };
            occurrences.push(EventOccurrence::instance(
                self.template,
                format!("{}-{}", self.template.id, index),
                start_time,
                index + 1,
                self.repeat_type,
            ));
        }

        occurrences
    }

    /// Walk weeks from the Sunday on or before the start, visiting `days` in
    /// stored order. Numbering follows visit order, which is only chronological
    /// when `days` is sorted.
    fn by_weekdays(&self, days: &[u8]) -> Vec<EventOccurrence> {
        let start_date = self.local_start.date();
        let time = self.local_start.time();
        let Some(first_week) = start_date.checked_sub_days(Days::new(u64::from(
            start_date.weekday().num_days_from_sunday(),
        ))) else {
            return Vec::new();
        };

        let mut occurrences = Vec::new();
        let mut count: u32 = 0;
        let mut week_offset: u64 = 0;

        'weeks: while count < self.limit {
            let Some(week_start) = first_week.checked_add_days(Days::new(week_offset * 7)) else {
                break;
            };
            // Every later date is at least this week's Sunday.
            if week_start > self.to {
                break;
            }

            for &day in days {
                if count >= self.limit {
                    break 'weeks;
                }
                let Some(date) = week_start.checked_add_days(Days::new(u64::from(day))) else {
                    break 'weeks;
                };
                if self.past_end_date(date) {
                    break 'weeks;
                }
                count += 1;

                if !self.in_window(date) {
                    continue;
                }
                let Some(start_time) = resolve_local(
                    date.and_time(time),
                    self.options.timezone,
                    self.options.dst_policy,
                ) else {
                    continue;
                };
                occurrences.push(EventOccurrence::instance(
                    self.template,
                    format!("{}-{}-{}", self.template.id, week_offset, day),
                    start_time,
                    count,
                    self.repeat_type,
                ));
            }

            week_offset += 1;
        }

        occurrences
    }
}

/// The local start of instance `index` for a fixed-unit cadence.
fn step(start: NaiveDateTime, repeat_type: RepeatType, index: u32) -> Option<NaiveDateTime> {
    let n = u64::from(index);
    match repeat_type {
        RepeatType::Daily => start.checked_add_days(Days::new(n)),
        RepeatType::Weekly | RepeatType::Unrecognized => start.checked_add_days(Days::new(n * 7)),
        RepeatType::Monthly => start.checked_add_months(Months::new(index)),
        RepeatType::Yearly => start.checked_add_months(Months::new(index.checked_mul(12)?)),
    }
}
