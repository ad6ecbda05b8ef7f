//! Tests for per-date and per-range occurrence expansion.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use occurrence_engine::{
    occurrences_between, occurrences_on_date, DstPolicy, EventOccurrence, EventTemplate,
    ExpandOptions, FixedClock, RepeatType,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn clock() -> FixedClock {
    FixedClock(at(2024, 6, 1, 12, 0))
}

fn on(template: &EventTemplate, day: NaiveDate) -> Vec<EventOccurrence> {
    occurrences_on_date(template, day, &ExpandOptions::default(), &clock())
}

/// Every day in `[from, to]` that has at least one occurrence.
fn days_with_occurrences(template: &EventTemplate, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| !on(template, *d).is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Non-repeating templates
// ---------------------------------------------------------------------------

#[test]
fn non_repeating_matches_only_its_start_day() {
    let template = EventTemplate::new("game-7", "League game", at(2024, 3, 15, 18, 30));

    for offset in -30..=30 {
        let day = date(2024, 3, 15) + Duration::days(offset);
        let occurrences = on(&template, day);
        if offset == 0 {
            assert_eq!(occurrences.len(), 1, "expected one occurrence on {}", day);
        } else {
            assert!(occurrences.is_empty(), "unexpected occurrence on {}", day);
        }
    }
}

#[test]
fn non_repeating_occurrence_keeps_template_identity() {
    let template = EventTemplate::new("game-7", "League game", at(2024, 3, 15, 18, 30))
        .with_end_time(at(2024, 3, 15, 20, 0));

    let occurrences = on(&template, date(2024, 3, 15));
    let occ = &occurrences[0];
    assert_eq!(occ.id, "game-7");
    assert_eq!(occ.original_event_id, "game-7");
    assert_eq!(occ.start_time, at(2024, 3, 15, 18, 30));
    assert_eq!(occ.end_time, Some(at(2024, 3, 15, 20, 0)));
    assert!(!occ.is_recurring_instance);
    assert_eq!(occ.occurrence_number, 1);
    assert_eq!(occ.repeat_type, None);
}

#[test]
fn repeat_flag_with_non_positive_count_behaves_as_one_off() {
    let start = at(2024, 1, 1, 9, 0);
    let zero = EventTemplate::new("z", "Zero", start).repeating(Some(RepeatType::Daily), Some(0));
    let negative =
        EventTemplate::new("n", "Negative", start).repeating(Some(RepeatType::Daily), Some(-1));

    for template in [&zero, &negative] {
        assert_eq!(on(template, date(2024, 1, 1)).len(), 1);
        assert!(on(template, date(2024, 1, 2)).is_empty());
    }
}

#[test]
fn missing_start_time_yields_nothing() {
    let template = EventTemplate {
        id: "broken".to_string(),
        is_repeat: true,
        repeat_type: Some(RepeatType::Daily),
        occurrence: Some(5),
        ..EventTemplate::default()
    };
    assert!(on(&template, date(2024, 1, 1)).is_empty());
    assert!(occurrences_between(
        &template,
        date(2024, 1, 1),
        date(2024, 12, 31),
        &ExpandOptions::default(),
        &clock()
    )
    .is_empty());
}

// ---------------------------------------------------------------------------
// Fixed-unit cadences
// ---------------------------------------------------------------------------

#[test]
fn daily_count_five() {
    let template = EventTemplate::new("drill", "Drill", at(2024, 1, 1, 9, 0))
        .repeating(Some(RepeatType::Daily), Some(5));

    let days = days_with_occurrences(&template, date(2023, 12, 1), date(2024, 2, 1));
    let expected: Vec<NaiveDate> = (1..=5).map(|d| date(2024, 1, d)).collect();
    assert_eq!(days, expected);
}

#[test]
fn daily_occurrence_fields() {
    let template = EventTemplate::new("drill", "Drill", at(2024, 1, 1, 9, 0))
        .repeating(Some(RepeatType::Daily), Some(5))
        .with_end_time(at(2024, 1, 1, 10, 30));

    let occurrences = on(&template, date(2024, 1, 3));
    assert_eq!(occurrences.len(), 1);
    let occ = &occurrences[0];
    assert_eq!(occ.id, "drill-2");
    assert_eq!(occ.original_event_id, "drill");
    assert_eq!(occ.occurrence_number, 3);
    assert!(occ.is_recurring_instance);
    assert_eq!(occ.start_time, at(2024, 1, 3, 9, 0));
    assert_eq!(occ.end_time, Some(at(2024, 1, 3, 10, 30)));
    assert_eq!(occ.repeat_type, Some(RepeatType::Daily));
}

#[test]
fn weekly_without_days_repeats_on_start_weekday() {
    let template = EventTemplate::new("film", "Film session", at(2024, 1, 2, 17, 0))
        .repeating(Some(RepeatType::Weekly), Some(3));

    let days = days_with_occurrences(&template, date(2024, 1, 1), date(2024, 2, 29));
    assert_eq!(days, vec![date(2024, 1, 2), date(2024, 1, 9), date(2024, 1, 16)]);
}

#[test]
fn monthly_clamps_to_month_end() {
    let template = EventTemplate::new("dues", "Dues", at(2024, 1, 31, 12, 0))
        .repeating(Some(RepeatType::Monthly), Some(4));

    let days = days_with_occurrences(&template, date(2024, 1, 1), date(2024, 6, 30));
    assert_eq!(
        days,
        vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)]
    );
}

#[test]
fn yearly_repeats_on_anniversary() {
    let template = EventTemplate::new("banquet", "Banquet", at(2024, 5, 20, 19, 0))
        .repeating(Some(RepeatType::Yearly), Some(3));

    let found = occurrences_between(
        &template,
        date(2024, 1, 1),
        date(2030, 12, 31),
        &ExpandOptions::default(),
        &clock(),
    );
    let starts: Vec<DateTime<Utc>> = found.iter().map(|o| o.start_time).collect();
    assert_eq!(
        starts,
        vec![at(2024, 5, 20, 19, 0), at(2025, 5, 20, 19, 0), at(2026, 5, 20, 19, 0)]
    );
}

#[test]
fn unrecognized_repeat_type_expands_weekly() {
    let template = EventTemplate::new("odd", "Odd cadence", at(2024, 1, 1, 9, 0))
        .repeating(Some(RepeatType::Unrecognized), Some(3));

    let days = days_with_occurrences(&template, date(2024, 1, 1), date(2024, 1, 31));
    assert_eq!(days, vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
}

// ---------------------------------------------------------------------------
// End date
// ---------------------------------------------------------------------------

#[test]
fn end_date_truncates_long_count() {
    let template = EventTemplate::new("camp", "Camp", at(2024, 7, 1, 8, 0))
        .repeating(Some(RepeatType::Daily), Some(100))
        .with_end_date(date(2024, 7, 4));

    let found = occurrences_between(
        &template,
        date(2024, 6, 1),
        date(2024, 12, 31),
        &ExpandOptions::default(),
        &clock(),
    );
    assert_eq!(found.len(), 4, "day 0 through day 3 inclusive");
    assert_eq!(found[3].start_time, at(2024, 7, 4, 8, 0));
}

#[test]
fn occurrence_on_end_date_is_included() {
    // The instance on the end date is late in the day; comparison is by day.
    let template = EventTemplate::new("late", "Late skate", at(2024, 2, 1, 23, 0))
        .repeating(Some(RepeatType::Weekly), Some(10))
        .with_end_date(date(2024, 2, 15));

    let days = days_with_occurrences(&template, date(2024, 2, 1), date(2024, 3, 31));
    assert_eq!(days, vec![date(2024, 2, 1), date(2024, 2, 8), date(2024, 2, 15)]);
}

#[test]
fn count_wins_when_reached_before_end_date() {
    let template = EventTemplate::new("s", "Short", at(2024, 1, 1, 9, 0))
        .repeating(Some(RepeatType::Daily), Some(2))
        .with_end_date(date(2024, 12, 31));

    let days = days_with_occurrences(&template, date(2024, 1, 1), date(2024, 1, 31));
    assert_eq!(days, vec![date(2024, 1, 1), date(2024, 1, 2)]);
}

#[test]
fn end_date_before_start_limits_to_nothing_after_start() {
    let template = EventTemplate::new("b", "Backwards", at(2024, 5, 10, 9, 0))
        .repeating(Some(RepeatType::Daily), Some(10))
        .with_end_date(date(2024, 5, 1));

    let days = days_with_occurrences(&template, date(2024, 4, 1), date(2024, 6, 30));
    assert!(days.len() <= 1);
    assert!(on(&template, date(2024, 5, 11)).is_empty());
}

#[test]
fn repeat_without_count_runs_until_end_date() {
    let template = EventTemplate::new("season", "Season practice", at(2024, 9, 2, 16, 0))
        .repeating(Some(RepeatType::Weekly), None)
        .with_end_date(date(2024, 9, 30));

    let days = days_with_occurrences(&template, date(2024, 9, 1), date(2024, 12, 31));
    assert_eq!(
        days,
        vec![
            date(2024, 9, 2),
            date(2024, 9, 9),
            date(2024, 9, 16),
            date(2024, 9, 23),
            date(2024, 9, 30)
        ]
    );
}

#[test]
fn repeat_without_count_or_end_date_is_capped() {
    let template = EventTemplate::new("forever", "Forever", at(2024, 1, 1, 9, 0))
        .repeating(Some(RepeatType::Daily), None);
    let options = ExpandOptions::default().with_max_instances(10);

    let found = occurrences_between(
        &template,
        date(2024, 1, 1),
        date(2024, 12, 31),
        &options,
        &clock(),
    );
    assert_eq!(found.len(), 10);
    assert_eq!(found.last().map(|o| o.occurrence_number), Some(10));
}

#[test]
fn stored_count_above_instance_cap_is_honored() {
    let start = at(2024, 1, 1, 9, 0);
    let template =
        EventTemplate::new("rehab", "Rehab", start).repeating(Some(RepeatType::Daily), Some(600));
    let day_550 = date(2024, 1, 1) + Duration::days(550);

    let found = on(&template, day_550);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "rehab-550");
    assert_eq!(found[0].occurrence_number, 551);
    assert!(on(&template, date(2024, 1, 1) + Duration::days(600)).is_empty());
}

#[test]
fn weekday_count_above_instance_cap_is_honored() {
    // Mon/Wed/Fri from Monday 2024-01-01, 600 sessions: 200 full weeks.
    let template = EventTemplate::new("gym", "Gym", at(2024, 1, 1, 7, 0))
        .repeating(Some(RepeatType::Weekly), Some(600))
        .with_days_of_week(vec![1, 3, 5]);
    let last_friday = date(2024, 1, 1) + Duration::days(199 * 7 + 4);

    let found = on(&template, last_friday);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, "gym-199-5");
    assert_eq!(found[0].occurrence_number, 600);
    assert!(on(&template, last_friday + Duration::days(3)).is_empty());
}

// ---------------------------------------------------------------------------
// Weekly with specific weekdays
// ---------------------------------------------------------------------------

#[test]
fn weekly_mon_wed_count_four() {
    // 2024-01-01 is a Monday.
    let template = EventTemplate::new("lift", "Lift", at(2024, 1, 1, 6, 30))
        .repeating(Some(RepeatType::Weekly), Some(4))
        .with_days_of_week(vec![1, 3]);

    let found = occurrences_between(
        &template,
        date(2023, 12, 1),
        date(2024, 3, 1),
        &ExpandOptions::default(),
        &clock(),
    );

    let starts: Vec<DateTime<Utc>> = found.iter().map(|o| o.start_time).collect();
    assert_eq!(
        starts,
        vec![
            at(2024, 1, 1, 6, 30),
            at(2024, 1, 3, 6, 30),
            at(2024, 1, 8, 6, 30),
            at(2024, 1, 10, 6, 30)
        ]
    );
    let numbers: Vec<u32> = found.iter().map(|o| o.occurrence_number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4]);
    let ids: Vec<&str> = found.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["lift-0-1", "lift-0-3", "lift-1-1", "lift-1-3"]);
}

#[test]
fn weekly_days_anchor_to_start_of_week() {
    // Starts on Wednesday 2024-01-03; Monday of the same week is still generated.
    let template = EventTemplate::new("w", "Weights", at(2024, 1, 3, 7, 0))
        .repeating(Some(RepeatType::Weekly), Some(3))
        .with_days_of_week(vec![1, 3]);

    let days = days_with_occurrences(&template, date(2023, 12, 25), date(2024, 1, 31));
    assert_eq!(days, vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 8)]);
}

#[test]
fn weekly_days_stop_at_end_date() {
    let template = EventTemplate::new("w", "Weights", at(2024, 1, 1, 7, 0))
        .repeating(Some(RepeatType::Weekly), Some(50))
        .with_days_of_week(vec![1, 3, 5])
        .with_end_date(date(2024, 1, 10));

    let days = days_with_occurrences(&template, date(2024, 1, 1), date(2024, 2, 29));
    assert_eq!(
        days,
        vec![date(2024, 1, 1), date(2024, 1, 3), date(2024, 1, 5), date(2024, 1, 8), date(2024, 1, 10)]
    );
}

#[test]
fn unsorted_weekdays_number_in_stored_order() {
    // Wednesday listed before Monday: numbering follows the stored order.
    let template = EventTemplate::new("u", "Unsorted", at(2024, 1, 1, 7, 0))
        .repeating(Some(RepeatType::Weekly), Some(4))
        .with_days_of_week(vec![3, 1]);

    let monday = on(&template, date(2024, 1, 1));
    let wednesday = on(&template, date(2024, 1, 3));
    assert_eq!(monday[0].occurrence_number, 2);
    assert_eq!(wednesday[0].occurrence_number, 1);
    assert_eq!(monday[0].id, "u-0-1");
}

#[test]
fn weekdays_ignored_for_non_weekly_cadence() {
    let template = EventTemplate::new("d", "Daily", at(2024, 1, 1, 7, 0))
        .repeating(Some(RepeatType::Daily), Some(3))
        .with_days_of_week(vec![5]);

    let days = days_with_occurrences(&template, date(2024, 1, 1), date(2024, 1, 31));
    assert_eq!(days, vec![date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
}

#[test]
fn empty_weekday_list_falls_back_to_plain_weekly() {
    let template = EventTemplate::new("e", "Empty", at(2024, 1, 2, 7, 0))
        .repeating(Some(RepeatType::Weekly), Some(2))
        .with_days_of_week(Vec::new());

    let days = days_with_occurrences(&template, date(2024, 1, 1), date(2024, 1, 31));
    assert_eq!(days, vec![date(2024, 1, 2), date(2024, 1, 9)]);
}

// ---------------------------------------------------------------------------
// Inferred cadence
// ---------------------------------------------------------------------------

#[test]
fn missing_repeat_type_uses_inferred_cadence() {
    let template = EventTemplate::new("legacy", "Morning Practice", at(2024, 1, 1, 6, 0))
        .repeating(None, Some(3));

    let found = on(&template, date(2024, 1, 2));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].repeat_type, Some(RepeatType::Daily));
}

// ---------------------------------------------------------------------------
// Calendar zone and DST
// ---------------------------------------------------------------------------

#[test]
fn calendar_zone_decides_the_day_and_keeps_local_time() {
    // 2024-03-05T02:00Z is the evening of March 4 in Chicago (UTC-6).
    let template = EventTemplate::new("night", "Night game", at(2024, 3, 5, 2, 0))
        .repeating(Some(RepeatType::Weekly), Some(2));
    let options = ExpandOptions::default().with_timezone(chrono_tz::America::Chicago);

    let first = occurrences_on_date(&template, date(2024, 3, 4), &options, &clock());
    assert_eq!(first.len(), 1);
    assert!(occurrences_on_date(&template, date(2024, 3, 5), &options, &clock()).is_empty());

    // DST starts March 10; 20:00 CDT on March 11 is 01:00Z on March 12.
    let second = occurrences_on_date(&template, date(2024, 3, 11), &options, &clock());
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].start_time, at(2024, 3, 12, 1, 0));
}

#[test]
fn dst_gap_policy_controls_missing_local_times() {
    // 02:30 local on 2024-03-10 does not exist in Chicago.
    let template = EventTemplate::new("early", "Early bus", at(2024, 3, 9, 8, 30))
        .repeating(Some(RepeatType::Daily), Some(3));
    let shift = ExpandOptions::default().with_timezone(chrono_tz::America::Chicago);
    let skip = shift.with_dst_policy(DstPolicy::Skip);

    let shifted = occurrences_on_date(&template, date(2024, 3, 10), &shift, &clock());
    assert_eq!(shifted.len(), 1);
    // 03:30 CDT = 08:30Z.
    assert_eq!(shifted[0].start_time, at(2024, 3, 10, 8, 30));

    assert!(occurrences_on_date(&template, date(2024, 3, 10), &skip, &clock()).is_empty());
    // Numbering is unaffected by the skipped instance.
    let after = occurrences_on_date(&template, date(2024, 3, 11), &skip, &clock());
    assert_eq!(after[0].occurrence_number, 3);
}

// ---------------------------------------------------------------------------
// Purity and range consistency
// ---------------------------------------------------------------------------

#[test]
fn repeated_calls_are_identical() {
    let template = EventTemplate::new("lift", "Lift", at(2024, 1, 1, 6, 30))
        .repeating(None, Some(4))
        .with_days_of_week(vec![1, 3]);

    let first = on(&template, date(2024, 1, 3));
    let second = on(&template, date(2024, 1, 3));
    assert_eq!(first, second);
}

#[test]
fn range_agrees_with_per_date_results() {
    let template = EventTemplate::new("mix", "Mixed", at(2024, 1, 1, 6, 30))
        .repeating(Some(RepeatType::Weekly), Some(9))
        .with_days_of_week(vec![5, 1, 3]);
    let from = date(2023, 12, 25);
    let to = date(2024, 2, 10);

    let range = occurrences_between(&template, from, to, &ExpandOptions::default(), &clock());
    let per_day: Vec<EventOccurrence> = from
        .iter_days()
        .take_while(|d| *d <= to)
        .flat_map(|d| on(&template, d))
        .collect();

    let mut range_sorted = range.clone();
    range_sorted.sort_by_key(|o| o.start_time);
    assert_eq!(range_sorted, per_day);
}

#[test]
fn reversed_range_is_empty() {
    let template = EventTemplate::new("d", "Daily", at(2024, 1, 1, 7, 0))
        .repeating(Some(RepeatType::Daily), Some(3));
    let found = occurrences_between(
        &template,
        date(2024, 1, 3),
        date(2024, 1, 1),
        &ExpandOptions::default(),
        &clock(),
    );
    assert!(found.is_empty());
}
