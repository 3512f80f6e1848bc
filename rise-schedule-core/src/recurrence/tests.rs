use super::*;
use chrono::{DateTime, Utc, Weekday};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap().and_utc()
}

fn spec(day: &str, start: Option<&str>, end: Option<&str>, from: &str, to: &str) -> ScheduleSpec {
    ScheduleSpec {
        day: day.to_string(),
        start_date: start.map(str::to_string),
        end_date: end.map(str::to_string),
        start_time: from.to_string(),
        end_time: to.to_string(),
    }
}

fn today() -> NaiveDate {
    date(2025, 3, 1)
}

#[test]
fn mondays_in_range_including_both_ends() {
    let occurrences = expand(
        &spec("MONDAY", Some("2025-01-06"), Some("2025-01-20"), "09:00", "10:00"),
        today(),
    )
    .unwrap();

    assert_eq!(
        occurrences,
        vec![
            Occurrence {
                start_at: at(2025, 1, 6, 9, 0),
                end_at: at(2025, 1, 6, 10, 0),
            },
            Occurrence {
                start_at: at(2025, 1, 13, 9, 0),
                end_at: at(2025, 1, 13, 10, 0),
            },
            Occurrence {
                start_at: at(2025, 1, 20, 9, 0),
                end_at: at(2025, 1, 20, 10, 0),
            },
        ]
    );
}

#[test]
fn start_after_target_weekday_skips_to_next_week() {
    let occurrences = expand(
        &spec("MONDAY", Some("2025-01-07"), Some("2025-01-20"), "09:00", "10:00"),
        today(),
    )
    .unwrap();

    let dates: Vec<_> = occurrences.iter().map(Occurrence::date).collect();
    assert_eq!(dates, vec![date(2025, 1, 13), date(2025, 1, 20)]);
}

#[test]
fn every_matching_date_is_produced_exactly_once() {
    let start = date(2025, 2, 1);
    let end = date(2025, 4, 30);

    for day in DayOfWeek::ALL {
        let rule = RecurrenceRule::new(
            day,
            start,
            Some(end),
            TimeOfDay::from_hm(18, 30).unwrap(),
            TimeOfDay::from_hm(19, 30).unwrap(),
        );
        let produced: Vec<_> = rule.occurrences().map(|o| o.date()).collect();
        let expected: Vec<_> = start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| d.weekday() == Weekday::from(day))
            .collect();

        assert_eq!(produced, expected, "mismatch for {day}");
    }
}

#[test]
fn missing_end_defaults_to_five_months() {
    assert_eq!(default_end(date(2025, 1, 15)), date(2025, 6, 15));
    assert_eq!(default_end(date(2025, 1, 31)), date(2025, 6, 30));

    let rule = RecurrenceRule::from_spec(
        &spec("Wednesday", Some("2025-01-15"), None, "09:00", "10:00"),
        today(),
    )
    .unwrap();
    assert_eq!(rule.end, date(2025, 6, 15));

    let last = rule.expand().last().copied().unwrap();
    assert_eq!(last.date(), date(2025, 6, 11));
}

#[test]
fn empty_dates_count_as_absent() {
    let rule = RecurrenceRule::from_spec(
        &spec("Saturday", Some(""), Some(""), "09:00", "10:00"),
        today(),
    )
    .unwrap();

    assert_eq!(rule.start, today());
    assert_eq!(rule.end, date(2025, 8, 1));
}

#[test]
fn missing_start_uses_injected_today() {
    let spec = spec("Saturday", None, Some("2025-03-15"), "09:00", "10:00");

    let first = expand(&spec, date(2025, 3, 1)).unwrap();
    assert_eq!(first.len(), 3);
    assert_eq!(first[0].start_at, at(2025, 3, 1, 9, 0));

    let later = expand(&spec, date(2025, 3, 9)).unwrap();
    assert_eq!(later.len(), 1);
    assert_eq!(later[0].start_at, at(2025, 3, 15, 9, 0));
}

#[test]
fn inverted_range_yields_nothing() {
    let rule = RecurrenceRule::from_spec(
        &spec("Monday", Some("2025-01-20"), Some("2025-01-06"), "09:00", "10:00"),
        today(),
    )
    .unwrap();

    assert!(rule.expand().is_empty());
    assert_eq!(rule.occurrences().len(), 0);
    assert_eq!(
        rule.validate(),
        Err(RecurrenceError::InvertedRange {
            start: date(2025, 1, 20),
            end: date(2025, 1, 6),
        })
    );
}

#[test]
fn malformed_time_rejects_rule() {
    let result = expand(
        &spec("Monday", Some("2025-01-06"), Some("2025-01-20"), "25:99", "10:00"),
        today(),
    );
    assert!(matches!(
        result,
        Err(RecurrenceError::InvalidTime {
            field: TimeField::Start,
            ..
        })
    ));

    let result = expand(
        &spec("Monday", Some("2025-01-06"), Some("2025-01-20"), "09:00", "late"),
        today(),
    );
    assert!(matches!(
        result,
        Err(RecurrenceError::InvalidTime {
            field: TimeField::End,
            ..
        })
    ));
}

#[test]
fn malformed_day_and_date_reject_rule() {
    assert_eq!(
        expand(&spec("Funday", None, None, "09:00", "10:00"), today()),
        Err(RecurrenceError::InvalidDay("Funday".to_string()))
    );
    assert_eq!(
        expand(&spec("Monday", Some("2025/01/06"), None, "09:00", "10:00"), today()),
        Err(RecurrenceError::InvalidDate("2025/01/06".to_string()))
    );
}

#[test]
fn expansion_is_deterministic_and_restartable() {
    let rule = RecurrenceRule::from_spec(
        &spec("friday", Some("2025-05-01"), Some("2025-07-31"), "17:30", "18:30"),
        today(),
    )
    .unwrap();

    let iter = rule.occurrences();
    let replay = iter.clone();
    assert_eq!(iter.collect::<Vec<_>>(), replay.collect::<Vec<_>>());
    assert_eq!(rule.expand(), rule.expand());
}

#[test]
fn size_hint_is_exact() {
    let rule = RecurrenceRule::from_spec(
        &spec("Tuesday", Some("2025-01-01"), Some("2025-03-31"), "09:00", "10:00"),
        today(),
    )
    .unwrap();

    let mut iter = rule.occurrences();
    let total = iter.len();
    assert_eq!(total, 12);

    iter.next();
    assert_eq!(iter.len(), total - 1);
    assert_eq!(iter.count(), total - 1);
}

#[test]
fn single_day_range_matches_only_its_weekday() {
    let tuesday = expand(
        &spec("Tuesday", Some("2025-04-22"), Some("2025-04-22"), "10:00", "15:30"),
        today(),
    )
    .unwrap();
    assert_eq!(
        tuesday,
        vec![Occurrence {
            start_at: at(2025, 4, 22, 10, 0),
            end_at: at(2025, 4, 22, 15, 30),
        }]
    );

    let wednesday = expand(
        &spec("Wednesday", Some("2025-04-22"), Some("2025-04-22"), "10:00", "15:30"),
        today(),
    )
    .unwrap();
    assert!(wednesday.is_empty());
}

#[test]
fn offset_times_land_in_utc() {
    let occurrences = expand(
        &spec("Monday", Some("2025-01-06"), Some("2025-01-06"), "09:00:00-07:00", "10:00:00-07:00"),
        today(),
    )
    .unwrap();

    assert_eq!(occurrences[0].start_at, at(2025, 1, 6, 16, 0));
    assert_eq!(occurrences[0].end_at, at(2025, 1, 6, 17, 0));
}

#[test]
fn offset_crossing_midnight_moves_the_utc_date() {
    let occurrences = expand(
        &spec("Monday", Some("2025-01-06"), Some("2025-01-06"), "17:00:00-07:00", "19:00:00-07:00"),
        today(),
    )
    .unwrap();

    assert_eq!(occurrences.len(), 1);
    assert_eq!(occurrences[0].start_at, at(2025, 1, 7, 0, 0));
    assert_eq!(occurrences[0].end_at, at(2025, 1, 7, 2, 0));

    let occurrences = expand(
        &spec("Monday", Some("2025-01-06"), Some("2025-01-06"), "01:00:00+09:00", "02:00:00+09:00"),
        today(),
    )
    .unwrap();

    assert_eq!(occurrences[0].start_at, at(2025, 1, 5, 16, 0));
}

#[test]
fn batch_keeps_siblings_of_a_broken_rule() {
    let specs = vec![
        spec("Monday", Some("2025-01-06"), Some("2025-01-20"), "09:00", "10:00"),
        spec("Tuesday", Some("2025-01-06"), Some("2025-01-20"), "25:99", "10:00"),
        spec("Friday", Some("2025-01-06"), Some("2025-01-20"), "12:00", "13:00"),
    ];

    let batch = expand_batch(&specs, today());

    assert!(!batch.is_clean());
    assert_eq!(batch.results().len(), 3);
    assert_eq!(batch.occurrences().count(), 5);

    let errors: Vec<_> = batch.errors().map(|(idx, _)| idx).collect();
    assert_eq!(errors, vec![1]);
}

#[test]
fn batch_of_valid_but_empty_rules_is_clean() {
    let specs = vec![spec(
        "Sunday",
        Some("2025-01-06"),
        Some("2025-01-10"),
        "09:00",
        "10:00",
    )];

    let batch = expand_batch(&specs, today());

    assert!(batch.is_clean());
    assert_eq!(batch.occurrences().count(), 0);
}
