use chrono::{NaiveDate, NaiveDateTime};
use vectal_core::recurrence::{parse_general, ParsedRecurrence};
use vectal_core::{generate_occurrences, next_occurrence, parse, serialize, Frequency};

fn at(year: i32, month: u32, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn shorthand_maps_to_interval_one() {
    for (input, token) in [
        ("daily", "DAILY"),
        ("weekly", "WEEKLY"),
        ("monthly", "MONTHLY"),
        ("yearly", "YEARLY"),
    ] {
        let parsed = parse(input);
        assert!(matches!(parsed, ParsedRecurrence::Shorthand(_)));
        let spec = parsed.spec().unwrap();
        assert_eq!(spec.interval(), 1);
        assert_eq!(spec.frequency().as_rule_token(), token);
    }
}

#[test]
fn general_form_exposes_raw_keys() {
    let parsed = parse("FREQ=DAILY;INTERVAL=2");
    let raw = parsed.raw().expect("general form should keep raw mapping");
    assert_eq!(raw.get("FREQ"), Some("DAILY"));
    assert_eq!(raw.get("INTERVAL"), Some("2"));
    assert_eq!(parsed.spec().map(|spec| spec.interval()), Some(2));
}

#[test]
fn empty_and_invalid_inputs_are_sentinels() {
    assert_eq!(parse(""), ParsedRecurrence::None);
    assert_eq!(parse("INVALID"), ParsedRecurrence::Unparseable);
    assert!(parse("INVALID").spec().is_none());
}

#[test]
fn create_rule_matches_general_form() {
    assert_eq!(serialize(Frequency::Daily, 1), "FREQ=DAILY;INTERVAL=1");
    assert_eq!(serialize(Frequency::Weekly, 2), "FREQ=WEEKLY;INTERVAL=2");
    assert_eq!(serialize(Frequency::Monthly, 1), "FREQ=MONTHLY;INTERVAL=1");

    let raw = parse_general(&serialize(Frequency::Yearly, 7));
    assert_eq!(raw.get("FREQ"), Some("YEARLY"));
    assert_eq!(raw.get("INTERVAL"), Some("7"));
}

#[test]
fn next_occurrence_for_each_frequency() {
    assert_eq!(
        next_occurrence(&at(2024, 1, 1), "FREQ=DAILY;INTERVAL=1", 1),
        Some(at(2024, 1, 2))
    );
    assert_eq!(
        next_occurrence(&at(2024, 1, 1), "FREQ=WEEKLY;INTERVAL=1", 1),
        Some(at(2024, 1, 8))
    );
    assert_eq!(
        next_occurrence(&at(2024, 1, 15), "FREQ=MONTHLY;INTERVAL=1", 1),
        Some(at(2024, 2, 15))
    );
    assert_eq!(
        next_occurrence(&at(2024, 1, 1), "FREQ=YEARLY;INTERVAL=1", 1),
        Some(at(2025, 1, 1))
    );
}

#[test]
fn count_is_measured_from_the_anchor() {
    assert_eq!(
        next_occurrence(&at(2024, 1, 1), "FREQ=DAILY;INTERVAL=1", 3),
        Some(at(2024, 1, 4))
    );

    // Chaining would drift to Mar 29 after the Feb clamp; whole periods do not.
    let rule = "FREQ=MONTHLY;INTERVAL=1";
    let chained = next_occurrence(&next_occurrence(&at(2024, 1, 31), rule, 1).unwrap(), rule, 1);
    assert_eq!(chained, Some(at(2024, 3, 29)));
    assert_eq!(next_occurrence(&at(2024, 1, 31), rule, 2), Some(at(2024, 3, 31)));
}

#[test]
fn invalid_rule_has_no_occurrence() {
    assert_eq!(next_occurrence(&at(2024, 1, 1), "INVALID", 1), None);
    assert_eq!(next_occurrence(&at(2024, 1, 1), "FREQ=HOURLY;INTERVAL=1", 1), None);
}

#[test]
fn generate_daily_occurrences() {
    let occurrences = generate_occurrences(&at(2024, 1, 1), "FREQ=DAILY;INTERVAL=1", 5);
    assert_eq!(occurrences.len(), 5);
    assert_eq!(occurrences[0], at(2024, 1, 2));
    assert_eq!(occurrences[4], at(2024, 1, 6));
}

#[test]
fn generate_weekly_occurrences_is_restartable() {
    let first = generate_occurrences(&at(2024, 1, 1), "FREQ=WEEKLY;INTERVAL=1", 3);
    assert_eq!(first, vec![at(2024, 1, 8), at(2024, 1, 15), at(2024, 1, 22)]);
    let second = generate_occurrences(&at(2024, 1, 1), "FREQ=WEEKLY;INTERVAL=1", 3);
    assert_eq!(first, second);
}

#[test]
fn generate_with_invalid_rule_is_empty() {
    assert!(generate_occurrences(&at(2024, 1, 1), "INVALID", 4).is_empty());
}
