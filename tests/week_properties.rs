//! Property-based tests for the schedule invariants and the text codec.

use proptest::prelude::*;
use weekly_timetable::storage::{decode_text, encode_text};
use weekly_timetable::time::{MINUTES_PER_DAY, format_time, parse_time};
use weekly_timetable::{Day, EventPatch, Week, WeekStart};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_day() -> impl Strategy<Value = Day> {
    (0usize..7).prop_map(|index| Day::from_index(index).expect("index below 7"))
}

/// Intervals that are sometimes invalid so rejected inputs get exercised too.
fn arb_interval() -> impl Strategy<Value = (u32, u32)> {
    (0u32..=MINUTES_PER_DAY, 1u32..=240).prop_map(|(start, length)| (start, start + length))
}

/// Field text, including marker-like prefixes and non-ASCII, but never the
/// delimiter stand-in or a line break.
fn arb_text() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => "[A-Za-z0-9 |@#.:éßü漢字😀-]{0,16}",
        1 => "(DAY:|WEEK_START:)[A-Za-z0-9 :|]{0,10}",
    ]
}

#[derive(Debug, Clone)]
enum Operation {
    Add {
        day: Day,
        title: String,
        location: String,
        interval: (u32, u32),
    },
    Update {
        day: Day,
        pick: usize,
        interval: (u32, u32),
    },
    Delete {
        day: Day,
        pick: usize,
    },
}

fn arb_operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (arb_day(), arb_text(), arb_text(), arb_interval()).prop_map(
            |(day, title, location, interval)| Operation::Add {
                day,
                title,
                location,
                interval,
            }
        ),
        1 => (arb_day(), 0usize..8, arb_interval())
            .prop_map(|(day, pick, interval)| Operation::Update { day, pick, interval }),
        1 => (arb_day(), 0usize..8).prop_map(|(day, pick)| Operation::Delete { day, pick }),
    ]
}

fn apply(week: &mut Week, operation: Operation) {
    match operation {
        Operation::Add {
            day,
            title,
            location,
            interval: (start, end),
        } => {
            let _ = week.add_event(day, title, location, start, end);
        }
        Operation::Update {
            day,
            pick,
            interval: (start, end),
        } => {
            let Some(key) = week.list_day(day).get(pick).map(|event| event.start) else {
                return;
            };
            let patch = EventPatch {
                start: Some(start),
                end: Some(end),
                ..EventPatch::default()
            };
            let before = week.clone();
            if week.update_event(day, key, &patch).is_err() {
                assert_eq!(*week, before, "failed update must not mutate");
            }
        }
        Operation::Delete { day, pick } => {
            if let Some(key) = week.list_day(day).get(pick).map(|event| event.start) {
                week.delete_event(day, key).expect("picked event exists");
            }
        }
    }
}

fn build_week(operations: Vec<Operation>, week_start: WeekStart) -> Week {
    let mut week = Week::new(week_start);
    for operation in operations {
        apply(&mut week, operation);
    }
    week
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn schedules_stay_sorted_and_disjoint(operations in prop::collection::vec(arb_operation(), 0..60)) {
        let week = build_week(operations, WeekStart::Monday);
        for day in Day::ALL {
            let events = week.list_day(day);
            for event in events {
                prop_assert!(event.start < event.end && event.end <= MINUTES_PER_DAY);
            }
            for pair in events.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start, "sorted by start on {day}");
                prop_assert!(pair[0].end <= pair[1].start, "no overlap on {day}");
            }
        }
    }

    #[test]
    fn text_codec_round_trips(
        operations in prop::collection::vec(arb_operation(), 0..40),
        sunday_first in any::<bool>(),
    ) {
        let week_start = if sunday_first { WeekStart::Sunday } else { WeekStart::Monday };
        let week = build_week(operations, week_start);
        let decoded = decode_text(&encode_text(&week), WeekStart::Monday);
        prop_assert_eq!(decoded, week);
    }

    #[test]
    fn formatted_time_reparses_to_same_minute(minutes in 0u32..MINUTES_PER_DAY) {
        let formatted = format_time(minutes);
        prop_assert_eq!(parse_time(&formatted), Some(minutes));
    }

    #[test]
    fn parse_format_parse_is_stable(hour in 0u32..24, minute in 0u32..60, style in 0u8..3) {
        let text = match style {
            0 => format!("{hour}:{minute:02}"),
            1 => format!("{}:{minute:02}{}", if hour % 12 == 0 { 12 } else { hour % 12 }, if hour < 12 { "am" } else { "pm" }),
            _ => format!(" {hour} : {minute:02} "),
        };
        let parsed = parse_time(&text);
        prop_assert_eq!(parsed, Some(hour * 60 + minute));
        let reparsed = parsed.map(format_time).and_then(|canonical| parse_time(&canonical));
        prop_assert_eq!(reparsed, parsed);
    }
}

// ---------------------------------------------------------------------------
// Examples
// ---------------------------------------------------------------------------

#[test]
fn one_malformed_line_among_valid_ones_is_dropped() {
    let raw = "WEEK_START:1\nDAY:Sun\nDAY:Mon\nStandup|540|555|Room A\nStandup|nine|555|Room A\nSync|555|585|Room B\n";
    let week = decode_text(raw, WeekStart::Sunday);
    let titles = week
        .list_day(Day::Mon)
        .iter()
        .map(|event| event.title.clone())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Standup".to_string(), "Sync".to_string()]);
    assert_eq!(week.total_events(), 2);
}

#[test]
fn search_ignores_display_order() {
    let mut week = Week::new(WeekStart::Monday);
    week.add_event(Day::Mon, "Standup", "Room A", 540, 555).unwrap();
    week.add_event(Day::Mon, "Sync", "Room B", 555, 585).unwrap();
    assert!(week.add_event(Day::Mon, "X", "", 550, 560).is_err());

    for week_start in [WeekStart::Monday, WeekStart::Sunday] {
        week.set_week_start(week_start);
        let hits = weekly_timetable::search(&week, "room").unwrap();
        let found = hits
            .iter()
            .map(|hit| (hit.day, hit.event.title.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(found, vec![(Day::Mon, "Standup"), (Day::Mon, "Sync")]);
    }
}
