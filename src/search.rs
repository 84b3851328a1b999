use log::debug;
use serde::Serialize;

use crate::domain::{Day, Event, ScheduleError, Week};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit<'a> {
    pub day: Day,
    pub event: &'a Event,
}

/// Case-insensitive substring search over titles and locations.
///
/// Hits are ordered by absolute day (Sunday first) and then start time; the
/// week-start display preference does not affect the order.
pub fn search<'a>(week: &'a Week, keyword: &str) -> Result<Vec<SearchHit<'a>>, ScheduleError> {
    let keyword = keyword.trim().to_lowercase();
    if keyword.is_empty() {
        return Err(ScheduleError::EmptyKeyword);
    }

    let mut hits = Day::ALL
        .into_iter()
        .flat_map(|day| {
            week.list_day(day)
                .iter()
                .map(move |event| SearchHit { day, event })
        })
        .filter(|hit| {
            hit.event.title.to_lowercase().contains(&keyword)
                || hit.event.location.to_lowercase().contains(&keyword)
        })
        .collect::<Vec<_>>();
    hits.sort_by_key(|hit| (hit.day, hit.event.start));

    debug!("event=search keyword_len={} hits={}", keyword.chars().count(), hits.len());
    Ok(hits)
}

#[cfg(test)]
mod tests {
    use crate::domain::{Day, ScheduleError, Week, WeekStart};

    use super::search;

    fn sample_week(week_start: WeekStart) -> Week {
        let mut week = Week::new(week_start);
        week.add_event(Day::Mon, "Sync", "Room B", 555, 585).unwrap();
        week.add_event(Day::Mon, "Standup", "Room A", 540, 555).unwrap();
        week.add_event(Day::Sun, "Brunch", "Cafe", 600, 660).unwrap();
        week.add_event(Day::Sat, "Book club", "Reading ROOM", 1000, 1060).unwrap();
        week
    }

    #[test]
    fn matches_title_or_location_ignoring_case() {
        let week = sample_week(WeekStart::Monday);
        let hits = search(&week, "ROOM").expect("keyword is not empty");
        let titles = hits.iter().map(|hit| hit.event.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Standup", "Sync", "Book club"]);

        let hits = search(&week, "brun").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].day, Day::Sun);
    }

    #[test]
    fn orders_by_absolute_day_regardless_of_week_start() {
        let monday_first = sample_week(WeekStart::Monday);
        let sunday_first = sample_week(WeekStart::Sunday);

        let days = |week: &Week| {
            search(week, "a")
                .unwrap()
                .iter()
                .map(|hit| (hit.day, hit.event.start))
                .collect::<Vec<_>>()
        };
        let expected = vec![(Day::Sun, 600), (Day::Mon, 540), (Day::Sat, 1000)];
        assert_eq!(days(&monday_first), expected);
        assert_eq!(days(&sunday_first), expected);
    }

    #[test]
    fn empty_keyword_is_rejected() {
        let week = sample_week(WeekStart::Monday);
        assert_eq!(search(&week, "   "), Err(ScheduleError::EmptyKeyword));
        assert!(search(&week, "nothing like this").unwrap().is_empty());
    }
}
