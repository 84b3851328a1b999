use std::fmt::{Display, Formatter};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time::{format_range, format_time, in_day_range};

pub const DAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid time `{0}` (examples: 9, 9am, 9:30, 14:00, 3:15pm)")]
    InvalidTime(String),
    #[error("invalid time range {}-{}: start must be before end within the same day", clock(.start), clock(.end))]
    InvalidRange { start: u32, end: u32 },
    #[error("overlaps `{title}` ({range})")]
    Overlap { title: String, range: String },
    #[error("no event on {day} starting at {}", clock(.start))]
    NotFound { day: Day, start: u32 },
    #[error("no event at position {0}")]
    MissingIndex(usize),
    #[error("not a valid day: `{0}` (try Mon, Tue, ...)")]
    InvalidDayName(String),
    #[error("empty search keyword")]
    EmptyKeyword,
    #[error("{0} must fit on one line")]
    LineBreak(&'static str),
}

fn clock(minutes: &u32) -> String {
    format_time(*minutes)
}

/// Absolute calendar day. Storage is always Sunday-first regardless of display preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Sun,
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Sun,
        Day::Mon,
        Day::Tue,
        Day::Wed,
        Day::Thu,
        Day::Fri,
        Day::Sat,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Day> {
        Day::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        DAY_NAMES[self.index()]
    }

    /// Strict lookup for user input: the first three characters must match exactly one day.
    pub fn from_name(name: &str) -> Result<Day, ScheduleError> {
        let matches = matching_days(name);
        match matches.as_slice() {
            [day] => Ok(*day),
            _ => Err(ScheduleError::InvalidDayName(name.trim().to_string())),
        }
    }

    pub fn today() -> Day {
        use chrono::Datelike;
        Day::from(chrono::Local::now().weekday())
    }
}

impl From<chrono::Weekday> for Day {
    fn from(weekday: chrono::Weekday) -> Self {
        Day::ALL[weekday.num_days_from_sunday() as usize]
    }
}

impl Display for Day {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Permissive lookup used for persisted day markers: anything that does not
/// name exactly one day resolves to Sunday.
pub fn resolve_day_name(name: &str) -> Day {
    match matching_days(name).as_slice() {
        [day] => *day,
        _ => Day::Sun,
    }
}

fn matching_days(name: &str) -> Vec<Day> {
    let prefix = name.trim().chars().take(3).collect::<String>().to_lowercase();
    if prefix.is_empty() {
        return Vec::new();
    }
    Day::ALL
        .into_iter()
        .filter(|day| day.label().to_lowercase().starts_with(&prefix))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    Sunday,
    #[default]
    Monday,
}

impl WeekStart {
    pub fn first_day(self) -> Day {
        match self {
            WeekStart::Sunday => Day::Sun,
            WeekStart::Monday => Day::Mon,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            WeekStart::Sunday => 0,
            WeekStart::Monday => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<WeekStart> {
        match code {
            0 => Some(WeekStart::Sunday),
            1 => Some(WeekStart::Monday),
            _ => None,
        }
    }

    pub fn toggled(self) -> WeekStart {
        match self {
            WeekStart::Sunday => WeekStart::Monday,
            WeekStart::Monday => WeekStart::Sunday,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub location: String,
}

impl Event {
    pub fn new(title: impl Into<String>, location: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            location: location.into(),
        }
    }

    pub fn overlaps(&self, start: u32, end: u32) -> bool {
        start < self.end && end > self.start
    }

    pub fn location(&self) -> Option<&str> {
        if self.location.is_empty() {
            None
        } else {
            Some(&self.location)
        }
    }

    pub fn time_range(&self) -> String {
        format_range(self.start, self.end)
    }
}

/// Replacement values for an update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub location: Option<String>,
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl EventPatch {
    fn apply_to(&self, event: &Event) -> Event {
        Event {
            title: self.title.clone().unwrap_or_else(|| event.title.clone()),
            start: self.start.unwrap_or(event.start),
            end: self.end.unwrap_or(event.end),
            location: self
                .location
                .clone()
                .unwrap_or_else(|| event.location.clone()),
        }
    }
}

/// Events of one day, sorted by start with no two `[start, end)` intervals overlapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySchedule {
    events: Vec<Event>,
}

impl DaySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn add(&mut self, event: Event) -> Result<usize, ScheduleError> {
        self.validate(event.start, event.end, None)?;
        let index = self
            .events
            .partition_point(|existing| existing.start <= event.start);
        self.events.insert(index, event);
        Ok(index)
    }

    /// Last event in list order whose start equals `start`.
    pub fn find_by_start(&self, start: u32) -> Option<usize> {
        self.events.iter().rposition(|event| event.start == start)
    }

    pub fn update(&mut self, index: usize, patch: &EventPatch) -> Result<(), ScheduleError> {
        let current = self
            .events
            .get(index)
            .ok_or(ScheduleError::MissingIndex(index))?;
        let updated = patch.apply_to(current);
        self.validate(updated.start, updated.end, Some(index))?;

        self.events[index] = updated;
        self.events.sort_by_key(|event| event.start);
        Ok(())
    }

    pub fn delete(&mut self, index: usize) -> Result<Event, ScheduleError> {
        if index >= self.events.len() {
            return Err(ScheduleError::MissingIndex(index));
        }
        Ok(self.events.remove(index))
    }

    pub fn conflict(&self, start: u32, end: u32, skip: Option<usize>) -> Option<&Event> {
        self.events
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != skip)
            .map(|(_, event)| event)
            .find(|event| event.overlaps(start, end))
    }

    fn validate(&self, start: u32, end: u32, skip: Option<usize>) -> Result<(), ScheduleError> {
        if !in_day_range(start, end) {
            return Err(ScheduleError::InvalidRange { start, end });
        }
        if let Some(existing) = self.conflict(start, end, skip) {
            return Err(ScheduleError::Overlap {
                title: existing.title.clone(),
                range: existing.time_range(),
            });
        }
        Ok(())
    }
}

/// The whole timetable: seven day schedules indexed Sunday-first plus the display preference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Week {
    days: [DaySchedule; 7],
    week_start: WeekStart,
}

impl Week {
    pub fn new(week_start: WeekStart) -> Self {
        Self {
            days: Default::default(),
            week_start,
        }
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub fn set_week_start(&mut self, week_start: WeekStart) {
        self.week_start = week_start;
    }

    pub fn day(&self, day: Day) -> &DaySchedule {
        &self.days[day.index()]
    }

    pub(crate) fn day_mut(&mut self, day: Day) -> &mut DaySchedule {
        &mut self.days[day.index()]
    }

    /// Day labels rotated to begin at the week start, paired with their absolute day.
    pub fn display_order(&self) -> [(&'static str, Day); 7] {
        let offset = self.week_start.first_day().index();
        std::array::from_fn(|position| {
            let day = Day::ALL[(offset + position) % 7];
            (day.label(), day)
        })
    }

    pub fn total_events(&self) -> usize {
        self.days.iter().map(DaySchedule::len).sum()
    }

    pub fn add_event(
        &mut self,
        day: Day,
        title: impl Into<String>,
        location: impl Into<String>,
        start: u32,
        end: u32,
    ) -> Result<(), ScheduleError> {
        let event = Event::new(title, location, start, end);
        match self.day_mut(day).add(event) {
            Ok(_) => {
                info!("event=add status=ok day={day} start={start} end={end}");
                Ok(())
            }
            Err(err) => {
                debug!("event=add status=rejected day={day} start={start} end={end} reason=\"{err}\"");
                Err(err)
            }
        }
    }

    pub fn update_event(
        &mut self,
        day: Day,
        start_key: u32,
        patch: &EventPatch,
    ) -> Result<(), ScheduleError> {
        let schedule = self.day_mut(day);
        let index = schedule
            .find_by_start(start_key)
            .ok_or(ScheduleError::NotFound {
                day,
                start: start_key,
            })?;
        schedule.update(index, patch)?;
        info!("event=update status=ok day={day} start_key={start_key}");
        Ok(())
    }

    pub fn delete_event(&mut self, day: Day, start_key: u32) -> Result<Event, ScheduleError> {
        let schedule = self.day_mut(day);
        let index = schedule
            .find_by_start(start_key)
            .ok_or(ScheduleError::NotFound {
                day,
                start: start_key,
            })?;
        let removed = schedule.delete(index)?;
        info!("event=delete status=ok day={day} start_key={start_key}");
        Ok(removed)
    }

    pub fn find_event(&self, day: Day, start_key: u32) -> Option<&Event> {
        let schedule = self.day(day);
        schedule
            .find_by_start(start_key)
            .and_then(|index| schedule.get(index))
    }

    pub fn list_day(&self, day: Day) -> &[Event] {
        self.day(day).list()
    }

    /// Every day in display order with its events.
    pub fn list_week(&self) -> Vec<(Day, &[Event])> {
        self.display_order()
            .into_iter()
            .map(|(_, day)| (day, self.list_day(day)))
            .collect()
    }
}

/// Shortens `text` to at most `max_len` characters, marking truncation with `..`.
pub fn abbreviate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.to_string();
    }
    let keep = max_len.saturating_sub(2).max(1);
    let mut out = text.chars().take(keep).collect::<String>();
    out.push_str("..");
    out
}
