use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Day, Event, Week, WeekStart, resolve_day_name};
use crate::time::parse_digits;

const WEEK_START_PREFIX: &str = "WEEK_START:";
const DAY_PREFIX: &str = "DAY:";
const FIELD_DELIMITER: char = '|';
const DELIMITER_STAND_IN: char = '\u{FF0F}';

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse JSON timetable: {0}")]
    JsonDecode(#[source] serde_json::Error),
    #[error("failed to encode JSON timetable: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

impl StorageError {
    fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimetableFormat {
    /// `WEEK_START:` / `DAY:` sections with `|`-separated event records.
    Text,
    Json,
}

impl TimetableFormat {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|extension| extension.to_str()) {
            Some(extension) if extension.eq_ignore_ascii_case("json") => TimetableFormat::Json,
            _ => TimetableFormat::Text,
        }
    }
}

/// Reads a timetable. The returned week replaces the caller's only on success;
/// `current_week_start` is kept when the file does not carry a valid preference.
pub fn load_week(path: &Path, current_week_start: WeekStart) -> Result<Week, StorageError> {
    let raw = fs::read_to_string(path).map_err(|err| StorageError::io(path, err))?;
    let week = match TimetableFormat::for_path(path) {
        TimetableFormat::Text => decode_text(&raw, current_week_start),
        TimetableFormat::Json => decode_json(&raw)?,
    };
    info!(
        "event=load status=ok path={} events={}",
        path.display(),
        week.total_events()
    );
    Ok(week)
}

/// Like [`load_week`], but a missing file yields an empty week.
pub fn load_or_default(path: &Path, default_week_start: WeekStart) -> Result<Week, StorageError> {
    match load_week(path, default_week_start) {
        Err(StorageError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            debug!("event=load status=missing path={}", path.display());
            Ok(Week::new(default_week_start))
        }
        other => other,
    }
}

/// Writes through a temporary sibling file so a failed save never truncates the target.
pub fn save_week(path: &Path, week: &Week) -> Result<(), StorageError> {
    let contents = match TimetableFormat::for_path(path) {
        TimetableFormat::Text => encode_text(week),
        TimetableFormat::Json => encode_json(week)?,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
        }
    }

    let tmp_path = temporary_path(path);
    if let Err(err) = fs::write(&tmp_path, contents) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::io(path, err));
    }
    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::io(path, err));
    }

    info!(
        "event=save status=ok path={} events={}",
        path.display(),
        week.total_events()
    );
    Ok(())
}

fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

pub fn encode_text(week: &Week) -> String {
    let mut out = format!("{WEEK_START_PREFIX}{}\n", week.week_start().code());
    for day in Day::ALL {
        out.push_str(&format!("{DAY_PREFIX}{}\n", day.label()));
        for event in week.list_day(day) {
            out.push_str(&format!(
                "{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}\n",
                escape_field(&event.title),
                event.start,
                event.end,
                escape_field(&event.location)
            ));
        }
    }
    out
}

/// Best-effort decode: malformed, out-of-range and overlapping records are skipped.
pub fn decode_text(raw: &str, current_week_start: WeekStart) -> Week {
    let mut week = Week::new(current_week_start);
    let mut current_day: Option<Day> = None;
    let mut skipped = 0usize;

    for (line_number, line) in raw.lines().enumerate() {
        // Marker lines never carry the field delimiter; records may start with marker text.
        let is_record = line.contains(FIELD_DELIMITER);
        if !is_record && line.starts_with(WEEK_START_PREFIX) {
            let value = line.split(':').nth(1).unwrap_or_default().trim();
            if let Some(week_start) = parse_digits(value)
                .and_then(|code| u8::try_from(code).ok())
                .and_then(WeekStart::from_code)
            {
                week.set_week_start(week_start);
            }
        } else if !is_record && line.starts_with(DAY_PREFIX) {
            let name = line.split(':').nth(1).unwrap_or_default();
            current_day = Some(resolve_day_name(name));
        } else if let Some(day) = current_day {
            if !is_record {
                continue;
            }
            let Some(event) = parse_record(line) else {
                skipped += 1;
                debug!("event=load_record status=malformed line={}", line_number + 1);
                continue;
            };
            if let Err(err) = week.day_mut(day).add(event) {
                skipped += 1;
                debug!(
                    "event=load_record status=rejected line={} reason=\"{err}\"",
                    line_number + 1
                );
            }
        }
    }

    if skipped > 0 {
        warn!("event=load skipped_records={skipped}");
    }
    week
}

fn parse_record(line: &str) -> Option<Event> {
    let fields = line.split(FIELD_DELIMITER).collect::<Vec<_>>();
    let [title, start, end, location] = fields.as_slice() else {
        return None;
    };
    Some(Event::new(
        restore_field(title),
        restore_field(location),
        parse_digits(start)?,
        parse_digits(end)?,
    ))
}

fn escape_field(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            FIELD_DELIMITER => DELIMITER_STAND_IN,
            '\r' | '\n' => ' ',
            other => other,
        })
        .collect()
}

fn restore_field(text: &str) -> String {
    text.replace(DELIMITER_STAND_IN, "|")
}

#[derive(Debug, Serialize, Deserialize)]
struct WeekDocument {
    week_start: WeekStart,
    #[serde(default)]
    days: BTreeMap<Day, Vec<Event>>,
}

fn encode_json(week: &Week) -> Result<String, StorageError> {
    let document = WeekDocument {
        week_start: week.week_start(),
        days: Day::ALL
            .into_iter()
            .map(|day| (day, week.list_day(day).to_vec()))
            .collect(),
    };
    let mut out = serde_json::to_string_pretty(&document).map_err(StorageError::JsonEncode)?;
    out.push('\n');
    Ok(out)
}

fn decode_json(raw: &str) -> Result<Week, StorageError> {
    let document: WeekDocument = serde_json::from_str(raw).map_err(StorageError::JsonDecode)?;
    let mut week = Week::new(document.week_start);
    for (day, events) in document.days {
        for event in events {
            if let Err(err) = week.day_mut(day).add(event) {
                warn!("event=load_record status=rejected day={day} reason=\"{err}\"");
            }
        }
    }
    Ok(week)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use crate::domain::{Day, Week, WeekStart};

    use super::{StorageError, decode_text, encode_text, load_or_default, load_week, save_week};

    fn sample_week() -> Week {
        let mut week = Week::new(WeekStart::Sunday);
        week.add_event(Day::Mon, "Standup", "Room A", 540, 555).unwrap();
        week.add_event(Day::Mon, "Sync", "Room B", 555, 585).unwrap();
        week.add_event(Day::Fri, "Pipes | and more", "A|B", 1200, 1260).unwrap();
        week
    }

    #[test]
    fn encodes_fixed_sunday_first_layout() {
        let encoded = encode_text(&sample_week());
        let expected = "WEEK_START:0\n\
DAY:Sun\n\
DAY:Mon\n\
Standup|540|555|Room A\n\
Sync|555|585|Room B\n\
DAY:Tue\n\
DAY:Wed\n\
DAY:Thu\n\
DAY:Fri\n\
Pipes \u{FF0F} and more|1200|1260|A\u{FF0F}B\n\
DAY:Sat\n";
        assert_eq!(encoded, expected);
    }

    #[test]
    fn round_trips_text_and_json_files() {
        let dir = TempDir::new().expect("temp dir");
        let week = sample_week();
        for name in ["week.txt", "week.json"] {
            let path = dir.path().join(name);
            save_week(&path, &week).expect("save should succeed");
            let loaded = load_week(&path, WeekStart::Monday).expect("load should succeed");
            assert_eq!(loaded, week, "{name} should round-trip");
            assert!(!dir.path().join(format!("{name}.tmp")).exists());
        }
    }

    #[test]
    fn skips_malformed_and_conflicting_records() {
        let raw = "WEEK_START:1\n\
DAY:Mon\n\
Standup|540|555|Room A\n\
broken line without enough|fields\n\
Clash|545|600|\n\
Backwards|700|600|\n\
Signed|+5|60|\n\
\n\
Sync|555|585|Room B\n\
DAY:tuesday\n\
Lunch|720|780|\n";
        let week = decode_text(raw, WeekStart::Sunday);
        assert_eq!(week.week_start(), WeekStart::Monday);
        let titles = week
            .list_day(Day::Mon)
            .iter()
            .map(|event| event.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Standup", "Sync"]);
        assert_eq!(week.list_day(Day::Tue).len(), 1);
    }

    #[test]
    fn titles_that_look_like_markers_stay_records() {
        let mut week = Week::new(WeekStart::Sunday);
        week.add_event(Day::Wed, "DAY:Off planning", "", 540, 600).unwrap();
        week.add_event(Day::Wed, "Lunch", "WEEK_START:1", 720, 780).unwrap();
        week.add_event(Day::Wed, "WEEK_START:1", "DAY:Mon", 800, 860).unwrap();

        let decoded = decode_text(&encode_text(&week), WeekStart::Monday);
        assert_eq!(decoded, week);
        assert_eq!(decoded.week_start(), WeekStart::Sunday);
        assert!(decoded.list_day(Day::Sun).is_empty());
        assert!(decoded.list_day(Day::Mon).is_empty());
    }

    #[test]
    fn keeps_existing_week_start_when_header_is_invalid() {
        let week = decode_text("WEEK_START:7\nDAY:Sun\n", WeekStart::Sunday);
        assert_eq!(week.week_start(), WeekStart::Sunday);
        let week = decode_text("WEEK_START:x\n", WeekStart::Monday);
        assert_eq!(week.week_start(), WeekStart::Monday);
    }

    #[test]
    fn records_before_any_day_marker_are_ignored() {
        let week = decode_text("Orphan|540|600|\nDAY:Wed\nKept|540|600|\n", WeekStart::Monday);
        assert_eq!(week.total_events(), 1);
        assert_eq!(week.list_day(Day::Wed)[0].title, "Kept");
    }

    #[test]
    fn unknown_day_markers_fall_back_to_sunday() {
        let week = decode_text("DAY:Someday\nParty|1200|1300|\n", WeekStart::Monday);
        assert_eq!(week.list_day(Day::Sun).len(), 1);
    }

    #[test]
    fn missing_file_is_an_io_error_unless_defaulted() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("absent.txt");
        assert!(matches!(
            load_week(&path, WeekStart::Monday),
            Err(StorageError::Io { .. })
        ));
        let week = load_or_default(&path, WeekStart::Sunday).expect("missing file is empty");
        assert_eq!(week, Week::new(WeekStart::Sunday));
    }

    #[test]
    fn failed_save_leaves_previous_file_intact() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("week.txt");
        save_week(&path, &sample_week()).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let blocked = dir.path().join("week.txt").join("child.txt");
        assert!(save_week(&blocked, &Week::default()).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn invalid_json_is_reported() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("week.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_week(&path, WeekStart::Monday),
            Err(StorageError::JsonDecode(_))
        ));
    }
}
