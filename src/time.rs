//! Conversion between human clock text and minutes since midnight.

pub const MINUTES_PER_DAY: u32 = 24 * 60;

const LAST_MINUTE: u32 = MINUTES_PER_DAY - 1;

/// Parses `9`, `9am`, `9:30`, `14:00`, `3:15 PM` and similar into minutes since midnight.
///
/// Without an `am`/`pm` suffix the hour is read on a 24-hour clock.
pub fn parse_time(text: &str) -> Option<u32> {
    let normalized = text.trim().to_lowercase().replace(' ', "");
    if normalized.is_empty() {
        return None;
    }

    let (clock, meridiem) = if let Some(clock) = normalized.strip_suffix("am") {
        (clock, Some(Meridiem::Am))
    } else if let Some(clock) = normalized.strip_suffix("pm") {
        (clock, Some(Meridiem::Pm))
    } else {
        (normalized.as_str(), None)
    };

    let (hour, minute) = match clock.split_once(':') {
        Some((hour, minute)) => {
            if minute.contains(':') {
                return None;
            }
            (parse_digits(hour)?, parse_digits(minute)?)
        }
        None => (parse_digits(clock)?, 0),
    };

    if minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(meridiem) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match meridiem {
                Meridiem::Am if hour == 12 => 0,
                Meridiem::Am => hour,
                Meridiem::Pm if hour == 12 => 12,
                Meridiem::Pm => hour + 12,
            }
        }
        None => {
            if hour > 23 {
                return None;
            }
            hour
        }
    };

    Some(hour * 60 + minute)
}

/// Renders minutes as `h:mmam`/`h:mmpm`, clamping to the last minute of the day.
pub fn format_time(minutes: u32) -> String {
    let minutes = minutes.min(LAST_MINUTE);
    let hour = minutes / 60;
    let minute = minutes % 60;
    let suffix = if hour < 12 { "am" } else { "pm" };
    let hour12 = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{hour12}:{minute:02}{suffix}")
}

pub fn format_range(start: u32, end: u32) -> String {
    format!("{}-{}", format_time(start), format_time(end))
}

pub fn in_day_range(start: u32, end: u32) -> bool {
    start < end && end <= MINUTES_PER_DAY
}

/// Parses a non-empty run of ASCII digits. Signs, whitespace and overflow are rejected.
pub(crate) fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[derive(Clone, Copy)]
enum Meridiem {
    Am,
    Pm,
}

#[cfg(test)]
mod tests {
    use super::{format_range, format_time, in_day_range, parse_time};

    #[test]
    fn parses_documented_examples() {
        assert_eq!(parse_time("9"), Some(540));
        assert_eq!(parse_time("9am"), Some(540));
        assert_eq!(parse_time("9pm"), Some(1260));
        assert_eq!(parse_time("12am"), Some(0));
        assert_eq!(parse_time("12pm"), Some(720));
        assert_eq!(parse_time("25"), None);
    }

    #[test]
    fn accepts_spacing_case_and_colons() {
        assert_eq!(parse_time("  3:15 PM "), Some(15 * 60 + 15));
        assert_eq!(parse_time("14:00"), Some(840));
        assert_eq!(parse_time("09:05"), Some(545));
        assert_eq!(parse_time("0"), Some(0));
        assert_eq!(parse_time("23:59"), Some(1439));
        assert_eq!(parse_time("12:30am"), Some(30));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in [
            "", "   ", "am", "13pm", "0am", "9:60", "24", "9:3:0", ":30", "9:", "-1", "+9",
            "nine", "9.30", "99999999999999999999",
        ] {
            assert_eq!(parse_time(text), None, "{text:?} should be rejected");
        }
    }

    #[test]
    fn formats_twelve_hour_clock() {
        assert_eq!(format_time(0), "12:00am");
        assert_eq!(format_time(540), "9:00am");
        assert_eq!(format_time(725), "12:05pm");
        assert_eq!(format_time(1260), "9:00pm");
        assert_eq!(format_time(1440), "11:59pm");
        assert_eq!(format_range(540, 555), "9:00am-9:15am");
    }

    #[test]
    fn day_range_is_half_open_on_the_day() {
        assert!(in_day_range(0, 1440));
        assert!(in_day_range(540, 541));
        assert!(!in_day_range(600, 600));
        assert!(!in_day_range(700, 600));
        assert!(!in_day_range(0, 1441));
    }
}
