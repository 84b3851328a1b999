use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::domain::{Day, Event, EventPatch, ScheduleError, Week, WeekStart, abbreviate};
use crate::search::{SearchHit, search};
use crate::storage::{load_week, save_week};
use crate::time::{format_time, parse_time};
use crate::timetables::RecentTimetables;

const PROGRAM_TITLE: &str = "Weekly Timetable Manager";
const RULE_WIDTH: usize = 64;
const OVERVIEW_TITLE_WIDTH: usize = 18;
const OVERVIEW_LOCATION_WIDTH: usize = 12;
const TIME_EXAMPLES: &str = "Examples: 9, 9am, 9:30, 14:00, 3:15pm.";
const RECENT_OFFERED: usize = 5;

/// Interactive prompt loop over an explicitly owned week.
///
/// Nothing is saved unless the user picks "Save"; the week is handed back by
/// [`Menu::into_week`].
pub struct Menu<R, W> {
	input: R,
	output: W,
	week: Week,
	recents: Option<RecentTimetables>,
}

impl<R: BufRead, W: Write> Menu<R, W> {
	pub fn new(input: R, output: W, week: Week) -> Self {
		Self {
			input,
			output,
			week,
			recents: None,
		}
	}

	/// Records saved and loaded files, and offers them again when loading.
	pub fn with_recents(mut self, recents: RecentTimetables) -> Self {
		self.recents = Some(recents);
		self
	}

	pub fn week(&self) -> &Week {
		&self.week
	}

	pub fn into_week(self) -> Week {
		self.week
	}

	/// Runs until the user quits or input ends.
	pub fn run(&mut self) -> io::Result<()> {
		self.print_header()?;
		loop {
			match self.step() {
				Ok(true) => {}
				Ok(false) => break,
				Err(err) if err.kind() == ErrorKind::UnexpectedEof => {
					writeln!(self.output)?;
					break;
				}
				Err(err) => return Err(err),
			}
		}
		writeln!(self.output, "Goodbye!")?;
		self.output.flush()
	}

	fn step(&mut self) -> io::Result<bool> {
		match self.ask_menu_choice()? {
			1 => self.add_event()?,
			2 => self.update_event()?,
			3 => self.delete_event()?,
			4 => write_week_overview(&mut self.output, &self.week)?,
			5 => {
				let day = self.ask_day()?;
				write_day(&mut self.output, day, self.week.list_day(day), true)?;
			}
			6 => self.save_to_file()?,
			7 => self.load_from_file()?,
			8 => self.search_events()?,
			9 => self.set_week_start()?,
			_ => return Ok(false),
		}
		Ok(true)
	}

	fn print_header(&mut self) -> io::Result<()> {
		let rule = "=".repeat(RULE_WIDTH);
		writeln!(self.output, "{rule}")?;
		writeln!(self.output, "{PROGRAM_TITLE}")?;
		writeln!(self.output, "version {}", env!("CARGO_PKG_VERSION"))?;
		writeln!(self.output, "{rule}")
	}

	fn ask_menu_choice(&mut self) -> io::Result<u8> {
		writeln!(
			self.output,
			"Menu:\n  \
			1. Add event\n  \
			2. Update event (by start time)\n  \
			3. Delete event (by start time)\n  \
			4. Print weekly overview\n  \
			5. Print one day (full details)\n  \
			6. Save timetable to file\n  \
			7. Load timetable from file\n  \
			8. Search events (title/location)\n  \
			9. Set week start day (Sun/Mon)\n  \
			0. Quit"
		)?;
		loop {
			let raw = self.prompt("Choose an option (0-9): ")?;
			if raw.is_empty() || !raw.bytes().all(|byte| byte.is_ascii_digit()) {
				writeln!(self.output, "  Please enter a number.")?;
				continue;
			}
			match raw.parse::<u8>() {
				Ok(choice) if choice <= 9 => return Ok(choice),
				_ => writeln!(self.output, "  Please choose a number 0..9.")?,
			}
		}
	}

	fn add_event(&mut self) -> io::Result<()> {
		let day = self.ask_day()?;
		let title = self.prompt("Title: ")?;
		let location = self.prompt("Where (optional): ")?;
		let start = self.ask_time("Start time (e.g., 9am, 13:00): ")?;
		let end = self.ask_time("End time (e.g., 10am, 14:45): ")?;

		match self.week.add_event(day, title, location, start, end) {
			Ok(()) => writeln!(self.output, "  Event added."),
			Err(ScheduleError::InvalidRange { .. }) => writeln!(
				self.output,
				"  Invalid time range. Start must be before end within the same day."
			),
			Err(err @ ScheduleError::Overlap { .. }) => writeln!(
				self.output,
				"  Overlap detected: {err}. Please reschedule."
			),
			Err(err) => writeln!(self.output, "  {err}"),
		}
	}

	fn update_event(&mut self) -> io::Result<()> {
		let day = self.ask_day()?;
		if self.week.day(day).is_empty() {
			return writeln!(self.output, "  No events to update on that day.");
		}
		write_day(&mut self.output, day, self.week.list_day(day), false)?;

		let target = self.ask_time("Enter START time of the event to update: ")?;
		let Some(current) = self.week.find_event(day, target).cloned() else {
			return writeln!(self.output, "  No event found with that start time.");
		};

		writeln!(self.output, "Leave a field empty to keep existing value.")?;
		let title = self.prompt(&format!("New title [{}]: ", current.title))?;
		let location = self.prompt(&format!("New where [{}]: ", current.location))?;
		let raw_start = self.prompt(&format!("New start [{}]: ", format_time(current.start)))?;
		let raw_end = self.prompt(&format!("New end [{}]: ", format_time(current.end)))?;

		let Ok(start) = optional_time(&raw_start) else {
			return writeln!(self.output, "  Invalid new start time. Update cancelled.");
		};
		let Ok(end) = optional_time(&raw_end) else {
			return writeln!(self.output, "  Invalid new end time. Update cancelled.");
		};

		let patch = EventPatch {
			title: non_empty(title),
			location: non_empty(location),
			start,
			end,
		};
		match self.week.update_event(day, target, &patch) {
			Ok(()) => writeln!(self.output, "  Event updated."),
			Err(ScheduleError::InvalidRange { .. }) => {
				writeln!(self.output, "  Invalid time range. Update cancelled.")
			}
			Err(err @ ScheduleError::Overlap { .. }) => {
				writeln!(self.output, "  Overlap detected: {err}. Update cancelled.")
			}
			Err(err) => writeln!(self.output, "  {err}"),
		}
	}

	fn delete_event(&mut self) -> io::Result<()> {
		let day = self.ask_day()?;
		if self.week.day(day).is_empty() {
			return writeln!(self.output, "  No events to delete on that day.");
		}
		write_day(&mut self.output, day, self.week.list_day(day), false)?;

		let target = self.ask_time("Enter START time of the event to delete: ")?;
		if self.week.find_event(day, target).is_none() {
			return writeln!(self.output, "  No event with that start time.");
		}

		let confirm = self.prompt("Confirm delete? (y/n): ")?;
		if !confirm.eq_ignore_ascii_case("y") {
			return writeln!(self.output, "  Delete cancelled.");
		}
		match self.week.delete_event(day, target) {
			Ok(_) => writeln!(self.output, "  Event deleted."),
			Err(err) => writeln!(self.output, "  {err}"),
		}
	}

	fn save_to_file(&mut self) -> io::Result<()> {
		let name = self.prompt("Enter filename to SAVE (e.g., my_timetable.txt): ")?;
		if name.is_empty() {
			return writeln!(self.output, "  Save cancelled.");
		}
		let path = Path::new(&name);
		match save_week(path, &self.week) {
			Ok(()) => {
				self.remember(path);
				writeln!(self.output, "  Saved.")
			}
			Err(err) => writeln!(self.output, "  Error saving file: {err}"),
		}
	}

	fn load_from_file(&mut self) -> io::Result<()> {
		let offered = self.offer_recent()?;
		let label = if offered.is_empty() {
			"Enter filename to LOAD (e.g., my_timetable.txt): "
		} else {
			"Enter filename to LOAD or a number from the list: "
		};
		let name = self.prompt(label)?;
		if name.is_empty() {
			return writeln!(self.output, "  Load cancelled.");
		}

		let path = pick_offered(&offered, &name).unwrap_or_else(|| PathBuf::from(&name));
		match load_week(&path, self.week.week_start()) {
			Ok(week) => {
				self.week = week;
				self.remember(&path);
				writeln!(self.output, "  Loaded timetable.")
			}
			Err(err) => writeln!(self.output, "  Could not open file: {err}"),
		}
	}

	fn offer_recent(&mut self) -> io::Result<Vec<PathBuf>> {
		let Some(recents) = &self.recents else {
			return Ok(Vec::new());
		};
		let offered = match recents.list(RECENT_OFFERED) {
			Ok(offered) => offered,
			Err(err) => {
				warn!("event=recent_timetables status=unreadable reason=\"{err}\"");
				return Ok(Vec::new());
			}
		};
		if !offered.is_empty() {
			writeln!(self.output, "Recent timetables:")?;
			for (position, path) in offered.iter().enumerate() {
				writeln!(self.output, "  {}. {}", position + 1, path.display())?;
			}
		}
		Ok(offered)
	}

	fn remember(&self, path: &Path) {
		if let Some(recents) = &self.recents {
			if let Err(err) = recents.remember(path) {
				warn!("event=remember_timetable status=failed reason=\"{err}\"");
			}
		}
	}

	fn search_events(&mut self) -> io::Result<()> {
		let keyword = self.prompt("Enter keyword to search (title/location): ")?;
		match search(&self.week, &keyword) {
			Ok(hits) if hits.is_empty() => writeln!(self.output, "  No matches."),
			Ok(hits) => write_search_results(&mut self.output, &hits),
			Err(ScheduleError::EmptyKeyword) => {
				writeln!(self.output, "  Empty keyword; search cancelled.")
			}
			Err(err) => writeln!(self.output, "  {err}"),
		}
	}

	fn set_week_start(&mut self) -> io::Result<()> {
		writeln!(self.output, "Choose week start day:\n  1. Sunday\n  2. Monday")?;
		let week_start = loop {
			match self.prompt("Enter 1 or 2: ")?.as_str() {
				"1" => break WeekStart::Sunday,
				"2" => break WeekStart::Monday,
				_ => writeln!(self.output, "  Please enter 1 or 2.")?,
			}
		};
		self.week.set_week_start(week_start);
		info!("event=set_week_start status=ok value={}", week_start.code());
		writeln!(self.output, "  Week start updated.")
	}

	fn ask_day(&mut self) -> io::Result<Day> {
		let order = self.week.display_order();
		writeln!(self.output, "Choose a day:")?;
		for (position, (label, _)) in order.iter().enumerate() {
			writeln!(self.output, "  {}. {label}", position + 1)?;
		}

		loop {
			let raw = self.prompt("Enter number (1-7) or name (e.g., Mon): ")?;
			if !raw.is_empty() && raw.bytes().all(|byte| byte.is_ascii_digit()) {
				match raw.parse::<usize>() {
					Ok(position @ 1..=7) => return Ok(order[position - 1].1),
					_ => writeln!(self.output, "  Out of range. Choose 1..7.")?,
				}
				continue;
			}
			match Day::from_name(&raw) {
				Ok(day) => return Ok(day),
				Err(_) => writeln!(self.output, "  Not a valid day. Try 'Mon', 'Tue', etc.")?,
			}
		}
	}

	fn ask_time(&mut self, label: &str) -> io::Result<u32> {
		loop {
			let raw = self.prompt(label)?;
			match parse_time(&raw) {
				Some(minutes) => return Ok(minutes),
				None => writeln!(self.output, "  Invalid time. {TIME_EXAMPLES}")?,
			}
		}
	}

	fn prompt(&mut self, label: &str) -> io::Result<String> {
		write!(self.output, "{label}")?;
		self.output.flush()?;

		let mut line = String::new();
		if self.input.read_line(&mut line)? == 0 {
			return Err(io::Error::new(ErrorKind::UnexpectedEof, "input closed"));
		}
		Ok(line.trim().to_string())
	}
}

/// A list position (1-based) among the offered recent files.
fn pick_offered(offered: &[PathBuf], input: &str) -> Option<PathBuf> {
	if input.is_empty() || !input.bytes().all(|byte| byte.is_ascii_digit()) {
		return None;
	}
	let position = input.parse::<usize>().ok()?;
	offered.get(position.checked_sub(1)?).cloned()
}

fn non_empty(value: String) -> Option<String> {
	if value.is_empty() { None } else { Some(value) }
}

fn optional_time(raw: &str) -> Result<Option<u32>, ScheduleError> {
	if raw.is_empty() {
		return Ok(None);
	}
	parse_time(raw)
		.map(Some)
		.ok_or_else(|| ScheduleError::InvalidTime(raw.to_string()))
}

/// Weekly overview in display order with abbreviated titles and locations.
pub fn write_week_overview(out: &mut impl Write, week: &Week) -> io::Result<()> {
	writeln!(out, "\n=== Weekly Overview ===")?;
	for (day, events) in week.list_week() {
		writeln!(out, "\n{day}:")?;
		if events.is_empty() {
			writeln!(out, "  (no events)")?;
			continue;
		}
		for event in events {
			let title = abbreviate(&event.title, OVERVIEW_TITLE_WIDTH);
			let location = abbreviate(&event.location, OVERVIEW_LOCATION_WIDTH);
			writeln!(
				out,
				"  {}  {title}{}",
				event.time_range(),
				where_suffix(&location)
			)?;
		}
	}
	writeln!(out)
}

pub fn write_day(out: &mut impl Write, day: Day, events: &[Event], full: bool) -> io::Result<()> {
	writeln!(out, "\n=== {day} ===")?;
	if events.is_empty() {
		return writeln!(out, "  (no events)\n");
	}
	for event in events {
		if full {
			writeln!(
				out,
				"- {}\n  When: {} - {}",
				event.title,
				format_time(event.start),
				format_time(event.end)
			)?;
			if let Some(location) = event.location() {
				writeln!(out, "  Where: {location}")?;
			}
			writeln!(out)?;
		} else {
			writeln!(
				out,
				"  {}  {}{}",
				event.time_range(),
				event.title,
				where_suffix(&event.location)
			)?;
		}
	}
	Ok(())
}

pub fn write_search_results(out: &mut impl Write, hits: &[SearchHit<'_>]) -> io::Result<()> {
	writeln!(out, "\n=== Search Results ===")?;
	for hit in hits {
		writeln!(
			out,
			"{}  {}\n  {}{}",
			hit.day,
			hit.event.time_range(),
			hit.event.title,
			where_suffix(&hit.event.location)
		)?;
	}
	writeln!(out)
}

fn where_suffix(location: &str) -> String {
	if location.is_empty() {
		String::new()
	} else {
		format!(" @ {location}")
	}
}
