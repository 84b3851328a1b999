use std::env;
use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::Serialize;

use weekly_timetable::config::Settings;
use weekly_timetable::domain::{Day, Event, EventPatch, ScheduleError, Week, WeekStart};
use weekly_timetable::logging::init_logging;
use weekly_timetable::menu::{Menu, write_day, write_search_results, write_week_overview};
use weekly_timetable::search::search;
use weekly_timetable::storage::{load_or_default, load_week, save_week};
use weekly_timetable::time::{format_range, parse_time};
use weekly_timetable::timetables::{RecentTimetables, absolutize, resolve_timetable_path, state_dir};
use weekly_timetable::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "weekly-timetable", version, about = "Weekly timetable manager")]
struct Cli {
	/// Timetable file; `.json` files use the JSON layout
	#[arg(long, global = true)]
	timetable: Option<PathBuf>,
	/// off, error, warn, info, debug or trace
	#[arg(long, global = true)]
	log_level: Option<String>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	/// Interactive numbered menu (default)
	Menu,
	Dashboard,
	Add {
		#[arg(long)]
		day: String,
		#[arg(long)]
		title: String,
		#[arg(long, default_value = "")]
		location: String,
		#[arg(long)]
		start: String,
		#[arg(long)]
		end: String,
	},
	/// Change the event that starts at `--at`; omitted fields keep their value
	Update {
		#[arg(long)]
		day: String,
		#[arg(long)]
		at: String,
		#[arg(long)]
		title: Option<String>,
		#[arg(long)]
		location: Option<String>,
		#[arg(long)]
		start: Option<String>,
		#[arg(long)]
		end: Option<String>,
	},
	Delete {
		#[arg(long)]
		day: String,
		#[arg(long)]
		at: String,
		#[arg(long)]
		yes: bool,
	},
	Week {
		#[arg(long)]
		json: bool,
	},
	Day {
		/// Defaults to today
		#[arg(long)]
		day: Option<String>,
		#[arg(long)]
		json: bool,
	},
	Search {
		#[arg(long)]
		keyword: String,
		#[arg(long)]
		json: bool,
	},
	WeekStart {
		/// sun or mon
		#[arg(long)]
		day: String,
	},
	Export {
		#[arg(long)]
		output: PathBuf,
	},
	Import {
		#[arg(long)]
		input: PathBuf,
	},
	Recent {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

#[derive(Serialize)]
struct DayListing<'a> {
	day: Day,
	events: &'a [Event],
}

fn main() {
	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let settings = Settings::load().unwrap_or_else(|err| {
		eprintln!("warning: {err}; using default settings");
		Settings::default()
	});
	let level = cli
		.log_level
		.clone()
		.or_else(|| env::var("TIMETABLE_LOG").ok())
		.unwrap_or_else(|| settings.log_level.clone());
	let _logger = match init_logging(&level, &state_dir().join("logs")) {
		Ok(handle) => Some(handle),
		Err(err) => {
			eprintln!("warning: logging disabled: {err}");
			None
		}
	};

	let recents = RecentTimetables::in_state_dir();
	match cli.command.unwrap_or(Command::Menu) {
		Command::Recent { limit } => print_recent_timetables(&recents, limit),
		Command::Menu => {
			let week = match cli.timetable {
				Some(path) => {
					let path = absolutize(path);
					let week = load_or_default(&path, settings.week_start)?;
					remember_or_warn(&recents, &path);
					week
				}
				None => Week::new(settings.week_start),
			};
			let stdin = io::stdin();
			let mut menu = Menu::new(stdin.lock(), io::stdout().lock(), week).with_recents(recents);
			menu.run()?;
			Ok(())
		}
		command => run_on_timetable(command, cli.timetable, &settings, &recents),
	}
}

fn run_on_timetable(
	command: Command,
	cli_path: Option<PathBuf>,
	settings: &Settings,
	recents: &RecentTimetables,
) -> Result<(), Box<dyn Error>> {
	let path = resolve_timetable_path(cli_path, recents)?;
	let mut week = load_or_default(&path, settings.week_start)?;
	remember_or_warn(recents, &path);

	let mut stdout = io::stdout().lock();
	match command {
		Command::Dashboard => {
			drop(stdout);
			run_dashboard(&mut week, &path)?;
		}
		Command::Add {
			day,
			title,
			location,
			start,
			end,
		} => {
			let day = parse_day(&day)?;
			let title = single_line("title", &title)?;
			let location = single_line("location", &location)?;
			let start = parse_clock(&start)?;
			let end = parse_clock(&end)?;
			week.add_event(day, title.as_str(), location, start, end)?;
			save_week(&path, &week)?;
			writeln!(stdout, "added {title} on {day} {}", format_range(start, end))?;
		}
		Command::Update {
			day,
			at,
			title,
			location,
			start,
			end,
		} => {
			let day = parse_day(&day)?;
			let start_key = parse_clock(&at)?;
			let patch = EventPatch {
				title: title.as_deref().map(|value| single_line("title", value)).transpose()?,
				location: location.as_deref().map(|value| single_line("location", value)).transpose()?,
				start: start.as_deref().map(parse_clock).transpose()?,
				end: end.as_deref().map(parse_clock).transpose()?,
			};
			week.update_event(day, start_key, &patch)?;
			save_week(&path, &week)?;
			writeln!(stdout, "updated event on {day}")?;
		}
		Command::Delete { day, at, yes } => {
			let day = parse_day(&day)?;
			let start_key = parse_clock(&at)?;
			let Some(event) = week.find_event(day, start_key) else {
				return Err(ScheduleError::NotFound { day, start: start_key }.into());
			};
			if !yes {
				writeln!(
					stdout,
					"delete cancelled: pass --yes to delete {} ({})",
					event.title,
					event.time_range()
				)?;
				return Ok(());
			}
			let removed = week.delete_event(day, start_key)?;
			save_week(&path, &week)?;
			writeln!(stdout, "deleted {} on {day}", removed.title)?;
		}
		Command::Week { json } => {
			if json {
				let listing = week
					.list_week()
					.into_iter()
					.map(|(day, events)| DayListing { day, events })
					.collect::<Vec<_>>();
				writeln!(stdout, "{}", serde_json::to_string_pretty(&listing)?)?;
			} else {
				write_week_overview(&mut stdout, &week)?;
			}
		}
		Command::Day { day, json } => {
			let day = match day {
				Some(raw) => parse_day(&raw)?,
				None => Day::today(),
			};
			let events = week.list_day(day);
			if json {
				writeln!(stdout, "{}", serde_json::to_string_pretty(&DayListing { day, events })?)?;
			} else {
				write_day(&mut stdout, day, events, true)?;
			}
		}
		Command::Search { keyword, json } => match search(&week, &keyword) {
			Err(ScheduleError::EmptyKeyword) => writeln!(stdout, "empty keyword; search cancelled")?,
			Err(err) => return Err(err.into()),
			Ok(hits) if json => writeln!(stdout, "{}", serde_json::to_string_pretty(&hits)?)?,
			Ok(hits) if hits.is_empty() => writeln!(stdout, "no matches")?,
			Ok(hits) => write_search_results(&mut stdout, &hits)?,
		},
		Command::WeekStart { day } => {
			let week_start = parse_week_start(&day)?;
			week.set_week_start(week_start);
			save_week(&path, &week)?;
			writeln!(stdout, "week now starts on {}", week_start.first_day())?;
		}
		Command::Export { output } => {
			save_week(&output, &week)?;
			writeln!(
				stdout,
				"exported {} events to {}",
				week.total_events(),
				output.display()
			)?;
		}
		Command::Import { input } => {
			let imported = load_week(&input, week.week_start())?;
			save_week(&path, &imported)?;
			writeln!(
				stdout,
				"imported {} events into {}",
				imported.total_events(),
				path.display()
			)?;
		}
		Command::Menu | Command::Recent { .. } => {}
	}

	Ok(())
}

fn remember_or_warn(recents: &RecentTimetables, path: &Path) {
	if let Err(err) = recents.remember(path) {
		eprintln!("warning: failed to store recent timetable: {err}");
	}
}

fn print_recent_timetables(recents: &RecentTimetables, limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = recents.list(limit)?;
	if rows.is_empty() {
		println!("no recent timetables");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}

fn parse_day(input: &str) -> Result<Day, ScheduleError> {
	if input.trim().eq_ignore_ascii_case("today") {
		return Ok(Day::today());
	}
	Day::from_name(input)
}

fn parse_clock(input: &str) -> Result<u32, ScheduleError> {
	parse_time(input).ok_or_else(|| ScheduleError::InvalidTime(input.trim().to_string()))
}

/// Trimmed field text; line breaks are rejected since a record is one line on disk.
fn single_line(field: &'static str, value: &str) -> Result<String, ScheduleError> {
	let value = value.trim();
	if value.contains(['\n', '\r']) {
		return Err(ScheduleError::LineBreak(field));
	}
	Ok(value.to_string())
}

fn parse_week_start(input: &str) -> Result<WeekStart, Box<dyn Error>> {
	match input.trim() {
		"0" => return Ok(WeekStart::Sunday),
		"1" => return Ok(WeekStart::Monday),
		_ => {}
	}
	match Day::from_name(input)? {
		Day::Sun => Ok(WeekStart::Sunday),
		Day::Mon => Ok(WeekStart::Monday),
		other => Err(format!("the week can start on Sun or Mon, not {other}").into()),
	}
}
