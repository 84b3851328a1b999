//! Where timetables live: the state directory, the recently used timetable
//! files, and which timetable a one-shot command works on.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

const APP_DIR_NAME: &str = "weekly_timetable";
const STATE_DIR_ENV: &str = "TIMETABLE_STATE_DIR";
const TIMETABLE_FILE_ENV: &str = "TIMETABLE_FILE";
const RECENT_TIMETABLES_FILE: &str = "recent_timetables.txt";
const MAX_RECENT_TIMETABLES: usize = 50;

#[derive(Debug, Error)]
pub enum TimetablesError {
	#[error("no timetable selected: pass --timetable <path>, set TIMETABLE_FILE, or pick one from `recent`")]
	NotSelected,
	#[error("recent timetables list {}: {source}", .path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Newest-first list of timetable files, one absolute path per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentTimetables {
	file: PathBuf,
}

impl RecentTimetables {
	pub fn in_state_dir() -> Self {
		Self::at(state_dir().join(RECENT_TIMETABLES_FILE))
	}

	pub fn at(file: impl Into<PathBuf>) -> Self {
		Self { file: file.into() }
	}

	/// Up to `limit` entries, newest first. A missing list is empty.
	pub fn list(&self, limit: usize) -> Result<Vec<PathBuf>, TimetablesError> {
		let raw = match fs::read_to_string(&self.file) {
			Ok(raw) => raw,
			Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
			Err(source) => return Err(self.io_error(source)),
		};

		Ok(raw
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.map(PathBuf::from)
			.take(limit)
			.collect())
	}

	pub fn latest(&self) -> Option<PathBuf> {
		self.list(1).ok()?.into_iter().next()
	}

	/// Moves `timetable` to the front, dropping older duplicates and anything past the cap.
	pub fn remember(&self, timetable: &Path) -> Result<(), TimetablesError> {
		let timetable = absolutize(timetable.to_path_buf());
		let rendered = timetable.to_string_lossy();
		if rendered.contains(['\n', '\r']) {
			debug!("event=remember_timetable status=skipped reason=line_break");
			return Ok(());
		}

		let mut entries = self.list(MAX_RECENT_TIMETABLES)?;
		entries.retain(|entry| entry != &timetable);
		entries.insert(0, timetable);
		entries.truncate(MAX_RECENT_TIMETABLES);

		if let Some(parent) = self.file.parent() {
			fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
		}
		let mut contents = entries
			.iter()
			.map(|entry| entry.to_string_lossy().into_owned())
			.collect::<Vec<_>>()
			.join("\n");
		contents.push('\n');
		fs::write(&self.file, contents).map_err(|source| self.io_error(source))
	}

	fn io_error(&self, source: io::Error) -> TimetablesError {
		TimetablesError::Io {
			path: self.file.clone(),
			source,
		}
	}
}

/// Picks the timetable for a one-shot command: the explicit path, then
/// `TIMETABLE_FILE`, then the most recently used file.
pub fn resolve_timetable_path(
	cli_path: Option<PathBuf>,
	recents: &RecentTimetables,
) -> Result<PathBuf, TimetablesError> {
	choose_timetable(cli_path, env::var_os(TIMETABLE_FILE_ENV), recents)
}

fn choose_timetable(
	cli_path: Option<PathBuf>,
	env_path: Option<OsString>,
	recents: &RecentTimetables,
) -> Result<PathBuf, TimetablesError> {
	cli_path
		.or_else(|| env_path.filter(|path| !path.is_empty()).map(PathBuf::from))
		.map(absolutize)
		.or_else(|| recents.latest())
		.ok_or(TimetablesError::NotSelected)
}

/// Directory holding the config file, logs and the recent-timetables list.
pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os(STATE_DIR_ENV) {
		return PathBuf::from(path);
	}

	platform_state_root()
		.map(|root| root.join(APP_DIR_NAME))
		.unwrap_or_else(|| PathBuf::from(format!(".{APP_DIR_NAME}")))
}

fn platform_state_root() -> Option<PathBuf> {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return Some(PathBuf::from(path));
		}
	}

	env::var_os("XDG_STATE_HOME")
		.map(PathBuf::from)
		.or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state")))
}

/// Absolute form of `path`, resolving symlinks when the file already exists.
pub fn absolutize(path: PathBuf) -> PathBuf {
	let absolute = std::path::absolute(&path).unwrap_or(path);
	fs::canonicalize(&absolute).unwrap_or(absolute)
}
