//! Weekly timetable: day-partitioned events with overlap checking, a flat-file
//! format, and the menu, CLI and dashboard front ends built on top of them.

pub mod config;
pub mod domain;
pub mod logging;
pub mod menu;
pub mod search;
pub mod storage;
pub mod time;
pub mod timetables;
pub mod ui;

pub use domain::{Day, DaySchedule, Event, EventPatch, ScheduleError, Week, WeekStart};
pub use search::{SearchHit, search};
pub use storage::{StorageError, load_week, save_week};
pub use time::{format_time, in_day_range, parse_time};
