use std::error::Error;
use std::io;
use std::path::Path;
use std::time::Duration as StdDuration;

use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use crate::domain::{Day, Event, EventPatch, Week};
use crate::search::search;
use crate::storage::save_week;
use crate::time::{format_time, parse_time};

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);
const TODAY_COLOR: Color = Color::LightGreen;

pub fn run_dashboard(week: &mut Week, timetable_path: &Path) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, week, timetable_path);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	week: &mut Week,
	timetable_path: &Path,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(timetable_path);

	loop {
		let view = build_view(&app, week);
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, week, &view))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code, week),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, week),
					InputMode::Normal => handle_normal_key(&mut app, key.code, week, timetable_path, &view),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn draw_dashboard(frame: &mut Frame, app: &App, week: &Week, view: &ViewModel) {
	let layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([Constraint::Min(10), Constraint::Length(5)])
		.split(frame.area());

	let body = Layout::default()
		.direction(Direction::Horizontal)
		.constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
		.split(layout[0]);

	render_days_panel(frame, body[0], app, week, view);
	render_selected_day_panel(frame, body[1], app, view);
	render_footer(frame, layout[1], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_days_panel(frame: &mut Frame, area: Rect, app: &App, week: &Week, view: &ViewModel) {
	let items = view
		.day_rows
		.iter()
		.map(|row| {
			let marker = if row.day == view.today { "*" } else { " " };
			let style = if row.day == view.today {
				Style::default().fg(TODAY_COLOR)
			} else {
				Style::default()
			};
			let count = match row.event_count {
				0 => "-".to_string(),
				1 => "1 event".to_string(),
				count => format!("{count} events"),
			};
			ListItem::new(Line::from(vec![
				Span::styled(format!("{marker}{} ", row.label), style),
				Span::styled(count, Style::default().fg(Color::DarkGray)),
			]))
		})
		.collect::<Vec<_>>();

	let mut state = ListState::default();
	state.select(view.day_rows.iter().position(|row| row.day == app.selected_day));

	let title = format!("Week (starts {})", week.week_start().first_day());
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(false)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_selected_day_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let mut items = view
		.events
		.iter()
		.map(|event| ListItem::new(render_event_line(event)))
		.collect::<Vec<_>>();

	if items.is_empty() {
		items.push(ListItem::new("(no events)"));
	}

	let mut state = ListState::default();
	if !view.events.is_empty() {
		state.select(Some(app.event_index.min(view.events.len() - 1)));
	}

	let title = format!(
		"{} | {} | {}{}",
		app.selected_day,
		match view.events.len() {
			1 => "1 event".to_string(),
			count => format!("{count} events"),
		},
		app.timetable_name,
		if app.dirty { " [modified]" } else { "" }
	);
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(true)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_event_line(event: &Event) -> Line<'static> {
	let mut spans = vec![
		Span::styled(
			format!("{:>7}-{:<7}", format_time(event.start), format_time(event.end)),
			Style::default().fg(Color::Cyan),
		),
		Span::raw(format!(" {}", event.title)),
	];
	if let Some(location) = event.location() {
		spans.push(Span::styled(
			format!(" @ {location}"),
			Style::default().fg(Color::DarkGray),
		));
	}
	Line::from(spans)
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from("h/l or left/right day | j/k or up/down event | t today | w toggle week start"),
			Line::from("a add | e edit | d delete | / search | s save | q quit (Q discards changes)"),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
			Line::from(app.status.clone()),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(Direction::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(Direction::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	week: &mut Week,
	timetable_path: &Path,
	view: &ViewModel,
) -> bool {
	let quit_armed = std::mem::take(&mut app.quit_armed);
	match code {
		KeyCode::Char('q') => {
			if app.dirty && !quit_armed {
				app.quit_armed = true;
				app.status = "Unsaved changes: s to save, q again or Q to quit without saving".to_string();
				return false;
			}
			return true;
		}
		KeyCode::Char('Q') => return true,
		KeyCode::Left | KeyCode::Char('h') => app.shift_selected_day(-1, week),
		KeyCode::Right | KeyCode::Char('l') => app.shift_selected_day(1, week),
		KeyCode::Up | KeyCode::Char('k') => app.move_event_selection(-1, view),
		KeyCode::Down | KeyCode::Char('j') => app.move_event_selection(1, view),
		KeyCode::Char('t') => {
			app.selected_day = view.today;
			app.event_index = 0;
		}
		KeyCode::Char('w') => {
			week.set_week_start(week.week_start().toggled());
			app.dirty = true;
			app.status = format!("Week now starts on {}", week.week_start().first_day());
		}
		KeyCode::Char('s') => match save_week(timetable_path, week) {
			Ok(()) => {
				app.dirty = false;
				app.status = format!("Saved {}", timetable_path.display());
			}
			Err(err) => app.status = format!("error: {err}"),
		},
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new(
				format!("New event on {}: title", app.selected_day),
				PromptKind::AddTitle { day: app.selected_day },
			));
		}
		KeyCode::Char('e') => match app.selected_event(view) {
			Some(event) => {
				app.mode = InputMode::Prompt(PromptState::new(
					format!("Title [{}] (empty keeps)", event.title),
					PromptKind::EditTitle {
						day: app.selected_day,
						start_key: event.start,
					},
				));
			}
			None => app.status = "No event selected".to_string(),
		},
		KeyCode::Char('d') => match app.selected_event(view) {
			Some(event) => {
				app.mode = InputMode::Select(build_delete_confirm_select(app.selected_day, event));
			}
			None => app.status = "No event selected".to_string(),
		},
		KeyCode::Char('/') => {
			app.mode = InputMode::Prompt(PromptState::new("Search title/location", PromptKind::Search));
		}
		_ => {}
	}

	false
}

fn handle_prompt_key(app: &mut App, code: KeyCode, week: &mut Week) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone(), week) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => {
					app.mode = InputMode::Prompt(next_prompt);
					app.status.clear();
				}
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Ok(PromptOutcome::Done(message)) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Ok(PromptOutcome::Changed { message, day, start }) => {
					app.mode = InputMode::Normal;
					app.status = message;
					app.dirty = true;
					app.focus_event(week, day, start);
				}
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(app: &mut App, code: KeyCode, week: &mut Week) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(&select, week) {
				Ok(SelectOutcome::Done(message)) => app.status = message,
				Ok(SelectOutcome::Deleted(message)) => {
					app.status = message;
					app.dirty = true;
				}
				Ok(SelectOutcome::Jump { day, start }) => {
					app.focus_event(week, day, start);
					app.status = format!("Jumped to {day} {}", format_time(start));
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn submit_prompt(prompt: PromptState, week: &mut Week) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::AddTitle { day } => Ok(PromptOutcome::NextPrompt(PromptState::new(
			"Where (optional)",
			PromptKind::AddLocation {
				day,
				title: prompt.input.trim().to_string(),
			},
		))),
		PromptKind::AddLocation { day, title } => Ok(PromptOutcome::NextPrompt(PromptState::new(
			"Start time (e.g., 9am, 13:00)",
			PromptKind::AddStart {
				day,
				title,
				location: prompt.input.trim().to_string(),
			},
		))),
		PromptKind::AddStart { day, title, location } => {
			let start = required_time(&prompt.input)?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"End time (e.g., 10am, 14:45)",
				PromptKind::AddEnd {
					day,
					title,
					location,
					start,
				},
			)))
		}
		PromptKind::AddEnd {
			day,
			title,
			location,
			start,
		} => {
			let end = required_time(&prompt.input)?;
			let label = title.clone();
			week.add_event(day, title, location, start, end)
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Changed {
				message: format!("Added {label} on {day}"),
				day,
				start,
			})
		}
		PromptKind::EditTitle { day, start_key } => {
			let current = current_event(week, day, start_key)?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				format!("Where [{}] (empty keeps)", current.location),
				PromptKind::EditLocation {
					day,
					start_key,
					title: optional_text(&prompt.input),
				},
			)))
		}
		PromptKind::EditLocation {
			day,
			start_key,
			title,
		} => {
			let current = current_event(week, day, start_key)?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				format!("Start [{}] (empty keeps)", format_time(current.start)),
				PromptKind::EditStart {
					day,
					start_key,
					patch: EventPatch {
						title,
						location: optional_text(&prompt.input),
						..EventPatch::default()
					},
				},
			)))
		}
		PromptKind::EditStart {
			day,
			start_key,
			mut patch,
		} => {
			let current = current_event(week, day, start_key)?;
			patch.start = optional_time(&prompt.input)?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				format!("End [{}] (empty keeps)", format_time(current.end)),
				PromptKind::EditEnd {
					day,
					start_key,
					patch,
				},
			)))
		}
		PromptKind::EditEnd {
			day,
			start_key,
			mut patch,
		} => {
			patch.end = optional_time(&prompt.input)?;
			week.update_event(day, start_key, &patch)
				.map_err(|err| err.to_string())?;
			Ok(PromptOutcome::Changed {
				message: "Event updated".to_string(),
				day,
				start: patch.start.unwrap_or(start_key),
			})
		}
		PromptKind::Search => {
			let hits = search(week, &prompt.input).map_err(|err| err.to_string())?;
			if hits.is_empty() {
				return Ok(PromptOutcome::Done("No matches".to_string()));
			}
			let options = hits
				.iter()
				.map(|hit| {
					let location = hit
						.event
						.location()
						.map(|location| format!(" @ {location}"))
						.unwrap_or_default();
					SelectOption::new(
						format!("{} {} {}{location}", hit.day, hit.event.time_range(), hit.event.title),
						SelectChoice::Hit {
							day: hit.day,
							start: hit.event.start,
						},
					)
				})
				.collect();
			Ok(PromptOutcome::Select(SelectState::new(
				format!("Matches for \"{}\"", prompt.input.trim()),
				SelectKind::SearchResults,
				options,
			)))
		}
	}
}

fn submit_select(select: &SelectState, week: &mut Week) -> Result<SelectOutcome, String> {
	let choice = select
		.selected_option()
		.map(|option| option.choice)
		.ok_or_else(|| "no option selected".to_string())?;

	match (&select.kind, choice) {
		(SelectKind::DeleteConfirm { day, start_key, title }, SelectChoice::Confirm) => {
			week.delete_event(*day, *start_key).map_err(|err| err.to_string())?;
			Ok(SelectOutcome::Deleted(format!("Deleted {title}")))
		}
		(SelectKind::DeleteConfirm { .. }, _) => Ok(SelectOutcome::Done("Delete cancelled".to_string())),
		(SelectKind::SearchResults, SelectChoice::Hit { day, start }) => Ok(SelectOutcome::Jump { day, start }),
		(SelectKind::SearchResults, _) => Ok(SelectOutcome::Done("Search closed".to_string())),
	}
}

fn build_delete_confirm_select(day: Day, event: &Event) -> SelectState {
	SelectState::new(
		format!("Delete {} on {day} ({})?", event.title, event.time_range()),
		SelectKind::DeleteConfirm {
			day,
			start_key: event.start,
			title: event.title.clone(),
		},
		vec![
			SelectOption::new("Cancel", SelectChoice::Cancel),
			SelectOption::new("Delete", SelectChoice::Confirm),
		],
	)
}

fn build_view(app: &App, week: &Week) -> ViewModel {
	let day_rows = week
		.display_order()
		.into_iter()
		.map(|(label, day)| DayRow {
			day,
			label,
			event_count: week.day(day).len(),
		})
		.collect();

	ViewModel {
		day_rows,
		events: week.list_day(app.selected_day).to_vec(),
		today: Day::today(),
	}
}

fn current_event(week: &Week, day: Day, start_key: u32) -> Result<Event, String> {
	week.find_event(day, start_key)
		.cloned()
		.ok_or_else(|| format!("no event on {day} starting at {}", format_time(start_key)))
}

fn required_time(input: &str) -> Result<u32, String> {
	parse_time(input).ok_or_else(|| format!("invalid time `{}` (e.g. 9, 9am, 9:30, 14:00)", input.trim()))
}

fn optional_time(input: &str) -> Result<Option<u32>, String> {
	if input.trim().is_empty() {
		Ok(None)
	} else {
		required_time(input).map(Some)
	}
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
	Done(String),
	Changed { message: String, day: Day, start: u32 },
}

#[derive(Debug, Clone)]
enum SelectOutcome {
	Done(String),
	Deleted(String),
	Jump { day: Day, start: u32 },
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	choice: SelectChoice,
}

impl SelectOption {
	fn new(label: impl Into<String>, choice: SelectChoice) -> Self {
		Self {
			label: label.into(),
			choice,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectChoice {
	Cancel,
	Confirm,
	Hit { day: Day, start: u32 },
}

#[derive(Debug, Clone)]
enum PromptKind {
	AddTitle {
		day: Day,
	},
	AddLocation {
		day: Day,
		title: String,
	},
	AddStart {
		day: Day,
		title: String,
		location: String,
	},
	AddEnd {
		day: Day,
		title: String,
		location: String,
		start: u32,
	},
	EditTitle {
		day: Day,
		start_key: u32,
	},
	EditLocation {
		day: Day,
		start_key: u32,
		title: Option<String>,
	},
	EditStart {
		day: Day,
		start_key: u32,
		patch: EventPatch,
	},
	EditEnd {
		day: Day,
		start_key: u32,
		patch: EventPatch,
	},
	Search,
}

#[derive(Debug, Clone)]
enum SelectKind {
	DeleteConfirm {
		day: Day,
		start_key: u32,
		title: String,
	},
	SearchResults,
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	selected_day: Day,
	event_index: usize,
	mode: InputMode,
	status: String,
	timetable_name: String,
	dirty: bool,
	quit_armed: bool,
}

impl App {
	fn new(timetable_path: &Path) -> Self {
		Self {
			selected_day: Day::today(),
			event_index: 0,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
			timetable_name: timetable_path
				.file_name()
				.map(|name| name.to_string_lossy().into_owned())
				.unwrap_or_else(|| timetable_path.display().to_string()),
			dirty: false,
			quit_armed: false,
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		if view.events.is_empty() {
			self.event_index = 0;
		} else {
			self.event_index = self.event_index.min(view.events.len() - 1);
		}
	}

	/// Moves along the display order, so `left` on the first column stays put.
	fn shift_selected_day(&mut self, delta: i32, week: &Week) {
		let order = week.display_order();
		let position = order
			.iter()
			.position(|(_, day)| *day == self.selected_day)
			.unwrap_or(0);
		let next = if delta > 0 {
			(position + delta as usize).min(order.len() - 1)
		} else {
			position.saturating_sub(delta.unsigned_abs() as usize)
		};
		self.selected_day = order[next].1;
		self.event_index = 0;
	}

	fn move_event_selection(&mut self, delta: i32, view: &ViewModel) {
		if view.events.is_empty() {
			self.event_index = 0;
			return;
		}

		if delta > 0 {
			self.event_index = (self.event_index + delta as usize).min(view.events.len() - 1);
		} else {
			self.event_index = self.event_index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_event<'a>(&self, view: &'a ViewModel) -> Option<&'a Event> {
		view.events.get(self.event_index)
	}

	fn focus_event(&mut self, week: &Week, day: Day, start: u32) {
		self.selected_day = day;
		self.event_index = week.day(day).find_by_start(start).unwrap_or(0);
	}
}

struct ViewModel {
	day_rows: Vec<DayRow>,
	events: Vec<Event>,
	today: Day,
}

struct DayRow {
	day: Day,
	label: &'static str,
	event_count: usize,
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use crossterm::event::KeyCode;

	use crate::domain::{Day, Week, WeekStart};

	use super::{App, InputMode, build_view, handle_normal_key, handle_prompt_key, handle_select_key};

	fn type_text(app: &mut App, week: &mut Week, text: &str) {
		for ch in text.chars() {
			handle_prompt_key(app, KeyCode::Char(ch), week);
		}
		handle_prompt_key(app, KeyCode::Enter, week);
	}

	fn app_on(day: Day) -> App {
		let mut app = App::new(Path::new("/tmp/dashboard.txt"));
		app.selected_day = day;
		app
	}

	#[test]
	fn add_prompt_chain_creates_event() {
		let mut week = Week::new(WeekStart::Monday);
		let mut app = app_on(Day::Thu);
		let view = build_view(&app, &week);

		handle_normal_key(&mut app, KeyCode::Char('a'), &mut week, Path::new("/tmp/unused.txt"), &view);
		type_text(&mut app, &mut week, "Review");
		type_text(&mut app, &mut week, "Room 4");
		type_text(&mut app, &mut week, "2pm");
		type_text(&mut app, &mut week, "3pm");

		assert!(matches!(app.mode, InputMode::Normal));
		assert!(app.dirty);
		assert_eq!(week.list_day(Day::Thu)[0].title, "Review");
		assert_eq!(week.list_day(Day::Thu)[0].end, 900);
	}

	#[test]
	fn invalid_time_keeps_prompt_open() {
		let mut week = Week::new(WeekStart::Monday);
		let mut app = app_on(Day::Thu);
		let view = build_view(&app, &week);

		handle_normal_key(&mut app, KeyCode::Char('a'), &mut week, Path::new("/tmp/unused.txt"), &view);
		type_text(&mut app, &mut week, "Review");
		type_text(&mut app, &mut week, "");
		type_text(&mut app, &mut week, "later");

		assert!(matches!(app.mode, InputMode::Prompt(_)));
		assert!(app.status.starts_with("error:"));
		assert!(week.day(Day::Thu).is_empty());
	}

	#[test]
	fn delete_needs_explicit_confirmation() {
		let mut week = Week::new(WeekStart::Monday);
		week.add_event(Day::Thu, "Review", "", 840, 900).unwrap();
		let mut app = app_on(Day::Thu);
		let view = build_view(&app, &week);

		handle_normal_key(&mut app, KeyCode::Char('d'), &mut week, Path::new("/tmp/unused.txt"), &view);
		handle_select_key(&mut app, KeyCode::Enter, &mut week);
		assert_eq!(week.day(Day::Thu).len(), 1);

		handle_normal_key(&mut app, KeyCode::Char('d'), &mut week, Path::new("/tmp/unused.txt"), &view);
		handle_select_key(&mut app, KeyCode::Down, &mut week);
		handle_select_key(&mut app, KeyCode::Enter, &mut week);
		assert!(week.day(Day::Thu).is_empty());
		assert!(app.dirty);
	}

	#[test]
	fn quitting_with_unsaved_changes_asks_twice() {
		let mut week = Week::new(WeekStart::Monday);
		let mut app = app_on(Day::Mon);
		let view = build_view(&app, &week);
		let path = Path::new("/tmp/unused.txt");

		handle_normal_key(&mut app, KeyCode::Char('w'), &mut week, path, &view);
		assert_eq!(week.week_start(), WeekStart::Sunday);
		assert!(!handle_normal_key(&mut app, KeyCode::Char('q'), &mut week, path, &view));
		assert!(handle_normal_key(&mut app, KeyCode::Char('q'), &mut week, path, &view));
	}

	#[test]
	fn search_jumps_to_hit() {
		let mut week = Week::new(WeekStart::Monday);
		week.add_event(Day::Sat, "Climbing", "Gym", 600, 720).unwrap();
		week.add_event(Day::Sat, "Lunch", "", 540, 600).unwrap();
		let mut app = app_on(Day::Mon);
		let view = build_view(&app, &week);

		handle_normal_key(&mut app, KeyCode::Char('/'), &mut week, Path::new("/tmp/unused.txt"), &view);
		type_text(&mut app, &mut week, "gym");
		assert!(matches!(app.mode, InputMode::Select(_)));
		handle_select_key(&mut app, KeyCode::Enter, &mut week);

		assert_eq!(app.selected_day, Day::Sat);
		assert_eq!(app.event_index, 1);
	}
}
