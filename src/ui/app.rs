use std::mem;

use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info};

use crate::db::{CountryPatch, CountryStore, LoadReport};
use crate::error::CatalogError;
use crate::models::Country;
use crate::query::{
    filter_by_continent, filter_by_range, find_exact, search_substring, sort, RangeField,
    SortDirection, SortKey,
};
use crate::stats::Summary;

use super::forms::{Answer, Prompt, PromptState, PromptStep};
use super::helpers::{centered_rect, country_count, format_thousands};
use super::screens::{CountryTable, Report, StatusKind};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows moved by PageUp/PageDown on result tables.
const PAGE_SCROLL: isize = 10;

const MENU_ITEMS: [&str; 10] = [
    "Add country",
    "Update country data",
    "Search country by name",
    "Filter by continent",
    "Filter by population range",
    "Filter by area range",
    "Sort countries",
    "Show statistics",
    "Show all countries",
    "Exit",
];

const UPDATE_OPTIONS: &[(&str, &str)] = &[
    ("1", "Update population"),
    ("2", "Update area"),
    ("3", "Update both"),
];

const SORT_KEYS: &[(&str, &str)] = &[("1", "By name"), ("2", "By population"), ("3", "By area")];

const SORT_DIRECTIONS: &[(&str, &str)] = &[("A", "Ascending"), ("D", "Descending")];

const NO_COUNTRIES: &str = "No countries registered.";

/// Which fields an update touches, in prompt order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum UpdateTarget {
    Population,
    Area,
    Both,
}

/// A menu operation that is still collecting input. Each variant carries the
/// answers gathered so far; the first `None` marks the field being prompted.
#[derive(Debug)]
enum Operation {
    Add {
        name: Option<String>,
        population: Option<u64>,
        area: Option<u64>,
    },
    Update {
        name: Option<String>,
        target: Option<UpdateTarget>,
        population: Option<u64>,
    },
    Search,
    FilterContinent,
    FilterRange {
        field: RangeField,
        min: Option<u64>,
    },
    Sort {
        key: Option<SortKey>,
    },
}

impl Operation {
    fn title(&self) -> &'static str {
        match self {
            Operation::Add { .. } => "Add Country",
            Operation::Update { .. } => "Update Country",
            Operation::Search => "Search Country",
            Operation::FilterContinent => "Filter by Continent",
            Operation::FilterRange {
                field: RangeField::Population,
                ..
            } => "Filter by Population Range",
            Operation::FilterRange {
                field: RangeField::Area,
                ..
            } => "Filter by Area Range",
            Operation::Sort { .. } => "Sort Countries",
        }
    }
}

/// An operation plus the prompt currently on screen.
struct Flow {
    operation: Operation,
    prompt: Prompt,
}

impl Flow {
    fn new(operation: Operation, prompt: Prompt) -> Self {
        Self { operation, prompt }
    }
}

/// Top-level modes. The menu reads a free-text choice, flows collect input
/// through prompts, and reports wait for Enter before the menu comes back.
enum Mode {
    Menu,
    Prompting(Flow),
    Report(Report),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Central application state. Owns the record store for the whole session.
pub struct App {
    store: CountryStore,
    mode: Mode,
    menu_input: String,
    status: Option<StatusMessage>,
}

impl App {
    /// Start on the welcome screen summarizing what was loaded.
    pub fn new(store: CountryStore, load: &LoadReport) -> Self {
        let welcome = welcome_report(&store, load);
        Self {
            store,
            mode: Mode::Report(welcome),
            menu_input: String::new(),
            status: None,
        }
    }

    pub fn store(&self) -> &CountryStore {
        &self.store
    }

    /// Feed one key press. Returns `true` once the user chose to exit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Menu);

        self.mode = match mode {
            Mode::Menu => self.handle_menu_key(code, &mut exit),
            Mode::Prompting(flow) => self.handle_prompt_key(code, flow),
            Mode::Report(report) => self.handle_report_key(code, report),
        };

        exit
    }

    fn handle_menu_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Enter => {
                let choice = mem::take(&mut self.menu_input);
                return self.dispatch(choice.trim(), exit);
            }
            KeyCode::Backspace => {
                self.menu_input.pop();
            }
            KeyCode::Esc => self.menu_input.clear(),
            KeyCode::Char(ch) if !ch.is_control() => self.menu_input.push(ch),
            _ => {}
        }
        Mode::Menu
    }

    fn dispatch(&mut self, choice: &str, exit: &mut bool) -> Mode {
        self.clear_status();
        debug!(choice, "menu choice");

        let needs_records = matches!(choice, "2" | "3" | "4" | "5" | "6" | "7" | "8");
        if needs_records && self.store.is_empty() {
            return Mode::Report(Report::info("Country Registry", vec![NO_COUNTRIES.into()]));
        }

        match choice {
            "" => Mode::Menu,
            "1" => self.start(
                Operation::Add {
                    name: None,
                    population: None,
                    area: None,
                },
                Prompt::text("Country name"),
            ),
            "2" => self.start(
                Operation::Update {
                    name: None,
                    target: None,
                    population: None,
                },
                Prompt::text("Country to update"),
            ),
            "3" => self.start(Operation::Search, Prompt::text("Name (full or partial)")),
            "4" => self.start(Operation::FilterContinent, Prompt::text("Continent")),
            "5" => self.start(
                Operation::FilterRange {
                    field: RangeField::Population,
                    min: None,
                },
                Prompt::non_negative("Minimum population"),
            ),
            "6" => self.start(
                Operation::FilterRange {
                    field: RangeField::Area,
                    min: None,
                },
                Prompt::non_negative("Minimum area (km²)"),
            ),
            "7" => self.start(
                Operation::Sort { key: None },
                Prompt::choice("Sort criterion", SORT_KEYS),
            ),
            "8" => self.show_statistics(),
            "9" => self.show_all(),
            "10" => {
                info!("exit requested");
                *exit = true;
                Mode::Menu
            }
            _ => {
                self.set_status(
                    "Invalid option. Choose an option from 1 to 10.",
                    StatusKind::Error,
                );
                Mode::Menu
            }
        }
    }

    fn start(&mut self, operation: Operation, prompt: Prompt) -> Mode {
        Mode::Prompting(Flow::new(operation, prompt))
    }

    fn handle_prompt_key(&mut self, code: KeyCode, mut flow: Flow) -> Mode {
        match flow.prompt.handle_key(code) {
            PromptStep::Pending => Mode::Prompting(flow),
            PromptStep::Cancelled => {
                info!(operation = flow.operation.title(), "operation cancelled");
                Mode::Report(Report::info(
                    flow.operation.title(),
                    vec!["Operation cancelled.".into()],
                ))
            }
            PromptStep::Accepted(answer) => self.advance(flow.operation, answer),
        }
    }

    fn handle_report_key(&mut self, code: KeyCode, mut report: Report) -> Mode {
        if let Report::Countries(table) = &mut report {
            match code {
                KeyCode::Up => table.scroll_by(-1),
                KeyCode::Down => table.scroll_by(1),
                KeyCode::PageUp => table.scroll_by(-PAGE_SCROLL),
                KeyCode::PageDown => table.scroll_by(PAGE_SCROLL),
                KeyCode::Home => table.scroll_to_start(),
                KeyCode::End => table.scroll_to_end(),
                _ => {}
            }
        }

        if code == KeyCode::Enter {
            self.clear_status();
            Mode::Menu
        } else {
            Mode::Report(report)
        }
    }

    /// Fold an accepted answer into the operation and either prompt for the
    /// next field or finish.
    fn advance(&mut self, operation: Operation, answer: Answer) -> Mode {
        match (operation, answer) {
            (
                Operation::Add {
                    name: None,
                    ..
                },
                Answer::Text(name),
            ) => {
                if find_exact(self.store.countries(), &name).is_some() {
                    return Mode::Report(Report::error(
                        "Add Country",
                        CatalogError::DuplicateName(name).to_string(),
                    ));
                }
                self.start(
                    Operation::Add {
                        name: Some(name),
                        population: None,
                        area: None,
                    },
                    Prompt::positive("Population"),
                )
            }
            (
                Operation::Add {
                    name: Some(name),
                    population: None,
                    ..
                },
                Answer::Number(population),
            ) => self.start(
                Operation::Add {
                    name: Some(name),
                    population: Some(population),
                    area: None,
                },
                Prompt::positive("Area (km²)"),
            ),
            (
                Operation::Add {
                    name: Some(name),
                    population: Some(population),
                    area: None,
                },
                Answer::Number(area),
            ) => self.start(
                Operation::Add {
                    name: Some(name),
                    population: Some(population),
                    area: Some(area),
                },
                Prompt::text("Continent"),
            ),
            (
                Operation::Add {
                    name: Some(name),
                    population: Some(population),
                    area: Some(area),
                },
                Answer::Text(continent),
            ) => self.add_country(Country::new(name, population, area, continent)),

            (
                Operation::Update {
                    name: None,
                    ..
                },
                Answer::Text(name),
            ) => match find_exact(self.store.countries(), &name) {
                None => Mode::Report(Report::error(
                    "Update Country",
                    CatalogError::NotFound(name).to_string(),
                )),
                Some(index) => {
                    let country = &self.store.countries()[index];
                    let context = vec![
                        format!("Selected country: {}", country.name),
                        format!("Current population: {}", format_thousands(country.population)),
                        format!("Current area: {} km²", format_thousands(country.area)),
                    ];
                    let stored_name = country.name.clone();
                    self.start(
                        Operation::Update {
                            name: Some(stored_name),
                            target: None,
                            population: None,
                        },
                        Prompt::choice("Option", UPDATE_OPTIONS).with_context(context),
                    )
                }
            },
            (
                Operation::Update {
                    name: Some(name),
                    target: None,
                    ..
                },
                Answer::Choice(index),
            ) => {
                let target = match index {
                    0 => UpdateTarget::Population,
                    1 => UpdateTarget::Area,
                    _ => UpdateTarget::Both,
                };
                let prompt = if target == UpdateTarget::Area {
                    Prompt::positive("New area (km²)")
                } else {
                    Prompt::positive("New population")
                };
                self.start(
                    Operation::Update {
                        name: Some(name),
                        target: Some(target),
                        population: None,
                    },
                    prompt,
                )
            }
            (
                Operation::Update {
                    name: Some(name),
                    target: Some(UpdateTarget::Both),
                    population: None,
                },
                Answer::Number(population),
            ) => self.start(
                Operation::Update {
                    name: Some(name),
                    target: Some(UpdateTarget::Both),
                    population: Some(population),
                },
                Prompt::positive("New area (km²)"),
            ),
            (
                Operation::Update {
                    name: Some(name),
                    target: Some(target),
                    population,
                },
                Answer::Number(value),
            ) => {
                let patch = match target {
                    UpdateTarget::Population => CountryPatch {
                        population: Some(value),
                        area: None,
                    },
                    UpdateTarget::Area => CountryPatch {
                        population: None,
                        area: Some(value),
                    },
                    UpdateTarget::Both => CountryPatch {
                        population,
                        area: Some(value),
                    },
                };
                self.update_country(&name, patch)
            }

            (Operation::Search, Answer::Text(term)) => {
                let matches = search_substring(self.store.countries(), &term);
                if matches.is_empty() {
                    Mode::Report(Report::info(
                        "Search Country",
                        vec![format!("No countries found matching '{term}'.")],
                    ))
                } else {
                    Mode::Report(Report::Countries(CountryTable::new(
                        format!("Search results: '{term}'"),
                        matches,
                    )))
                }
            }
            (Operation::FilterContinent, Answer::Text(continent)) => {
                let matches = filter_by_continent(self.store.countries(), &continent);
                if matches.is_empty() {
                    Mode::Report(Report::info(
                        "Filter by Continent",
                        vec![format!("No countries in '{continent}'.")],
                    ))
                } else {
                    Mode::Report(Report::Countries(CountryTable::new(
                        format!("Countries in {}", continent.to_uppercase()),
                        matches,
                    )))
                }
            }
            (Operation::FilterRange { field, min: None }, Answer::Number(min)) => {
                let label = match field {
                    RangeField::Population => "Maximum population",
                    RangeField::Area => "Maximum area (km²)",
                };
                self.start(
                    Operation::FilterRange {
                        field,
                        min: Some(min),
                    },
                    Prompt::non_negative(label),
                )
            }
            (Operation::FilterRange { field, min: Some(min) }, Answer::Number(max)) => {
                self.show_range(field, min, max)
            }
            (Operation::Sort { key: None }, Answer::Choice(index)) => {
                let key = match index {
                    0 => SortKey::Name,
                    1 => SortKey::Population,
                    _ => SortKey::Area,
                };
                self.start(
                    Operation::Sort { key: Some(key) },
                    Prompt::choice("Direction", SORT_DIRECTIONS),
                )
            }
            (Operation::Sort { key: Some(key) }, Answer::Choice(index)) => {
                let direction = if index == 0 {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                };
                let sorted = sort(self.store.countries(), key, direction);
                Mode::Report(Report::Countries(CountryTable::new(
                    format!(
                        "Countries sorted by {} ({})",
                        key.to_string().to_uppercase(),
                        direction.to_string().to_uppercase()
                    ),
                    sorted,
                )))
            }

            (operation, answer) => {
                // Every prompt's kind matches the field it collects.
                debug!(?operation, ?answer, "answer does not fit the operation");
                Mode::Report(Report::error(operation.title(), "Unexpected input."))
            }
        }
    }

    fn add_country(&mut self, country: Country) -> Mode {
        match self.store.add(country) {
            Ok(added) => {
                let message = format!("Country '{}' added successfully.", added.name);
                self.set_status(message.clone(), StatusKind::Info);
                Mode::Report(Report::info("Add Country", vec![message]))
            }
            Err(err) => Mode::Report(Report::error("Add Country", err.to_string())),
        }
    }

    fn update_country(&mut self, name: &str, patch: CountryPatch) -> Mode {
        match self.store.update(name, patch) {
            Ok(updated) => {
                let message = format!("Country '{}' updated successfully.", updated.name);
                self.set_status(message.clone(), StatusKind::Info);
                Mode::Report(Report::info("Update Country", vec![message]))
            }
            Err(err) => Mode::Report(Report::error("Update Country", err.to_string())),
        }
    }

    fn show_range(&mut self, field: RangeField, min: u64, max: u64) -> Mode {
        let title = Operation::FilterRange {
            field,
            min: Some(min),
        }
        .title();
        let unit = match field {
            RangeField::Population => "",
            RangeField::Area => " km²",
        };

        match filter_by_range(self.store.countries(), field, min, max) {
            Err(err) => Mode::Report(Report::error(title, err.to_string())),
            Ok(matches) if matches.is_empty() => Mode::Report(Report::info(
                title,
                vec![format!(
                    "No countries with {field} between {} and {}{unit}.",
                    format_thousands(min),
                    format_thousands(max)
                )],
            )),
            Ok(matches) => Mode::Report(Report::Countries(CountryTable::new(
                format!(
                    "Countries with {field} between {} and {}{unit}",
                    format_thousands(min),
                    format_thousands(max)
                ),
                matches,
            ))),
        }
    }

    fn show_statistics(&mut self) -> Mode {
        match Summary::compute(self.store.countries()) {
            Some(summary) => Mode::Report(Report::Statistics(summary)),
            None => Mode::Report(Report::info("Statistics", vec![NO_COUNTRIES.into()])),
        }
    }

    fn show_all(&mut self) -> Mode {
        if self.store.is_empty() {
            return Mode::Report(Report::info("All Countries", vec![NO_COUNTRIES.into()]));
        }
        let all: Vec<&Country> = self.store.countries().iter().collect();
        Mode::Report(Report::Countries(CountryTable::new("All Countries", all)))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.mode {
            Mode::Menu => self.draw_menu(frame, content_area),
            Mode::Prompting(flow) => {
                if matches!(flow.operation, Operation::Update { name: None, .. }) {
                    let all: Vec<&Country> = self.store.countries().iter().collect();
                    CountryTable::new("Registered Countries", all).render(frame, content_area);
                } else {
                    self.draw_menu(frame, content_area);
                }
                self.draw_prompt(frame, content_area, flow);
            }
            Mode::Report(report) => report.render(frame, content_area),
        }

        if area.height > footer_height {
            self.draw_footer(frame, footer_area);
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);

        let mut lines: Vec<Line> = MENU_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                Line::from(vec![
                    Span::styled(format!("{:>2}. ", idx + 1), key_style),
                    Span::raw(*item),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::raw("Select an option: "),
            Span::styled(self.menu_input.clone(), Style::default().fg(Color::Yellow)),
        ]));

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(
                " Country Registry ({}) ",
                country_count(self.store.len())
            ));
        let inner = block.inner(area);
        frame.render_widget(Paragraph::new(lines).block(block), area);

        if matches!(self.mode, Mode::Menu) && inner.height > MENU_ITEMS.len() as u16 + 1 {
            let cursor_x = inner
                .x
                .saturating_add("Select an option: ".len() as u16)
                .saturating_add(self.menu_input.chars().count() as u16);
            let cursor_y = inner.y + MENU_ITEMS.len() as u16 + 1;
            frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), cursor_y));
        }
    }

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, flow: &Flow) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(flow.operation.title())
            .borders(Borders::ALL);
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let prompt = &flow.prompt;
        let mut lines: Vec<Line> = prompt
            .context
            .iter()
            .map(|line| Line::from(line.clone()))
            .collect();
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        let options = prompt.option_lines();
        if !options.is_empty() {
            lines.extend(options);
            lines.push(Line::from(""));
        }
        let input_row = lines.len() as u16;
        lines.push(prompt.input_line());
        lines.push(Line::from(""));

        match &prompt.state {
            PromptState::Retrying { error } => {
                lines.push(Line::from(Span::styled(
                    format!("Error: {error}"),
                    Style::default().fg(Color::Red),
                )));
                lines.push(Line::from(Span::styled(
                    "Press S to try again, any other key to cancel.",
                    Style::default().fg(Color::Yellow),
                )));
            }
            _ => {
                lines.push(Line::from(Span::styled(
                    "Enter to confirm • Esc to cancel",
                    Style::default().fg(Color::Gray),
                )));
            }
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

        if prompt.state == PromptState::Prompting && input_row < inner.height {
            let cursor_x = inner.x + prompt.cursor_offset() as u16;
            frame.set_cursor_position((cursor_x.min(inner.right().saturating_sub(1)), inner.y + input_row));
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        match &self.mode {
            Mode::Menu => Line::from(vec![
                Span::styled("[1-10]", key_style),
                Span::raw(" Choose   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Confirm   "),
                Span::styled("[10]", key_style),
                Span::raw(" Exit"),
            ]),
            Mode::Prompting(flow) => match flow.prompt.state {
                PromptState::Retrying { .. } => Line::from(vec![
                    Span::styled("[S]", key_style),
                    Span::raw(" Try again   "),
                    Span::styled("[any key]", key_style),
                    Span::raw(" Cancel"),
                ]),
                _ => Line::from(vec![
                    Span::styled("[Enter]", key_style),
                    Span::raw(" Confirm   "),
                    Span::styled("[Esc]", key_style),
                    Span::raw(" Cancel"),
                ]),
            },
            Mode::Report(Report::Countries(_)) => Line::from(vec![
                Span::styled("[↑↓ PgUp PgDn]", key_style),
                Span::raw(" Scroll   "),
                Span::styled("[Enter]", key_style),
                Span::raw(" Continue"),
            ]),
            Mode::Report(_) => Line::from(vec![
                Span::raw("Press "),
                Span::styled("[Enter]", key_style),
                Span::raw(" to continue"),
            ]),
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

fn welcome_report(store: &CountryStore, load: &LoadReport) -> Report {
    let path = store.path().display();
    let mut lines = vec!["Welcome to the Country Registry".to_string(), String::new()];
    if load.file_found {
        lines.push(format!(
            "Loaded {} from '{path}'.",
            country_count(store.len())
        ));
    } else {
        lines.push(format!("No data yet. File '{path}' was not found."));
    }

    if load.skipped.is_empty() {
        return Report::info("Country Registry", lines);
    }

    let rows: Vec<String> = load.skipped.iter().map(|row| row.line.to_string()).collect();
    lines.push(format!(
        "Skipped {} malformed row(s) at line(s) {}.",
        load.skipped.len(),
        rows.join(", ")
    ));
    Report::Message {
        title: "Country Registry".to_string(),
        lines,
        kind: StatusKind::Error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use tempfile::{tempdir, TempDir};

    use crate::db::{DataFile, SkippedRow};

    fn seeded_app() -> (TempDir, App) {
        let dir = tempdir().unwrap();
        let data = DataFile::new(dir.path().join("countries.csv"));
        data.save(&[
            Country::new("A", 10, 100, "X"),
            Country::new("B", 30, 50, "Y"),
            Country::new("C", 20, 75, "X"),
        ])
        .unwrap();
        let (store, load) = CountryStore::open(data).unwrap();
        let mut app = App::new(store, &load);
        // Dismiss the welcome screen.
        app.handle_key(KeyCode::Enter);
        (dir, app)
    }

    fn empty_app() -> (TempDir, App) {
        let dir = tempdir().unwrap();
        let (store, load) = CountryStore::open(DataFile::new(dir.path().join("countries.csv"))).unwrap();
        let mut app = App::new(store, &load);
        app.handle_key(KeyCode::Enter);
        (dir, app)
    }

    fn enter(app: &mut App, text: &str) -> bool {
        for ch in text.chars() {
            app.handle_key(KeyCode::Char(ch));
        }
        app.handle_key(KeyCode::Enter)
    }

    fn report_lines(app: &App) -> Vec<String> {
        match &app.mode {
            Mode::Report(Report::Message { lines, .. }) => lines.clone(),
            _ => panic!("expected a message report"),
        }
    }

    fn table_names(app: &App) -> Vec<String> {
        match &app.mode {
            Mode::Report(Report::Countries(table)) => {
                table.rows.iter().map(|c| c.name.clone()).collect()
            }
            _ => panic!("expected a country table"),
        }
    }

    fn names(app: &App) -> Vec<String> {
        app.store().countries().iter().map(|c| c.name.clone()).collect()
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn welcome_reports_loaded_and_skipped_rows() {
        let dir = tempdir().unwrap();
        let store = CountryStore::new(DataFile::new(dir.path().join("countries.csv")), Vec::new());
        let load = LoadReport {
            file_found: true,
            loaded: 0,
            skipped: vec![SkippedRow {
                line: 3,
                reason: "bad".into(),
            }],
        };
        let app = App::new(store, &load);
        let lines = report_lines(&app);
        assert!(lines.iter().any(|l| l.contains("Loaded 0 countries")));
        assert!(lines.iter().any(|l| l.contains("line(s) 3")));
    }

    #[test]
    fn empty_and_invalid_menu_choices_stay_on_the_menu() {
        let (_dir, mut app) = seeded_app();
        assert!(!enter(&mut app, ""));
        assert!(matches!(app.mode, Mode::Menu));
        assert!(app.status.is_none());

        assert!(!enter(&mut app, "42"));
        assert!(matches!(app.mode, Mode::Menu));
        assert_eq!(app.status.as_ref().map(|s| s.kind), Some(StatusKind::Error));
        assert!(app.menu_input.is_empty());
    }

    #[test]
    fn exit_only_through_option_ten() {
        let (_dir, mut app) = seeded_app();
        assert!(!app.handle_key(KeyCode::Esc));
        assert!(!enter(&mut app, "q"));
        assert!(enter(&mut app, " 10 "));
    }

    #[test]
    fn save_failures_show_an_error_and_keep_the_store() {
        let dir = tempdir().unwrap();
        let blocked = dir.path().join("countries.csv");
        fs::create_dir(&blocked).unwrap();
        let records = vec![Country::new("A", 10, 100, "X"), Country::new("B", 30, 50, "Y")];
        let mut app = App::new(
            CountryStore::new(DataFile::new(&blocked), records.clone()),
            &LoadReport::default(),
        );
        app.handle_key(KeyCode::Enter);

        enter(&mut app, "2");
        enter(&mut app, "b");
        enter(&mut app, "1");
        enter(&mut app, "99");
        match &app.mode {
            Mode::Report(Report::Message { kind, lines, .. }) => {
                assert_eq!(*kind, StatusKind::Error);
                assert!(lines[0].contains("Could not save"));
            }
            _ => panic!("expected an error report"),
        }
        assert_eq!(app.store().countries(), records.as_slice());

        app.handle_key(KeyCode::Enter);
        enter(&mut app, "1");
        enter(&mut app, "Chile");
        enter(&mut app, "1");
        enter(&mut app, "1");
        enter(&mut app, "America");
        assert!(report_lines(&app)[0].contains("Could not save"));
        assert_eq!(app.store().countries(), records.as_slice());
        assert!(!dir.path().join(".countries.csv.tmp").exists());
    }

    #[test]
    fn add_flow_persists_the_country() {
        let (dir, mut app) = seeded_app();
        enter(&mut app, "1");
        enter(&mut app, "  Chile ");
        enter(&mut app, "19000000");
        enter(&mut app, "756102");
        enter(&mut app, "America");

        assert!(report_lines(&app)[0].contains("Chile"));
        assert_eq!(names(&app), vec!["A", "B", "C", "Chile"]);

        let (reloaded, _) = DataFile::new(dir.path().join("countries.csv")).load().unwrap();
        assert_eq!(reloaded.last(), Some(&Country::new("Chile", 19_000_000, 756_102, "America")));

        app.handle_key(KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Menu));
    }

    #[test]
    fn add_rejects_duplicate_names_before_asking_more() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "1");
        enter(&mut app, "  b ");
        match &app.mode {
            Mode::Report(Report::Message { kind, lines, .. }) => {
                assert_eq!(*kind, StatusKind::Error);
                assert!(lines[0].contains("already exists"));
            }
            _ => panic!("expected an error report"),
        }
        assert_eq!(names(&app), vec!["A", "B", "C"]);
    }

    #[test]
    fn cancelling_a_field_aborts_without_changes() {
        let (dir, mut app) = seeded_app();
        let before = fs::read_to_string(dir.path().join("countries.csv")).unwrap();

        enter(&mut app, "1");
        enter(&mut app, "Peru");
        enter(&mut app, "zero");
        assert!(matches!(
            &app.mode,
            Mode::Prompting(flow) if matches!(flow.prompt.state, PromptState::Retrying { .. })
        ));
        app.handle_key(KeyCode::Char('n'));

        assert_eq!(report_lines(&app), vec!["Operation cancelled.".to_string()]);
        assert_eq!(names(&app), vec!["A", "B", "C"]);
        let after = fs::read_to_string(dir.path().join("countries.csv")).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn retry_after_invalid_input_continues_the_flow() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "1");
        enter(&mut app, "Peru");
        enter(&mut app, "0");
        app.handle_key(KeyCode::Char('s'));
        enter(&mut app, "34000000");
        enter(&mut app, "1285216");
        enter(&mut app, "America");
        assert_eq!(names(&app), vec!["A", "B", "C", "Peru"]);
    }

    #[test]
    fn update_both_fields() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "2");
        enter(&mut app, "b");
        enter(&mut app, "3");
        enter(&mut app, "99");
        enter(&mut app, "60");

        let b = &app.store().countries()[1];
        assert_eq!(*b, Country::new("B", 99, 60, "Y"));
        assert!(report_lines(&app)[0].contains("updated"));
    }

    #[test]
    fn update_population_only() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "2");
        enter(&mut app, "B");
        enter(&mut app, "1");
        enter(&mut app, "99");
        assert_eq!(app.store().countries()[1], Country::new("B", 99, 50, "Y"));
    }

    #[test]
    fn update_unknown_country_reports_not_found() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "2");
        enter(&mut app, "Narnia");
        assert!(report_lines(&app)[0].contains("does not exist"));
    }

    #[test]
    fn queries_on_an_empty_store_report_no_countries() {
        let (_dir, mut app) = empty_app();
        for choice in ["2", "3", "4", "5", "6", "7", "8", "9"] {
            enter(&mut app, choice);
            assert_eq!(report_lines(&app), vec![NO_COUNTRIES.to_string()]);
            app.handle_key(KeyCode::Enter);
        }
    }

    #[test]
    fn search_and_filters_show_tables() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "3");
        enter(&mut app, "b");
        assert_eq!(table_names(&app), vec!["B"]);
        app.handle_key(KeyCode::Enter);

        enter(&mut app, "4");
        enter(&mut app, " x ");
        assert_eq!(table_names(&app), vec!["A", "C"]);
        app.handle_key(KeyCode::Enter);

        enter(&mut app, "6");
        enter(&mut app, "60");
        enter(&mut app, "100");
        assert_eq!(table_names(&app), vec!["A", "C"]);
        app.handle_key(KeyCode::Enter);

        enter(&mut app, "3");
        enter(&mut app, "zz");
        assert!(report_lines(&app)[0].contains("No countries found"));
    }

    #[test]
    fn reversed_range_is_reported() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "5");
        enter(&mut app, "100");
        enter(&mut app, "50");
        match &app.mode {
            Mode::Report(Report::Message { kind, lines, .. }) => {
                assert_eq!(*kind, StatusKind::Error);
                assert!(lines[0].contains("cannot be greater"));
            }
            _ => panic!("expected an error report"),
        }
    }

    #[test]
    fn sort_shows_a_view_and_keeps_store_order() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "7");
        enter(&mut app, "2");
        enter(&mut app, "d");
        assert_eq!(table_names(&app), vec!["B", "C", "A"]);
        assert_eq!(names(&app), vec!["A", "B", "C"]);
    }

    #[test]
    fn statistics_screen_renders() {
        let (_dir, mut app) = seeded_app();
        enter(&mut app, "8");
        assert!(matches!(app.mode, Mode::Report(Report::Statistics(_))));
        let screen = render(&app);
        assert!(screen.contains("Largest population: B (30)"));
        assert!(screen.contains("Average area: 75 km²"));
    }

    #[test]
    fn menu_and_listing_render() {
        let (_dir, mut app) = seeded_app();
        let screen = render(&app);
        assert!(screen.contains("Filter by population range"));
        assert!(screen.contains("Select an option:"));

        enter(&mut app, "9");
        let screen = render(&app);
        assert!(screen.contains("All Countries"));
        assert!(screen.contains("Total: 3 countries"));
    }

    #[test]
    fn menu_cursor_stays_inside_a_narrow_frame() {
        let (_dir, mut app) = seeded_app();
        for _ in 0..40 {
            app.handle_key(KeyCode::Char('9'));
        }
        let mut terminal = Terminal::new(TestBackend::new(30, 30)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();
        assert!(cursor.x < 30);
    }
}
