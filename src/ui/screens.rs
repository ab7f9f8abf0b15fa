use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::models::Country;
use crate::stats::Summary;

use super::helpers::{country_count, format_thousands};

/// Severity of a message, shared by the footer and message screens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    pub(crate) fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Scrollable listing of countries. Rows are owned so the view survives later
/// changes to the store.
pub(crate) struct CountryTable {
    pub(crate) title: String,
    pub(crate) rows: Vec<Country>,
    pub(crate) scroll: usize,
    /// Rows that fit in the last rendered frame.
    page_rows: std::cell::Cell<usize>,
}

impl CountryTable {
    pub(crate) fn new(title: impl Into<String>, rows: Vec<&Country>) -> Self {
        Self {
            title: title.into(),
            rows: rows.into_iter().cloned().collect(),
            scroll: 0,
            page_rows: std::cell::Cell::new(1),
        }
    }

    /// Furthest offset that still fills the last rendered page.
    fn max_scroll(&self) -> usize {
        self.rows.len().saturating_sub(self.page_rows.get().max(1))
    }

    pub(crate) fn scroll_by(&mut self, offset: isize) {
        let max = self.max_scroll() as isize;
        self.scroll = (self.scroll as isize + offset).clamp(0, max) as usize;
    }

    pub(crate) fn scroll_to_start(&mut self) {
        self.scroll = 0;
    }

    pub(crate) fn scroll_to_end(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub(crate) fn render(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(area);

        // Borders plus the header row.
        let visible = chunks[0].height.saturating_sub(3) as usize;
        self.page_rows.set(visible);
        let start = self.scroll.min(self.max_scroll());
        let rows = self
            .rows
            .iter()
            .skip(start)
            .take(visible)
            .map(|country| {
                Row::new(vec![
                    Cell::from(country.name.clone()),
                    Cell::from(
                        Line::from(format_thousands(country.population))
                            .alignment(Alignment::Right),
                    ),
                    Cell::from(
                        Line::from(format_thousands(country.area)).alignment(Alignment::Right),
                    ),
                    Cell::from(country.continent.clone()),
                ])
            });

        let header = Row::new(vec![
            Cell::from("Country"),
            Cell::from(Line::from("Population").alignment(Alignment::Right)),
            Cell::from(Line::from("Area (km²)").alignment(Alignment::Right)),
            Cell::from("Continent"),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let widths = [
            Constraint::Min(20),
            Constraint::Length(15),
            Constraint::Length(18),
            Constraint::Min(12),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(2)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.title.clone()),
            );
        frame.render_widget(table, chunks[0]);

        let mut total = format!("Total: {}", country_count(self.rows.len()));
        if self.rows.len() > visible && visible > 0 {
            let last_shown = (start + visible).min(self.rows.len());
            total.push_str(&format!(
                "  (showing {}-{})",
                start + 1,
                last_shown
            ));
        }
        frame.render_widget(Paragraph::new(total), chunks[1]);
    }
}

/// Result screens shown after an operation, dismissed with Enter.
pub(crate) enum Report {
    Message {
        title: String,
        lines: Vec<String>,
        kind: StatusKind,
    },
    Countries(CountryTable),
    Statistics(Summary),
}

impl Report {
    pub(crate) fn info(title: impl Into<String>, lines: Vec<String>) -> Self {
        Report::Message {
            title: title.into(),
            lines,
            kind: StatusKind::Info,
        }
    }

    pub(crate) fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Report::Message {
            title: title.into(),
            lines: vec![message.into()],
            kind: StatusKind::Error,
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame, area: Rect) {
        match self {
            Report::Message { title, lines, kind } => {
                let text: Vec<Line> = lines
                    .iter()
                    .map(|line| Line::from(Span::styled(line.clone(), kind.style())))
                    .collect();
                let paragraph = Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL).title(title.clone()));
                frame.render_widget(paragraph, area);
            }
            Report::Countries(table) => table.render(frame, area),
            Report::Statistics(summary) => render_statistics(frame, area, summary),
        }
    }
}

fn render_statistics(frame: &mut Frame, area: Rect, summary: &Summary) {
    let label = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Largest population: ", label),
            Span::raw(format!(
                "{} ({})",
                summary.most_populated.name,
                format_thousands(summary.most_populated.population)
            )),
        ]),
        Line::from(vec![
            Span::styled("Smallest population: ", label),
            Span::raw(format!(
                "{} ({})",
                summary.least_populated.name,
                format_thousands(summary.least_populated.population)
            )),
        ]),
        Line::from(vec![
            Span::styled("Average population: ", label),
            Span::raw(format_thousands(summary.averages.population)),
        ]),
        Line::from(vec![
            Span::styled("Average area: ", label),
            Span::raw(format!("{} km²", format_thousands(summary.averages.area))),
        ]),
        Line::from(""),
        Line::from(Span::styled("Countries per continent:", label)),
    ];

    for (continent, count) in &summary.by_continent {
        lines.push(Line::from(format!("  {continent}: {}", country_count(*count))));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Total countries registered: ", label),
        Span::raw(summary.total.to_string()),
    ]));

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Statistics"));
    frame.render_widget(paragraph, area);
}
