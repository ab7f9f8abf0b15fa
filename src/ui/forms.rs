use crossterm::event::KeyCode;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::CatalogError;

/// Accepted shapes of a single prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InputKind {
    /// Any non-blank text, trimmed.
    Text,
    /// Decimal digits only. Zero is rejected unless `allow_zero`.
    Number { allow_zero: bool },
    /// One of a fixed set of `(key, label)` options, matched case-insensitively.
    Choice(&'static [(&'static str, &'static str)]),
}

/// Typed value produced by an accepted prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Answer {
    Text(String),
    Number(u64),
    /// Index into the option list.
    Choice(usize),
}

/// Retry-or-cancel state machine for one field. `Accepted` and `Cancelled`
/// are terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PromptState {
    Prompting,
    Retrying { error: String },
    Cancelled,
    Accepted(Answer),
}

/// What the owner of a prompt has to react to after a key press.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PromptStep {
    Pending,
    Accepted(Answer),
    Cancelled,
}

/// Validate raw input against `kind`. Surrounding whitespace is ignored.
pub(crate) fn validate(kind: InputKind, raw: &str) -> Result<Answer, CatalogError> {
    let input = raw.trim();
    match kind {
        InputKind::Text => {
            if input.is_empty() {
                Err(CatalogError::InvalidInput(
                    "This field cannot be empty.".to_string(),
                ))
            } else {
                Ok(Answer::Text(input.to_string()))
            }
        }
        InputKind::Number { allow_zero } => {
            let number = if !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit()) {
                input.parse::<u64>().ok()
            } else {
                None
            };
            match number {
                None => Err(CatalogError::InvalidInput(
                    "Enter a valid whole number.".to_string(),
                )),
                Some(0) if !allow_zero => Err(CatalogError::InvalidInput(
                    "Enter a number greater than 0.".to_string(),
                )),
                Some(number) => Ok(Answer::Number(number)),
            }
        }
        InputKind::Choice(options) => options
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(input))
            .map(Answer::Choice)
            .ok_or_else(|| {
                let keys: Vec<&str> = options.iter().map(|(key, _)| *key).collect();
                CatalogError::InvalidInput(format!("Choose one of: {}.", keys.join(", ")))
            }),
    }
}

/// A single field being collected inside a pop-up.
#[derive(Clone, Debug)]
pub(crate) struct Prompt {
    pub(crate) label: String,
    pub(crate) kind: InputKind,
    pub(crate) context: Vec<String>,
    pub(crate) buffer: String,
    pub(crate) state: PromptState,
}

impl Prompt {
    pub(crate) fn new(label: impl Into<String>, kind: InputKind) -> Self {
        Self {
            label: label.into(),
            kind,
            context: Vec::new(),
            buffer: String::new(),
            state: PromptState::Prompting,
        }
    }

    pub(crate) fn text(label: impl Into<String>) -> Self {
        Self::new(label, InputKind::Text)
    }

    pub(crate) fn positive(label: impl Into<String>) -> Self {
        Self::new(label, InputKind::Number { allow_zero: false })
    }

    pub(crate) fn non_negative(label: impl Into<String>) -> Self {
        Self::new(label, InputKind::Number { allow_zero: true })
    }

    pub(crate) fn choice(
        label: impl Into<String>,
        options: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self::new(label, InputKind::Choice(options))
    }

    /// Lines shown above the field, e.g. the current values of a record.
    pub(crate) fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    /// Advance the state machine by one key press.
    pub(crate) fn handle_key(&mut self, code: KeyCode) -> PromptStep {
        match self.state {
            PromptState::Prompting => match code {
                KeyCode::Esc => self.state = PromptState::Cancelled,
                KeyCode::Enter => self.submit(),
                KeyCode::Backspace => {
                    self.buffer.pop();
                }
                KeyCode::Char(ch) if !ch.is_control() => self.buffer.push(ch),
                _ => {}
            },
            PromptState::Retrying { .. } => match code {
                KeyCode::Char('s') | KeyCode::Char('S') => {
                    self.buffer.clear();
                    self.state = PromptState::Prompting;
                }
                KeyCode::Char(_) | KeyCode::Enter | KeyCode::Esc => {
                    self.state = PromptState::Cancelled;
                }
                _ => {}
            },
            PromptState::Cancelled | PromptState::Accepted(_) => {}
        }

        match &self.state {
            PromptState::Accepted(answer) => PromptStep::Accepted(answer.clone()),
            PromptState::Cancelled => PromptStep::Cancelled,
            PromptState::Prompting | PromptState::Retrying { .. } => PromptStep::Pending,
        }
    }

    fn submit(&mut self) {
        self.state = match validate(self.kind, &self.buffer) {
            Ok(answer) => PromptState::Accepted(answer),
            Err(err) => PromptState::Retrying {
                error: err.to_string(),
            },
        };
    }

    /// Option lines for choice prompts, empty otherwise.
    pub(crate) fn option_lines(&self) -> Vec<Line<'static>> {
        match self.kind {
            InputKind::Choice(options) => options
                .iter()
                .map(|(key, label)| {
                    Line::from(vec![
                        Span::styled(format!("{key}. "), Style::default().fg(Color::Cyan)),
                        Span::raw(*label),
                    ])
                })
                .collect(),
            InputKind::Text | InputKind::Number { .. } => Vec::new(),
        }
    }

    /// Render the `label: buffer` line.
    pub(crate) fn input_line(&self) -> Line<'static> {
        let style = match self.state {
            PromptState::Prompting => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::DarkGray),
        };
        Line::from(vec![
            Span::raw(format!("{}: ", self.label)),
            Span::styled(self.buffer.clone(), style),
        ])
    }

    /// Column of the cursor relative to the start of the input line.
    pub(crate) fn cursor_offset(&self) -> usize {
        self.label.chars().count() + 2 + self.buffer.chars().count()
    }
}
