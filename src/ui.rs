//! Ratatui front-end for the country registry: a numbered menu, pop-up prompts
//! with retry-or-cancel validation, and result screens that wait for Enter.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
