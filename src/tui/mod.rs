//! TUI module: Terminal User Interface using Ratatui.
//!
//! - Clinical intake form
//! - Verdict screen with the advisory note

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
