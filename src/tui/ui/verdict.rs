//! Verdict view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::domain::{Prediction, ADVISORY_NOTE};
use crate::tui::styles::MedicalTheme;

/// Verdict state
#[derive(Debug, Clone, Default)]
pub enum VerdictState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// Prediction returned
    Complete { prediction: Prediction },
    /// Encoding, loading or prediction failed
    Error { message: String },
}

/// Render the verdict screen
pub fn render_verdict(f: &mut Frame, area: Rect, state: &VerdictState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_verdict_header(f, chunks[0]);
    match state {
        VerdictState::Idle => render_idle(f, chunks[1]),
        VerdictState::Complete { prediction } => render_result(f, chunks[1], *prediction),
        VerdictState::Error { message } => render_error(f, chunks[1], message),
    }
    render_verdict_footer(f, chunks[2], state);
}

fn render_verdict_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Prediction", MedicalTheme::title()),
        Span::styled(" │ Logistic regression screening", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No prediction yet",
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_result(f: &mut Frame, area: Rect, prediction: Prediction) {
    let block = Block::default()
        .title(Span::styled(" Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Verdict
            Constraint::Min(0),    // Advisory
        ])
        .margin(1)
        .split(inner);

    let style = MedicalTheme::verdict(prediction);
    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(format!("{prediction}"), style)),
        Line::from(""),
        Line::from(Span::styled(prediction.message(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(verdict, chunks[0]);

    let note = Paragraph::new(Line::from(Span::styled(
        ADVISORY_NOTE,
        MedicalTheme::warning(),
    )))
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true });
    f.render_widget(note, chunks[1]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Error", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_verdict_footer(f: &mut Frame, area: Rect, state: &VerdictState) {
    let content = match state {
        VerdictState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Edit & Retry ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Patient ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Back to Form ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Patient ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
