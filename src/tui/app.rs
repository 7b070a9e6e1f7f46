//! Main TUI application state machine.
//!
//! Two screens: the intake form and the verdict. Submission encodes the
//! record and runs the predictor synchronously; a single logistic
//! regression evaluation is well under a frame.

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::application::ConfiguredPredictor;

use super::ui::{
    form::{render_intake_form, IntakeFormState},
    render_disclaimer,
    verdict::{render_verdict, VerdictState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Form,
    Verdict,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,
    predictor: ConfiguredPredictor,
    form_state: IntakeFormState,
    verdict_state: VerdictState,
}

impl App {
    /// Create the application around an already-built predictor.
    #[must_use]
    pub fn new(predictor: ConfiguredPredictor) -> Self {
        Self {
            screen: Screen::Form,
            should_quit: false,
            predictor,
            form_state: IntakeFormState::default(),
            verdict_state: VerdictState::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        // Nothing entered should survive the session.
        self.form_state.clear_sensitive();

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::Form => render_intake_form(f, chunks[0], &self.form_state),
                    Screen::Verdict => render_verdict(f, chunks[0], &self.verdict_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Esc
            || (key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL))
        {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Form => self.handle_form_key(key),
            Screen::Verdict => self.handle_verdict_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left => self.form_state.cycle_option(false),
            KeyCode::Right => self.form_state.cycle_option(true),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form_state.load_sample_data(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_verdict_key(&mut self, key: KeyCode) {
        match key {
            // Values are kept after an error so they can be corrected.
            KeyCode::Enter => self.screen = Screen::Form,
            KeyCode::Char('n') | KeyCode::Char('N') => {
                self.form_state = IntakeFormState::default();
                self.verdict_state = VerdictState::Idle;
                self.screen = Screen::Form;
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let record = match self.form_state.to_clinical_record() {
            Ok(record) => record,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        if let Err(errors) = record.validate() {
            self.form_state.error_message = Some(errors.join(", "));
            return;
        }

        self.verdict_state = match self.predictor.assess(&record) {
            Ok(prediction) => {
                self.form_state.clear_sensitive();
                VerdictState::Complete { prediction }
            }
            Err(e) => {
                tracing::error!("Prediction failed: {}", e);
                VerdictState::Error {
                    message: e.to_string(),
                }
            }
        };
        self.screen = Screen::Verdict;
    }
}
