//! Clinical intake form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    Categorical, ChestPainType, Choice, ClinicalRecord, RestingEcg, Sex, StSlope, Thalassemia,
};
use crate::tui::styles::MedicalTheme;

const YES_NO: [&str; 2] = ["No", "Yes"];

/// How a field takes input.
#[derive(Debug, Clone)]
pub enum FieldInput {
    /// Typed number checked against an inclusive range.
    Number {
        value: String,
        min: f64,
        max: f64,
        integer: bool,
    },
    /// One of a fixed list of options, cycled with Left/Right.
    Select {
        options: Vec<&'static str>,
        selected: usize,
    },
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub input: FieldInput,
}

impl FormField {
    fn number(label: &'static str, hint: &'static str, min: f64, max: f64, integer: bool) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Number {
                value: String::new(),
                min,
                max,
                integer,
            },
        }
    }

    fn select(label: &'static str, hint: &'static str, options: Vec<&'static str>) -> Self {
        Self {
            label,
            hint,
            input: FieldInput::Select {
                options,
                selected: 0,
            },
        }
    }

    fn options_of<T: Categorical>() -> Vec<&'static str> {
        T::ALL.iter().map(|option| option.label()).collect()
    }

    /// Parsed, range-checked numeric value.
    fn number_value(&self) -> Result<f64, String> {
        let FieldInput::Number {
            value,
            min,
            max,
            integer,
        } = &self.input
        else {
            return Err(format!("{}: not a numeric field", self.label));
        };

        let parsed: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", self.label))?;
        if *integer && parsed.fract() != 0.0 {
            return Err(format!("{}: Must be a whole number", self.label));
        }
        if !(*min..=*max).contains(&parsed) {
            return Err(format!(
                "{}: Value must be between {} and {}",
                self.label, min, max
            ));
        }
        Ok(parsed)
    }

    fn selected_label(&self) -> &'static str {
        match &self.input {
            FieldInput::Select { options, selected } => options.get(*selected).copied().unwrap_or(""),
            FieldInput::Number { .. } => "",
        }
    }

    fn set_number(&mut self, number: f64) {
        if let FieldInput::Number { value, .. } = &mut self.input {
            value.zeroize();
            *value = number.to_string();
        }
    }

    fn select_label(&mut self, label: &str) {
        if let FieldInput::Select { options, selected } = &mut self.input {
            *selected = options.iter().position(|o| *o == label).unwrap_or(0);
        }
    }
}

// Field positions, in record order.
const AGE: usize = 0;
const SEX: usize = 1;
const CHEST_PAIN: usize = 2;
const RESTING_BP: usize = 3;
const CHOLESTEROL: usize = 4;
const FASTING_SUGAR: usize = 5;
const RESTING_ECG: usize = 6;
const MAX_HEART_RATE: usize = 7;
const EXERCISE_ANGINA: usize = 8;
const ST_DEPRESSION: usize = 9;
const ST_SLOPE: usize = 10;
const MAJOR_VESSELS: usize = 11;
const THALASSEMIA: usize = 12;

/// Intake form state
pub struct IntakeFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for IntakeFormState {
    fn default() -> Self {
        let mut state = Self {
            fields: vec![
                FormField::number("Age", "years (1-100)", 1.0, 100.0, true),
                FormField::select("Sex", "", FormField::options_of::<Sex>()),
                FormField::select(
                    "Chest Pain Type",
                    "",
                    FormField::options_of::<ChestPainType>(),
                ),
                FormField::number("Resting Blood Pressure", "mmHg (50-200)", 50.0, 200.0, true),
                FormField::number("Cholesterol", "mg/dL (50-500)", 50.0, 500.0, true),
                FormField::select("Fasting Blood Sugar > 120", "", YES_NO.to_vec()),
                FormField::select("Resting ECG", "", FormField::options_of::<RestingEcg>()),
                FormField::number("Max Heart Rate", "bpm (50-200)", 50.0, 200.0, true),
                FormField::select("Exercise Induced Angina", "", YES_NO.to_vec()),
                FormField::number("ST Depression", "exercise vs rest (0-10)", 0.0, 10.0, false),
                FormField::select("ST Slope", "", FormField::options_of::<StSlope>()),
                FormField::number("Major Vessels", "fluoroscopy (0-4)", 0.0, 4.0, true),
                FormField::select("Thalassemia", "", FormField::options_of::<Thalassemia>()),
            ],
            selected_field: 0,
            error_message: None,
        };
        state.load_record(&ClinicalRecord::default());
        state
    }
}

impl IntakeFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Cycle the current select field forward (`true`) or backward.
    pub fn cycle_option(&mut self, forward: bool) {
        if let FieldInput::Select { options, selected } =
            &mut self.fields[self.selected_field].input
        {
            let n = options.len();
            *selected = if forward {
                (*selected + 1) % n
            } else {
                (*selected + n - 1) % n
            };
            self.error_message = None;
        }
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        if let FieldInput::Number { value, .. } = &mut self.fields[self.selected_field].input {
            if c.is_ascii_digit() || c == '.' {
                value.push(c);
                self.error_message = None;
            }
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FieldInput::Number { value, .. } = &mut self.fields[self.selected_field].input {
            value.pop();
        }
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        if let FieldInput::Number { value, .. } = &mut self.fields[self.selected_field].input {
            value.zeroize();
        }
    }

    /// Wipe all numeric buffers and reset selections.
    ///
    /// Called right after submission so entered values do not linger in UI state.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            match &mut field.input {
                FieldInput::Number { value, .. } => value.zeroize(),
                FieldInput::Select { selected, .. } => *selected = 0,
            }
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Fill every field from `record`.
    pub fn load_record(&mut self, record: &ClinicalRecord) {
        self.fields[AGE].set_number(f64::from(record.age));
        self.fields[SEX].select_label(&record.sex.to_string());
        self.fields[CHEST_PAIN].select_label(&record.chest_pain_type.to_string());
        self.fields[RESTING_BP].set_number(f64::from(record.resting_blood_pressure));
        self.fields[CHOLESTEROL].set_number(f64::from(record.cholesterol));
        self.fields[FASTING_SUGAR].select_label(YES_NO[usize::from(record.fasting_blood_sugar_high)]);
        self.fields[RESTING_ECG].select_label(&record.resting_ecg.to_string());
        self.fields[MAX_HEART_RATE].set_number(f64::from(record.max_heart_rate));
        self.fields[EXERCISE_ANGINA].select_label(YES_NO[usize::from(record.exercise_induced_angina)]);
        self.fields[ST_DEPRESSION].set_number(record.st_depression);
        self.fields[ST_SLOPE].select_label(&record.st_slope.to_string());
        self.fields[MAJOR_VESSELS].set_number(f64::from(record.num_major_vessels));
        self.fields[THALASSEMIA].select_label(&record.thalassemia.to_string());
        self.error_message = None;
    }

    /// Load the reference patient.
    pub fn load_sample_data(&mut self) {
        self.load_record(&ClinicalRecord::sample());
    }

    /// Validate and convert to a ClinicalRecord.
    ///
    /// Numeric values are checked against their ranges here; values are
    /// integral where required, so the casts below cannot truncate.
    pub fn to_clinical_record(&self) -> Result<ClinicalRecord, String> {
        let f = &self.fields;
        Ok(ClinicalRecord {
            age: f[AGE].number_value()? as u32,
            sex: Choice::from_raw(f[SEX].selected_label()),
            chest_pain_type: Choice::from_raw(f[CHEST_PAIN].selected_label()),
            resting_blood_pressure: f[RESTING_BP].number_value()? as u32,
            cholesterol: f[CHOLESTEROL].number_value()? as u32,
            fasting_blood_sugar_high: f[FASTING_SUGAR].selected_label() == YES_NO[1],
            resting_ecg: Choice::from_raw(f[RESTING_ECG].selected_label()),
            max_heart_rate: f[MAX_HEART_RATE].number_value()? as u32,
            exercise_induced_angina: f[EXERCISE_ANGINA].selected_label() == YES_NO[1],
            st_depression: f[ST_DEPRESSION].number_value()?,
            st_slope: Choice::from_raw(f[ST_SLOPE].selected_label()),
            num_major_vessels: f[MAJOR_VESSELS].number_value()? as u8,
            thalassemia: Choice::from_raw(f[THALASSEMIA].selected_label()),
        })
    }
}

/// Render the intake form
pub fn render_intake_form(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Heart Disease Prediction", MedicalTheme::title()),
        Span::styled(
            " │ Fill in the patient details and press Enter",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .margin(1)
        .split(area);

    // 5 / 4 / 4 fields per column
    let splits = [0, 5, 9, state.fields.len()];
    for (col, window) in splits.windows(2).enumerate() {
        render_field_column(
            f,
            columns[col],
            &state.fields[window[0]..window[1]],
            window[0],
            state.selected_field,
        );
    }
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match &field.input {
            FieldInput::Number { value, .. } if value.is_empty() => {
                spans.push(Span::styled(field.hint, MedicalTheme::text_muted()));
            }
            FieldInput::Number { value, .. } => {
                spans.push(Span::styled(value.as_str(), MedicalTheme::text()));
                if is_selected {
                    spans.push(Span::styled("▌", MedicalTheme::focused()));
                }
            }
            FieldInput::Select { .. } => {
                if is_selected {
                    spans.push(Span::styled("◂ ", MedicalTheme::key_hint()));
                }
                spans.push(Span::styled(field.selected_label(), MedicalTheme::text()));
                if is_selected {
                    spans.push(Span::styled(" ▸", MedicalTheme::key_hint()));
                }
            }
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &IntakeFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Choose ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Predict ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encode;

    fn set_value(state: &mut IntakeFormState, index: usize, text: &str) {
        state.selected_field = index;
        state.clear_field();
        for c in text.chars() {
            state.input_char(c);
        }
    }

    #[test]
    fn test_defaults_produce_default_record() {
        let state = IntakeFormState::default();
        assert_eq!(state.fields.len(), 13);
        assert_eq!(
            state.to_clinical_record().expect("defaults are valid"),
            ClinicalRecord::default()
        );
    }

    #[test]
    fn test_sample_data_round_trips_through_form() {
        let mut state = IntakeFormState::default();
        state.load_sample_data();
        let record = state.to_clinical_record().expect("valid");
        assert_eq!(record, ClinicalRecord::sample());
        assert_eq!(
            encode(&record).expect("encode").as_slice(),
            &[63.0, 1.0, 0.0, 145.0, 233.0, 1.0, 2.0, 150.0, 0.0, 2.3, 2.0, 0.0, 1.0]
        );
    }

    #[test]
    fn test_cycle_option_wraps() {
        let mut state = IntakeFormState::default();
        state.selected_field = THALASSEMIA;
        state.cycle_option(false);
        assert_eq!(state.fields[THALASSEMIA].selected_label(), "Reversable Defect");
        state.cycle_option(true);
        assert_eq!(state.fields[THALASSEMIA].selected_label(), "Normal");
    }

    #[test]
    fn test_out_of_range_value_is_rejected() {
        let mut state = IntakeFormState::default();
        set_value(&mut state, CHOLESTEROL, "600");
        let err = state.to_clinical_record().expect_err("must fail");
        assert!(err.contains("Cholesterol"));
    }

    #[test]
    fn test_fractional_age_is_rejected() {
        let mut state = IntakeFormState::default();
        set_value(&mut state, AGE, "40.5");
        assert!(state.to_clinical_record().is_err());
    }

    #[test]
    fn test_letters_are_ignored_in_numeric_fields() {
        let mut state = IntakeFormState::default();
        set_value(&mut state, ST_DEPRESSION, "1x.5");
        let record = state.to_clinical_record().expect("valid");
        assert!((record.st_depression - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear_sensitive_wipes_numbers() {
        let mut state = IntakeFormState::default();
        state.load_sample_data();
        state.clear_sensitive();
        assert!(state.fields.iter().all(|f| match &f.input {
            FieldInput::Number { value, .. } => value.is_empty(),
            FieldInput::Select { selected, .. } => *selected == 0,
        }));
        assert!(state.to_clinical_record().is_err());
    }
}
