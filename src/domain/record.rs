//! Clinical record types for heart disease risk screening.
//!
//! Thirteen measurements as collected by the intake form. Categorical fields
//! are typed enums wrapped in [`Choice`], so a value that arrived from outside
//! (a JSON file, a free-text field) and matches no known option is kept as
//! [`Choice::Unrecognized`] instead of being coerced into a wrong category.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A categorical clinical field with a fixed encoding table.
pub trait Categorical: Copy + Eq + fmt::Debug + 'static {
    /// Field name used in errors and logs.
    const FIELD: &'static str;

    /// Every declared option, in form order.
    const ALL: &'static [Self];

    /// Integer code the classifier was trained on.
    fn code(self) -> u8;

    /// Human-readable option text shown in the form.
    fn label(self) -> &'static str;

    /// Parse from the form label, the variant name or its snake_case form.
    fn parse(raw: &str) -> Option<Self> {
        let wanted = normalize(raw);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.iter().copied().find(|option| {
            normalize(option.label()) == wanted || normalize(&format!("{option:?}")) == wanted
        })
    }
}

/// Lowercase alphanumerics only: "ST-T Wave Abnormality" == "STTWaveAbnormality".
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Value of a categorical field: a declared option or the raw input that
/// matched none of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Known(T),
    Unrecognized(String),
}

impl<T: Categorical> Choice<T> {
    /// Resolve raw input against the declared options.
    #[must_use]
    pub fn from_raw(raw: &str) -> Self {
        match T::parse(raw) {
            Some(option) => Self::Known(option),
            None => Self::Unrecognized(raw.to_string()),
        }
    }

    /// The declared option, if any.
    #[must_use]
    pub fn known(&self) -> Option<T> {
        match self {
            Self::Known(option) => Some(*option),
            Self::Unrecognized(_) => None,
        }
    }
}

impl<T: Categorical> From<T> for Choice<T> {
    fn from(option: T) -> Self {
        Self::Known(option)
    }
}

impl<T: Categorical> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(option) => f.write_str(option.label()),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

impl<T: Categorical> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Strings are matched against the options; other scalars (`1`, `true`)
/// are kept as unrecognized text so encoding reports them.
impl<'de, T: Categorical> Deserialize<'de> for Choice<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(raw) => raw,
            scalar @ (serde_json::Value::Number(_)
            | serde_json::Value::Bool(_)
            | serde_json::Value::Null) => scalar.to_string(),
            other => {
                return Err(D::Error::custom(format!(
                    "{}: expected a label, got {other}",
                    T::FIELD
                )))
            }
        };
        Ok(Self::from_raw(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Categorical for Sex {
    const FIELD: &'static str = "sex";
    const ALL: &'static [Self] = &[Self::Male, Self::Female];

    fn code(self) -> u8 {
        match self {
            Self::Male => 1,
            Self::Female => 0,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChestPainType {
    TypicalAngina,
    AtypicalAngina,
    NonAnginalPain,
    Asymptomatic,
}

impl Categorical for ChestPainType {
    const FIELD: &'static str = "chest_pain_type";
    const ALL: &'static [Self] = &[
        Self::TypicalAngina,
        Self::AtypicalAngina,
        Self::NonAnginalPain,
        Self::Asymptomatic,
    ];

    fn code(self) -> u8 {
        match self {
            Self::TypicalAngina => 0,
            Self::AtypicalAngina => 1,
            Self::NonAnginalPain => 2,
            Self::Asymptomatic => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::TypicalAngina => "Typical Angina",
            Self::AtypicalAngina => "Atypical Angina",
            Self::NonAnginalPain => "Non-anginal Pain",
            Self::Asymptomatic => "Asymptomatic",
        }
    }
}

/// Resting electrocardiographic result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestingEcg {
    Normal,
    STTWaveAbnormality,
    LeftVentricularHypertrophy,
}

impl Categorical for RestingEcg {
    const FIELD: &'static str = "resting_ecg";
    const ALL: &'static [Self] = &[
        Self::Normal,
        Self::STTWaveAbnormality,
        Self::LeftVentricularHypertrophy,
    ];

    fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::STTWaveAbnormality => 1,
            Self::LeftVentricularHypertrophy => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::STTWaveAbnormality => "ST-T Wave Abnormality",
            Self::LeftVentricularHypertrophy => "Left Ventricular Hypertrophy",
        }
    }
}

/// Slope of the peak exercise ST segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StSlope {
    Upsloping,
    Flat,
    Downsloping,
}

impl Categorical for StSlope {
    const FIELD: &'static str = "st_slope";
    const ALL: &'static [Self] = &[Self::Upsloping, Self::Flat, Self::Downsloping];

    fn code(self) -> u8 {
        match self {
            Self::Upsloping => 0,
            Self::Flat => 1,
            Self::Downsloping => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Upsloping => "Upsloping",
            Self::Flat => "Flat",
            Self::Downsloping => "Downsloping",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Thalassemia {
    Normal,
    FixedDefect,
    ReversableDefect,
}

impl Categorical for Thalassemia {
    const FIELD: &'static str = "thalassemia";
    const ALL: &'static [Self] = &[Self::Normal, Self::FixedDefect, Self::ReversableDefect];

    fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::FixedDefect => 1,
            Self::ReversableDefect => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::FixedDefect => "Fixed Defect",
            Self::ReversableDefect => "Reversable Defect",
        }
    }
}

/// One patient's clinical measurements, in classifier feature order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    /// Age in years (1-100)
    pub age: u32,

    pub sex: Choice<Sex>,

    pub chest_pain_type: Choice<ChestPainType>,

    /// Resting blood pressure in mmHg (50-200)
    pub resting_blood_pressure: u32,

    /// Serum cholesterol in mg/dL (50-500)
    pub cholesterol: u32,

    /// Fasting blood sugar > 120 mg/dL
    pub fasting_blood_sugar_high: bool,

    pub resting_ecg: Choice<RestingEcg>,

    /// Maximum heart rate achieved (50-200)
    pub max_heart_rate: u32,

    pub exercise_induced_angina: bool,

    /// ST depression induced by exercise relative to rest (0.0-10.0)
    pub st_depression: f64,

    pub st_slope: Choice<StSlope>,

    /// Number of major vessels colored by fluoroscopy (0-4)
    pub num_major_vessels: u8,

    pub thalassemia: Choice<Thalassemia>,
}

impl Default for ClinicalRecord {
    /// The intake form's initial values.
    fn default() -> Self {
        Self {
            age: 25,
            sex: Sex::Male.into(),
            chest_pain_type: ChestPainType::TypicalAngina.into(),
            resting_blood_pressure: 120,
            cholesterol: 200,
            fasting_blood_sugar_high: false,
            resting_ecg: RestingEcg::Normal.into(),
            max_heart_rate: 150,
            exercise_induced_angina: false,
            st_depression: 0.0,
            st_slope: StSlope::Upsloping.into(),
            num_major_vessels: 0,
            thalassemia: Thalassemia::Normal.into(),
        }
    }
}

impl ClinicalRecord {
    /// Reference patient: 63yo male, typical angina, LVH on resting ECG.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            age: 63,
            sex: Sex::Male.into(),
            chest_pain_type: ChestPainType::TypicalAngina.into(),
            resting_blood_pressure: 145,
            cholesterol: 233,
            fasting_blood_sugar_high: true,
            resting_ecg: RestingEcg::LeftVentricularHypertrophy.into(),
            max_heart_rate: 150,
            exercise_induced_angina: false,
            st_depression: 2.3,
            st_slope: StSlope::Downsloping.into(),
            num_major_vessels: 0,
            thalassemia: Thalassemia::FixedDefect.into(),
        }
    }

    /// Check every field against its declared domain.
    ///
    /// # Errors
    /// Returns all violations found, one message per field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        check_range(&mut errors, "Age", self.age, 1, 100);
        check_range(
            &mut errors,
            "Resting blood pressure",
            self.resting_blood_pressure,
            50,
            200,
        );
        check_range(&mut errors, "Cholesterol", self.cholesterol, 50, 500);
        check_range(&mut errors, "Maximum heart rate", self.max_heart_rate, 50, 200);
        check_range(&mut errors, "Major vessels", self.num_major_vessels, 0, 4);
        if !self.st_depression.is_finite() || !(0.0..=10.0).contains(&self.st_depression) {
            errors.push(format!(
                "ST depression {} out of range [0, 10]",
                self.st_depression
            ));
        }

        check_choice(&mut errors, &self.sex);
        check_choice(&mut errors, &self.chest_pain_type);
        check_choice(&mut errors, &self.resting_ecg);
        check_choice(&mut errors, &self.st_slope);
        check_choice(&mut errors, &self.thalassemia);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_range<N>(errors: &mut Vec<String>, name: &str, value: N, min: N, max: N)
where
    N: PartialOrd + fmt::Display,
{
    if value < min || value > max {
        errors.push(format!("{name} {value} out of range [{min}, {max}]"));
    }
}

fn check_choice<T: Categorical>(errors: &mut Vec<String>, choice: &Choice<T>) {
    if let Choice::Unrecognized(raw) = choice {
        errors.push(format!("{}: unrecognized value {raw:?}", T::FIELD));
    }
}
