//! Log sanitization for clinical values.
//!
//! Formatted log lines pass through [`SanitizingMakeWriter`] before reaching
//! the sink. It redacts:
//! - clinical field assignments (`age=63`, `cholesterol: 233`)
//! - numeric feature vectors (`[63.0, 1.0, 0.0, ...]`)
//!
//! Call sites should still avoid logging record contents; this is the
//! fallback for values that slip into a formatted message.
//!
//! Input is capped at `CARDIOSCREEN_SANITIZE_MAX_BYTES` (default 16 KiB) per
//! call.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

static PATTERNS: OnceLock<ClinicalPatterns> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct RedactionRule {
    regex: Regex,
    replacement: &'static str,
}

struct ClinicalPatterns {
    set: RegexSet,
    rules: Vec<RedactionRule>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("CARDIOSCREEN_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static ClinicalPatterns {
    PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Field assignments, both the record's names and the short dataset codes.
            (
                r"(?i)\b(?P<key>age|sex|chest_pain_type|cp|resting_blood_pressure|trestbps|cholesterol|chol|fasting_blood_sugar_high|fbs|resting_ecg|restecg|max_heart_rate|thalach|exercise_induced_angina|exang|st_depression|oldpeak|st_slope|slope|num_major_vessels|ca|thalassemia|thal)\b\s*[:=]\s*(?:\x22[^\x22]{0,64}\x22|[A-Za-z0-9_.+-]{1,32})",
                "${key}=[REDACTED]",
            ),
            // Runs of five or more numbers in brackets look like feature vectors.
            (
                r"\[\s*-?\d+(?:\.\d+)?(?:\s*,\s*-?\d+(?:\.\d+)?){4,}\s*\]",
                "[REDACTED-FEATURES]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| RedactionRule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        ClinicalPatterns { set, rules }
    })
}

/// Redact clinical values from `input`.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let mut result = prefix.to_string();
    for idx in patterns.set.matches(prefix).into_iter() {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).to_string();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// Check whether a string carries anything [`sanitize`] would redact.
fn contains_clinical_values(input: &str) -> bool {
    let (prefix, _truncated) = truncate_to_char_boundary(input, max_sanitize_bytes());
    get_patterns().set.is_match(prefix)
}

/// A `tracing_subscriber` writer wrapper that sanitizes each formatted line.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let text = String::from_utf8_lossy(&line);
            // Most lines carry no values; skip the rewrite for those.
            if text.len() <= max_sanitize_bytes() && !contains_clinical_values(&text) {
                self.inner.write_all(text.as_bytes())?;
            } else {
                self.inner.write_all(sanitize(&text).as_bytes())?;
            }
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A formatter writing one huge line without newlines must not buffer forever.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sanitize_field_assignments() {
        let sanitized = sanitize("submitted age=63 cholesterol: 233 thal=\"Fixed Defect\"");
        assert_eq!(
            sanitized,
            "submitted age=[REDACTED] cholesterol=[REDACTED] thal=[REDACTED]"
        );
    }

    #[test]
    fn test_sanitize_feature_vector() {
        let sanitized = sanitize("features [63.0, 1.0, 0.0, 145.0, 233.0, 1.0] encoded");
        assert_eq!(sanitized, "features [REDACTED-FEATURES] encoded");
    }

    #[test]
    fn test_leaves_ordinary_text_alone() {
        let line = "Loaded model from \"models/heart_disease_model.json\" (n_features=13)";
        assert!(!contains_clinical_values(line));
        assert_eq!(sanitize(line), line);
        // Words that merely contain a field name are not assignments.
        assert_eq!(sanitize("image=cat.png"), "image=cat.png");
    }

    #[test]
    fn test_contains_clinical_values() {
        assert!(contains_clinical_values("oldpeak=2.3"));
        assert!(contains_clinical_values("[1, 2, 3, 4, 5]"));
        assert!(!contains_clinical_values("[1, 2]"));
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let sanitized = sanitize_with_limit("prefix age=63 and a long tail", 10);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_passes_clean_lines_through() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut sink);
            writer
                .write_all(b"Model signature verified\ncholesterol: 233\n")
                .expect("write");
            writer.flush().expect("flush");
        }
        assert_eq!(
            String::from_utf8(sink).expect("utf8"),
            "Model signature verified\ncholesterol=[REDACTED]\n"
        );
    }

    #[test]
    fn test_writer_sanitizes_lines() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut sink);
            writer.write_all(b"max_heart_rate=150\nplain").expect("write");
            writer.flush().expect("flush");
        }
        assert_eq!(
            String::from_utf8(sink).expect("utf8"),
            "max_heart_rate=[REDACTED]\nplain"
        );
    }
}
