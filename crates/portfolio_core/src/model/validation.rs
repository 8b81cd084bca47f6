//! Field-level validation shared by all drafts.
//!
//! # Invariants
//! - Validation reports every failing field, not only the first one.
//! - Text is trimmed before length checks; lengths count chars, not bytes.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

// Absolute URL with an explicit protocol and a dotted host.
static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(https?|ftp)://[^\s/?#.]+(\.[^\s/?#.]+)+(:\d+)?([/?#]\S*)?$")
        .expect("URL pattern is a valid regex")
});

const YEAR_MIN_CHARS: usize = 4;
const YEAR_MAX_CHARS: usize = 9;

/// One failing field with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: String,
}

/// Validation failure carrying every failing field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

impl ValidationError {
    /// Returns whether `field` is among the failing fields.
    pub fn has_field(&self, field: &str) -> bool {
        self.issues.iter().any(|issue| issue.field == field)
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .issues
            .iter()
            .map(|issue| format!("{}: {}", issue.field, issue.message))
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "validation failed: {joined}")
    }
}

impl Error for ValidationError {}

/// Accumulates field issues for one draft.
#[derive(Debug, Default)]
pub(crate) struct Validator {
    issues: Vec<FieldIssue>,
}

impl Validator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(FieldIssue {
            field,
            message: message.into(),
        });
    }

    /// Requires non-blank text, optionally capped at `max_chars`.
    pub(crate) fn text(
        &mut self,
        field: &'static str,
        label: &str,
        value: &str,
        max_chars: Option<usize>,
    ) -> &mut Self {
        if value.is_empty() {
            self.push(field, format!("{label} is required"));
        } else if let Some(max) = max_chars {
            if value.chars().count() > max {
                self.push(field, format!("{label} cannot exceed {max} characters"));
            }
        }
        self
    }

    /// Requires a year-like value of `YEAR_MIN_CHARS..=YEAR_MAX_CHARS` chars,
    /// e.g. `2020` or `2019-2021`.
    pub(crate) fn year(&mut self, field: &'static str, label: &str, value: &str) -> &mut Self {
        let length = value.chars().count();
        if value.is_empty() {
            self.push(field, format!("{label} is required"));
        } else if !(YEAR_MIN_CHARS..=YEAR_MAX_CHARS).contains(&length) {
            self.push(field, format!("{label} must be valid"));
        }
        self
    }

    pub(crate) fn url(&mut self, field: &'static str, label: &str, value: &str) -> &mut Self {
        if value.is_empty() {
            self.push(field, format!("{label} is required"));
        } else if !is_valid_url(value) {
            self.push(field, format!("Invalid {label}"));
        }
        self
    }

    pub(crate) fn optional_url(
        &mut self,
        field: &'static str,
        label: &str,
        value: Option<&str>,
    ) -> &mut Self {
        if let Some(value) = value {
            if !is_valid_url(value) {
                self.push(field, format!("Invalid {label}"));
            }
        }
        self
    }

    /// Requires at least one entry and no blank entries.
    pub(crate) fn list(
        &mut self,
        field: &'static str,
        empty_message: &str,
        item_label: &str,
        values: &[String],
    ) -> &mut Self {
        if values.is_empty() {
            self.push(field, empty_message);
        } else if values.iter().any(|value| value.is_empty()) {
            self.push(field, format!("{item_label} cannot be empty"));
        }
        self
    }

    pub(crate) fn finish(&mut self) -> Result<(), ValidationError> {
        if self.issues.is_empty() {
            return Ok(());
        }
        Err(ValidationError {
            issues: std::mem::take(&mut self.issues),
        })
    }
}

/// Returns whether `value` is an absolute URL with an explicit protocol.
pub fn is_valid_url(value: &str) -> bool {
    URL_PATTERN.is_match(value)
}

pub(crate) fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub(crate) fn trim_all(values: &mut [String]) {
    for value in values {
        trim_in_place(value);
    }
}
