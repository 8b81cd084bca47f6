//! Work experience domain model.

use crate::model::validation::{trim_all, trim_in_place, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ExperienceId = Uuid;

pub const JOB_TITLE_MAX_CHARS: usize = 150;
pub const COMPANY_NAME_MAX_CHARS: usize = 150;
pub const OPEN_END_DATE: &str = "Present";

fn open_end_date() -> String {
    OPEN_END_DATE.to_string()
}

/// Caller-supplied work experience payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceDraft {
    pub job_title: String,
    pub company_name: String,
    pub start_date: String,
    #[serde(default = "open_end_date")]
    pub end_date: String,
    #[serde(default)]
    pub is_current: bool,
    /// Bullet points.
    pub description: Vec<String>,
}

impl ExperienceDraft {
    /// Trims text, fills a blank end date with `Present`, then validates.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        trim_in_place(&mut self.job_title);
        trim_in_place(&mut self.company_name);
        trim_in_place(&mut self.start_date);
        trim_in_place(&mut self.end_date);
        trim_all(&mut self.description);
        if self.end_date.is_empty() {
            self.end_date = open_end_date();
        }

        Validator::new()
            .text("jobTitle", "Job title", &self.job_title, Some(JOB_TITLE_MAX_CHARS))
            .text(
                "companyName",
                "Company name",
                &self.company_name,
                Some(COMPANY_NAME_MAX_CHARS),
            )
            .text("startDate", "Start date", &self.start_date, None)
            .list(
                "description",
                "Job description must contain at least one bullet point.",
                "Bullet point",
                &self.description,
            )
            .finish()?;
        Ok(self)
    }
}

/// Persisted work experience record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: ExperienceId,
    pub job_title: String,
    pub company_name: String,
    pub start_date: String,
    pub end_date: String,
    pub is_current: bool,
    pub description: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}
