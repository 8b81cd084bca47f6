//! Project domain model.
//!
//! # Responsibility
//! - Define the persisted project record and the draft accepted from callers.
//! - Normalize and validate drafts before persistence.
//!
//! # Invariants
//! - `id` is stable and never reused for another project.
//! - `featured` is the ordering partition key.
//! - `display_order` is 1-based, unique and contiguous within its partition
//!   once every order-maintenance step of an operation has run.

use crate::model::validation::{trim_all, trim_in_place, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a project.
pub type ProjectId = Uuid;

pub const TITLE_MAX_CHARS: usize = 100;

/// Publication state of a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Published,
}

impl ProjectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

/// Caller-supplied project payload for create and update.
///
/// `featured` only matters on create; updates leave partition membership
/// to the toggle path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    pub image: String,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub url: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub featured: bool,
}

impl ProjectDraft {
    /// Trims every text field and validates the result.
    ///
    /// # Errors
    /// - Returns every failing field when the draft is not acceptable.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        trim_in_place(&mut self.title);
        trim_in_place(&mut self.description);
        trim_in_place(&mut self.image);
        trim_in_place(&mut self.github_url);
        trim_in_place(&mut self.url);
        trim_all(&mut self.technologies);

        Validator::new()
            .text("title", "Project title", &self.title, Some(TITLE_MAX_CHARS))
            .text("description", "Project description", &self.description, None)
            .url("image", "image URL", &self.image)
            .list(
                "technologies",
                "Technologies array cannot be empty",
                "Technology",
                &self.technologies,
            )
            .url("githubUrl", "GitHub URL", &self.github_url)
            .url("url", "project URL", &self.url)
            .finish()?;
        Ok(self)
    }
}

/// Persisted project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    pub image: String,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub url: String,
    pub status: ProjectStatus,
    pub featured: bool,
    pub display_order: i64,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms.
    pub updated_at: i64,
}

impl Project {
    /// Builds an unsaved record from a validated draft at the given slot.
    ///
    /// Timestamps are zero until the store assigns them.
    pub fn from_draft(id: ProjectId, draft: ProjectDraft, display_order: i64) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            image: draft.image,
            technologies: draft.technologies,
            github_url: draft.github_url,
            url: draft.url,
            status: draft.status,
            featured: draft.featured,
            display_order,
            created_at: 0,
            updated_at: 0,
        }
    }
}
