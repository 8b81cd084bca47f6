//! Profile domain model with nested education and certification entries.
//!
//! # Invariants
//! - Nested entries keep their own stable ids across updates when the caller
//!   sends them back; entries without an id get a fresh one.

use crate::model::validation::{trim_all, trim_in_place, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ProfileId = Uuid;

pub const HEADLINE_MAX_CHARS: usize = 150;
pub const DEGREE_MAX_CHARS: usize = 100;
pub const INSTITUTION_MAX_CHARS: usize = 150;
pub const CERTIFICATE_MAX_CHARS: usize = 150;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub degree: String,
    pub institution: String,
    pub graduation_year: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub certificate_name: String,
    pub issuing_organization: String,
    pub year_issued: String,
}

/// Caller-supplied profile payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    #[serde(default)]
    pub profile_picture_url: Option<String>,
    pub headline: String,
    pub biography: String,
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub certifications: Vec<Certification>,
}

impl ProfileDraft {
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if let Some(url) = self.profile_picture_url.as_mut() {
            trim_in_place(url);
        }
        if self.profile_picture_url.as_deref() == Some("") {
            self.profile_picture_url = None;
        }
        trim_in_place(&mut self.headline);
        trim_in_place(&mut self.biography);
        trim_all(&mut self.skills);
        for entry in &mut self.education {
            trim_in_place(&mut entry.degree);
            trim_in_place(&mut entry.institution);
            trim_in_place(&mut entry.graduation_year);
        }
        for entry in &mut self.certifications {
            trim_in_place(&mut entry.certificate_name);
            trim_in_place(&mut entry.issuing_organization);
            trim_in_place(&mut entry.year_issued);
        }

        let mut validator = Validator::new();
        validator
            .optional_url(
                "profilePictureUrl",
                "profile picture URL",
                self.profile_picture_url.as_deref(),
            )
            .text("headline", "Headline", &self.headline, Some(HEADLINE_MAX_CHARS))
            .text("biography", "Biography", &self.biography, None)
            .list("skills", "At least one skill is required", "Skill", &self.skills);
        for entry in &self.education {
            validator
                .text("education.degree", "Degree", &entry.degree, Some(DEGREE_MAX_CHARS))
                .text(
                    "education.institution",
                    "Institution name",
                    &entry.institution,
                    Some(INSTITUTION_MAX_CHARS),
                )
                .year(
                    "education.graduationYear",
                    "Graduation year",
                    &entry.graduation_year,
                );
        }
        for entry in &self.certifications {
            validator
                .text(
                    "certifications.certificateName",
                    "Certificate name",
                    &entry.certificate_name,
                    Some(CERTIFICATE_MAX_CHARS),
                )
                .text(
                    "certifications.issuingOrganization",
                    "Issuing organization",
                    &entry.issuing_organization,
                    Some(CERTIFICATE_MAX_CHARS),
                )
                .year(
                    "certifications.yearIssued",
                    "Year issued",
                    &entry.year_issued,
                );
        }
        validator.finish()?;
        Ok(self)
    }
}

/// Persisted profile record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: ProfileId,
    pub profile_picture_url: Option<String>,
    pub headline: String,
    pub biography: String,
    pub skills: Vec<String>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::{Certification, Education, ProfileDraft};
    use uuid::Uuid;

    #[test]
    fn nested_entries_get_ids_and_are_validated() {
        let draft: ProfileDraft = serde_json::from_str(
            r#"{
                "headline": "Backend engineer",
                "biography": "Builds storage engines.",
                "skills": ["rust", "sql"],
                "education": [{"degree": "", "institution": "Uni", "graduationYear": "2019"}]
            }"#,
        )
        .unwrap();
        assert!(!draft.education[0].id.is_nil());

        let err = draft.validated().unwrap_err();
        assert!(err.has_field("education.degree"));
    }

    #[test]
    fn blank_picture_url_is_dropped() {
        let draft = ProfileDraft {
            profile_picture_url: Some("   ".to_string()),
            headline: "Engineer".to_string(),
            biography: "Bio".to_string(),
            skills: vec!["rust".to_string()],
            education: Vec::new(),
            certifications: Vec::new(),
        };
        assert_eq!(draft.validated().unwrap().profile_picture_url, None);
    }

    #[test]
    fn year_fields_must_have_plausible_length() {
        let draft = ProfileDraft {
            profile_picture_url: None,
            headline: "Engineer".to_string(),
            biography: "Bio".to_string(),
            skills: vec!["rust".to_string()],
            education: vec![Education {
                id: Uuid::new_v4(),
                degree: "BSc".to_string(),
                institution: "Uni".to_string(),
                graduation_year: "1".to_string(),
            }],
            certifications: vec![Certification {
                id: Uuid::new_v4(),
                certificate_name: "Cert".to_string(),
                issuing_organization: "Org".to_string(),
                year_issued: "12345678901".to_string(),
            }],
        };

        let err = draft.validated().unwrap_err();
        assert!(err.has_field("education.graduationYear"));
        assert!(err.has_field("certifications.yearIssued"));
    }
}
