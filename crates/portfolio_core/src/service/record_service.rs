//! Use-case services for the unordered collections (experience, profile).
//!
//! # Responsibility
//! - Validate drafts and delegate persistence to repositories.
//! - Map repository not-found results to a semantic service error.

use crate::model::experience::{Experience, ExperienceDraft, ExperienceId};
use crate::model::profile::{Profile, ProfileDraft, ProfileId};
use crate::model::validation::ValidationError;
use crate::repo::experience_repo::ExperienceRepository;
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoError;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

#[derive(Debug)]
pub enum RecordServiceError {
    Validation(ValidationError),
    NotFound { kind: &'static str, id: Uuid },
    Repo(RepoError),
}

impl RecordServiceError {
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Repo(_))
    }

    fn from_repo(kind: &'static str, err: RepoError) -> Self {
        match err {
            RepoError::NotFound(id) => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

impl Display for RecordServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RecordServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for RecordServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type RecordServiceResult<T> = Result<T, RecordServiceError>;

const EXPERIENCE: &str = "Experience";
const PROFILE: &str = "Profile";

/// Work experience service facade.
pub struct ExperienceService<R: ExperienceRepository> {
    repo: R,
}

impl<R: ExperienceRepository> ExperienceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_experience(&self, draft: ExperienceDraft) -> RecordServiceResult<Experience> {
        let draft = draft.validated()?;
        let created = self
            .repo
            .create_experience(&draft)
            .map_err(|err| RecordServiceError::from_repo(EXPERIENCE, err))?;
        debug!(
            "event=experience_create module=experience status=ok id={}",
            created.id
        );
        Ok(created)
    }

    pub fn get_experience(&self, id: ExperienceId) -> RecordServiceResult<Experience> {
        self.repo
            .get_experience(id)
            .map_err(|err| RecordServiceError::from_repo(EXPERIENCE, err))?
            .ok_or(RecordServiceError::NotFound {
                kind: EXPERIENCE,
                id,
            })
    }

    /// Lists experiences, most recent start date first.
    pub fn list_experiences(&self) -> RecordServiceResult<Vec<Experience>> {
        self.repo
            .list_experiences()
            .map_err(|err| RecordServiceError::from_repo(EXPERIENCE, err))
    }

    pub fn update_experience(
        &self,
        id: ExperienceId,
        draft: ExperienceDraft,
    ) -> RecordServiceResult<Experience> {
        let draft = draft.validated()?;
        self.repo
            .update_experience(id, &draft)
            .map_err(|err| RecordServiceError::from_repo(EXPERIENCE, err))
    }

    pub fn delete_experience(&self, id: ExperienceId) -> RecordServiceResult<()> {
        self.repo
            .delete_experience(id)
            .map_err(|err| RecordServiceError::from_repo(EXPERIENCE, err))
    }
}

/// Profile service facade.
pub struct ProfileService<R: ProfileRepository> {
    repo: R,
}

impl<R: ProfileRepository> ProfileService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_profile(&self, draft: ProfileDraft) -> RecordServiceResult<Profile> {
        let draft = draft.validated()?;
        let created = self
            .repo
            .create_profile(&draft)
            .map_err(|err| RecordServiceError::from_repo(PROFILE, err))?;
        debug!(
            "event=profile_create module=profile status=ok id={}",
            created.id
        );
        Ok(created)
    }

    pub fn get_profile(&self, id: ProfileId) -> RecordServiceResult<Profile> {
        self.repo
            .get_profile(id)
            .map_err(|err| RecordServiceError::from_repo(PROFILE, err))?
            .ok_or(RecordServiceError::NotFound { kind: PROFILE, id })
    }

    /// Lists profiles, newest first.
    pub fn list_profiles(&self) -> RecordServiceResult<Vec<Profile>> {
        self.repo
            .list_profiles()
            .map_err(|err| RecordServiceError::from_repo(PROFILE, err))
    }

    pub fn update_profile(
        &self,
        id: ProfileId,
        draft: ProfileDraft,
    ) -> RecordServiceResult<Profile> {
        let draft = draft.validated()?;
        self.repo
            .update_profile(id, &draft)
            .map_err(|err| RecordServiceError::from_repo(PROFILE, err))
    }

    pub fn delete_profile(&self, id: ProfileId) -> RecordServiceResult<()> {
        self.repo
            .delete_profile(id)
            .map_err(|err| RecordServiceError::from_repo(PROFILE, err))
    }
}
