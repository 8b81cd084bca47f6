//! Core domain logic for the portfolio backend.
//! This crate is the single source of truth for project display ordering.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, PortfolioConfig};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::experience::{Experience, ExperienceDraft, ExperienceId};
pub use model::profile::{Certification, Education, Profile, ProfileDraft, ProfileId};
pub use model::project::{Project, ProjectDraft, ProjectId, ProjectStatus};
pub use model::validation::{FieldIssue, ValidationError};
pub use repo::experience_repo::{ExperienceRepository, SqliteExperienceRepository};
pub use repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
pub use repo::project_repo::{
    PartitionRenumber, ProjectListQuery, ProjectRepository, SqliteProjectRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::order_manager::{
    OrderError, OrderManager, OrderResult, RebalanceSummary, ReorderOutcome,
};
pub use service::project_service::{ProjectService, ProjectServiceError, ProjectServiceResult};
pub use service::record_service::{
    ExperienceService, ProfileService, RecordServiceError, RecordServiceResult,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
