//! Project use-case service.
//!
//! # Responsibility
//! - Provide project CRUD entry points for outer layers.
//! - Run order maintenance as explicit steps after create, delete and
//!   partition changes.
//!
//! # Invariants
//! - Payload updates never change `featured` or `display_order`.
//! - A partition change always rebalances both partitions before returning.
//! - Deleting a project always rebalances its former partition.

use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectStatus};
use crate::model::validation::ValidationError;
use crate::repo::project_repo::{ProjectListQuery, ProjectRepository};
use crate::repo::RepoError;
use crate::service::order_manager::{OrderError, OrderManager, RebalanceSummary, ReorderOutcome};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from project service operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    Validation(ValidationError),
    ProjectNotFound(ProjectId),
    Order(OrderError),
    Repo(RepoError),
}

impl ProjectServiceError {
    /// Whether the failure was caused by the request rather than the server.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::Validation(_) | Self::ProjectNotFound(_) => true,
            Self::Order(err) => err.is_client_error(),
            Self::Repo(_) => false,
        }
    }
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ProjectNotFound(id) => write!(f, "Project not found: {id}"),
            Self::Order(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::ProjectNotFound(_) => None,
            Self::Order(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ProjectServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<OrderError> for ProjectServiceError {
    fn from(value: OrderError) -> Self {
        match value {
            OrderError::Repo(RepoError::NotFound(id)) => Self::ProjectNotFound(id),
            other => Self::Order(other),
        }
    }
}

impl From<RepoError> for ProjectServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::ProjectNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type ProjectServiceResult<T> = Result<T, ProjectServiceError>;

/// Project service facade.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    fn orders(&self) -> OrderManager<'_, R> {
        OrderManager::new(&self.repo)
    }

    /// Validates `draft` and appends the new project to its partition.
    pub fn create_project(&self, draft: ProjectDraft) -> ProjectServiceResult<Project> {
        let draft = draft.validated()?;
        let display_order = self.orders().assign_on_create(draft.featured)?;
        let project = Project::from_draft(Uuid::new_v4(), draft, display_order);
        let stored = self.repo.insert_project(&project)?;
        info!(
            "event=project_create module=projects status=ok project_id={} featured={} display_order={}",
            stored.id, stored.featured, stored.display_order
        );
        Ok(stored)
    }

    pub fn get_project(&self, id: ProjectId) -> ProjectServiceResult<Project> {
        self.repo
            .get_project(id)?
            .ok_or(ProjectServiceError::ProjectNotFound(id))
    }

    /// Lists projects in display order, optionally restricted to a partition.
    pub fn list_projects(&self, featured: Option<bool>) -> ProjectServiceResult<Vec<Project>> {
        let query = ProjectListQuery {
            featured,
            status: None,
        };
        Ok(self.repo.list_projects(&query)?)
    }

    /// Published featured projects in display order.
    pub fn list_featured(&self) -> ProjectServiceResult<Vec<Project>> {
        self.list_published(true)
    }

    /// Published non-featured projects in display order.
    pub fn list_regular(&self) -> ProjectServiceResult<Vec<Project>> {
        self.list_published(false)
    }

    fn list_published(&self, featured: bool) -> ProjectServiceResult<Vec<Project>> {
        let query = ProjectListQuery {
            featured: Some(featured),
            status: Some(ProjectStatus::Published),
        };
        Ok(self.repo.list_projects(&query)?)
    }

    /// Replaces the payload fields of a project.
    ///
    /// `draft.featured` is ignored; use `set_featured` to change partitions.
    pub fn update_project(
        &self,
        id: ProjectId,
        draft: ProjectDraft,
    ) -> ProjectServiceResult<Project> {
        let draft = draft.validated()?;
        let updated = self.repo.update_project_payload(id, &draft)?;
        debug!("event=project_update module=projects status=ok project_id={id}");
        Ok(updated)
    }

    /// Deletes a project and closes the gap in its partition.
    pub fn delete_project(&self, id: ProjectId) -> ProjectServiceResult<Project> {
        let deleted = self
            .repo
            .delete_project(id)?
            .ok_or(ProjectServiceError::ProjectNotFound(id))?;
        let summary = self.orders().delete_cleanup(&deleted)?;
        info!(
            "event=project_delete module=projects status=ok project_id={} featured={} remaining={}",
            id, deleted.featured, summary.members
        );
        Ok(deleted)
    }

    /// Flips `featured` and returns the project with its new slot.
    pub fn toggle_featured(&self, id: ProjectId) -> ProjectServiceResult<Project> {
        let project = self.get_project(id)?;
        let target = !project.featured;
        self.move_partition(&project, target)
    }

    /// Sets `featured`; a no-op when the value does not change.
    pub fn set_featured(&self, id: ProjectId, featured: bool) -> ProjectServiceResult<Project> {
        let project = self.get_project(id)?;
        if project.featured == featured {
            return Ok(project);
        }
        self.move_partition(&project, featured)
    }

    fn move_partition(&self, project: &Project, featured: bool) -> ProjectServiceResult<Project> {
        let orders = self.orders();
        orders.assign_on_feature_toggle(project, featured)?;
        orders.rebalance(true)?;
        orders.rebalance(false)?;
        self.get_project(project.id)
    }

    /// Applies a caller-chosen order to one whole partition.
    pub fn reorder_projects(
        &self,
        ids: &[ProjectId],
        featured: bool,
    ) -> ProjectServiceResult<ReorderOutcome> {
        Ok(self.orders().reorder_by_sequence(ids, featured)?)
    }

    /// Rebalances both partitions (featured first).
    pub fn rebalance_all(&self) -> ProjectServiceResult<[RebalanceSummary; 2]> {
        let orders = self.orders();
        let featured = orders.rebalance(true)?;
        let regular = orders.rebalance(false)?;
        Ok([featured, regular])
    }
}
