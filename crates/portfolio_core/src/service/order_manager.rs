//! Display-order maintenance for the two project partitions.
//!
//! # Responsibility
//! - Assign append slots on create and on partition change.
//! - Restore dense `1..N` ordering of one partition (rebalance).
//! - Apply an explicit caller-chosen order as one atomic unit.
//!
//! # Invariants
//! - Density: after an operation and its paired cleanup, each partition
//!   holds exactly the orders `1..=N`.
//! - Isolation: an operation scoped to one partition never rewrites orders
//!   in the other one.
//! - `reorder_by_sequence` validates before writing and never leaves a
//!   partially applied sequence.
//!
//! Concurrent operations on the same partition are not serialized here.
//! `assign_on_create` reads the partition max and writes in a separate
//! statement, so two racing creates can receive the same slot until the next
//! rebalance.

use crate::model::project::{Project, ProjectId};
use crate::repo::project_repo::ProjectRepository;
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub const REORDER_SUCCESS_MESSAGE: &str = "Display order successfully updated.";

pub type OrderResult<T> = Result<T, OrderError>;

/// Errors from order maintenance operations.
#[derive(Debug)]
pub enum OrderError {
    /// Reorder request carried no ids.
    EmptySequence,
    /// The same id appears more than once in a reorder request.
    DuplicateId(ProjectId),
    /// A referenced project does not exist.
    UnknownProject(ProjectId),
    /// A referenced project belongs to the other partition.
    WrongPartition { id: ProjectId, featured: bool },
    /// Reorder request does not cover the whole partition.
    MembershipMismatch {
        featured: bool,
        partition_size: usize,
        requested: usize,
    },
    /// A write failed mid-sequence; every write of the call was rolled back.
    ReorderAborted(RepoError),
    /// Persistence failure on assign/rebalance paths.
    Repo(RepoError),
}

impl OrderError {
    /// Whether the caller sent an unacceptable request, as opposed to a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptySequence
                | Self::DuplicateId(_)
                | Self::UnknownProject(_)
                | Self::WrongPartition { .. }
                | Self::MembershipMismatch { .. }
        )
    }
}

impl Display for OrderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySequence => write!(f, "ids must be a non-empty array of project IDs"),
            Self::DuplicateId(id) => write!(f, "project id listed more than once: {id}"),
            Self::UnknownProject(id) => write!(f, "project not found: {id}"),
            Self::WrongPartition { id, featured } => write!(
                f,
                "project {id} does not belong to the featured={featured} group"
            ),
            Self::MembershipMismatch {
                featured,
                partition_size,
                requested,
            } => write!(
                f,
                "reorder must list every project of the featured={featured} group: expected {partition_size}, got {requested}"
            ),
            Self::ReorderAborted(err) => write!(f, "reorder aborted and rolled back: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OrderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReorderAborted(err) | Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for OrderError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Result of rebalancing one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RebalanceSummary {
    pub featured: bool,
    pub members: usize,
    /// Rows whose order value actually changed.
    pub reassigned: usize,
}

/// Result of an accepted reorder request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderOutcome {
    pub success: bool,
    pub message: String,
    pub featured: bool,
    /// Ids in their new display order.
    pub order: Vec<ProjectId>,
    pub reassigned: usize,
}

/// Order maintenance over a borrowed project repository.
pub struct OrderManager<'r, R: ProjectRepository + ?Sized> {
    repo: &'r R,
}

impl<'r, R: ProjectRepository + ?Sized> OrderManager<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// Returns the append slot for a new project in `featured`.
    ///
    /// Touches no existing record.
    pub fn assign_on_create(&self, featured: bool) -> OrderResult<i64> {
        let max = self.repo.max_display_order(featured)?;
        Ok(next_slot(max))
    }

    /// Moves `project` into `featured` at the end of that partition.
    ///
    /// Returns the assigned order. When `project` is already in `featured`
    /// nothing is written and its current order is returned. The partition it
    /// leaves keeps a hole until `rebalance` runs for it.
    pub fn assign_on_feature_toggle(&self, project: &Project, featured: bool) -> OrderResult<i64> {
        if project.featured == featured {
            return Ok(project.display_order);
        }

        let slot = next_slot(self.repo.max_display_order(featured)?);
        self.repo.move_to_partition(project.id, featured, slot)?;
        info!(
            "event=order_toggle module=ordering status=ok project_id={} from_featured={} to_featured={} display_order={}",
            project.id, project.featured, featured, slot
        );
        Ok(slot)
    }

    /// Renumbers `featured` to `1..=N`, keeping current relative order.
    ///
    /// Ties (duplicate orders) keep insertion order. Running it on a dense
    /// partition changes nothing.
    pub fn rebalance(&self, featured: bool) -> OrderResult<RebalanceSummary> {
        let started_at = Instant::now();
        let renumber = self.repo.rebalance_partition(featured)?;
        info!(
            "event=order_rebalance module=ordering status=ok featured={} members={} reassigned={} duration_ms={}",
            featured,
            renumber.members,
            renumber.reassigned,
            started_at.elapsed().as_millis()
        );
        Ok(RebalanceSummary {
            featured,
            members: renumber.members,
            reassigned: renumber.reassigned,
        })
    }

    /// Assigns `position + 1` to every id, as one all-or-nothing write.
    ///
    /// # Errors
    /// - Client errors when `ids` is empty, repeats an id, references a
    ///   missing project or one outside `featured`, or does not list every
    ///   member of the partition. Nothing is written in these cases.
    /// - `OrderError::ReorderAborted` when a write fails; the partition is
    ///   left exactly as it was.
    pub fn reorder_by_sequence(
        &self,
        ids: &[ProjectId],
        featured: bool,
    ) -> OrderResult<ReorderOutcome> {
        let started_at = Instant::now();
        if let Err(err) = self.check_sequence(ids, featured) {
            warn!(
                "event=order_reorder module=ordering status=rejected featured={} requested={} error={}",
                featured,
                ids.len(),
                err
            );
            return Err(err);
        }

        let reassigned = match self.repo.write_order_sequence(featured, ids) {
            Ok(count) => count,
            Err(RepoError::PartitionChanged { actual, .. }) => {
                return Err(OrderError::MembershipMismatch {
                    featured,
                    partition_size: actual,
                    requested: ids.len(),
                });
            }
            Err(err) => {
                warn!(
                    "event=order_reorder module=ordering status=aborted featured={} requested={} duration_ms={} error={}",
                    featured,
                    ids.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(OrderError::ReorderAborted(err));
            }
        };

        info!(
            "event=order_reorder module=ordering status=ok featured={} members={} reassigned={} duration_ms={}",
            featured,
            ids.len(),
            reassigned,
            started_at.elapsed().as_millis()
        );
        Ok(ReorderOutcome {
            success: true,
            message: REORDER_SUCCESS_MESSAGE.to_string(),
            featured,
            order: ids.to_vec(),
            reassigned,
        })
    }

    /// Closes the gap left by a removed project in its former partition.
    pub fn delete_cleanup(&self, deleted: &Project) -> OrderResult<RebalanceSummary> {
        self.rebalance(deleted.featured)
    }

    fn check_sequence(&self, ids: &[ProjectId], featured: bool) -> OrderResult<()> {
        if ids.is_empty() {
            return Err(OrderError::EmptySequence);
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(*id) {
                return Err(OrderError::DuplicateId(*id));
            }
        }

        let members: HashSet<ProjectId> =
            self.repo.list_partition_ids(featured)?.into_iter().collect();
        for id in ids {
            if members.contains(id) {
                continue;
            }
            return Err(match self.repo.get_project(*id)? {
                None => OrderError::UnknownProject(*id),
                Some(_) => OrderError::WrongPartition { id: *id, featured },
            });
        }

        if members.len() != ids.len() {
            return Err(OrderError::MembershipMismatch {
                featured,
                partition_size: members.len(),
                requested: ids.len(),
            });
        }
        Ok(())
    }
}

fn next_slot(max: Option<i64>) -> i64 {
    max.map_or(1, |value| value.max(0).saturating_add(1))
}
