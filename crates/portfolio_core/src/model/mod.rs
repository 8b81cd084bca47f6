//! Domain models for the portfolio collections.
//!
//! # Responsibility
//! - Define the canonical records persisted for projects, work experience
//!   and profiles, plus their create/update drafts.
//! - Validate drafts before they reach a repository.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at creation.
//! - `Project::display_order` is owned by the order manager; drafts cannot
//!   carry it.

pub mod experience;
pub mod profile;
pub mod project;
pub mod validation;
