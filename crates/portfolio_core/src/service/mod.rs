//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Own display-order maintenance for projects (`order_manager`).
//! - Keep outer layers decoupled from storage details.

pub mod order_manager;
pub mod project_service;
pub mod record_service;
