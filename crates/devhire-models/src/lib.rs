//! Shared data models for the DevHire backend.
//!
//! This crate provides Serde-serializable types for:
//! - User accounts and roles
//! - Job postings
//! - Job applications and their status

pub mod application;
pub mod job;
pub mod user;

// Re-export common types
pub use application::{ApplicationRecord, ApplicationStatus};
pub use job::{JobId, JobPatch, JobRecord};
pub use user::{PublicUser, Role, UserId, UserRecord};
