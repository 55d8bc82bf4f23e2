//! Firestore REST API client for the DevHire backend.
//!
//! This crate provides:
//! - Typed repositories for users, jobs, and applications
//! - Job browsing with filters and offset pagination
//! - Service account authentication via gcp_auth
//! - Merge updates, write preconditions, and retry logic

pub mod applications_repo;
pub mod client;
pub mod error;
pub mod jobs_repo;
pub mod metrics;
pub mod query;
pub mod retry;
pub mod token_cache;
pub mod types;
pub mod users_repo;

#[cfg(test)]
mod client_tests;

pub use applications_repo::ApplicationRepository;
pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use jobs_repo::{JobPage, JobRepository};
pub use query::{JobFilter, JobSort};
pub use users_repo::UserRepository;
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};
