//! Job application models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobId;
use crate::user::UserId;

/// Application review status.
///
/// Applications are created as `Pending`. `Accepted` and `Rejected` are
/// terminal; there is no transition back to `Pending`. No wired endpoint
/// performs the transition yet, so the variants exist for employers' review
/// tooling to build on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Parse from the stored string, defaulting to `Pending`.
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "accepted" => ApplicationStatus::Accepted,
            "rejected" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One developer's application to one job.
///
/// The document ID is derived from the `(job, applicant)` pair, so the store
/// itself rejects a second application for the same pair — the uniqueness
/// guarantee does not depend on a read-then-write check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    /// Document ID: `{job_id}_{applicant_id}`
    pub id: String,

    /// Job applied to
    pub job_id: JobId,

    /// Applying developer
    pub applicant_id: UserId,

    /// Optional cover letter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,

    /// Review status
    #[serde(default)]
    pub status: ApplicationStatus,

    /// Submission timestamp
    pub applied_at: DateTime<Utc>,
}

impl ApplicationRecord {
    /// Deterministic document ID for a `(job, applicant)` pair.
    pub fn document_id(job_id: &JobId, applicant_id: &UserId) -> String {
        format!("{}_{}", job_id.as_str(), applicant_id.as_str())
    }

    /// Create a new pending application.
    pub fn new(job_id: JobId, applicant_id: UserId, cover_letter: Option<String>) -> Self {
        Self {
            id: Self::document_id(&job_id, &applicant_id),
            job_id,
            applicant_id,
            cover_letter,
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_is_deterministic_per_pair() {
        let job = JobId::from_string("job-1");
        let dev = UserId::from_string("dev-1");

        let a = ApplicationRecord::new(job.clone(), dev.clone(), None);
        let b = ApplicationRecord::new(job, dev, Some("hello".to_string()));

        // Same pair always maps to the same document, whatever the payload.
        assert_eq!(a.id, b.id);
        assert_eq!(a.id, "job-1_dev-1");
    }

    #[test]
    fn different_pairs_get_different_documents() {
        let job = JobId::from_string("job-1");
        let a = ApplicationRecord::document_id(&job, &UserId::from_string("dev-1"));
        let b = ApplicationRecord::document_id(&job, &UserId::from_string("dev-2"));
        assert_ne!(a, b);
    }

    #[test]
    fn new_application_is_pending() {
        let app = ApplicationRecord::new(
            JobId::from_string("job-1"),
            UserId::from_string("dev-1"),
            None,
        );
        assert_eq!(app.status, ApplicationStatus::Pending);
        assert!(app.cover_letter.is_none());
    }

    #[test]
    fn status_parsing() {
        assert_eq!(
            ApplicationStatus::from_str_or_default("accepted"),
            ApplicationStatus::Accepted
        );
        assert_eq!(
            ApplicationStatus::from_str_or_default("rejected"),
            ApplicationStatus::Rejected
        );
        assert_eq!(
            ApplicationStatus::from_str_or_default("anything"),
            ApplicationStatus::Pending
        );
    }
}
