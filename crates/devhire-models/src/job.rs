//! Job posting models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::user::UserId;

/// Unique identifier for a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Job posting stored in Firestore.
///
/// A posting is owned by exactly one employer. `applicant_ids` is append-only:
/// entries are added when a developer applies and never removed while the job
/// exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    /// Unique job ID
    pub id: JobId,

    /// Job title
    pub title: String,

    /// Full description
    pub description: String,

    /// Required skill tags. Non-empty; matched case-sensitively by filters.
    pub skills: Vec<String>,

    /// Offered salary. Positive.
    pub salary: f64,

    /// Location string, matched case-insensitively by filters.
    pub location: String,

    /// Owning employer
    pub employer_id: UserId,

    /// Users who applied, in application order
    #[serde(default)]
    pub applicant_ids: Vec<UserId>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new posting owned by `employer_id`.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        skills: Vec<String>,
        salary: f64,
        location: impl Into<String>,
        employer_id: UserId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            title: title.into(),
            description: description.into(),
            skills,
            salary,
            location: location.into(),
            employer_id,
            applicant_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update in place, touching `updated_at`.
    pub fn apply_patch(&mut self, patch: &JobPatch) {
        if let Some(ref title) = patch.title {
            self.title = title.clone();
        }
        if let Some(ref description) = patch.description {
            self.description = description.clone();
        }
        if let Some(ref skills) = patch.skills {
            self.skills = skills.clone();
        }
        if let Some(salary) = patch.salary {
            self.salary = salary;
        }
        if let Some(ref location) = patch.location {
            self.location = location.clone();
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update to a job posting. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skills: Option<Vec<String>>,
    pub salary: Option<f64>,
    pub location: Option<String>,
}

impl JobPatch {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.skills.is_none()
            && self.salary.is_none()
            && self.location.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> JobRecord {
        JobRecord::new(
            "Backend Engineer",
            "Build services",
            vec!["Go".to_string(), "SQL".to_string()],
            90_000.0,
            "Remote",
            UserId::from_string("employer-1"),
        )
    }

    #[test]
    fn new_job_has_no_applicants() {
        let job = sample_job();
        assert!(job.applicant_ids.is_empty());
        assert_eq!(job.employer_id.as_str(), "employer-1");
    }

    #[test]
    fn patch_updates_only_present_fields() {
        let mut job = sample_job();
        let patch = JobPatch {
            salary: Some(95_000.0),
            location: Some("Berlin".to_string()),
            ..JobPatch::default()
        };
        job.apply_patch(&patch);

        assert_eq!(job.salary, 95_000.0);
        assert_eq!(job.location, "Berlin");
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.skills, vec!["Go".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn empty_patch_detection() {
        assert!(JobPatch::default().is_empty());
        let patch = JobPatch {
            title: Some("t".to_string()),
            ..JobPatch::default()
        };
        assert!(!patch.is_empty());
    }
}
