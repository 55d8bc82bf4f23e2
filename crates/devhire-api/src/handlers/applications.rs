//! Job application handlers.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use devhire_firestore::FirestoreError;
use devhire_models::{ApplicationRecord, ApplicationStatus, JobId, Role, UserId};

use crate::auth::{require_role, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::response::ApiResponse;
use crate::state::AppState;

const ALREADY_APPLIED: &str = "You have already applied for this job";

/// Application request body.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ApplyInput {
    #[validate(length(max = 5000, message = "Cover letter is too long"))]
    pub cover_letter: Option<String>,
}

/// POST /api/jobs/:id/apply — developer applies to a job.
///
/// The pre-check read exists for the friendly error message; the duplicate
/// guard itself is the store's create precondition, which also catches two
/// simultaneous submissions.
pub async fn apply_for_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<ApplyInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ApplicationRecord>>)> {
    require_role(&user, &[Role::Developer])?;

    let job_id = JobId::from_string(job_id);

    let job = state
        .jobs
        .get(&job_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    if state.applications.get(&job.id, &user.id).await?.is_some() {
        return Err(ApiError::bad_request(ALREADY_APPLIED));
    }

    let application = ApplicationRecord::new(job.id, user.id, input.cover_letter);

    match state.applications.create(&application).await {
        Ok(()) => {}
        Err(FirestoreError::AlreadyExists(_)) => {
            // Lost a race against an identical submission
            return Err(ApiError::bad_request(ALREADY_APPLIED));
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "Developer {} applied to job {}",
        application.applicant_id, application.job_id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(application, "Applied successfully")),
    ))
}

/// Employer summary embedded in an applied-job entry.
#[derive(Debug, Serialize)]
pub struct EmployerSummary {
    pub name: String,
    pub email: String,
}

/// Job summary embedded in an applied-job entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub id: JobId,
    pub title: String,
    pub salary: f64,
    pub location: String,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employer: Option<EmployerSummary>,
}

/// One entry in a developer's applied-jobs listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJobEntry {
    pub id: String,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    pub applied_at: chrono::DateTime<chrono::Utc>,
    /// Absent when the posting has since been deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<AppliedJob>,
}

/// GET /api/jobs/applied — developer lists their applications, joined with
/// the job and its employer.
pub async fn applied_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<AppliedJobEntry>>>> {
    require_role(&user, &[Role::Developer])?;

    let applications = state.applications.list_by_applicant(&user.id).await?;

    let job_ids: Vec<JobId> = applications.iter().map(|a| a.job_id.clone()).collect();
    let jobs = state.jobs.get_many(&job_ids).await?;

    let mut employer_ids: Vec<UserId> = jobs.iter().map(|j| j.employer_id.clone()).collect();
    employer_ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    employer_ids.dedup();
    let employers: HashMap<String, EmployerSummary> = state
        .users
        .get_many(&employer_ids)
        .await?
        .into_iter()
        .map(|u| {
            (
                u.id.as_str().to_string(),
                EmployerSummary {
                    name: u.name,
                    email: u.email,
                },
            )
        })
        .collect();

    let jobs_by_id: HashMap<String, _> = jobs
        .into_iter()
        .map(|j| (j.id.as_str().to_string(), j))
        .collect();

    let entries: Vec<AppliedJobEntry> = applications
        .into_iter()
        .map(|application| {
            let job = jobs_by_id.get(application.job_id.as_str()).map(|j| AppliedJob {
                id: j.id.clone(),
                title: j.title.clone(),
                salary: j.salary,
                location: j.location.clone(),
                skills: j.skills.clone(),
                employer: employers.get(j.employer_id.as_str()).map(|e| EmployerSummary {
                    name: e.name.clone(),
                    email: e.email.clone(),
                }),
            });

            AppliedJobEntry {
                id: application.id,
                status: application.status,
                cover_letter: application.cover_letter,
                applied_at: application.applied_at,
                job,
            }
        })
        .collect();

    Ok(Json(ApiResponse::ok(
        entries,
        "Applied jobs retrieved successfully",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_input_accepts_missing_cover_letter() {
        let input = ApplyInput { cover_letter: None };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn apply_input_bounds_cover_letter_length() {
        let input = ApplyInput {
            cover_letter: Some("x".repeat(5001)),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn applied_entry_serializes_pending_status() {
        let entry = AppliedJobEntry {
            id: "job-1_dev-1".to_string(),
            status: ApplicationStatus::Pending,
            cover_letter: None,
            applied_at: chrono::Utc::now(),
            job: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("coverLetter").is_none());
        assert!(json.get("job").is_none());
    }
}
