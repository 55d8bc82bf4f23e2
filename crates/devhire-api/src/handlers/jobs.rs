//! Job posting handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use devhire_firestore::{JobFilter, JobPage, JobSort};
use devhire_models::{JobId, JobPatch, JobRecord, PublicUser, Role};

use crate::auth::{require_role, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for job browsing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsQuery {
    /// Comma-separated skill tags; a job must carry all of them.
    pub skills: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub location: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    /// `salary` orders by descending salary; anything else is creation order.
    pub sort: Option<String>,
}

impl ListJobsQuery {
    fn filter(&self) -> JobFilter {
        JobFilter {
            skills: self
                .skills
                .as_deref()
                .map(JobFilter::parse_skills)
                .unwrap_or_default(),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            location: self.location.clone(),
            search: self.search.clone(),
        }
    }

    fn sort(&self) -> JobSort {
        self.sort
            .as_deref()
            .map(JobSort::from_str_or_default)
            .unwrap_or_default()
    }
}

/// GET /api/jobs — public browsing with filters and pagination.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<ListJobsQuery>,
) -> ApiResult<Json<ApiResponse<JobPage>>> {
    let page = state
        .jobs
        .list(&query.filter(), query.sort(), query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::ok(page, "Jobs retrieved successfully")))
}

/// Job creation request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostJobInput {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "At least one skill is required"))]
    pub skills: Vec<String>,
    #[validate(range(exclusive_min = 0.0, message = "Salary must be positive"))]
    pub salary: f64,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
}

/// POST /api/jobs — employer posts a new job.
pub async fn post_job(
    State(state): State<AppState>,
    user: AuthUser,
    ValidatedJson(input): ValidatedJson<PostJobInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<JobRecord>>)> {
    require_role(&user, &[Role::Employer])?;

    let job = JobRecord::new(
        input.title,
        input.description,
        input.skills,
        input.salary,
        input.location,
        user.id,
    );

    state.jobs.create(&job).await?;
    info!("Employer {} posted job {}", job.employer_id, job.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(job, "Job posted successfully")),
    ))
}

/// PUT /api/jobs/:id — employer edits an owned job.
///
/// A missing job and a job owned by someone else respond identically, so the
/// endpoint cannot be used to probe which postings exist.
pub async fn update_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    user: AuthUser,
    Json(patch): Json<JobPatch>,
) -> ApiResult<Json<ApiResponse<JobRecord>>> {
    require_role(&user, &[Role::Employer])?;

    if let Some(salary) = patch.salary {
        if salary <= 0.0 {
            return Err(ApiError::Validation(vec![
                "salary: Salary must be positive".to_string(),
            ]));
        }
    }
    if let Some(ref skills) = patch.skills {
        if skills.is_empty() {
            return Err(ApiError::Validation(vec![
                "skills: At least one skill is required".to_string(),
            ]));
        }
    }

    let job = state
        .jobs
        .update_owned(&JobId::from_string(job_id), &user.id, &patch)
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Job not found or you do not have permission to edit")
        })?;

    Ok(Json(ApiResponse::ok(job, "Job updated successfully")))
}

/// DELETE /api/jobs/:id — employer deletes an owned job.
pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Option<()>>>> {
    require_role(&user, &[Role::Employer])?;

    let deleted = state
        .jobs
        .delete_owned(&JobId::from_string(job_id), &user.id)
        .await?;

    if !deleted {
        return Err(ApiError::not_found(
            "Job not found or you do not have permission to delete",
        ));
    }

    Ok(Json(ApiResponse::ok(None, "Job deleted successfully")))
}

/// GET /api/jobs/my-jobs — employer lists their own postings.
pub async fn my_jobs(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<JobRecord>>>> {
    require_role(&user, &[Role::Employer])?;

    let jobs = state.jobs.list_by_employer(&user.id).await?;

    Ok(Json(ApiResponse::ok(jobs, "My jobs retrieved successfully")))
}

/// GET /api/jobs/:id/applicants — employer views applicants for an owned job.
pub async fn job_applicants(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    user: AuthUser,
) -> ApiResult<Json<ApiResponse<Vec<PublicUser>>>> {
    require_role(&user, &[Role::Employer])?;

    let job = state
        .jobs
        .get_owned(&JobId::from_string(job_id), &user.id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found("Job not found or you do not have permission to view applicants")
        })?;

    let applicants: Vec<PublicUser> = state
        .users
        .get_many(&job.applicant_ids)
        .await?
        .iter()
        .map(|u| u.public())
        .collect();

    Ok(Json(ApiResponse::ok(
        applicants,
        "Applicants retrieved successfully",
    )))
}
