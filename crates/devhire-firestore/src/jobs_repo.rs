//! Typed repository for job postings.
//!
//! Postings live in the top-level `jobs` collection. Mutations are
//! ownership-scoped: a lookup resolves `(job id, employer id)` in one read,
//! so "does not exist" and "belongs to someone else" are indistinguishable to
//! callers — and to API clients probing for other employers' postings.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use devhire_models::{JobId, JobPatch, JobRecord, UserId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::query::{
    build_job_query, normalize_limit, normalize_page, paginate, sort_jobs, JobFilter, JobSort,
};
use crate::types::{
    Document, FieldOperator, Filter, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value,
};

/// Top-level collection of job documents.
pub(crate) const JOBS_COLLECTION: &str = "jobs";

/// One page of a filtered job listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobPage {
    pub jobs: Vec<JobRecord>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

/// Repository for job documents.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    /// Create a new job repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create a new posting.
    pub async fn create(&self, job: &JobRecord) -> FirestoreResult<()> {
        self.client
            .create_document(JOBS_COLLECTION, job.id.as_str(), job_to_fields(job))
            .await?;
        info!("Created job posting: {}", job.id);
        Ok(())
    }

    /// Get a posting by ID.
    pub async fn get(&self, job_id: &JobId) -> FirestoreResult<Option<JobRecord>> {
        let doc = self
            .client
            .get_document(JOBS_COLLECTION, job_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_job(&d)?)),
            None => Ok(None),
        }
    }

    /// Get a posting scoped to its owner.
    ///
    /// One read answers both "does it exist" and "is it mine"; a foreign
    /// posting yields `None` exactly like a missing one.
    pub async fn get_owned(
        &self,
        job_id: &JobId,
        employer_id: &UserId,
    ) -> FirestoreResult<Option<JobRecord>> {
        let job = self.get(job_id).await?;
        Ok(job.filter(|j| &j.employer_id == employer_id))
    }

    /// Apply a partial update to an owned posting.
    ///
    /// Returns the updated record, or `None` when the posting is missing or
    /// owned by someone else. The write carries an exists precondition so a
    /// concurrent delete cannot be resurrected as a fresh document.
    pub async fn update_owned(
        &self,
        job_id: &JobId,
        employer_id: &UserId,
        patch: &JobPatch,
    ) -> FirestoreResult<Option<JobRecord>> {
        let Some(mut job) = self.get_owned(job_id, employer_id).await? else {
            return Ok(None);
        };

        job.apply_patch(patch);

        let (fields, mask) = patch_to_fields(patch, job.updated_at);

        match self
            .client
            .update_document_with_precondition(
                JOBS_COLLECTION,
                job_id.as_str(),
                fields,
                Some(mask),
                Some(true),
                None,
            )
            .await
        {
            Ok(_) => Ok(Some(job)),
            // Deleted between the ownership read and the write
            Err(e) if e.is_precondition_failed() => Ok(None),
            Err(FirestoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Hard-delete an owned posting. Returns false when the posting is
    /// missing or owned by someone else.
    pub async fn delete_owned(
        &self,
        job_id: &JobId,
        employer_id: &UserId,
    ) -> FirestoreResult<bool> {
        if self.get_owned(job_id, employer_id).await?.is_none() {
            return Ok(false);
        }

        self.client
            .delete_document(JOBS_COLLECTION, job_id.as_str())
            .await?;
        info!("Deleted job posting: {}", job_id);
        Ok(true)
    }

    /// All postings owned by an employer, newest last.
    pub async fn list_by_employer(&self, employer_id: &UserId) -> FirestoreResult<Vec<JobRecord>> {
        let query = StructuredQuery {
            from: vec![crate::types::CollectionSelector {
                collection_id: JOBS_COLLECTION.to_string(),
                all_descendants: None,
            }],
            filter: Some(Filter::field(
                "employer_id",
                FieldOperator::Equal,
                Value::StringValue(employer_id.as_str().to_string()),
            )),
            order_by: None,
            limit: None,
        };

        let docs = self.client.run_query(query).await?;
        let mut jobs = parse_job_documents(docs);
        sort_jobs(&mut jobs, JobSort::CreatedAt);
        Ok(jobs)
    }

    /// Browse postings with filters and offset pagination.
    pub async fn list(
        &self,
        filter: &JobFilter,
        sort: JobSort,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> FirestoreResult<JobPage> {
        let page = normalize_page(page);
        let limit = normalize_limit(limit);

        let query = build_job_query(JOBS_COLLECTION, filter);
        let docs = self.client.run_query(query).await?;

        let mut jobs: Vec<JobRecord> = parse_job_documents(docs)
            .into_iter()
            .filter(|job| filter.matches_residual(job))
            .collect();
        sort_jobs(&mut jobs, sort);

        let (page_jobs, total, pages) = paginate(&jobs, page, limit);

        Ok(JobPage {
            jobs: page_jobs,
            total,
            page,
            pages,
        })
    }

    /// Fetch several postings at once, e.g. a developer's applied jobs.
    /// Missing IDs are dropped; order of `job_ids` is preserved.
    pub async fn get_many(&self, job_ids: &[JobId]) -> FirestoreResult<Vec<JobRecord>> {
        if job_ids.is_empty() {
            return Ok(vec![]);
        }

        let names: Vec<String> = job_ids
            .iter()
            .map(|id| self.client.full_document_name(JOBS_COLLECTION, id.as_str()))
            .collect();

        let docs = self.client.batch_get_documents(names, None).await?;

        let mut by_id: HashMap<String, JobRecord> = HashMap::new();
        for doc in &docs {
            if let Ok(job) = document_to_job(doc) {
                by_id.insert(job.id.as_str().to_string(), job);
            }
        }

        Ok(job_ids
            .iter()
            .filter_map(|id| by_id.remove(id.as_str()))
            .collect())
    }
}

/// Parse query results, skipping documents that fail to decode.
fn parse_job_documents(docs: Vec<Document>) -> Vec<JobRecord> {
    docs.iter()
        .filter_map(|doc| document_to_job(doc).ok())
        .collect()
}

fn job_to_fields(job: &JobRecord) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), job.id.as_str().to_firestore_value());
    fields.insert("title".to_string(), job.title.to_firestore_value());
    fields.insert(
        "description".to_string(),
        job.description.to_firestore_value(),
    );
    fields.insert("skills".to_string(), job.skills.to_firestore_value());
    fields.insert("salary".to_string(), job.salary.to_firestore_value());
    fields.insert("location".to_string(), job.location.to_firestore_value());
    fields.insert(
        "employer_id".to_string(),
        job.employer_id.as_str().to_firestore_value(),
    );
    let applicant_ids: Vec<String> = job
        .applicant_ids
        .iter()
        .map(|id| id.as_str().to_string())
        .collect();
    fields.insert(
        "applicant_ids".to_string(),
        applicant_ids.to_firestore_value(),
    );
    fields.insert("created_at".to_string(), job.created_at.to_firestore_value());
    fields.insert("updated_at".to_string(), job.updated_at.to_firestore_value());
    fields
}

/// Fields and update mask for a partial job update.
fn patch_to_fields(
    patch: &JobPatch,
    updated_at: chrono::DateTime<Utc>,
) -> (HashMap<String, Value>, Vec<String>) {
    let mut fields = HashMap::new();

    if let Some(ref title) = patch.title {
        fields.insert("title".to_string(), title.to_firestore_value());
    }
    if let Some(ref description) = patch.description {
        fields.insert("description".to_string(), description.to_firestore_value());
    }
    if let Some(ref skills) = patch.skills {
        fields.insert("skills".to_string(), skills.to_firestore_value());
    }
    if let Some(salary) = patch.salary {
        fields.insert("salary".to_string(), salary.to_firestore_value());
    }
    if let Some(ref location) = patch.location {
        fields.insert("location".to_string(), location.to_firestore_value());
    }
    fields.insert("updated_at".to_string(), updated_at.to_firestore_value());

    let mask = fields.keys().cloned().collect();
    (fields, mask)
}

fn document_to_job(doc: &Document) -> FirestoreResult<JobRecord> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("Job document has no fields".to_string()))?;

    let get_string = |key: &str| -> String {
        fields
            .get(key)
            .and_then(String::from_firestore_value)
            .unwrap_or_default()
    };

    Ok(JobRecord {
        id: JobId::from_string(get_string("id")),
        title: get_string("title"),
        description: get_string("description"),
        skills: fields
            .get("skills")
            .and_then(Vec::<String>::from_firestore_value)
            .unwrap_or_default(),
        salary: fields
            .get("salary")
            .and_then(f64::from_firestore_value)
            .unwrap_or(0.0),
        location: get_string("location"),
        employer_id: UserId::from_string(get_string("employer_id")),
        applicant_ids: fields
            .get("applicant_ids")
            .and_then(Vec::<String>::from_firestore_value)
            .unwrap_or_default()
            .into_iter()
            .map(UserId::from_string)
            .collect(),
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
        updated_at: fields
            .get("updated_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> JobRecord {
        let mut job = JobRecord::new(
            "Backend Engineer",
            "Build the job board",
            vec!["Go".to_string(), "SQL".to_string()],
            90_000.0,
            "Remote",
            UserId::from_string("employer-1"),
        );
        job.applicant_ids.push(UserId::from_string("dev-1"));
        job
    }

    #[test]
    fn job_fields_round_trip() {
        let job = sample_job();
        let doc = Document::new(job_to_fields(&job));
        let back = document_to_job(&doc).unwrap();

        assert_eq!(back.id, job.id);
        assert_eq!(back.title, "Backend Engineer");
        assert_eq!(back.skills, job.skills);
        assert_eq!(back.salary, 90_000.0);
        assert_eq!(back.employer_id, job.employer_id);
        assert_eq!(back.applicant_ids, job.applicant_ids);
    }

    #[test]
    fn patch_fields_carry_matching_mask() {
        let patch = JobPatch {
            salary: Some(95_000.0),
            title: Some("Senior Backend Engineer".to_string()),
            ..JobPatch::default()
        };
        let (fields, mask) = patch_to_fields(&patch, Utc::now());

        assert_eq!(fields.len(), 3); // title + salary + updated_at
        assert_eq!(mask.len(), 3);
        assert!(mask.contains(&"salary".to_string()));
        assert!(mask.contains(&"updated_at".to_string()));
        assert!(!mask.contains(&"location".to_string()));
    }
}
