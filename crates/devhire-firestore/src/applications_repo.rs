//! Typed repository for job applications.
//!
//! Applications live in the top-level `applications` collection under a
//! deterministic `{job_id}_{applicant_id}` document ID, which makes
//! "one application per (job, applicant)" a property of the store: the create
//! precondition fails for a duplicate no matter how the requests interleave.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use devhire_models::{ApplicationRecord, ApplicationStatus, JobId, UserId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::jobs_repo::JOBS_COLLECTION;
use crate::types::{
    Document, DocumentTransform, FieldOperator, FieldTransform, Filter, FromFirestoreValue,
    StructuredQuery, ToFirestoreValue, Value, Write,
};

/// Top-level collection of application documents.
const APPLICATIONS_COLLECTION: &str = "applications";

/// Repository for application documents.
#[derive(Clone)]
pub struct ApplicationRepository {
    client: FirestoreClient,
}

impl ApplicationRepository {
    /// Create a new application repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Get the application for a `(job, applicant)` pair, if any.
    pub async fn get(
        &self,
        job_id: &JobId,
        applicant_id: &UserId,
    ) -> FirestoreResult<Option<ApplicationRecord>> {
        let doc_id = ApplicationRecord::document_id(job_id, applicant_id);
        let doc = self
            .client
            .get_document(APPLICATIONS_COLLECTION, &doc_id)
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_application(&d)?)),
            None => Ok(None),
        }
    }

    /// Record an application and append the applicant to the job's roster.
    ///
    /// Both writes land in one atomic batch: the application create has an
    /// exists=false precondition (the duplicate guard), and the job document
    /// receives an array-union transform on `applicant_ids`, so the roster
    /// append never partially applies. A duplicate surfaces as
    /// `AlreadyExists`.
    pub async fn create(&self, application: &ApplicationRecord) -> FirestoreResult<()> {
        let application_name = self
            .client
            .full_document_name(APPLICATIONS_COLLECTION, &application.id);
        let job_name = self
            .client
            .full_document_name(JOBS_COLLECTION, application.job_id.as_str());

        let writes = vec![
            Write::create(application_name, application_to_fields(application)),
            Write {
                update: None,
                delete: None,
                transform: Some(DocumentTransform {
                    document: job_name,
                    field_transforms: vec![FieldTransform::array_union(
                        "applicant_ids",
                        vec![Value::StringValue(
                            application.applicant_id.as_str().to_string(),
                        )],
                    )],
                }),
                update_mask: None,
                current_document: None,
            },
        ];

        self.client.batch_write(writes).await?;
        info!(
            "Recorded application: job={} applicant={}",
            application.job_id, application.applicant_id
        );
        Ok(())
    }

    /// All applications submitted by a developer, oldest first.
    pub async fn list_by_applicant(
        &self,
        applicant_id: &UserId,
    ) -> FirestoreResult<Vec<ApplicationRecord>> {
        let query = StructuredQuery {
            from: vec![crate::types::CollectionSelector {
                collection_id: APPLICATIONS_COLLECTION.to_string(),
                all_descendants: None,
            }],
            filter: Some(Filter::field(
                "applicant_id",
                FieldOperator::Equal,
                Value::StringValue(applicant_id.as_str().to_string()),
            )),
            order_by: None,
            limit: None,
        };

        let docs = self.client.run_query(query).await?;
        let mut applications: Vec<ApplicationRecord> = docs
            .iter()
            .filter_map(|doc| document_to_application(doc).ok())
            .collect();
        applications.sort_by(|a, b| a.applied_at.cmp(&b.applied_at));
        Ok(applications)
    }
}

fn application_to_fields(application: &ApplicationRecord) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), application.id.to_firestore_value());
    fields.insert(
        "job_id".to_string(),
        application.job_id.as_str().to_firestore_value(),
    );
    fields.insert(
        "applicant_id".to_string(),
        application.applicant_id.as_str().to_firestore_value(),
    );
    if let Some(ref letter) = application.cover_letter {
        fields.insert("cover_letter".to_string(), letter.to_firestore_value());
    }
    fields.insert(
        "status".to_string(),
        application.status.as_str().to_firestore_value(),
    );
    fields.insert(
        "applied_at".to_string(),
        application.applied_at.to_firestore_value(),
    );
    fields
}

fn document_to_application(doc: &Document) -> FirestoreResult<ApplicationRecord> {
    let fields = doc.fields.as_ref().ok_or_else(|| {
        FirestoreError::InvalidResponse("Application document has no fields".to_string())
    })?;

    let get_string = |key: &str| -> String {
        fields
            .get(key)
            .and_then(String::from_firestore_value)
            .unwrap_or_default()
    };

    Ok(ApplicationRecord {
        id: get_string("id"),
        job_id: JobId::from_string(get_string("job_id")),
        applicant_id: UserId::from_string(get_string("applicant_id")),
        cover_letter: fields
            .get("cover_letter")
            .and_then(String::from_firestore_value),
        status: ApplicationStatus::from_str_or_default(&get_string("status")),
        applied_at: fields
            .get("applied_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_application() -> ApplicationRecord {
        ApplicationRecord::new(
            JobId::from_string("job-1"),
            UserId::from_string("dev-1"),
            Some("I would love this role".to_string()),
        )
    }

    #[test]
    fn application_fields_round_trip() {
        let application = sample_application();
        let doc = Document::new(application_to_fields(&application));
        let back = document_to_application(&doc).unwrap();

        assert_eq!(back.id, "job-1_dev-1");
        assert_eq!(back.job_id, application.job_id);
        assert_eq!(back.applicant_id, application.applicant_id);
        assert_eq!(back.status, ApplicationStatus::Pending);
        assert_eq!(
            back.cover_letter.as_deref(),
            Some("I would love this role")
        );
    }

    #[test]
    fn cover_letter_is_omitted_when_absent() {
        let application = ApplicationRecord::new(
            JobId::from_string("job-1"),
            UserId::from_string("dev-1"),
            None,
        );
        let fields = application_to_fields(&application);
        assert!(!fields.contains_key("cover_letter"));
    }
}
