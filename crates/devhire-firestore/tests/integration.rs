//! Firestore integration tests.
//!
//! These exercise a live Firestore project and are skipped by default; run
//! with `cargo test -- --ignored` after pointing GOOGLE_APPLICATION_CREDENTIALS
//! and GCP_PROJECT_ID at a test project.

use devhire_firestore::{
    ApplicationRepository, FirestoreClient, FirestoreError, JobFilter, JobRepository, JobSort,
    UserRepository,
};
use devhire_models::{ApplicationRecord, JobRecord, Role, UserRecord};

async fn client() -> FirestoreClient {
    dotenvy::dotenv().ok();
    FirestoreClient::from_env()
        .await
        .expect("Failed to create Firestore client")
}

#[tokio::test]
#[ignore = "requires Firestore credentials"]
async fn test_firestore_connection() {
    let client = client().await;

    // Health check document read; NotFound still proves connectivity
    let result = client.get_document("_health", "_check").await;
    match result {
        Ok(_) => println!("Health check document readable"),
        Err(e) => panic!("Unexpected error: {}", e),
    }
}

#[tokio::test]
#[ignore = "requires Firestore credentials"]
async fn test_user_repository_enforces_email_uniqueness() {
    let client = client().await;
    let repo = UserRepository::new(client.clone());

    let email = format!("it-{}@example.com", uuid_suffix());
    let first = UserRecord::new("Integration One", &email, "hash-1", Role::Developer);
    let second = UserRecord::new("Integration Two", &email, "hash-2", Role::Developer);

    repo.create(&first).await.expect("Failed to create user");

    // Same email, different casing, different account id
    let result = repo.create(&second).await;
    assert!(matches!(result, Err(FirestoreError::AlreadyExists(_))));

    let fetched = repo
        .find_by_email(&email.to_uppercase())
        .await
        .expect("Lookup failed")
        .expect("User should exist");
    assert_eq!(fetched.id, first.id);
}

#[tokio::test]
#[ignore = "requires Firestore credentials"]
async fn test_job_repository_ownership_scoping() {
    let client = client().await;
    let repo = JobRepository::new(client.clone());

    let employer = UserRecord::new(
        "Employer",
        format!("emp-{}@example.com", uuid_suffix()),
        "hash",
        Role::Employer,
    );
    let job = JobRecord::new(
        "Integration Test Job",
        "Posted by an integration test",
        vec!["Rust".to_string()],
        100_000.0,
        "Remote",
        employer.id.clone(),
    );

    repo.create(&job).await.expect("Failed to create job");

    // Owner sees it; a different employer does not
    let owned = repo
        .get_owned(&job.id, &employer.id)
        .await
        .expect("Lookup failed");
    assert!(owned.is_some());

    let foreign = repo
        .get_owned(&job.id, &UserRecord::new("X", "x@example.com", "h", Role::Employer).id)
        .await
        .expect("Lookup failed");
    assert!(foreign.is_none());

    assert!(repo
        .delete_owned(&job.id, &employer.id)
        .await
        .expect("Delete failed"));
}

#[tokio::test]
#[ignore = "requires Firestore credentials"]
async fn test_duplicate_application_is_rejected_by_the_store() {
    let client = client().await;
    let jobs = JobRepository::new(client.clone());
    let applications = ApplicationRepository::new(client.clone());

    let employer = UserRecord::new(
        "Employer",
        format!("emp-{}@example.com", uuid_suffix()),
        "hash",
        Role::Employer,
    );
    let developer = UserRecord::new(
        "Developer",
        format!("dev-{}@example.com", uuid_suffix()),
        "hash",
        Role::Developer,
    );

    let job = JobRecord::new(
        "Apply Twice Target",
        "Integration test job",
        vec!["Rust".to_string()],
        95_000.0,
        "Remote",
        employer.id.clone(),
    );
    jobs.create(&job).await.expect("Failed to create job");

    let application = ApplicationRecord::new(job.id.clone(), developer.id.clone(), None);
    applications
        .create(&application)
        .await
        .expect("First application should succeed");

    // Identical second submission hits the create precondition
    let duplicate = ApplicationRecord::new(job.id.clone(), developer.id.clone(), None);
    let result = applications.create(&duplicate).await;
    assert!(matches!(result, Err(FirestoreError::AlreadyExists(_))));

    // The roster picked up the applicant exactly once
    let refreshed = jobs.get(&job.id).await.expect("Lookup failed").unwrap();
    assert_eq!(refreshed.applicant_ids, vec![developer.id.clone()]);

    jobs.delete_owned(&job.id, &employer.id)
        .await
        .expect("Cleanup failed");
}

#[tokio::test]
#[ignore = "requires Firestore credentials"]
async fn test_job_listing_filters_and_pagination() {
    let client = client().await;
    let repo = JobRepository::new(client.clone());

    let filter = JobFilter {
        salary_min: Some(1.0),
        ..JobFilter::default()
    };
    let page = repo
        .list(&filter, JobSort::CreatedAt, Some(1), Some(5))
        .await
        .expect("Listing failed");

    assert!(page.jobs.len() <= 5);
    assert_eq!(page.page, 1);
}

fn uuid_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    format!(
        "{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default()
    )
}
