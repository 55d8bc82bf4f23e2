//! Application state.

use std::sync::Arc;

use devhire_firestore::{
    ApplicationRepository, FirestoreClient, JobRepository, UserRepository,
};

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub firestore: Arc<FirestoreClient>,
    pub users: UserRepository,
    pub jobs: JobRepository,
    pub applications: ApplicationRepository,
    pub tokens: Arc<TokenIssuer>,
}

impl AppState {
    /// Create new application state.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let firestore = Arc::new(FirestoreClient::from_env().await?);
        let tokens = Arc::new(TokenIssuer::from_env()?);

        Ok(Self {
            config,
            users: UserRepository::new((*firestore).clone()),
            jobs: JobRepository::new((*firestore).clone()),
            applications: ApplicationRepository::new((*firestore).clone()),
            firestore,
            tokens,
        })
    }
}
