//! Typed repository for user accounts.
//!
//! Accounts live in the top-level `users` collection. Email uniqueness is a
//! store-level guarantee: registration writes `user_emails/{email}` and
//! `users/{id}` in one atomic batch, both with create preconditions, so two
//! concurrent registrations for the same address cannot both succeed.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use devhire_models::{Role, UserId, UserRecord};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value, Write};

/// Top-level collection of account documents.
const USERS_COLLECTION: &str = "users";
/// Email-to-user index; the document ID is the lowercase address.
const EMAIL_INDEX_COLLECTION: &str = "user_emails";

/// Repository for user documents.
#[derive(Clone)]
pub struct UserRepository {
    client: FirestoreClient,
}

impl UserRepository {
    /// Create a new user repository.
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create an account together with its email index entry.
    ///
    /// Fails with `AlreadyExists` when the (case-normalized) email is taken,
    /// racing registrations included — the index create precondition is the
    /// guard, not any prior lookup.
    pub async fn create(&self, user: &UserRecord) -> FirestoreResult<()> {
        let email_key = normalize_email(&user.email);

        let mut index_fields = HashMap::new();
        index_fields.insert("user_id".to_string(), user.id.as_str().to_firestore_value());
        index_fields.insert("email".to_string(), email_key.to_firestore_value());
        index_fields.insert("created_at".to_string(), user.created_at.to_firestore_value());

        let writes = vec![
            Write::create(
                self.client
                    .full_document_name(EMAIL_INDEX_COLLECTION, &email_key),
                index_fields,
            ),
            Write::create(
                self.client
                    .full_document_name(USERS_COLLECTION, user.id.as_str()),
                user_to_fields(user),
            ),
        ];

        self.client.batch_write(writes).await?;
        info!("Created user account: {}", user.id);
        Ok(())
    }

    /// Get an account by ID.
    pub async fn get(&self, user_id: &UserId) -> FirestoreResult<Option<UserRecord>> {
        let doc = self
            .client
            .get_document(USERS_COLLECTION, user_id.as_str())
            .await?;

        match doc {
            Some(d) => Ok(Some(document_to_user(&d)?)),
            None => Ok(None),
        }
    }

    /// Look up an account by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> FirestoreResult<Option<UserRecord>> {
        let email_key = normalize_email(email);
        let index_doc = self
            .client
            .get_document(EMAIL_INDEX_COLLECTION, &email_key)
            .await?;

        let Some(index_doc) = index_doc else {
            return Ok(None);
        };

        let user_id = index_doc
            .fields
            .as_ref()
            .and_then(|f| f.get("user_id"))
            .and_then(String::from_firestore_value)
            .ok_or_else(|| {
                FirestoreError::InvalidResponse(format!(
                    "Email index entry {} has no user_id",
                    email_key
                ))
            })?;

        self.get(&UserId::from_string(user_id)).await
    }

    /// Persist the most recently issued refresh token. Last issued wins.
    pub async fn set_refresh_token(&self, user_id: &UserId, token: &str) -> FirestoreResult<()> {
        let mut fields = HashMap::new();
        fields.insert("refresh_token".to_string(), token.to_firestore_value());
        fields.insert("updated_at".to_string(), Utc::now().to_firestore_value());

        self.client
            .update_document_with_precondition(
                USERS_COLLECTION,
                user_id.as_str(),
                fields,
                Some(vec!["refresh_token".to_string(), "updated_at".to_string()]),
                Some(true),
                None,
            )
            .await?;
        Ok(())
    }

    /// Fetch several accounts at once, e.g. a job's applicants.
    ///
    /// Missing IDs are silently dropped; the result preserves the order of
    /// `user_ids`.
    pub async fn get_many(&self, user_ids: &[UserId]) -> FirestoreResult<Vec<UserRecord>> {
        if user_ids.is_empty() {
            return Ok(vec![]);
        }

        let names: Vec<String> = user_ids
            .iter()
            .map(|id| self.client.full_document_name(USERS_COLLECTION, id.as_str()))
            .collect();

        let docs = self.client.batch_get_documents(names, None).await?;

        let mut by_id: HashMap<String, UserRecord> = HashMap::new();
        for doc in &docs {
            if let Ok(user) = document_to_user(doc) {
                by_id.insert(user.id.as_str().to_string(), user);
            }
        }

        Ok(user_ids
            .iter()
            .filter_map(|id| by_id.remove(id.as_str()))
            .collect())
    }
}

/// Lowercase and trim an email for use as an index key.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn user_to_fields(user: &UserRecord) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), user.id.as_str().to_firestore_value());
    fields.insert("name".to_string(), user.name.to_firestore_value());
    fields.insert("email".to_string(), user.email.to_firestore_value());
    fields.insert(
        "password_hash".to_string(),
        user.password_hash.to_firestore_value(),
    );
    fields.insert("role".to_string(), user.role.as_str().to_firestore_value());
    if let Some(ref phone) = user.phone {
        fields.insert("phone".to_string(), phone.to_firestore_value());
    }
    if let Some(ref avatar) = user.avatar_url {
        fields.insert("avatar_url".to_string(), avatar.to_firestore_value());
    }
    if let Some(ref token) = user.refresh_token {
        fields.insert("refresh_token".to_string(), token.to_firestore_value());
    }
    fields.insert("created_at".to_string(), user.created_at.to_firestore_value());
    fields.insert("updated_at".to_string(), user.updated_at.to_firestore_value());
    fields
}

fn document_to_user(doc: &Document) -> FirestoreResult<UserRecord> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::InvalidResponse("User document has no fields".to_string()))?;

    let get_string = |key: &str| -> String {
        fields
            .get(key)
            .and_then(String::from_firestore_value)
            .unwrap_or_default()
    };

    let get_opt_string = |key: &str| -> Option<String> {
        fields.get(key).and_then(String::from_firestore_value)
    };

    Ok(UserRecord {
        id: UserId::from_string(get_string("id")),
        name: get_string("name"),
        email: get_string("email"),
        password_hash: get_string("password_hash"),
        role: Role::from_str_or_default(&get_string("role")),
        phone: get_opt_string("phone"),
        avatar_url: get_opt_string("avatar_url"),
        refresh_token: get_opt_string("refresh_token"),
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

    fn sample_user() -> UserRecord {
        let mut user = UserRecord::new("Alice", "Alice@Example.com", "bcrypt-hash", Role::Employer);
        user.phone = Some("555-0100".to_string());
        user
    }

    #[test]
    fn email_normalization_for_index_key() {
        assert_eq!(normalize_email(" Dev@Example.COM "), "dev@example.com");
    }

    #[test]
    fn user_fields_round_trip() {
        let user = sample_user();
        let fields = user_to_fields(&user);
        let doc = Document::new(fields);
        let back = document_to_user(&doc).unwrap();

        assert_eq!(back.id, user.id);
        assert_eq!(back.email, "alice@example.com");
        assert_eq!(back.role, Role::Employer);
        assert_eq!(back.password_hash, "bcrypt-hash");
        assert_eq!(back.phone.as_deref(), Some("555-0100"));
        assert!(back.refresh_token.is_none());
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let user = UserRecord::new("Bob", "bob@example.com", "hash", Role::Developer);
        let fields = user_to_fields(&user);
        assert!(!fields.contains_key("phone"));
        assert!(!fields.contains_key("avatar_url"));
        assert!(!fields.contains_key("refresh_token"));
    }
}
