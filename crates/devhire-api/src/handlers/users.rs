//! Registration and login handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use devhire_firestore::FirestoreError;
use devhire_models::{PublicUser, Role, UserRecord};

use crate::auth::{ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use crate::error::{ApiError, ApiResult};
use crate::extract::ValidatedJson;
use crate::password::{hash_password, verify_password};
use crate::response::ApiResponse;
use crate::state::AppState;

/// Registration request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 2, max = 50, message = "Name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub phone: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar_url: Option<String>,
}

/// POST /api/users/register
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PublicUser>>)> {
    if let Some(ref phone) = input.phone {
        if phone.trim().is_empty() {
            return Err(ApiError::bad_request(
                "Phone number cannot be empty if provided",
            ));
        }
    }

    let password_hash = hash_password(&input.password)?;

    let mut user = UserRecord::new(input.name, input.email, password_hash, input.role);
    user.phone = input.phone;
    user.avatar_url = input.avatar_url;

    match state.users.create(&user).await {
        Ok(()) => {}
        Err(FirestoreError::AlreadyExists(_)) => {
            return Err(ApiError::conflict(
                "This email is already registered. Please use a different email or try logging in.",
            ));
        }
        Err(e) => return Err(e.into()),
    }

    info!("Registered {} account: {}", user.role, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::created(
            user.public(),
            "User created successfully",
        )),
    ))
}

/// Login request body.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login response payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /api/users/login
///
/// Issues the token pair in the body and as httpOnly cookies, and persists
/// the refresh token on the account (last issued wins).
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginData>>)> {
    let user = state
        .users
        .find_by_email(&input.email)
        .await?
        .ok_or_else(|| ApiError::not_found("User doesn't exist with this email"))?;

    if !verify_password(&input.password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let access_token = state.tokens.issue_access_token(&user.id)?;
    let refresh_token = state.tokens.issue_refresh_token(&user.id)?;

    state
        .users
        .set_refresh_token(&user.id, &refresh_token)
        .await?;

    info!("User logged in: {}", user.id);

    let jar = jar
        .add(auth_cookie(ACCESS_TOKEN_COOKIE, access_token.clone()))
        .add(auth_cookie(REFRESH_TOKEN_COOKIE, refresh_token.clone()));

    Ok((
        jar,
        Json(ApiResponse::ok(
            LoginData {
                user: user.public(),
                access_token,
                refresh_token,
            },
            "User logged in successfully",
        )),
    ))
}

fn auth_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(true)
        .path("/")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_input_rejects_bad_fields() {
        let input = RegisterInput {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "short".to_string(),
            role: Role::Developer,
            phone: None,
            avatar_url: None,
        };
        let errors = input.validate().unwrap_err();
        let fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|k| k.to_string())
            .collect();
        assert!(fields.contains(&"name".to_string()));
        assert!(fields.contains(&"email".to_string()));
        assert!(fields.contains(&"password".to_string()));
    }

    #[test]
    fn register_input_accepts_valid_body() {
        let input = RegisterInput {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "secret123".to_string(),
            role: Role::Employer,
            phone: Some("555-0100".to_string()),
            avatar_url: Some("https://example.com/alice.png".to_string()),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn register_role_defaults_to_developer() {
        let input: RegisterInput = serde_json::from_value(serde_json::json!({
            "name": "Bob",
            "email": "bob@example.com",
            "password": "secret123"
        }))
        .unwrap();
        assert_eq!(input.role, Role::Developer);
    }

    #[test]
    fn login_input_requires_password() {
        let input = LoginInput {
            email: "alice@example.com".to_string(),
            password: String::new(),
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn auth_cookies_are_http_only_and_secure() {
        let cookie = auth_cookie(ACCESS_TOKEN_COOKIE, "token".to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
