//! JWT authentication and role-based authorization.
//!
//! Login issues two HS256 tokens signed with server-held secrets: a
//! short-lived access token presented on every request and a longer-lived
//! refresh token persisted on the user record. Protected handlers take an
//! [`AuthUser`] extractor argument, which resolves the bearer token (header
//! or cookie) back to a live account and fails closed with 401 on any defect.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use devhire_models::{Role, UserId, UserRecord};

use crate::error::ApiError;
use crate::state::AppState;

/// Cookie carrying the access token, set at login.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// Cookie carrying the refresh token, set at login.
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Which of the two token types a JWT claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims carried by both token types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration (seconds since epoch)
    pub exp: i64,
    /// Token type, so a refresh token cannot pass as an access token
    pub token_type: TokenKind,
}

/// Issues and verifies access/refresh token pairs.
pub struct TokenIssuer {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer with explicit secrets and lifetimes.
    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret),
            access_decoding: DecodingKey::from_secret(access_secret),
            refresh_encoding: EncodingKey::from_secret(refresh_secret),
            refresh_decoding: DecodingKey::from_secret(refresh_secret),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Create from environment variables.
    ///
    /// `ACCESS_TOKEN_SECRET` and `REFRESH_TOKEN_SECRET` are required;
    /// lifetimes default to one hour and ten days.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let access_secret = std::env::var("ACCESS_TOKEN_SECRET")
            .map_err(|_| "ACCESS_TOKEN_SECRET must be set")?;
        let refresh_secret = std::env::var("REFRESH_TOKEN_SECRET")
            .map_err(|_| "REFRESH_TOKEN_SECRET must be set")?;

        let access_ttl_secs: u64 = std::env::var("ACCESS_TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600);
        let refresh_ttl_secs: u64 = std::env::var("REFRESH_TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10 * 24 * 3600);

        Ok(Self::new(
            access_secret.as_bytes(),
            refresh_secret.as_bytes(),
            Duration::from_secs(access_ttl_secs),
            Duration::from_secs(refresh_ttl_secs),
        ))
    }

    /// Issue an access token for a user.
    pub fn issue_access_token(&self, user_id: &UserId) -> Result<String, ApiError> {
        self.issue(user_id, TokenKind::Access, self.access_ttl, &self.access_encoding)
    }

    /// Issue a refresh token for a user.
    pub fn issue_refresh_token(&self, user_id: &UserId) -> Result<String, ApiError> {
        self.issue(
            user_id,
            TokenKind::Refresh,
            self.refresh_ttl,
            &self.refresh_encoding,
        )
    }

    fn issue(
        &self,
        user_id: &UserId,
        kind: TokenKind,
        ttl: Duration,
        key: &EncodingKey,
    ) -> Result<String, ApiError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.as_str().to_string(),
            iat: now,
            exp: now + ttl.as_secs() as i64,
            token_type: kind,
        };

        encode(&Header::new(Algorithm::HS256), &claims, key)
            .map_err(|e| ApiError::internal(format!("Token signing failed: {}", e)))
    }

    /// Verify a token's signature, expiry, and type, returning its claims.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, ApiError> {
        let key = match expected {
            TokenKind::Access => &self.access_decoding,
            TokenKind::Refresh => &self.refresh_decoding,
        };

        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, key, &validation)
            .map_err(|e| ApiError::unauthorized(format!("Invalid access token: {}", e)))?;

        if data.claims.token_type != expected {
            return Err(ApiError::unauthorized("Invalid access token"));
        }

        Ok(data.claims)
    }
}

/// Authenticated user extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<UserRecord> for AuthUser {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Role gate: authenticated identity, wrong role.
///
/// The extractor already handled the missing-identity case with 401, so the
/// only denial left here is 403. Ownership is NOT checked at this layer;
/// store lookups scope by owner in the same read that fetches the record.
pub fn require_role(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "You do not have permission to perform this action",
        ))
    }
}

/// Pull the bearer token from the `accessToken` cookie or the
/// `Authorization` header, in that order.
fn extract_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized request"))?;

        let claims = state.tokens.verify(&token, TokenKind::Access)?;

        // The token may outlive the account; resolve it on every request.
        let user = state
            .users
            .get(&UserId::from_string(claims.sub))
            .await
            .map_err(|e| ApiError::internal(format!("Failed to resolve user: {}", e)))?
            .ok_or_else(|| ApiError::unauthorized("Invalid access token"))?;

        Ok(AuthUser::from(user))
    }
}
