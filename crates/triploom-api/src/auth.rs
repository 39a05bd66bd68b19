//! Caller identification.
//!
//! In `jwt` mode the middleware verifies an HS256 bearer token and takes the
//! user id from its `sub` claim. In `test` mode it trusts the `X-User-Id`
//! header and falls back to a fixed local user.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use triploom_core::config::AuthConfig;

use crate::error::ApiError;
use crate::state::AppState;

pub const TEST_USER_HEADER: &str = "x-user-id";
pub const DEFAULT_TEST_USER: &str = "local-test-user";

/// Authenticated caller, inserted as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Trust `X-User-Id`. For local development only.
    TestUser,
    Jwt {
        secret: String,
        /// Expected `iss` prefix; empty disables the check.
        issuer: String,
    },
}

impl AuthMode {
    pub fn from_config(config: &AuthConfig) -> Self {
        match config.mode.as_str() {
            "jwt" => AuthMode::Jwt {
                secret: config.jwt_secret.clone(),
                issuer: config.issuer.trim_end_matches('/').to_string(),
            },
            _ => AuthMode::TestUser,
        }
    }

    /// Identify the caller from request headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        match self {
            AuthMode::TestUser => {
                let user = headers
                    .get(TEST_USER_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .unwrap_or(DEFAULT_TEST_USER);
                Ok(user.to_string())
            }
            AuthMode::Jwt { secret, issuer } => {
                let token = bearer_token(headers)
                    .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".into()))?;
                verify_token(token, secret, issuer)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    iss: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get("authorization")?.to_str().ok()?;
    let scheme = value.get(..7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }
    Some(value[7..].trim())
}

fn verify_token(token: &str, secret: &str, issuer: &str) -> Result<String, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.required_spec_claims.clear();
    validation.validate_aud = false;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::Unauthenticated("invalid token".into())
    })?;

    if let Some(iss) = data.claims.iss.as_deref() {
        if !issuer.is_empty() && !iss.is_empty() && !iss.starts_with(issuer) {
            return Err(ApiError::Unauthenticated("invalid issuer".into()));
        }
    }

    data.claims
        .sub
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::Unauthenticated("missing subject".into()))
}

/// Middleware that resolves the caller and stores a [`UserId`] extension.
pub async fn require_user(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match state.auth.authenticate(req.headers()) {
        Ok(user) => {
            req.extensions_mut().insert(UserId(user));
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
