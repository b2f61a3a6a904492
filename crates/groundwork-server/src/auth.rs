//! Bearer-token authentication.
//!
//! Access tokens are EdDSA (Ed25519) JWTs carrying the user id and the
//! user's tenant. Verification is stateless; the middleware then loads
//! the user so that role and status are always current.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use groundwork_core::error::GroundworkError;
use groundwork_core::repository::UserRepository;
use groundwork_tenancy::TenancyError;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_public_key_pem: String,
    /// Only needed by tooling that issues tokens.
    pub jwt_private_key_pem: Option<String>,
    pub jwt_issuer: String,
    pub access_token_lifetime_secs: u64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("no signing key configured")]
    MissingSigningKey,

    #[error("crypto error: {0}")]
    Crypto(String),
}

/// Claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User id.
    pub sub: String,
    /// Tenant id, absent for accounts that predate tenancy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed EdDSA access token.
pub fn issue_access_token(
    user_id: Uuid,
    tenant_id: Option<Uuid>,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let pem = config
        .jwt_private_key_pem
        .as_deref()
        .ok_or(AuthError::MissingSigningKey)?;

    let now = Utc::now().timestamp();
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        tenant_id: tenant_id.map(|t| t.to_string()),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + config.access_token_lifetime_secs as i64,
    };

    let key = EncodingKey::from_ed_pem(pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;

    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Verify signature, expiry and issuer of an access token.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    let key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Claims of the bearer token in `headers`, `None` when there is no
/// `Authorization` header at all.
fn bearer_claims(
    headers: &HeaderMap,
    config: &AuthConfig,
) -> Result<Option<AccessTokenClaims>, TenancyError> {
    let Some(header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(TenancyError::Unauthenticated)?;

    decode_access_token(token.trim(), config)
        .map(Some)
        .map_err(|e| {
            debug!(error = %e, "rejected access token");
            TenancyError::Unauthenticated
        })
}

/// Attach the authenticated [`Principal`](groundwork_core::models::user::Principal)
/// to the request when a bearer token is present.
///
/// Requests without a token pass through anonymously; a token that does
/// not verify, or that names an unknown or inactive user, is rejected.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(claims) = bearer_claims(request.headers(), &state.auth)? else {
        return Ok(next.run(request).await);
    };

    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| TenancyError::Unauthenticated)?;
    let user = match state.users.get_by_id(user_id).await {
        Ok(user) => user,
        Err(GroundworkError::NotFound { .. }) => return Err(TenancyError::Unauthenticated.into()),
        Err(e) => return Err(TenancyError::storage("load_principal", None)(e).into()),
    };

    if !user.is_active() {
        debug!(user_id = %user.id, "token of inactive user rejected");
        return Err(TenancyError::Unauthenticated.into());
    }

    request.extensions_mut().insert(user.principal());
    Ok(next.run(request).await)
}
