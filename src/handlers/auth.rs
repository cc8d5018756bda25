use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::state::AppState;

pub const AUTH_COOKIE: &str = "auth_token";
const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub exp: usize,
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        AppError::Unauthorized
    })?;

    if data.claims.user_id.is_empty() {
        return Err(AppError::Unauthorized);
    }
    Ok(data.claims)
}

fn session_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(&parts.headers)
            .get(AUTH_COOKIE)
            .map(|c| c.value().to_string())
    })
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Option<String>,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = decode_token(&token, &state.config.jwt_secret)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            role: claims.role,
        })
    }
}

#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role.as_deref() != Some(ADMIN_ROLE) {
            return Err(AppError::Forbidden("Access denied. Admins only.".to_string()));
        }
        Ok(AdminUser(user))
    }
}
