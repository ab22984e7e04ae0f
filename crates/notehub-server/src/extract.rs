//! Bearer token check for the notes routes.

use axum::{extract::FromRequestParts, http::request::Parts};
use http::header::AUTHORIZATION;

use crate::error::ApiError;
use crate::state::AppState;

/// Proof that the request carried the configured Bearer token.
///
/// When no token is configured every request is accepted.
#[derive(Debug, Clone, Copy)]
pub struct Authorized;

impl FromRequestParts<AppState> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config().token.as_deref() else {
            return Ok(Self);
        };

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization: Bearer <token> header".into()))?;
        let value = header.to_str().map_err(|_| {
            ApiError::Unauthorized("Authorization header contains invalid characters".into())
        })?;

        match value.strip_prefix("Bearer ") {
            Some(token) if token.trim() == expected => Ok(Self),
            Some(_) => {
                tracing::debug!("rejected request with wrong token");
                Err(ApiError::Unauthorized("Invalid token".into()))
            }
            None => Err(ApiError::Unauthorized(
                "Missing Authorization: Bearer <token> header".into(),
            )),
        }
    }
}
