use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;

/// Authenticated caller identity.
///
/// The bearer token carries the caller's user id; token issuance and
/// verification belong to the managed auth provider in front of this
/// service. A request without a usable `Authorization` header is
/// rejected before any handler or store access runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthenticated)?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or(AppError::Unauthenticated)?;

        if token.is_empty() {
            return Err(AppError::Unauthenticated);
        }

        Ok(AuthUser {
            user_id: token.to_string(),
        })
    }
}
