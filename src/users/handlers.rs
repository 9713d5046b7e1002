use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::api::handler::AppState;
use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::users::models::{Role, User};

#[derive(Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(max = 64))]
    pub name: Option<String>,
    pub role: Role,
    pub profile_color: Option<String>,
}

/// POST /api/v1/users
///
/// Sign-up: creates the user record with balance zero. Public — the
/// auth provider in front of this service vouches for the sign-up flow
/// and the returned id becomes the caller's bearer identity.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    req.validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

    let user = state
        .store
        .insert_user(User::new(req.name, req.role, req.profile_color))
        .await?;

    info!(user_id = %user.id, "user created");
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<User>> {
    let user = state
        .store
        .get_user(&user_id)
        .await?
        .ok_or(AppError::UserNotFound(user_id))?;

    Ok(Json(user))
}
