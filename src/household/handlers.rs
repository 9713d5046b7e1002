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
use crate::household::models::Household;
use crate::users::models::User;

#[derive(Deserialize, Validate)]
pub struct CreateHouseholdRequest {
    #[validate(length(min = 1, max = 64))]
    pub tag: String,
}

/// POST /api/v1/households
///
/// Creates the household and joins the caller to it.
pub async fn create_household(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateHouseholdRequest>,
) -> AppResult<(StatusCode, Json<Household>)> {
    req.validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

    let household = state.store.insert_household(Household::new(req.tag)).await?;
    state
        .store
        .set_user_household(&auth.user_id, &household.id)
        .await?;

    info!(household_id = %household.id, creator = %auth.user_id, "household created");
    Ok((StatusCode::CREATED, Json(household)))
}

/// GET /api/v1/households/:id
pub async fn get_household(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(household_id): Path<String>,
) -> AppResult<Json<Household>> {
    let household = state
        .store
        .get_household(&household_id)
        .await?
        .ok_or(AppError::HouseholdNotFound(household_id))?;

    Ok(Json(household))
}

/// GET /api/v1/households/:id/members
pub async fn list_members(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(household_id): Path<String>,
) -> AppResult<Json<Vec<User>>> {
    state
        .store
        .get_household(&household_id)
        .await?
        .ok_or_else(|| AppError::HouseholdNotFound(household_id.clone()))?;

    let members = state.store.list_members(&household_id).await?;
    Ok(Json(members))
}

/// POST /api/v1/households/:id/join
pub async fn join_household(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(household_id): Path<String>,
) -> AppResult<Json<User>> {
    state
        .store
        .get_household(&household_id)
        .await?
        .ok_or_else(|| AppError::HouseholdNotFound(household_id.clone()))?;

    let user = state
        .store
        .set_user_household(&auth.user_id, &household_id)
        .await?;

    info!(household_id = %household_id, user_id = %user.id, "user joined household");
    Ok(Json(user))
}
