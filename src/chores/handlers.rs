use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError};

use crate::api::handler::AppState;
use crate::auth::AuthUser;
use crate::chores::models::{Chore, UserSnapshot};
use crate::chores::state::{resolve, ChoreAction, ChoreStatus};
use crate::error::{AppError, AppResult};

#[derive(Deserialize, Validate)]
pub struct CreateChoreRequest {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "non_negative")]
    pub reward: Decimal,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

fn non_negative(reward: &Decimal) -> Result<(), ValidationError> {
    if reward.is_sign_negative() {
        return Err(ValidationError::new("reward must be non-negative"));
    }
    Ok(())
}

/// Chore as returned to clients: the stored document plus the derived
/// status and the caller's permitted action.
#[derive(Serialize)]
pub struct ChoreView {
    #[serde(flatten)]
    pub chore: Chore,
    pub status: ChoreStatus,
    pub action: ChoreAction,
    pub requestor_label: String,
    pub acceptor_label: Option<String>,
}

impl ChoreView {
    fn for_viewer(chore: Chore, viewer: &str) -> Self {
        let (status, action) = resolve(&chore, Some(viewer));
        let requestor_label = chore.requestor.display_label(Some(viewer));
        let acceptor_label = chore
            .acceptor
            .as_ref()
            .map(|a| a.display_label(Some(viewer)));
        Self {
            chore,
            status,
            action,
            requestor_label,
            acceptor_label,
        }
    }
}

/// POST /api/v1/households/:id/chores
///
/// The caller becomes the requestor; their identity snapshot is copied
/// into the chore document at write time.
pub async fn create_chore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(household_id): Path<String>,
    Json(req): Json<CreateChoreRequest>,
) -> AppResult<(StatusCode, Json<ChoreView>)> {
    req.validate()
        .map_err(|e| AppError::InvalidArgument(e.to_string()))?;

    state
        .store
        .get_household(&household_id)
        .await?
        .ok_or_else(|| AppError::HouseholdNotFound(household_id.clone()))?;

    let requestor = state
        .store
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(auth.user_id.clone()))?;

    let chore = state
        .store
        .insert_chore(Chore::new(
            household_id,
            req.name,
            req.description,
            req.reward,
            req.image_urls,
            UserSnapshot::of(&requestor),
        ))
        .await?;

    info!(chore_id = %chore.id, requestor = %requestor.id, reward = %chore.reward, "chore created");
    Ok((
        StatusCode::CREATED,
        Json(ChoreView::for_viewer(chore, &auth.user_id)),
    ))
}

/// GET /api/v1/households/:id/chores
pub async fn list_chores(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(household_id): Path<String>,
) -> AppResult<Json<Vec<ChoreView>>> {
    let chores = state.store.list_chores(&household_id).await?;
    let views = chores
        .into_iter()
        .map(|c| ChoreView::for_viewer(c, &auth.user_id))
        .collect();
    Ok(Json(views))
}

/// GET /api/v1/households/:id/chores/:chore_id
pub async fn get_chore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((household_id, chore_id)): Path<(String, String)>,
) -> AppResult<Json<ChoreView>> {
    let chore = state
        .store
        .get_chore(&household_id, &chore_id)
        .await?
        .ok_or(AppError::ChoreNotFound(chore_id))?;

    Ok(Json(ChoreView::for_viewer(chore, &auth.user_id)))
}

/// POST /api/v1/households/:id/chores/:chore_id/accept
///
/// Validation here runs against the stored record, not the client's
/// resolver output; the store re-checks the open state under its own
/// lock so a lost race surfaces as a conflict.
pub async fn accept_chore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((household_id, chore_id)): Path<(String, String)>,
) -> AppResult<Json<ChoreView>> {
    let chore = state
        .store
        .get_chore(&household_id, &chore_id)
        .await?
        .ok_or_else(|| AppError::ChoreNotFound(chore_id.clone()))?;

    if chore.requestor.id == auth.user_id {
        return Err(AppError::Forbidden(
            "requestors cannot accept their own chore".to_string(),
        ));
    }

    let acceptor = state
        .store
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(auth.user_id.clone()))?;

    let chore = state
        .store
        .claim_chore(&household_id, &chore_id, UserSnapshot::of(&acceptor))
        .await?;

    info!(chore_id = %chore.id, acceptor = %acceptor.id, "chore accepted");
    Ok(Json(ChoreView::for_viewer(chore, &auth.user_id)))
}

/// POST /api/v1/households/:id/chores/:chore_id/withdraw
pub async fn withdraw_chore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((household_id, chore_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let chore = state
        .store
        .get_chore(&household_id, &chore_id)
        .await?
        .ok_or_else(|| AppError::ChoreNotFound(chore_id.clone()))?;

    if chore.requestor.id != auth.user_id {
        return Err(AppError::Forbidden(
            "only the requestor may withdraw a chore".to_string(),
        ));
    }

    state.store.delete_chore(&household_id, &chore_id).await?;

    info!(chore_id = %chore_id, "chore withdrawn");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/households/:id/chores/:chore_id/finish
///
/// Marks the chore finished. Settlement is a separate call; finishing
/// first is what keeps a chore from being settled more than once.
pub async fn finish_chore(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((household_id, chore_id)): Path<(String, String)>,
) -> AppResult<Json<ChoreView>> {
    let chore = state
        .store
        .get_chore(&household_id, &chore_id)
        .await?
        .ok_or_else(|| AppError::ChoreNotFound(chore_id.clone()))?;

    match &chore.acceptor {
        Some(acceptor) if acceptor.id == auth.user_id => {}
        Some(_) => {
            return Err(AppError::Forbidden(
                "only the acceptor may finish a chore".to_string(),
            ))
        }
        None => {
            return Err(AppError::Conflict(
                "chore has no acceptor to finish it".to_string(),
            ))
        }
    }

    let chore = state
        .store
        .finish_chore(&household_id, &chore_id, Utc::now())
        .await?;

    info!(chore_id = %chore.id, acceptor = %auth.user_id, "chore finished");
    Ok(Json(ChoreView::for_viewer(chore, &auth.user_id)))
}
