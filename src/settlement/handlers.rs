use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::api::handler::AppState;
use crate::auth::AuthUser;
use crate::error::AppResult;

#[derive(Deserialize)]
pub struct SettleRewardRequest {
    pub household_id: String,
    pub chore_id: String,
}

#[derive(Serialize)]
pub struct SettleRewardResponse {
    pub message: String,
}

/// POST /api/v1/settlement
///
/// Credits the chore's reward to its acceptor. The response message is
/// human-readable; clients should only check for its presence.
pub async fn settle_reward(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SettleRewardRequest>,
) -> AppResult<Json<SettleRewardResponse>> {
    let receipt = state
        .settlement
        .settle(Some(&auth.user_id), &req.household_id, &req.chore_id)
        .await?;

    Ok(Json(SettleRewardResponse {
        message: format!(
            "Transferred {} to user {}",
            receipt.amount, receipt.recipient_id
        ),
    }))
}
