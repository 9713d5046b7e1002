use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::store::Store;

/// Confirmation of a settled reward.
#[derive(Clone, Debug)]
pub struct SettlementReceipt {
    pub recipient_id: String,
    pub amount: Decimal,
    pub new_balance: Decimal,
}

/// Credits a chore's reward to its acceptor.
///
/// The caller supplies identifiers only, never an amount: the chore is
/// re-read from the authoritative store at settlement time, and the
/// balance credit itself is a single atomic read-modify-write on the
/// acceptor's record. Concurrent settlements crediting the same user
/// serialize in the store, so no increment is lost.
///
/// Settlement is not idempotent: settling the same chore twice credits
/// the reward twice. Callers invoke it once per chore; finishing the
/// chore first is the natural guard point.
pub struct SettlementService {
    store: Arc<dyn Store>,
}

impl SettlementService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Settle the reward for one chore.
    ///
    /// Precondition failures are each a distinct error, checked in
    /// order before the balance transaction: unauthenticated caller,
    /// empty identifier, missing chore, chore without an acceptor
    /// (corrupt: such a chore can never have been finished). A failure
    /// inside the balance transaction leaves every balance untouched.
    pub async fn settle(
        &self,
        caller: Option<&str>,
        household_id: &str,
        chore_id: &str,
    ) -> AppResult<SettlementReceipt> {
        let caller = caller.ok_or(AppError::Unauthenticated)?;

        if household_id.trim().is_empty() || chore_id.trim().is_empty() {
            return Err(AppError::InvalidArgument(
                "household_id and chore_id must be non-empty".to_string(),
            ));
        }

        let chore = self
            .store
            .get_chore(household_id, chore_id)
            .await?
            .ok_or_else(|| AppError::ChoreNotFound(chore_id.to_string()))?;

        let acceptor = chore.acceptor.as_ref().ok_or_else(|| {
            AppError::Internal(format!("chore {} has no acceptor to credit", chore.id))
        })?;

        let new_balance = self.store.credit_balance(&acceptor.id, chore.reward).await?;

        info!(
            chore_id = %chore.id,
            recipient = %acceptor.id,
            amount = %chore.reward,
            caller = %caller,
            "reward settled"
        );

        Ok(SettlementReceipt {
            recipient_id: acceptor.id.clone(),
            amount: chore.reward,
            new_balance,
        })
    }
}
