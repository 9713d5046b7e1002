pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::chores::models::{Chore, UserSnapshot};
use crate::error::AppResult;
use crate::household::models::Household;
use crate::users::models::User;

/// Document store seam for the service.
///
/// `MemoryStore` backs tests and DB-less development; `PgStore` is the
/// durable implementation. Methods that change chore state or credit a
/// balance are atomic with respect to concurrent callers: the state
/// preconditions are re-checked inside the store's own critical
/// section, so a lost race surfaces as `Conflict` instead of a silent
/// overwrite, and concurrent balance credits never lose an update.
#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: User) -> AppResult<User>;
    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>>;
    async fn set_user_household(&self, user_id: &str, household_id: &str) -> AppResult<User>;

    /// Atomic read-modify-write on one user's balance. Re-reads the
    /// current balance inside the transaction, adds `amount`, writes
    /// the result back, and returns the new balance. Never operates on
    /// a balance read before the transaction began.
    async fn credit_balance(&self, user_id: &str, amount: Decimal) -> AppResult<Decimal>;

    // households
    async fn insert_household(&self, household: Household) -> AppResult<Household>;
    async fn get_household(&self, household_id: &str) -> AppResult<Option<Household>>;
    async fn list_members(&self, household_id: &str) -> AppResult<Vec<User>>;

    // chores, scoped under a household
    async fn insert_chore(&self, chore: Chore) -> AppResult<Chore>;
    async fn get_chore(&self, household_id: &str, chore_id: &str) -> AppResult<Option<Chore>>;
    async fn list_chores(&self, household_id: &str) -> AppResult<Vec<Chore>>;

    /// Set the acceptor, provided the chore is still open.
    async fn claim_chore(
        &self,
        household_id: &str,
        chore_id: &str,
        acceptor: UserSnapshot,
    ) -> AppResult<Chore>;

    /// Set the finished timestamp, provided the chore is accepted and
    /// not yet finished. A chore with no acceptor can never finish.
    async fn finish_chore(
        &self,
        household_id: &str,
        chore_id: &str,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Chore>;

    /// Remove an unfinished chore (requestor withdrawal).
    async fn delete_chore(&self, household_id: &str, chore_id: &str) -> AppResult<()>;
}
