use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::chores::models::{Chore, UserSnapshot};
use crate::error::{AppError, AppResult};
use crate::household::models::Household;
use crate::store::Store;
use crate::users::models::User;

/// In-memory document store.
///
/// Atomicity comes from holding the relevant write lock across each
/// read-modify-write: a concurrent credit or claim serializes on the
/// lock, so the preconditions it checked still hold when it writes.
pub struct MemoryStore {
    users: tokio::sync::RwLock<HashMap<String, User>>,
    households: tokio::sync::RwLock<HashMap<String, Household>>,
    // keyed by (household_id, chore_id)
    chores: tokio::sync::RwLock<HashMap<(String, String), Chore>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: tokio::sync::RwLock::new(HashMap::new()),
            households: tokio::sync::RwLock::new(HashMap::new()),
            chores: tokio::sync::RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn set_user_household(&self, user_id: &str, household_id: &str) -> AppResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;
        user.household_id = Some(household_id.to_string());
        Ok(user.clone())
    }

    async fn credit_balance(&self, user_id: &str, amount: Decimal) -> AppResult<Decimal> {
        // Write lock held across the whole read-modify-write
        let mut users = self.users.write().await;
        let user = users
            .get_mut(user_id)
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;
        user.balance += amount;
        Ok(user.balance)
    }

    async fn insert_household(&self, household: Household) -> AppResult<Household> {
        let mut households = self.households.write().await;
        households.insert(household.id.clone(), household.clone());
        Ok(household)
    }

    async fn get_household(&self, household_id: &str) -> AppResult<Option<Household>> {
        let households = self.households.read().await;
        Ok(households.get(household_id).cloned())
    }

    async fn list_members(&self, household_id: &str) -> AppResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| u.household_id.as_deref() == Some(household_id))
            .cloned()
            .collect())
    }

    async fn insert_chore(&self, chore: Chore) -> AppResult<Chore> {
        let mut chores = self.chores.write().await;
        chores.insert(
            (chore.household_id.clone(), chore.id.clone()),
            chore.clone(),
        );
        Ok(chore)
    }

    async fn get_chore(&self, household_id: &str, chore_id: &str) -> AppResult<Option<Chore>> {
        let chores = self.chores.read().await;
        Ok(chores
            .get(&(household_id.to_string(), chore_id.to_string()))
            .cloned())
    }

    async fn list_chores(&self, household_id: &str) -> AppResult<Vec<Chore>> {
        let chores = self.chores.read().await;
        let mut result: Vec<Chore> = chores
            .values()
            .filter(|c| c.household_id == household_id)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.created_at);
        Ok(result)
    }

    async fn claim_chore(
        &self,
        household_id: &str,
        chore_id: &str,
        acceptor: UserSnapshot,
    ) -> AppResult<Chore> {
        let mut chores = self.chores.write().await;
        let chore = chores
            .get_mut(&(household_id.to_string(), chore_id.to_string()))
            .ok_or_else(|| AppError::ChoreNotFound(chore_id.to_string()))?;

        if chore.finished_at.is_some() {
            return Err(AppError::Conflict("chore is already finished".to_string()));
        }
        if chore.acceptor.is_some() {
            return Err(AppError::Conflict("chore is already accepted".to_string()));
        }

        chore.acceptor = Some(acceptor);
        Ok(chore.clone())
    }

    async fn finish_chore(
        &self,
        household_id: &str,
        chore_id: &str,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Chore> {
        let mut chores = self.chores.write().await;
        let chore = chores
            .get_mut(&(household_id.to_string(), chore_id.to_string()))
            .ok_or_else(|| AppError::ChoreNotFound(chore_id.to_string()))?;

        if chore.finished_at.is_some() {
            return Err(AppError::Conflict("chore is already finished".to_string()));
        }
        if chore.acceptor.is_none() {
            return Err(AppError::Conflict(
                "chore has no acceptor to finish it".to_string(),
            ));
        }

        chore.finished_at = Some(finished_at);
        Ok(chore.clone())
    }

    async fn delete_chore(&self, household_id: &str, chore_id: &str) -> AppResult<()> {
        let mut chores = self.chores.write().await;
        let key = (household_id.to_string(), chore_id.to_string());
        let chore = chores
            .get(&key)
            .ok_or_else(|| AppError::ChoreNotFound(chore_id.to_string()))?;

        if chore.finished_at.is_some() {
            return Err(AppError::Conflict(
                "finished chores cannot be withdrawn".to_string(),
            ));
        }

        chores.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::models::Role;
    use rust_decimal_macros::dec;

    fn snapshot(id: &str) -> UserSnapshot {
        UserSnapshot {
            id: id.to_string(),
            name: None,
        }
    }

    fn chore(store_id: &str) -> Chore {
        Chore::new(
            store_id.to_string(),
            "laundry".to_string(),
            String::new(),
            dec!(3),
            vec![],
            snapshot("req"),
        )
    }

    #[tokio::test]
    async fn claim_is_first_wins() {
        let store = MemoryStore::new();
        let c = store.insert_chore(chore("hh")).await.unwrap();

        store.claim_chore("hh", &c.id, snapshot("a")).await.unwrap();
        let err = store
            .claim_chore("hh", &c.id, snapshot("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = store.get_chore("hh", &c.id).await.unwrap().unwrap();
        assert_eq!(stored.acceptor, Some(snapshot("a")));
    }

    #[tokio::test]
    async fn finish_requires_an_acceptor() {
        let store = MemoryStore::new();
        let c = store.insert_chore(chore("hh")).await.unwrap();

        let err = store
            .finish_chore("hh", &c.id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn finished_chore_cannot_be_withdrawn() {
        let store = MemoryStore::new();
        let c = store.insert_chore(chore("hh")).await.unwrap();
        store.claim_chore("hh", &c.id, snapshot("a")).await.unwrap();
        store.finish_chore("hh", &c.id, Utc::now()).await.unwrap();

        let err = store.delete_chore("hh", &c.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn credit_balance_is_cumulative() {
        let store = MemoryStore::new();
        let user = store
            .insert_user(User::new(None, Role::Child, None))
            .await
            .unwrap();

        assert_eq!(
            store.credit_balance(&user.id, dec!(10)).await.unwrap(),
            dec!(10)
        );
        assert_eq!(
            store.credit_balance(&user.id, dec!(2.5)).await.unwrap(),
            dec!(12.5)
        );
    }

    #[tokio::test]
    async fn credit_balance_for_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let err = store.credit_balance("ghost", dec!(1)).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound(_)));
    }
}
