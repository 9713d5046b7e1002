use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::chores::models::{Chore, UserSnapshot};
use crate::error::{AppError, AppResult};
use crate::household::models::Household;
use crate::store::Store;
use crate::users::models::User;

/// Postgres-backed document store.
///
/// Chore state changes and balance credits run inside a transaction
/// with a `FOR UPDATE` row lock, so the precondition check and the
/// write are serialized against concurrent callers touching the same
/// row.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> AppResult<Self> {
        info!("connecting to database");
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("database ready");

        Ok(Self { pool })
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    name: Option<String>,
    household_id: Option<String>,
    role: String,
    profile_color: Option<String>,
    balance: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            household_id: row.household_id,
            role: row.role.parse()?,
            profile_color: row.profile_color,
            balance: row.balance,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct HouseholdRow {
    id: String,
    tag: String,
    created_at: DateTime<Utc>,
}

impl From<HouseholdRow> for Household {
    fn from(row: HouseholdRow) -> Self {
        Household {
            id: row.id,
            tag: row.tag,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChoreRow {
    id: String,
    household_id: String,
    name: String,
    description: String,
    requestor_id: String,
    requestor_name: Option<String>,
    acceptor_id: Option<String>,
    acceptor_name: Option<String>,
    reward: Decimal,
    image_urls: Vec<String>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

impl From<ChoreRow> for Chore {
    fn from(row: ChoreRow) -> Self {
        Chore {
            id: row.id,
            household_id: row.household_id,
            name: row.name,
            description: row.description,
            requestor: UserSnapshot {
                id: row.requestor_id,
                name: row.requestor_name,
            },
            acceptor: row.acceptor_id.map(|id| UserSnapshot {
                id,
                name: row.acceptor_name,
            }),
            reward: row.reward,
            image_urls: row.image_urls,
            created_at: row.created_at,
            finished_at: row.finished_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, household_id, role, profile_color, balance, created_at";
const CHORE_COLUMNS: &str = "id, household_id, name, description, requestor_id, requestor_name, \
     acceptor_id, acceptor_name, reward, image_urls, created_at, finished_at";

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        sqlx::query(
            "INSERT INTO users (id, name, household_id, role, profile_color, balance, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(&user.household_id)
        .bind(user.role.as_str())
        .bind(&user.profile_color)
        .bind(user.balance)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn set_user_household(&self, user_id: &str, household_id: &str) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET household_id = $2 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .bind(household_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        row.try_into()
    }

    async fn credit_balance(&self, user_id: &str, amount: Decimal) -> AppResult<Decimal> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent credits to the same user
        let balance: Option<(Decimal,)> =
            sqlx::query_as("SELECT balance FROM users WHERE id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (balance,) = balance.ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;
        let new_balance = balance + amount;

        sqlx::query("UPDATE users SET balance = $2 WHERE id = $1")
            .bind(user_id)
            .bind(new_balance)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(new_balance)
    }

    async fn insert_household(&self, household: Household) -> AppResult<Household> {
        sqlx::query("INSERT INTO households (id, tag, created_at) VALUES ($1, $2, $3)")
            .bind(&household.id)
            .bind(&household.tag)
            .bind(household.created_at)
            .execute(&self.pool)
            .await?;

        Ok(household)
    }

    async fn get_household(&self, household_id: &str) -> AppResult<Option<Household>> {
        let row = sqlx::query_as::<_, HouseholdRow>(
            "SELECT id, tag, created_at FROM households WHERE id = $1",
        )
        .bind(household_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Household::from))
    }

    async fn list_members(&self, household_id: &str) -> AppResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE household_id = $1 ORDER BY created_at",
            USER_COLUMNS
        ))
        .bind(household_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn insert_chore(&self, chore: Chore) -> AppResult<Chore> {
        sqlx::query(
            "INSERT INTO chores (id, household_id, name, description, requestor_id, \
             requestor_name, acceptor_id, acceptor_name, reward, image_urls, created_at, \
             finished_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&chore.id)
        .bind(&chore.household_id)
        .bind(&chore.name)
        .bind(&chore.description)
        .bind(&chore.requestor.id)
        .bind(&chore.requestor.name)
        .bind(chore.acceptor.as_ref().map(|a| a.id.clone()))
        .bind(chore.acceptor.as_ref().and_then(|a| a.name.clone()))
        .bind(chore.reward)
        .bind(&chore.image_urls)
        .bind(chore.created_at)
        .bind(chore.finished_at)
        .execute(&self.pool)
        .await?;

        Ok(chore)
    }

    async fn get_chore(&self, household_id: &str, chore_id: &str) -> AppResult<Option<Chore>> {
        let row = sqlx::query_as::<_, ChoreRow>(&format!(
            "SELECT {} FROM chores WHERE household_id = $1 AND id = $2",
            CHORE_COLUMNS
        ))
        .bind(household_id)
        .bind(chore_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Chore::from))
    }

    async fn list_chores(&self, household_id: &str) -> AppResult<Vec<Chore>> {
        let rows = sqlx::query_as::<_, ChoreRow>(&format!(
            "SELECT {} FROM chores WHERE household_id = $1 ORDER BY created_at",
            CHORE_COLUMNS
        ))
        .bind(household_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Chore::from).collect())
    }

    async fn claim_chore(
        &self,
        household_id: &str,
        chore_id: &str,
        acceptor: UserSnapshot,
    ) -> AppResult<Chore> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ChoreRow>(&format!(
            "SELECT {} FROM chores WHERE household_id = $1 AND id = $2 FOR UPDATE",
            CHORE_COLUMNS
        ))
        .bind(household_id)
        .bind(chore_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ChoreNotFound(chore_id.to_string()))?;

        if row.finished_at.is_some() {
            return Err(AppError::Conflict("chore is already finished".to_string()));
        }
        if row.acceptor_id.is_some() {
            return Err(AppError::Conflict("chore is already accepted".to_string()));
        }

        sqlx::query(
            "UPDATE chores SET acceptor_id = $3, acceptor_name = $4
             WHERE household_id = $1 AND id = $2",
        )
        .bind(household_id)
        .bind(chore_id)
        .bind(&acceptor.id)
        .bind(&acceptor.name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut chore = Chore::from(row);
        chore.acceptor = Some(acceptor);
        Ok(chore)
    }

    async fn finish_chore(
        &self,
        household_id: &str,
        chore_id: &str,
        finished_at: DateTime<Utc>,
    ) -> AppResult<Chore> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ChoreRow>(&format!(
            "SELECT {} FROM chores WHERE household_id = $1 AND id = $2 FOR UPDATE",
            CHORE_COLUMNS
        ))
        .bind(household_id)
        .bind(chore_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::ChoreNotFound(chore_id.to_string()))?;

        if row.finished_at.is_some() {
            return Err(AppError::Conflict("chore is already finished".to_string()));
        }
        if row.acceptor_id.is_none() {
            return Err(AppError::Conflict(
                "chore has no acceptor to finish it".to_string(),
            ));
        }

        sqlx::query("UPDATE chores SET finished_at = $3 WHERE household_id = $1 AND id = $2")
            .bind(household_id)
            .bind(chore_id)
            .bind(finished_at)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut chore = Chore::from(row);
        chore.finished_at = Some(finished_at);
        Ok(chore)
    }

    async fn delete_chore(&self, household_id: &str, chore_id: &str) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(Option<DateTime<Utc>>,)> = sqlx::query_as(
            "SELECT finished_at FROM chores WHERE household_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(household_id)
        .bind(chore_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (finished_at,) = row.ok_or_else(|| AppError::ChoreNotFound(chore_id.to_string()))?;
        if finished_at.is_some() {
            return Err(AppError::Conflict(
                "finished chores cannot be withdrawn".to_string(),
            ));
        }

        sqlx::query("DELETE FROM chores WHERE household_id = $1 AND id = $2")
            .bind(household_id)
            .bind(chore_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
