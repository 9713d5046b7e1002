use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::users::User;

/// Denormalized copy of a user's identity embedded in a chore document.
///
/// Copied at write time so chores render without a join; a later rename
/// is not reflected in old snapshots. Accepted staleness, not a bug.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSnapshot {
    pub id: String,
    pub name: Option<String>,
}

impl UserSnapshot {
    pub fn of(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
        }
    }

    /// Display name for the snapshot, substituting a self-referential
    /// label when the viewer is the snapshotted user.
    pub fn display_label(&self, viewer: Option<&str>) -> String {
        if viewer == Some(self.id.as_str()) {
            return "you".to_string();
        }
        self.name.clone().unwrap_or_else(|| self.id.clone())
    }
}

/// Chore document, scoped under a household.
///
/// Lifecycle state is derived from `acceptor`/`finished_at`, never
/// stored. A finished chore never again changes acceptor or reward.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chore {
    pub id: String,
    pub household_id: String,
    pub name: String,
    pub description: String,
    pub requestor: UserSnapshot,
    pub acceptor: Option<UserSnapshot>,
    pub reward: Decimal,
    pub image_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Chore {
    pub fn new(
        household_id: String,
        name: String,
        description: String,
        reward: Decimal,
        image_urls: Vec<String>,
        requestor: UserSnapshot,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            household_id,
            name,
            description,
            requestor,
            acceptor: None,
            reward,
            image_urls,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}
