use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Household record. The identifier is immutable after creation;
/// membership is implicit via each user's `household_id`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Household {
    pub id: String,
    pub tag: String,
    pub created_at: DateTime<Utc>,
}

impl Household {
    pub fn new(tag: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tag,
            created_at: Utc::now(),
        }
    }
}
