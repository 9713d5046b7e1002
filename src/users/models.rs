use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Parent,
    Child,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Parent => "parent",
            Role::Child => "child",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parent" => Ok(Role::Parent),
            "child" => Ok(Role::Child),
            other => Err(AppError::Internal(format!("corrupt user role: {}", other))),
        }
    }
}

/// User record.
///
/// Balance starts at zero and is mutated only by the reward settlement
/// transaction (or an explicit edit outside this service).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub household_id: Option<String>,
    pub role: Role,
    pub profile_color: Option<String>,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: Option<String>, role: Role, profile_color: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            household_id: None,
            role,
            profile_color,
            balance: Decimal::ZERO,
            created_at: Utc::now(),
        }
    }
}
