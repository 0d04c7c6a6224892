use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use super::expense::{Category, ExpenseType};

/// Lightweight expense snapshot embedded in a [`Session`].
///
/// Sessions are an identity-free path: participants and payers are plain
/// display names, amounts are caller-owned display data the core never does
/// arithmetic on.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionExpense {
    pub id: String,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub expense_type: ExpenseType,
    /// Payer display name, not a user identifier.
    pub paid_by: String,
    pub date: DateTime<Utc>,
    /// Shares keyed by participant name.
    #[serde(default)]
    pub splits: HashMap<String, f64>,
    /// Distinguishes a real expense from a balance-settling transfer entry.
    #[serde(default)]
    pub is_settlement: bool,
}

/// Ephemeral, time-boxed aggregate for anonymous group-expense sharing.
///
/// Never joined against users, groups or expenses. A session past its
/// `expires_at` behaves as not-found on every access and is deleted eagerly;
/// the background reaper is only a second line of defense.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Session {
    /// Caller-supplied identifier; collisions are rejected, never merged.
    pub id: String,
    pub group_name: String,
    pub participants: Vec<String>,
    pub expenses: Vec<SessionExpense>,
    /// Opaque settlement markers; format owned by the caller.
    pub settled_payments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Requested lifetime in whole days, fixed at creation.
    pub duration_days: i64,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            group_name: self.group_name.clone(),
            participants: self.participants.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    pub id: String,
    pub group_name: String,
    pub participants: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
