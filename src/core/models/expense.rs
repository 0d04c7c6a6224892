use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::money;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Groceries,
    Transport,
    Shopping,
    Entertainment,
    Utilities,
    Bills,
    Health,
    Travel,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Groceries => "groceries",
            Category::Transport => "transport",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::Utilities => "utilities",
            Category::Bills => "bills",
            Category::Health => "health",
            Category::Travel => "travel",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseType {
    #[default]
    Personal,
    Shared,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    #[default]
    Equal,
    Custom,
    Percentage,
}

/// One participant's owed share, embedded in its owning [`Expense`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Split {
    pub user_id: String,
    /// Denormalized display name; the identifier is the source of truth.
    pub user_name: Option<String>,
    pub amount_cents: i64,
    pub percentage: Option<f64>,
    pub paid: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount_cents: i64,
    pub category: Category,
    pub expense_type: ExpenseType,
    pub split_type: SplitType,
    /// Identifier of the user who fronted the money.
    pub paid_by: String,
    pub group_id: Option<String>,
    /// Denormalized group display name, refreshed at write time.
    pub group_name: Option<String>,
    pub splits: Vec<Split>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    /// True when the user paid the expense or holds one of its splits.
    pub fn involves(&self, user_id: &str) -> bool {
        self.paid_by == user_id || self.splits.iter().any(|s| s.user_id == user_id)
    }
}

/// Raw split input as supplied by callers: a participant given by identifier
/// or by display name, with an explicit amount (custom splits) or a
/// percentage (percentage splits).
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct SplitSpec {
    pub user: Option<String>,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub percentage: Option<f64>,
}

/// Partial-update payload for an expense. Absent fields are left untouched;
/// a supplied `splits` array re-runs the allocator.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ExpenseUpdate {
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub category: Option<Category>,
    pub expense_type: Option<ExpenseType>,
    pub split_type: Option<SplitType>,
    pub group_id: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub splits: Option<Vec<SplitSpec>>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SplitView {
    pub user_id: String,
    pub user_name: Option<String>,
    pub amount: f64,
    pub percentage: Option<f64>,
    pub paid: bool,
}

impl From<Split> for SplitView {
    fn from(split: Split) -> Self {
        SplitView {
            user_id: split.user_id,
            user_name: split.user_name,
            amount: money::to_major(split.amount_cents),
            percentage: split.percentage,
            paid: split.paid,
        }
    }
}

/// Presentation shape of an expense: identifiers joined with display names,
/// amounts in major units. Rebuildable from the stored record at any time.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ExpenseView {
    pub id: String,
    pub description: String,
    pub amount: f64,
    pub category: Category,
    pub expense_type: ExpenseType,
    pub split_type: SplitType,
    pub paid_by: String,
    pub paid_by_name: Option<String>,
    pub group_id: Option<String>,
    pub group_name: Option<String>,
    pub splits: Vec<SplitView>,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExpenseView {
    pub fn new(expense: Expense, paid_by_name: Option<String>) -> Self {
        ExpenseView {
            id: expense.id,
            description: expense.description,
            amount: money::to_major(expense.amount_cents),
            category: expense.category,
            expense_type: expense.expense_type,
            split_type: expense.split_type,
            paid_by: expense.paid_by,
            paid_by_name,
            group_id: expense.group_id,
            group_name: expense.group_name,
            splits: expense.splits.into_iter().map(SplitView::from).collect(),
            date: expense.date,
            created_at: expense.created_at,
            updated_at: expense.updated_at,
        }
    }
}
