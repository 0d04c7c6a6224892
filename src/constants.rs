// Structured-log action names.
pub const USER_REGISTERED: &str = "user_registered";
pub const GROUP_CREATED: &str = "group_created";
pub const SPLITS_ALLOCATED: &str = "splits_allocated";
pub const EXPENSE_CREATED: &str = "expense_created";
pub const EXPENSE_UPDATED: &str = "expense_updated";
pub const EXPENSE_DELETED: &str = "expense_deleted";
pub const SPLIT_MARKED: &str = "split_marked";
pub const STATS_QUERIED: &str = "stats_queried";
pub const SESSION_CREATED: &str = "session_created";
pub const SESSION_UPDATED: &str = "session_updated";
pub const SESSION_DELETED: &str = "session_deleted";
pub const SESSIONS_PURGED: &str = "sessions_purged";

/// Tolerance when checking that supplied percentages sum to 100.
pub const PERCENT_TOLERANCE: f64 = 0.01;

/// Largest accepted expense amount, in cents.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;

pub const MAX_DESCRIPTION_LEN: usize = 255;
pub const MAX_NAME_LEN: usize = 100;
