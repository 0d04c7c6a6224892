pub mod in_memory;

use chrono::{DateTime, Utc};

use crate::core::errors::DivvyError;
use crate::core::models::{Expense, Group, Session, User};
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_user(&self, user: User) -> Result<(), DivvyError>;
    async fn get_user(&self, id: &str) -> Result<Option<User>, DivvyError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DivvyError>;
    /// Exact display-name lookup used by best-effort split resolution.
    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, DivvyError>;

    async fn save_group(&self, group: Group) -> Result<(), DivvyError>;
    async fn get_group(&self, id: &str) -> Result<Option<Group>, DivvyError>;

    async fn save_expense(&self, expense: Expense) -> Result<(), DivvyError>;
    async fn get_expense(&self, id: &str) -> Result<Option<Expense>, DivvyError>;
    async fn delete_expense(&self, id: &str) -> Result<bool, DivvyError>;
    /// All expenses where the user is the payer or holds a split.
    async fn get_expenses_for_user(&self, user_id: &str) -> Result<Vec<Expense>, DivvyError>;

    /// Inserts a new session; fails with [`DivvyError::DuplicateSession`]
    /// when the caller-supplied id is already taken.
    async fn insert_session(&self, session: Session) -> Result<(), DivvyError>;
    async fn get_session(&self, id: &str) -> Result<Option<Session>, DivvyError>;
    async fn save_session(&self, session: Session) -> Result<(), DivvyError>;
    async fn delete_session(&self, id: &str) -> Result<bool, DivvyError>;
    async fn list_sessions(&self) -> Result<Vec<Session>, DivvyError>;
    /// Reaper primitive: removes every session with `expires_at <= now` and
    /// returns how many were dropped. A cleanup safety net only; accessors
    /// perform their own expiry check synchronously.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, DivvyError>;
}
