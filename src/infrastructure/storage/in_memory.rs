use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::core::errors::DivvyError;
use crate::core::models::{Expense, Group, Session, User};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;

pub struct InMemoryStorage {
    users: Mutex<HashMap<String, User>>,
    emails: Mutex<HashMap<String, String>>, // email -> user_id
    groups: Mutex<HashMap<String, Group>>,
    expenses: Mutex<HashMap<String, Expense>>,
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            users: Mutex::new(HashMap::new()),
            emails: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            expenses: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_user(&self, user: User) -> Result<(), DivvyError> {
        let mut emails = self.emails.lock().await;
        if emails.contains_key(&user.email) {
            return Err(DivvyError::EmailAlreadyRegistered(user.email));
        }
        emails.insert(user.email.clone(), user.id.clone());
        let mut users = self.users.lock().await;
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>, DivvyError> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, DivvyError> {
        // For production: Use database index on email
        let user_id = self.emails.lock().await.get(email).cloned();
        Ok(match user_id {
            Some(id) => self.users.lock().await.get(&id).cloned(),
            None => None,
        })
    }

    async fn find_user_by_name(&self, name: &str) -> Result<Option<User>, DivvyError> {
        // For production: Use database index on name
        Ok(self.users.lock().await.values().find(|u| u.name == name).cloned())
    }

    async fn save_group(&self, group: Group) -> Result<(), DivvyError> {
        self.groups.lock().await.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, id: &str) -> Result<Option<Group>, DivvyError> {
        Ok(self.groups.lock().await.get(id).cloned())
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), DivvyError> {
        self.expenses.lock().await.insert(expense.id.clone(), expense);
        Ok(())
    }

    async fn get_expense(&self, id: &str) -> Result<Option<Expense>, DivvyError> {
        Ok(self.expenses.lock().await.get(id).cloned())
    }

    async fn delete_expense(&self, id: &str) -> Result<bool, DivvyError> {
        Ok(self.expenses.lock().await.remove(id).is_some())
    }

    async fn get_expenses_for_user(&self, user_id: &str) -> Result<Vec<Expense>, DivvyError> {
        // For production: Use database query with index
        Ok(self
            .expenses
            .lock()
            .await
            .values()
            .filter(|e| e.involves(user_id))
            .cloned()
            .collect())
    }

    async fn insert_session(&self, session: Session) -> Result<(), DivvyError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&session.id) {
            return Err(DivvyError::DuplicateSession(session.id));
        }
        sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<Session>, DivvyError> {
        Ok(self.sessions.lock().await.get(id).cloned())
    }

    async fn save_session(&self, session: Session) -> Result<(), DivvyError> {
        self.sessions.lock().await.insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<bool, DivvyError> {
        Ok(self.sessions.lock().await.remove(id).is_some())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, DivvyError> {
        Ok(self.sessions.lock().await.values().cloned().collect())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize, DivvyError> {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok(before - sessions.len())
    }
}
