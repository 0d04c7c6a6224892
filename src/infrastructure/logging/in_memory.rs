use crate::core::errors::DivvyError;
use crate::infrastructure::logging::{AppLog, LoggingService};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

pub struct InMemoryLogging {
    logs: tokio::sync::Mutex<Vec<AppLog>>,
}

impl InMemoryLogging {
    pub fn new() -> Self {
        InMemoryLogging {
            logs: tokio::sync::Mutex::new(Vec::new()),
        }
    }
}

impl Default for InMemoryLogging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), DivvyError> {
        // For production: Use a logging queue or batch writes
        let mut logs = self.logs.lock().await;
        logs.push(AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            user_id: user_id.map(String::from),
            details,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self) -> Result<Vec<AppLog>, DivvyError> {
        Ok(self.logs.lock().await.clone())
    }
}
