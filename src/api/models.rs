use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::core::errors::DivvyError;
use crate::core::models::{Category, ExpenseType, SessionExpense, SplitSpec, SplitType};

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AllocateSplitsRequest {
    pub amount: f64,
    #[serde(default)]
    pub split_type: SplitType,
    pub participants: Vec<SplitSpec>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateExpenseRequest {
    pub description: String,
    pub amount: f64,
    pub category: Option<Category>,
    pub expense_type: Option<ExpenseType>,
    pub split_type: Option<SplitType>,
    pub group_id: Option<String>,
    pub splits: Option<Vec<SplitSpec>>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, ToSchema)]
pub struct MarkSplitPaidRequest {
    pub user_id: String,
    pub paid: bool,
}

/// Query-string filters for expense listing and stats.
#[derive(Deserialize, Default)]
pub struct StatsQuery {
    pub group_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub category: Option<Category>,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub id: String,
    pub group_name: String,
    pub participants: Vec<String>,
    pub duration_days: i64,
}

#[derive(Serialize, ToSchema)]
pub struct SessionCreated {
    pub id: String,
    pub group_name: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateSessionRequest {
    pub expenses: Option<Vec<SessionExpense>>,
    pub settled_payments: Option<Vec<String>>,
}

/// Uniform response envelope: a success flag plus either `data` or `message`.
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        ApiResponse {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

// Newtype wrapper for DivvyError to implement IntoResponse
pub struct ApiError(pub DivvyError);

impl From<DivvyError> for ApiError {
    fn from(err: DivvyError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self.0 {
            DivvyError::InvalidInput(field, err) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid input for {}: {}", field, err.description),
            ),
            DivvyError::AllocationMismatch(msg) => {
                (StatusCode::BAD_REQUEST, format!("Allocation mismatch: {}", msg))
            }
            DivvyError::UserNotFound(id) => (StatusCode::NOT_FOUND, format!("User {} not found", id)),
            DivvyError::GroupNotFound(id) => (StatusCode::NOT_FOUND, format!("Group {} not found", id)),
            DivvyError::ExpenseNotFound(id) => (StatusCode::NOT_FOUND, format!("Expense {} not found", id)),
            DivvyError::SessionNotFound(id) => (StatusCode::NOT_FOUND, format!("Session {} not found", id)),
            DivvyError::SessionGone(id) => (StatusCode::GONE, format!("Session {} has expired", id)),
            DivvyError::DuplicateSession(id) => {
                (StatusCode::CONFLICT, format!("Session {} already exists", id))
            }
            DivvyError::NotExpenseParticipant(user_id, expense_id) => (
                StatusCode::FORBIDDEN,
                format!("User {} is not a participant of expense {}", user_id, expense_id),
            ),
            DivvyError::NotExpensePayer(user_id, expense_id) => (
                StatusCode::FORBIDDEN,
                format!("User {} is not the payer of expense {}", user_id, expense_id),
            ),
            DivvyError::NotGroupMember(user_id, group_id) => (
                StatusCode::FORBIDDEN,
                format!("User {} is not a member of group {}", user_id, group_id),
            ),
            DivvyError::EmailAlreadyRegistered(email) => {
                (StatusCode::CONFLICT, format!("Email {} already registered", email))
            }
            DivvyError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()),
            DivvyError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            DivvyError::StorageError(msg)
            | DivvyError::LoggingError(msg)
            | DivvyError::InternalServerError(msg) => {
                // Internal detail stays in the logs, not in the response.
                error!(detail = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}
