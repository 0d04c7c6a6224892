use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug)]
pub enum DivvyError {
    /// Generic input validation error with detailed field information
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),

    /// User with given ID not found
    #[error("User {0} not found")]
    UserNotFound(String),

    /// Group with given ID not found
    #[error("Group {0} not found")]
    GroupNotFound(String),

    /// Expense with given ID not found
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),

    /// Session with given ID not found (or already expired)
    #[error("Session {0} not found")]
    SessionNotFound(String),

    /// Session existed but its lifetime has elapsed
    #[error("Session {0} has expired")]
    SessionGone(String),

    /// A session with the given caller-supplied ID already exists
    #[error("Session {0} already exists")]
    DuplicateSession(String),

    /// Split shares do not reconcile with the declared total or percentages
    #[error("Allocation mismatch: {0}")]
    AllocationMismatch(String),

    /// Actor is neither the payer nor a split participant of the expense
    #[error("User {0} is not a participant of expense {1}")]
    NotExpenseParticipant(String, String),

    /// Only the original payer may perform this operation
    #[error("User {0} is not the payer of expense {1}")]
    NotExpensePayer(String, String),

    /// Actor does not belong to the group the expense targets
    #[error("User {0} is not a member of group {1}")]
    NotGroupMember(String, String),

    /// Email is already registered
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),

    /// Email or password did not match
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Bearer token missing, malformed or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Logging operation failed
    #[error("Logging error: {0}")]
    LoggingError(String),

    /// Internal server error (e.g., unexpected failure)
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl DivvyError {
    pub fn invalid_input(field: &str, description: impl Into<String>) -> Self {
        DivvyError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: format!("Invalid {}", field),
                description: description.into(),
            },
        )
    }
}
