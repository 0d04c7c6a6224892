use utoipa::OpenApi;

use crate::{
    api::models::{
        AllocateSplitsRequest, CreateExpenseRequest, CreateGroupRequest, CreateSessionRequest,
        LoginRequest, LoginResponse, MarkSplitPaidRequest, RegisterUserRequest, SessionCreated,
        UpdateSessionRequest,
    },
    core::{
        models::{
            Category, ExpenseType, ExpenseUpdate, ExpenseView, Group, GroupMember, Role, Session,
            SessionExpense, SessionSummary, SplitSpec, SplitType, SplitView, User,
        },
        services::{CategoryStat, ExpenseStats, Position, StatsTotal},
    },
    infrastructure::logging::AppLog,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::handlers::login,
        super::handlers::register_user,
        super::handlers::get_user,
        super::handlers::create_group,
        super::handlers::get_group,
        super::handlers::allocate_splits,
        super::handlers::create_expense,
        super::handlers::list_expenses,
        super::handlers::get_expense,
        super::handlers::update_expense,
        super::handlers::delete_expense,
        super::handlers::mark_split_paid,
        super::handlers::expense_stats,
        super::handlers::create_session,
        super::handlers::get_session,
        super::handlers::update_session,
        super::handlers::delete_session,
        super::handlers::list_sessions,
        super::handlers::get_app_logs
    ),
    components(schemas(
        RegisterUserRequest,
        LoginRequest,
        LoginResponse,
        CreateGroupRequest,
        AllocateSplitsRequest,
        CreateExpenseRequest,
        MarkSplitPaidRequest,
        CreateSessionRequest,
        SessionCreated,
        UpdateSessionRequest,
        Category,
        ExpenseType,
        SplitType,
        SplitSpec,
        ExpenseUpdate,
        ExpenseView,
        SplitView,
        Group,
        GroupMember,
        Role,
        User,
        Session,
        SessionExpense,
        SessionSummary,
        CategoryStat,
        StatsTotal,
        Position,
        ExpenseStats,
        AppLog
    )),
    info(
        title = "Divvy API",
        description = "API for shared-expense tracking and ephemeral split sessions",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;
