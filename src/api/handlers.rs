use crate::{
    api::models::*,
    auth::jwt::Claims,
    core::{
        errors::DivvyError,
        models::{ExpenseUpdate, ExpenseView, Group, Session, SessionSummary, SplitView, User},
        services::{DivvyService, ExpenseStats, StatsFilter},
    },
    infrastructure::{
        logging::{AppLog, in_memory::InMemoryLogging},
        storage::in_memory::InMemoryStorage,
    },
};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::IntoResponse,
};
use http::header;

use std::sync::Arc;

type AppService = Arc<DivvyService<InMemoryLogging, InMemoryStorage>>;

/// Middleware to validate the Bearer JWT and stash the claims for handlers.
async fn auth_middleware(
    State(service): State<AppService>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| DivvyError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| DivvyError::Unauthorized("Invalid Authorization header".to_string()))?;

    let claims = service.validate_token(token)?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// Define API routes. Session routes stay open: sessions are the anonymous,
// identity-free sharing path and never touch user accounts.
pub fn api_routes(service: AppService) -> Router {
    let protected_routes = Router::new()
        .route("/users/{user_id}", axum::routing::get(get_user))
        .route("/groups", axum::routing::post(create_group))
        .route("/groups/{group_id}", axum::routing::get(get_group))
        .route("/splits/allocate", axum::routing::post(allocate_splits))
        .route(
            "/expenses",
            axum::routing::post(create_expense).get(list_expenses),
        )
        .route(
            "/expenses/{expense_id}",
            axum::routing::get(get_expense)
                .put(update_expense)
                .delete(delete_expense),
        )
        .route("/expenses/{expense_id}/paid", axum::routing::post(mark_split_paid))
        .route("/expenses/stats", axum::routing::get(expense_stats))
        .route("/logs", axum::routing::get(get_app_logs))
        .route_layer(middleware::from_fn_with_state(service.clone(), auth_middleware));

    Router::new()
        .route("/login", axum::routing::post(login))
        .route("/users", axum::routing::post(register_user)) // Unprotected
        .route(
            "/sessions",
            axum::routing::post(create_session).get(list_sessions),
        )
        .route(
            "/sessions/{session_id}",
            axum::routing::get(get_session)
                .put(update_session)
                .delete(delete_session),
        )
        .merge(protected_routes)
        .with_state(service)
}

#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(service): State<AppService>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let token = service.authenticate(&req.email, &req.password).await?;
    Ok(Json(ApiResponse::ok(LoginResponse { token })))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User registered successfully", body = User),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_user(
    State(service): State<AppService>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let user = service.register_user(req.name, req.email, req.password).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user))))
}

#[utoipa::path(
    get,
    path = "/api/users/{user_id}",
    params(("user_id" = String, Path, description = "ID of the user to retrieve")),
    responses(
        (status = 200, description = "User retrieved successfully", body = User),
        (status = 404, description = "User not found")
    ),
    security(("Bearer" = []))
)]
pub async fn get_user(
    State(service): State<AppService>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = service.require_user(&user_id).await?;
    Ok(Json(ApiResponse::ok(user)))
}

#[utoipa::path(
    post,
    path = "/api/groups",
    request_body = CreateGroupRequest,
    responses(
        (status = 201, description = "Group created successfully", body = Group),
        (status = 404, description = "Member not found")
    ),
    security(("Bearer" = []))
)]
pub async fn create_group(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Group>>), ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let group = service.create_group(req.name, req.member_ids, &actor).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(group))))
}

#[utoipa::path(
    get,
    path = "/api/groups/{group_id}",
    params(("group_id" = String, Path, description = "ID of the group")),
    responses(
        (status = 200, description = "Group retrieved successfully", body = Group),
        (status = 404, description = "Group not found")
    ),
    security(("Bearer" = []))
)]
pub async fn get_group(
    State(service): State<AppService>,
    Path(group_id): Path<String>,
) -> Result<Json<ApiResponse<Group>>, ApiError> {
    let group = service
        .get_group(&group_id)
        .await?
        .ok_or_else(|| DivvyError::GroupNotFound(group_id))?;
    Ok(Json(ApiResponse::ok(group)))
}

#[utoipa::path(
    post,
    path = "/api/splits/allocate",
    request_body = AllocateSplitsRequest,
    responses(
        (status = 200, description = "Splits allocated", body = [SplitView]),
        (status = 400, description = "Allocation mismatch or invalid input")
    ),
    security(("Bearer" = []))
)]
pub async fn allocate_splits(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AllocateSplitsRequest>,
) -> Result<Json<ApiResponse<Vec<SplitView>>>, ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let splits = service
        .allocate_splits(req.amount, req.split_type, req.participants, &actor)
        .await?;
    Ok(Json(ApiResponse::ok(splits)))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = CreateExpenseRequest,
    responses(
        (status = 201, description = "Expense created successfully", body = ExpenseView),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Group not found")
    ),
    security(("Bearer" = []))
)]
pub async fn create_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseView>>), ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let expense = service
        .create_expense(
            req.description,
            req.amount,
            req.category,
            req.expense_type,
            req.split_type,
            req.group_id,
            req.splits,
            req.date,
            &actor,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(expense))))
}

#[utoipa::path(
    get,
    path = "/api/expenses",
    responses(
        (status = 200, description = "Expenses in scope for the actor", body = [ExpenseView])
    ),
    security(("Bearer" = []))
)]
pub async fn list_expenses(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<Vec<ExpenseView>>>, ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let filter = StatsFilter {
        group_id: query.group_id,
        from: query.from,
        to: query.to,
        category: query.category,
    };
    let expenses = service.list_expenses(&actor, &filter).await?;
    Ok(Json(ApiResponse::ok(expenses)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "ID of the expense")),
    responses(
        (status = 200, description = "Expense retrieved successfully", body = ExpenseView),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Expense not found")
    ),
    security(("Bearer" = []))
)]
pub async fn get_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
) -> Result<Json<ApiResponse<ExpenseView>>, ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let expense = service.get_expense(&expense_id, &actor).await?;
    Ok(Json(ApiResponse::ok(expense)))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{expense_id}",
    request_body = ExpenseUpdate,
    params(("expense_id" = String, Path, description = "ID of the expense")),
    responses(
        (status = 200, description = "Expense updated successfully", body = ExpenseView),
        (status = 400, description = "Bad request"),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Expense not found")
    ),
    security(("Bearer" = []))
)]
pub async fn update_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
    Json(update): Json<ExpenseUpdate>,
) -> Result<Json<ApiResponse<ExpenseView>>, ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let expense = service.update_expense(&expense_id, update, &actor).await?;
    Ok(Json(ApiResponse::ok(expense)))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{expense_id}",
    params(("expense_id" = String, Path, description = "ID of the expense")),
    responses(
        (status = 200, description = "Expense deleted successfully"),
        (status = 403, description = "Not the payer"),
        (status = 404, description = "Expense not found")
    ),
    security(("Bearer" = []))
)]
pub async fn delete_expense(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    service.delete_expense(&expense_id, &actor).await?;
    Ok(Json(ApiResponse::message("Expense deleted")))
}

#[utoipa::path(
    post,
    path = "/api/expenses/{expense_id}/paid",
    request_body = MarkSplitPaidRequest,
    params(("expense_id" = String, Path, description = "ID of the expense")),
    responses(
        (status = 200, description = "Split settlement flag updated", body = ExpenseView),
        (status = 403, description = "Not a participant"),
        (status = 404, description = "Expense not found")
    ),
    security(("Bearer" = []))
)]
pub async fn mark_split_paid(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Path(expense_id): Path<String>,
    Json(req): Json<MarkSplitPaidRequest>,
) -> Result<Json<ApiResponse<ExpenseView>>, ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let expense = service
        .mark_split_paid(&expense_id, &req.user_id, req.paid, &actor)
        .await?;
    Ok(Json(ApiResponse::ok(expense)))
}

#[utoipa::path(
    get,
    path = "/api/expenses/stats",
    responses(
        (status = 200, description = "Aggregated expense stats", body = ExpenseStats)
    ),
    security(("Bearer" = []))
)]
pub async fn expense_stats(
    State(service): State<AppService>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<ExpenseStats>>, ApiError> {
    let actor = service.require_user(&claims.sub).await?;
    let filter = StatsFilter {
        group_id: query.group_id,
        from: query.from,
        to: query.to,
        category: query.category,
    };
    let stats = service.expense_stats(&actor, &filter).await?;
    Ok(Json(ApiResponse::ok(stats)))
}

#[utoipa::path(
    post,
    path = "/api/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created successfully", body = SessionCreated),
        (status = 400, description = "Bad request"),
        (status = 409, description = "Session id already exists")
    )
)]
pub async fn create_session(
    State(service): State<AppService>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionCreated>>), ApiError> {
    let session = service
        .create_session(req.id, req.group_name, req.participants, req.duration_days)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(SessionCreated {
            id: session.id,
            group_name: session.group_name,
            expires_at: session.expires_at,
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Caller-supplied session id")),
    responses(
        (status = 200, description = "Session retrieved successfully", body = Session),
        (status = 404, description = "Session not found or expired")
    )
)]
pub async fn get_session(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    let session = service.get_session(&session_id).await?;
    Ok(Json(ApiResponse::ok(session)))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{session_id}",
    request_body = UpdateSessionRequest,
    params(("session_id" = String, Path, description = "Caller-supplied session id")),
    responses(
        (status = 200, description = "Session updated successfully", body = Session),
        (status = 404, description = "Session not found"),
        (status = 410, description = "Session expired")
    )
)]
pub async fn update_session(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
    Json(req): Json<UpdateSessionRequest>,
) -> Result<Json<ApiResponse<Session>>, ApiError> {
    let session = service
        .update_session(&session_id, req.expenses, req.settled_payments)
        .await?;
    Ok(Json(ApiResponse::ok(session)))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{session_id}",
    params(("session_id" = String, Path, description = "Caller-supplied session id")),
    responses(
        (status = 200, description = "Session deleted successfully"),
        (status = 404, description = "Session not found")
    )
)]
pub async fn delete_session(
    State(service): State<AppService>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service.delete_session(&session_id).await?;
    Ok(Json(ApiResponse::message("Session deleted")))
}

#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Summaries of live sessions", body = [SessionSummary])
    )
)]
pub async fn list_sessions(
    State(service): State<AppService>,
) -> Result<Json<ApiResponse<Vec<SessionSummary>>>, ApiError> {
    let summaries = service.list_sessions().await?;
    Ok(Json(ApiResponse::ok(summaries)))
}

#[utoipa::path(
    get,
    path = "/api/logs",
    responses(
        (status = 200, description = "Application logs retrieved successfully", body = [AppLog])
    ),
    security(("Bearer" = []))
)]
pub async fn get_app_logs(
    State(service): State<AppService>,
) -> Result<Json<ApiResponse<Vec<AppLog>>>, ApiError> {
    let logs = service.get_app_logs().await?;
    Ok(Json(ApiResponse::ok(logs)))
}
