use crate::auth::jwt::{Claims, JwtService};
use crate::constants::{
    EXPENSE_CREATED, EXPENSE_DELETED, EXPENSE_UPDATED, GROUP_CREATED, MAX_DESCRIPTION_LEN, MAX_NAME_LEN,
    SESSIONS_PURGED, SESSION_CREATED, SESSION_DELETED, SESSION_UPDATED, SPLITS_ALLOCATED, SPLIT_MARKED,
    STATS_QUERIED, USER_REGISTERED,
};
use crate::core::errors::DivvyError;
use crate::core::models::{
    Category, Expense, ExpenseType, ExpenseUpdate, ExpenseView, Group, GroupMember, Role, Session,
    SessionExpense, SessionSummary, SplitSpec, SplitType, SplitView, User,
};
use crate::core::money;
use crate::core::split::{self, Participant};
use crate::infrastructure::logging::{AppLog, LoggingService};
use crate::infrastructure::storage::Storage;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct CategoryStat {
    pub category: Category,
    pub total: f64,
    pub count: usize,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct StatsTotal {
    pub total: f64,
    pub count: usize,
}

/// The actor's owed-vs-paid position over the scoped expenses.
#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct Position {
    /// Sum of amounts the actor fronted as payer.
    pub fronted: f64,
    /// Sum of the actor's own split shares.
    pub owed: f64,
}

#[derive(Serialize, Debug, Clone, ToSchema)]
pub struct ExpenseStats {
    pub by_category: Vec<CategoryStat>,
    pub total: StatsTotal,
    pub position: Position,
}

/// Scope filters shared by the expense listing and the stats aggregation.
#[derive(Clone, Debug, Default)]
pub struct StatsFilter {
    pub group_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub category: Option<Category>,
}

pub struct DivvyService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    jwt_service: JwtService,
}

impl<L: LoggingService, S: Storage> DivvyService<L, S> {
    pub fn new(storage: S, logging: L, jwt_secret: String) -> Self {
        DivvyService {
            storage,
            logging,
            jwt_service: JwtService::new(jwt_secret),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, DivvyError> {
        self.jwt_service.validate_token(token)
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), DivvyError> {
        if value.trim().is_empty() {
            return Err(DivvyError::invalid_input(field, format!("{} cannot be empty", field)));
        }
        if value.len() > max_length {
            return Err(DivvyError::invalid_input(
                field,
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(DivvyError::invalid_input(
                field,
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    async fn validate_users(&self, user_ids: &[&str]) -> Result<(), DivvyError> {
        for &user_id in user_ids {
            if self.storage.get_user(user_id).await?.is_none() {
                return Err(DivvyError::UserNotFound(user_id.to_string()));
            }
        }
        Ok(())
    }

    // USER & GROUP GLUE

    pub async fn register_user(&self, name: String, email: String, password: String) -> Result<User, DivvyError> {
        if email.is_empty() {
            return Err(DivvyError::invalid_input("email", "Email is required"));
        }
        if !email.contains('@') || !email.contains('.') || email.len() < 5 {
            return Err(DivvyError::invalid_input("email", "Invalid email format"));
        }
        if password.is_empty() {
            return Err(DivvyError::invalid_input("password", "Password cannot be empty"));
        }
        self.validate_string_input("name", &name, MAX_NAME_LEN)?;

        let hash = bcrypt::hash(&password, bcrypt::DEFAULT_COST)
            .map_err(|e| DivvyError::InternalServerError(format!("Password hashing error: {}", e)))?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password: hash,
        };
        self.storage.save_user(user.clone()).await?;

        self.logging
            .log_action(
                USER_REGISTERED,
                json!({ "user_id": user.id, "name": user.name, "email": user.email }),
                Some(user.id.as_str()),
            )
            .await?;

        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, DivvyError> {
        let user = self
            .storage
            .get_user_by_email(email)
            .await?
            .ok_or(DivvyError::InvalidCredentials)?;

        if bcrypt::verify(password, &user.password)
            .map_err(|e| DivvyError::InternalServerError(format!("Password verification error: {}", e)))?
        {
            self.jwt_service.generate_token(&user.id)
        } else {
            Err(DivvyError::InvalidCredentials)
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, DivvyError> {
        self.storage.get_user(user_id).await
    }

    pub async fn require_user(&self, user_id: &str) -> Result<User, DivvyError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| DivvyError::UserNotFound(user_id.to_string()))
    }

    pub async fn create_group(
        &self,
        name: String,
        member_ids: Vec<String>,
        created_by: &User,
    ) -> Result<Group, DivvyError> {
        self.validate_string_input("name", &name, MAX_NAME_LEN)?;
        self.validate_users(&member_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>())
            .await?;

        let mut members: Vec<GroupMember> = vec![GroupMember {
            user_id: created_by.id.clone(),
            role: Role::Admin,
        }];
        for id in member_ids {
            if id != created_by.id {
                members.push(GroupMember {
                    user_id: id,
                    role: Role::Member,
                });
            }
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            members,
            created_by: created_by.id.clone(),
            created_at: Utc::now(),
        };
        self.storage.save_group(group.clone()).await?;

        self.logging
            .log_action(
                GROUP_CREATED,
                json!({
                    "group_id": group.id,
                    "name": group.name,
                    "member_ids": group.members.iter().map(|m| m.user_id.clone()).collect::<Vec<_>>()
                }),
                Some(created_by.id.as_str()),
            )
            .await?;

        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DivvyError> {
        self.storage.get_group(group_id).await
    }

    // SPLIT ALLOCATION

    /// Resolves raw split input to user identifiers. A participant given only
    /// by display name that cannot be resolved is attributed to the acting
    /// user instead of failing the operation.
    async fn resolve_participants(&self, specs: &[SplitSpec], actor: &User) -> Result<Vec<Participant>, DivvyError> {
        let mut resolved = Vec::with_capacity(specs.len());
        for spec in specs {
            let (user_id, user_name) = if let Some(id) = &spec.user {
                let name = self.storage.get_user(id).await?.map(|u| u.name);
                (id.clone(), name)
            } else if let Some(name) = &spec.name {
                match self.storage.find_user_by_name(name).await? {
                    Some(user) => (user.id, Some(user.name)),
                    None => {
                        warn!(
                            name = %name,
                            actor = %actor.id,
                            "unresolved split participant, attributing share to acting user"
                        );
                        (actor.id.clone(), Some(actor.name.clone()))
                    }
                }
            } else {
                return Err(DivvyError::invalid_input(
                    "splits",
                    "Each split needs a user id or a name",
                ));
            };
            let amount_cents = match spec.amount {
                Some(amount) => Some(money::to_cents("splits", amount)?),
                None => None,
            };
            resolved.push(Participant {
                user_id,
                user_name,
                amount_cents,
                percentage: spec.percentage,
            });
        }
        Ok(resolved)
    }

    pub async fn allocate_splits(
        &self,
        amount: f64,
        split_type: SplitType,
        participants: Vec<SplitSpec>,
        actor: &User,
    ) -> Result<Vec<SplitView>, DivvyError> {
        let amount_cents = money::to_cents("amount", amount)?;
        let resolved = self.resolve_participants(&participants, actor).await?;
        let splits = split::allocate(amount_cents, split_type, &resolved)?;

        self.logging
            .log_action(
                SPLITS_ALLOCATED,
                json!({ "amount_cents": amount_cents, "split_type": split_type, "participants": splits.len() }),
                Some(actor.id.as_str()),
            )
            .await?;

        Ok(splits.into_iter().map(SplitView::from).collect())
    }

    // EXPENSE MANAGEMENT

    #[allow(clippy::too_many_arguments)]
    pub async fn create_expense(
        &self,
        description: String,
        amount: f64,
        category: Option<Category>,
        expense_type: Option<ExpenseType>,
        split_type: Option<SplitType>,
        group_id: Option<String>,
        splits: Option<Vec<SplitSpec>>,
        date: Option<DateTime<Utc>>,
        actor: &User,
    ) -> Result<ExpenseView, DivvyError> {
        self.validate_string_input("description", &description, MAX_DESCRIPTION_LEN)?;
        let amount_cents = money::to_cents("amount", amount)?;
        let split_type = split_type.unwrap_or_default();

        let group = match &group_id {
            Some(gid) => Some(
                self.storage
                    .get_group(gid)
                    .await?
                    .ok_or_else(|| DivvyError::GroupNotFound(gid.clone()))?,
            ),
            None => None,
        };
        if let Some(group) = &group {
            if !group.is_member(&actor.id) {
                return Err(DivvyError::NotGroupMember(actor.id.clone(), group.id.clone()));
            }
        }

        let splits = match splits {
            Some(specs) if !specs.is_empty() => {
                let resolved = self.resolve_participants(&specs, actor).await?;
                split::allocate(amount_cents, split_type, &resolved)?
            }
            _ => Vec::new(),
        };

        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            description,
            amount_cents,
            category: category.unwrap_or_default(),
            expense_type: expense_type.unwrap_or_default(),
            split_type,
            // The payer is always the acting user; callers cannot front
            // money on someone else's behalf through this path.
            paid_by: actor.id.clone(),
            group_id: group.as_ref().map(|g| g.id.clone()),
            group_name: group.map(|g| g.name),
            splits,
            date: date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };
        self.storage.save_expense(expense.clone()).await?;

        self.logging
            .log_action(
                EXPENSE_CREATED,
                json!({
                    "expense_id": expense.id,
                    "amount_cents": expense.amount_cents,
                    "category": expense.category,
                    "group_id": expense.group_id
                }),
                Some(actor.id.as_str()),
            )
            .await?;

        self.present_expense(expense).await
    }

    pub async fn get_expense(&self, expense_id: &str, actor: &User) -> Result<ExpenseView, DivvyError> {
        let expense = self.require_expense(expense_id).await?;
        if !expense.involves(&actor.id) {
            return Err(DivvyError::NotExpenseParticipant(
                actor.id.clone(),
                expense_id.to_string(),
            ));
        }
        self.present_expense(expense).await
    }

    pub async fn list_expenses(&self, actor: &User, filter: &StatsFilter) -> Result<Vec<ExpenseView>, DivvyError> {
        let mut expenses = self.scoped_expenses(actor, filter).await?;
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        let mut views = Vec::with_capacity(expenses.len());
        for expense in expenses {
            views.push(self.present_expense(expense).await?);
        }
        Ok(views)
    }

    pub async fn update_expense(
        &self,
        expense_id: &str,
        update: ExpenseUpdate,
        actor: &User,
    ) -> Result<ExpenseView, DivvyError> {
        let mut expense = self.require_expense(expense_id).await?;
        if !expense.involves(&actor.id) {
            warn!(
                actor = %actor.id,
                expense = %expense_id,
                "update rejected: actor is neither payer nor participant"
            );
            return Err(DivvyError::NotExpenseParticipant(
                actor.id.clone(),
                expense_id.to_string(),
            ));
        }

        if let Some(description) = update.description {
            self.validate_string_input("description", &description, MAX_DESCRIPTION_LEN)?;
            expense.description = description;
        }
        if let Some(amount) = update.amount {
            expense.amount_cents = money::to_cents("amount", amount)?;
        }
        if let Some(category) = update.category {
            expense.category = category;
        }
        if let Some(expense_type) = update.expense_type {
            expense.expense_type = expense_type;
        }
        if let Some(split_type) = update.split_type {
            expense.split_type = split_type;
        }
        if let Some(gid) = update.group_id {
            let group = self
                .storage
                .get_group(&gid)
                .await?
                .ok_or_else(|| DivvyError::GroupNotFound(gid.clone()))?;
            if !group.is_member(&actor.id) {
                return Err(DivvyError::NotGroupMember(actor.id.clone(), group.id));
            }
            expense.group_id = Some(group.id);
            expense.group_name = Some(group.name);
        }
        if let Some(date) = update.date {
            expense.date = date;
        }
        // A new splits array re-runs the allocator against the (possibly
        // just-updated) amount and split type; other field updates do not.
        if let Some(specs) = update.splits {
            let resolved = self.resolve_participants(&specs, actor).await?;
            expense.splits = split::allocate(expense.amount_cents, expense.split_type, &resolved)?;
        }

        expense.updated_at = Utc::now();
        self.storage.save_expense(expense.clone()).await?;

        self.logging
            .log_action(
                EXPENSE_UPDATED,
                json!({ "expense_id": expense.id }),
                Some(actor.id.as_str()),
            )
            .await?;

        self.present_expense(expense).await
    }

    pub async fn delete_expense(&self, expense_id: &str, actor: &User) -> Result<(), DivvyError> {
        let expense = self.require_expense(expense_id).await?;
        if expense.paid_by != actor.id {
            return Err(DivvyError::NotExpensePayer(actor.id.clone(), expense_id.to_string()));
        }
        self.storage.delete_expense(expense_id).await?;

        self.logging
            .log_action(
                EXPENSE_DELETED,
                json!({ "expense_id": expense_id }),
                Some(actor.id.as_str()),
            )
            .await?;
        Ok(())
    }

    /// Flips the settlement flag on one participant's split — the only
    /// mutation the split model allows once an expense is finalized.
    pub async fn mark_split_paid(
        &self,
        expense_id: &str,
        split_user_id: &str,
        paid: bool,
        actor: &User,
    ) -> Result<ExpenseView, DivvyError> {
        let mut expense = self.require_expense(expense_id).await?;
        if !expense.involves(&actor.id) {
            return Err(DivvyError::NotExpenseParticipant(
                actor.id.clone(),
                expense_id.to_string(),
            ));
        }
        let split = expense
            .splits
            .iter_mut()
            .find(|s| s.user_id == split_user_id)
            .ok_or_else(|| DivvyError::invalid_input("user_id", "No split for that user on this expense"))?;
        split.paid = paid;
        expense.updated_at = Utc::now();
        self.storage.save_expense(expense.clone()).await?;

        self.logging
            .log_action(
                SPLIT_MARKED,
                json!({ "expense_id": expense_id, "split_user_id": split_user_id, "paid": paid }),
                Some(actor.id.as_str()),
            )
            .await?;

        self.present_expense(expense).await
    }

    async fn require_expense(&self, expense_id: &str) -> Result<Expense, DivvyError> {
        self.storage
            .get_expense(expense_id)
            .await?
            .ok_or_else(|| DivvyError::ExpenseNotFound(expense_id.to_string()))
    }

    /// Rebuilds the display-oriented fields from identifiers. The stored
    /// denormalized copies are refreshed here; on divergence the identifier
    /// wins.
    async fn present_expense(&self, mut expense: Expense) -> Result<ExpenseView, DivvyError> {
        let paid_by_name = self.storage.get_user(&expense.paid_by).await?.map(|u| u.name);

        let users = futures::future::try_join_all(
            expense.splits.iter().map(|s| self.storage.get_user(&s.user_id)),
        )
        .await?;
        for (split, user) in expense.splits.iter_mut().zip(users) {
            if let Some(user) = user {
                split.user_name = Some(user.name);
            }
        }

        if let Some(gid) = &expense.group_id {
            if let Some(group) = self.storage.get_group(gid).await? {
                expense.group_name = Some(group.name);
            }
        }

        Ok(ExpenseView::new(expense, paid_by_name))
    }

    // BALANCE AGGREGATION

    async fn scoped_expenses(&self, actor: &User, filter: &StatsFilter) -> Result<Vec<Expense>, DivvyError> {
        let mut expenses = self.storage.get_expenses_for_user(&actor.id).await?;
        expenses.retain(|e| {
            filter.group_id.as_deref().is_none_or(|g| e.group_id.as_deref() == Some(g))
                && filter.category.is_none_or(|c| e.category == c)
                && filter.from.is_none_or(|from| e.date >= from)
                && filter.to.is_none_or(|to| e.date <= to)
        });
        Ok(expenses)
    }

    /// Recomputed from stored expenses on every call; nothing here is
    /// persisted or cached.
    pub async fn expense_stats(&self, actor: &User, filter: &StatsFilter) -> Result<ExpenseStats, DivvyError> {
        let expenses = self.scoped_expenses(actor, filter).await?;

        let mut per_category: HashMap<Category, (i64, usize)> = HashMap::new();
        let mut total_cents = 0i64;
        let mut fronted_cents = 0i64;
        let mut owed_cents = 0i64;
        for expense in &expenses {
            let entry = per_category.entry(expense.category).or_insert((0, 0));
            entry.0 += expense.amount_cents;
            entry.1 += 1;
            total_cents += expense.amount_cents;
            if expense.paid_by == actor.id {
                fronted_cents += expense.amount_cents;
            }
            owed_cents += expense
                .splits
                .iter()
                .filter(|s| s.user_id == actor.id)
                .map(|s| s.amount_cents)
                .sum::<i64>();
        }

        let mut totals: Vec<(Category, i64, usize)> = per_category
            .into_iter()
            .map(|(category, (cents, count))| (category, cents, count))
            .collect();
        // Descending by total; ties broken by category name so the output is
        // a pure function of the stored state.
        totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));

        self.logging
            .log_action(
                STATS_QUERIED,
                json!({ "user_id": actor.id, "group_id": filter.group_id }),
                Some(actor.id.as_str()),
            )
            .await?;

        Ok(ExpenseStats {
            by_category: totals
                .into_iter()
                .map(|(category, cents, count)| CategoryStat {
                    category,
                    total: money::to_major(cents),
                    count,
                })
                .collect(),
            total: StatsTotal {
                total: money::to_major(total_cents),
                count: expenses.len(),
            },
            position: Position {
                fronted: money::to_major(fronted_cents),
                owed: money::to_major(owed_cents),
            },
        })
    }

    // SESSION LIFECYCLE

    pub async fn create_session(
        &self,
        id: String,
        group_name: String,
        participants: Vec<String>,
        duration_days: i64,
    ) -> Result<Session, DivvyError> {
        self.validate_string_input("id", &id, MAX_NAME_LEN)?;
        self.validate_string_input("group_name", &group_name, MAX_NAME_LEN)?;
        if participants.is_empty() {
            return Err(DivvyError::invalid_input(
                "participants",
                "At least one participant is required",
            ));
        }
        for participant in &participants {
            self.validate_string_input("participants", participant, MAX_NAME_LEN)?;
        }
        if duration_days <= 0 {
            return Err(DivvyError::invalid_input(
                "duration_days",
                "Duration must be a positive number of days",
            ));
        }

        // Participants form an ordered set; keep first occurrences.
        let mut seen = std::collections::HashSet::new();
        let participants: Vec<String> = participants.into_iter().filter(|p| seen.insert(p.clone())).collect();

        let now = Utc::now();
        let session = Session {
            id,
            group_name,
            participants,
            expenses: Vec::new(),
            settled_payments: Vec::new(),
            created_at: now,
            last_modified: now,
            expires_at: now + Duration::days(duration_days),
            duration_days,
        };
        self.storage.insert_session(session.clone()).await?;

        self.logging
            .log_action(
                SESSION_CREATED,
                json!({ "session_id": session.id, "expires_at": session.expires_at }),
                None,
            )
            .await?;

        Ok(session)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session, DivvyError> {
        let session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| DivvyError::SessionNotFound(session_id.to_string()))?;
        if session.is_expired(Utc::now()) {
            // The expiry check is part of every read; drop the stale record
            // without waiting for the reaper.
            self.storage.delete_session(session_id).await?;
            debug!(session = %session_id, "expired session purged on read");
            return Err(DivvyError::SessionNotFound(session_id.to_string()));
        }
        Ok(session)
    }

    pub async fn update_session(
        &self,
        session_id: &str,
        expenses: Option<Vec<SessionExpense>>,
        settled_payments: Option<Vec<String>>,
    ) -> Result<Session, DivvyError> {
        let mut session = self
            .storage
            .get_session(session_id)
            .await?
            .ok_or_else(|| DivvyError::SessionNotFound(session_id.to_string()))?;
        if session.is_expired(Utc::now()) {
            self.storage.delete_session(session_id).await?;
            debug!(session = %session_id, "expired session purged on write");
            return Err(DivvyError::SessionGone(session_id.to_string()));
        }

        // Replace-by-field, not merge-by-element; whichever fields the
        // caller supplies overwrite the stored collection wholesale.
        if let Some(expenses) = expenses {
            session.expenses = expenses;
        }
        if let Some(payments) = settled_payments {
            session.settled_payments = payments;
        }
        session.last_modified = Utc::now();
        // expires_at is deliberately untouched; session lifetime is fixed at
        // creation.
        self.storage.save_session(session.clone()).await?;

        self.logging
            .log_action(SESSION_UPDATED, json!({ "session_id": session_id }), None)
            .await?;

        Ok(session)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), DivvyError> {
        if !self.storage.delete_session(session_id).await? {
            return Err(DivvyError::SessionNotFound(session_id.to_string()));
        }
        self.logging
            .log_action(SESSION_DELETED, json!({ "session_id": session_id }), None)
            .await?;
        Ok(())
    }

    /// Diagnostic listing of live sessions. Skips expired entries without
    /// purging them; eager deletion stays with the accessors and the reaper.
    pub async fn list_sessions(&self) -> Result<Vec<SessionSummary>, DivvyError> {
        let now = Utc::now();
        let mut sessions = self.storage.list_sessions().await?;
        sessions.retain(|s| !s.is_expired(now));
        sessions.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions.iter().map(Session::summary).collect())
    }

    /// Reaper sweep, called on an interval by the binary.
    pub async fn purge_expired_sessions(&self) -> Result<usize, DivvyError> {
        let removed = self.storage.purge_expired_sessions(Utc::now()).await?;
        if removed > 0 {
            debug!(removed, "session sweep removed expired records");
            self.logging
                .log_action(SESSIONS_PURGED, json!({ "removed": removed }), None)
                .await?;
        }
        Ok(removed)
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, DivvyError> {
        self.logging.get_logs().await
    }
}
