use chrono::{Duration, Utc};
use std::collections::HashMap;

use crate::core::errors::DivvyError;
use crate::core::models::{Category, ExpenseType, Session, SessionExpense};
use crate::infrastructure::storage::{Storage, in_memory::InMemoryStorage};
use crate::tests::{create_test_service, create_test_service_with};

fn snapshot(id: &str, description: &str, amount: f64, paid_by: &str) -> SessionExpense {
    SessionExpense {
        id: id.to_string(),
        description: description.to_string(),
        amount,
        category: Category::default(),
        expense_type: ExpenseType::Shared,
        paid_by: paid_by.to_string(),
        date: Utc::now(),
        splits: HashMap::from([("Alice".to_string(), amount / 2.0), ("Bob".to_string(), amount / 2.0)]),
        is_settlement: false,
    }
}

fn stale_session(id: &str) -> Session {
    let created = Utc::now() - Duration::days(10);
    Session {
        id: id.to_string(),
        group_name: "Old trip".to_string(),
        participants: vec!["Alice".to_string(), "Bob".to_string()],
        expenses: Vec::new(),
        settled_payments: Vec::new(),
        created_at: created,
        last_modified: created,
        expires_at: created + Duration::days(7),
        duration_days: 7,
    }
}

#[tokio::test]
async fn test_create_and_get_session() {
    let service = create_test_service();
    let session = service
        .create_session(
            "s1".to_string(),
            "Trip".to_string(),
            vec!["Alice".to_string(), "Bob".to_string()],
            7,
        )
        .await
        .unwrap();

    assert_eq!(session.expires_at, session.created_at + Duration::days(7));
    assert_eq!(session.duration_days, 7);

    let fetched = service.get_session("s1").await.unwrap();
    assert_eq!(fetched.group_name, "Trip");
    assert_eq!(fetched.participants, vec!["Alice", "Bob"]);
    assert!(fetched.expenses.is_empty());

    let summaries = service.list_sessions().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, "s1");
}

#[tokio::test]
async fn test_duplicate_session_id_is_rejected() {
    let service = create_test_service();
    service
        .create_session("s1".to_string(), "Trip".to_string(), vec!["Alice".to_string()], 7)
        .await
        .unwrap();

    let result = service
        .create_session("s1".to_string(), "Other".to_string(), vec!["Eve".to_string()], 3)
        .await;
    assert!(matches!(result, Err(DivvyError::DuplicateSession(_))));

    // The first session is untouched.
    let session = service.get_session("s1").await.unwrap();
    assert_eq!(session.group_name, "Trip");
    assert_eq!(session.participants, vec!["Alice"]);
}

#[tokio::test]
async fn test_session_create_validates_input() {
    let service = create_test_service();

    let result = service
        .create_session("s1".to_string(), "Trip".to_string(), Vec::new(), 7)
        .await;
    assert!(matches!(result, Err(DivvyError::InvalidInput(_, _))));

    let result = service
        .create_session("s1".to_string(), "Trip".to_string(), vec!["Alice".to_string()], 0)
        .await;
    assert!(matches!(result, Err(DivvyError::InvalidInput(_, _))));
}

#[tokio::test]
async fn test_expired_session_reads_as_not_found_and_is_purged() {
    let storage = InMemoryStorage::new();
    storage.insert_session(stale_session("stale")).await.unwrap();
    let service = create_test_service_with(storage);

    let result = service.get_session("stale").await;
    assert!(matches!(result, Err(DivvyError::SessionNotFound(_))));

    // The read purged the record even though no reaper ran: the id is free
    // again and the session is absent from the listing.
    assert!(service.list_sessions().await.unwrap().is_empty());
    service
        .create_session("stale".to_string(), "Fresh".to_string(), vec!["Carol".to_string()], 1)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_expired_session_update_reports_gone() {
    let storage = InMemoryStorage::new();
    storage.insert_session(stale_session("stale")).await.unwrap();
    let service = create_test_service_with(storage);

    let result = service
        .update_session("stale", Some(vec![snapshot("e1", "Dinner", 40.0, "Alice")]), None)
        .await;
    assert!(matches!(result, Err(DivvyError::SessionGone(_))));

    // Purged by the failed write.
    let result = service.get_session("stale").await;
    assert!(matches!(result, Err(DivvyError::SessionNotFound(_))));
}

#[tokio::test]
async fn test_update_replaces_fields_wholesale() {
    let service = create_test_service();
    let created = service
        .create_session(
            "s1".to_string(),
            "Trip".to_string(),
            vec!["Alice".to_string(), "Bob".to_string()],
            7,
        )
        .await
        .unwrap();

    let session = service
        .update_session(
            "s1",
            Some(vec![
                snapshot("e1", "Dinner", 40.0, "Alice"),
                snapshot("e2", "Taxi", 20.0, "Bob"),
            ]),
            None,
        )
        .await
        .unwrap();
    assert_eq!(session.expenses.len(), 2);

    // Supplying only settled_payments leaves expenses alone.
    let session = service
        .update_session("s1", None, Some(vec!["Bob->Alice:10".to_string()]))
        .await
        .unwrap();
    assert_eq!(session.expenses.len(), 2);
    assert_eq!(session.settled_payments, vec!["Bob->Alice:10"]);

    // A new expenses array replaces the old one wholesale.
    let session = service
        .update_session("s1", Some(vec![snapshot("e3", "Brunch", 30.0, "Alice")]), None)
        .await
        .unwrap();
    assert_eq!(session.expenses.len(), 1);
    assert_eq!(session.expenses[0].id, "e3");

    // Lifetime is fixed at creation; updates never extend it.
    assert_eq!(session.expires_at, created.expires_at);
    assert!(session.last_modified >= created.last_modified);
}

#[tokio::test]
async fn test_delete_session_is_unconditional_and_reports_absence() {
    let service = create_test_service();
    service
        .create_session("s1".to_string(), "Trip".to_string(), vec!["Alice".to_string()], 7)
        .await
        .unwrap();

    service.delete_session("s1").await.unwrap();
    let result = service.delete_session("s1").await;
    assert!(matches!(result, Err(DivvyError::SessionNotFound(_))));
}

#[tokio::test]
async fn test_list_skips_expired_sessions_without_purging() {
    let storage = InMemoryStorage::new();
    storage.insert_session(stale_session("stale")).await.unwrap();
    let service = create_test_service_with(storage);
    service
        .create_session("live".to_string(), "Trip".to_string(), vec!["Alice".to_string()], 7)
        .await
        .unwrap();

    let summaries = service.list_sessions().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, "live");

    // The stale record is still on disk after the listing: the next write
    // against it reports Gone rather than a plain not-found.
    let result = service.update_session("stale", None, None).await;
    assert!(matches!(result, Err(DivvyError::SessionGone(_))));
}

#[tokio::test]
async fn test_reaper_sweep_removes_expired_records() {
    let storage = InMemoryStorage::new();
    storage.insert_session(stale_session("old1")).await.unwrap();
    storage.insert_session(stale_session("old2")).await.unwrap();
    let service = create_test_service_with(storage);
    service
        .create_session("live".to_string(), "Trip".to_string(), vec!["Alice".to_string()], 7)
        .await
        .unwrap();

    let removed = service.purge_expired_sessions().await.unwrap();
    assert_eq!(removed, 2);
    assert_eq!(service.purge_expired_sessions().await.unwrap(), 0);
    assert!(service.get_session("live").await.is_ok());
}

#[tokio::test]
async fn test_duplicate_participants_collapse_preserving_order() {
    let service = create_test_service();
    let session = service
        .create_session(
            "s1".to_string(),
            "Trip".to_string(),
            vec!["Alice".to_string(), "Bob".to_string(), "Alice".to_string()],
            7,
        )
        .await
        .unwrap();
    assert_eq!(session.participants, vec!["Alice", "Bob"]);
}
