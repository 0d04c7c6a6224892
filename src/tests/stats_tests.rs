use chrono::{Duration, Utc};

use crate::core::models::{Category, SplitSpec, User};
use crate::core::services::{DivvyService, StatsFilter};
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use crate::tests::create_test_service;

async fn register(
    service: &DivvyService<InMemoryLogging, InMemoryStorage>,
    name: &str,
    email: &str,
) -> User {
    service
        .register_user(name.to_string(), email.to_string(), "password".to_string())
        .await
        .unwrap()
}

async fn spend(
    service: &DivvyService<InMemoryLogging, InMemoryStorage>,
    actor: &User,
    description: &str,
    amount: f64,
    category: Category,
) {
    service
        .create_expense(
            description.to_string(),
            amount,
            Some(category),
            None,
            None,
            None,
            None,
            None,
            actor,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_stats_group_by_category_descending() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    spend(&service, &alice, "Pizza", 30.0, Category::Food).await;
    spend(&service, &alice, "Sushi", 20.0, Category::Food).await;
    spend(&service, &alice, "Flight", 80.0, Category::Travel).await;
    spend(&service, &alice, "Misc", 10.0, Category::Other).await;

    let stats = service.expense_stats(&alice, &StatsFilter::default()).await.unwrap();

    let categories: Vec<Category> = stats.by_category.iter().map(|c| c.category).collect();
    assert_eq!(categories, vec![Category::Travel, Category::Food, Category::Other]);
    assert_eq!(stats.by_category[0].total, 80.0);
    assert_eq!(stats.by_category[1].total, 50.0);
    assert_eq!(stats.by_category[1].count, 2);
    assert_eq!(stats.total.total, 140.0);
    assert_eq!(stats.total.count, 4);
    assert_eq!(stats.position.fronted, 140.0);
}

#[tokio::test]
async fn test_stats_filters_by_category_and_date() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    spend(&service, &alice, "Pizza", 30.0, Category::Food).await;
    spend(&service, &alice, "Bus", 5.0, Category::Transport).await;

    let filter = StatsFilter {
        category: Some(Category::Food),
        ..Default::default()
    };
    let stats = service.expense_stats(&alice, &filter).await.unwrap();
    assert_eq!(stats.total.total, 30.0);
    assert_eq!(stats.total.count, 1);

    // A date window entirely in the future matches nothing.
    let filter = StatsFilter {
        from: Some(Utc::now() + Duration::days(1)),
        ..Default::default()
    };
    let stats = service.expense_stats(&alice, &filter).await.unwrap();
    assert_eq!(stats.total.count, 0);
    assert!(stats.by_category.is_empty());
}

#[tokio::test]
async fn test_stats_filter_by_group() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let group = service
        .create_group("Trip".to_string(), Vec::new(), &alice)
        .await
        .unwrap();

    service
        .create_expense(
            "Hotel".to_string(),
            200.0,
            Some(Category::Travel),
            None,
            None,
            Some(group.id.clone()),
            None,
            None,
            &alice,
        )
        .await
        .unwrap();
    spend(&service, &alice, "Coffee", 4.0, Category::Food).await;

    let filter = StatsFilter {
        group_id: Some(group.id.clone()),
        ..Default::default()
    };
    let stats = service.expense_stats(&alice, &filter).await.unwrap();
    assert_eq!(stats.total.total, 200.0);
    assert_eq!(stats.total.count, 1);
}

#[tokio::test]
async fn test_stats_include_expenses_where_actor_holds_a_split() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;
    let bob = register(&service, "Bob", "bob@example.com").await;

    let splits = vec![
        SplitSpec {
            user: Some(alice.id.clone()),
            name: None,
            amount: None,
            percentage: None,
        },
        SplitSpec {
            user: Some(bob.id.clone()),
            name: None,
            amount: None,
            percentage: None,
        },
    ];
    service
        .create_expense(
            "Dinner".to_string(),
            100.0,
            Some(Category::Food),
            None,
            None,
            None,
            Some(splits),
            None,
            &alice,
        )
        .await
        .unwrap();

    // Bob paid nothing but owes his share of Alice's expense.
    let stats = service.expense_stats(&bob, &StatsFilter::default()).await.unwrap();
    assert_eq!(stats.total.total, 100.0);
    assert_eq!(stats.position.fronted, 0.0);
    assert_eq!(stats.position.owed, 50.0);
}

#[tokio::test]
async fn test_stats_are_deterministic_over_fixed_state() {
    let service = create_test_service();
    let alice = register(&service, "Alice", "alice@example.com").await;

    spend(&service, &alice, "Pizza", 30.0, Category::Food).await;
    spend(&service, &alice, "Flight", 80.0, Category::Travel).await;
    spend(&service, &alice, "Meds", 30.0, Category::Health).await;

    let first = service.expense_stats(&alice, &StatsFilter::default()).await.unwrap();
    for _ in 0..5 {
        let again = service.expense_stats(&alice, &StatsFilter::default()).await.unwrap();
        assert_eq!(
            serde_json::to_value(&again).unwrap(),
            serde_json::to_value(&first).unwrap()
        );
    }
}
