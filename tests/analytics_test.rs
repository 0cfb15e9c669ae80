//! Tests for the spending rollup and monthly summary endpoints.

mod common;

use axum::http::StatusCode;
use common::TestClient;

#[tokio::test]
async fn test_spending_rolls_up_to_top_level_ancestor() {
    let client = TestClient::new();
    client.register_and_login("alice").await;

    // Food > Groceries > Produce, plus a flat Travel category
    let food = client.create_category("Food", None).await;
    let groceries = client.create_category("Groceries", Some(food)).await;
    let produce = client.create_category("Produce", Some(groceries)).await;
    let travel = client.create_category("Travel", None).await;

    client.create_expense(produce, 3000, "2024-05-05").await;
    client.create_expense(groceries, 2000, "2024-05-10").await;
    client.create_expense(food, 1000, "2024-05-15").await;
    client.create_expense(travel, 4000, "2024-05-20").await;

    let (status, report) = client
        .get_json("/api/analytics/spending-by-category?year=2024&month=5")
        .await;
    assert_eq!(status, StatusCode::OK);
    let report = report.as_array().unwrap();

    // Everything under Food collapses into Food
    assert_eq!(report.len(), 2);
    assert_eq!(report[0]["category"], "Food");
    assert_eq!(report[0]["amount_cents"], 6000);
    assert_eq!(report[0]["percentage"], 60.0);
    assert_eq!(report[1]["category"], "Travel");
    assert_eq!(report[1]["amount_cents"], 4000);
}

#[tokio::test]
async fn test_spending_drilldown_by_parent() {
    let client = TestClient::new();
    client.register_and_login("alice").await;

    let food = client.create_category("Food", None).await;
    let groceries = client.create_category("Groceries", Some(food)).await;
    let produce = client.create_category("Produce", Some(groceries)).await;
    let dining = client.create_category("Dining", Some(food)).await;
    let travel = client.create_category("Travel", None).await;

    client.create_expense(produce, 3000, "2024-05-05").await;
    client.create_expense(dining, 2000, "2024-05-10").await;
    client.create_expense(food, 1000, "2024-05-15").await;
    client.create_expense(travel, 9999, "2024-05-20").await;

    let (status, report) = client
        .get_json(&format!(
            "/api/analytics/spending-by-category?year=2024&month=5&parent_id={}",
            food
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let report = report.as_array().unwrap();

    // Travel is outside the subtree; Produce rolls into Groceries; spending
    // on Food itself stays on Food
    assert_eq!(report.len(), 3);
    assert_eq!(report[0]["category"], "Groceries");
    assert_eq!(report[0]["amount_cents"], 3000);
    assert_eq!(report[1]["category"], "Dining");
    assert_eq!(report[1]["amount_cents"], 2000);
    assert_eq!(report[2]["category"], "Food");
    assert_eq!(report[2]["amount_cents"], 1000);
}

#[tokio::test]
async fn test_spending_unknown_parent_is_not_found() {
    let client = TestClient::new();
    client.register_and_login("alice").await;

    let (status, _) = client
        .get("/api/analytics/spending-by-category?year=2024&month=5&parent_id=9999")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_spending_only_counts_requested_month() {
    let client = TestClient::new();
    client.register_and_login("alice").await;

    let food = client.create_category("Food", None).await;
    client.create_expense(food, 1000, "2024-04-30").await;
    client.create_expense(food, 2000, "2024-05-01").await;
    client.create_expense(food, 3000, "2024-05-31").await;
    client.create_expense(food, 4000, "2024-06-01").await;

    let (_, report) = client
        .get_json("/api/analytics/spending-by-category?year=2024&month=5")
        .await;
    let report = report.as_array().unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report[0]["amount_cents"], 5000);
}

#[tokio::test]
async fn test_monthly_summary() {
    let client = TestClient::new();
    client.register_and_login("alice").await;

    let food = client.create_category("Food", None).await;
    client.create_expense(food, 1000, "2024-04-10").await;
    client.create_expense(food, 3000, "2024-04-20").await;
    client.create_expense(food, 5000, "2024-05-10").await;

    let (status, summary) = client
        .get_json("/api/analytics/monthly-summary?from_date=2024-01-01&to_date=2024-12-31")
        .await;
    assert_eq!(status, StatusCode::OK);
    let summary = summary.as_array().unwrap();

    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0]["month"], "2024-04");
    assert_eq!(summary[0]["total_cents"], 4000);
    assert_eq!(summary[0]["expense_count"], 2);
    assert_eq!(summary[0]["average_cents"], 2000);
    assert_eq!(summary[1]["month"], "2024-05");
    assert_eq!(summary[1]["total_cents"], 5000);
}
