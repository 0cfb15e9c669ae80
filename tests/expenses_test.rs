//! Tests for expense CRUD, installment expansion, and list filtering.

mod common;

use axum::http::StatusCode;
use common::TestClient;

#[tokio::test]
async fn test_create_and_fetch_expense() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let food = client.create_category("Food", None).await;

    let (status, body) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "amount_cents": 1250,
                "date": "2024-05-10",
                "category_id": food,
                "note": "Lunch",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let expense: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(expense["amount_cents"], 1250);
    assert_eq!(expense["note"], "Lunch");
    assert_eq!(expense["currency"], "USD");
    assert_eq!(expense["is_installment"], false);

    let id = expense["id"].as_i64().unwrap();
    let (status, fetched) = client.get_json(&format!("/api/expenses/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["date"], "2024-05-10");
}

#[tokio::test]
async fn test_expense_validation() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let food = client.create_category("Food", None).await;

    // Non-positive amount
    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({ "amount_cents": 0, "date": "2024-05-10", "category_id": food }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Malformed date
    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({ "amount_cents": 100, "date": "05/10/2024", "category_id": food }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown category
    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({ "amount_cents": 100, "date": "2024-05-10", "category_id": 9999 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Note over 100 characters
    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "amount_cents": 100,
                "date": "2024-05-10",
                "category_id": food,
                "note": "x".repeat(101),
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_installment_total_stored_as_given() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let tech = client.create_category("Tech", None).await;

    let (status, body) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "amount_cents": 120_000,
                "date": "2024-05-10",
                "category_id": tech,
                "is_installment": true,
                "installment_count": 12,
                "amount_mode": "total",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let expense: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(expense["amount_cents"], 120_000);
    assert_eq!(expense["installment_count"], 12);
}

#[tokio::test]
async fn test_per_installment_amount_expanded_at_creation() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let tech = client.create_category("Tech", None).await;

    let (status, body) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "amount_cents": 10_000,
                "date": "2024-05-10",
                "category_id": tech,
                "is_installment": true,
                "installment_count": 12,
                "amount_mode": "per_installment",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let expense: serde_json::Value = serde_json::from_str(&body).unwrap();
    // 10000 x 12: stored as the final total
    assert_eq!(expense["amount_cents"], 120_000);
    assert_eq!(expense["amount_mode"], "per_installment");
}

#[tokio::test]
async fn test_installment_rules_enforced() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let tech = client.create_category("Tech", None).await;

    // Installment without a count
    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "amount_cents": 100,
                "date": "2024-05-10",
                "category_id": tech,
                "is_installment": true,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Count of 1 is not an installment purchase
    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "amount_cents": 100,
                "date": "2024-05-10",
                "category_id": tech,
                "is_installment": true,
                "installment_count": 1,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Per-installment mode only makes sense for installment purchases
    let (status, _) = client
        .post_json(
            "/api/expenses",
            serde_json::json!({
                "amount_cents": 100,
                "date": "2024-05-10",
                "category_id": tech,
                "amount_mode": "per_installment",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_expense() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let food = client.create_category("Food", None).await;
    let id = client.create_expense(food, 500, "2024-05-10").await;

    let (status, body) = client
        .put_json(
            &format!("/api/expenses/{}", id),
            serde_json::json!({
                "amount_cents": 750,
                "date": "2024-05-11",
                "category_id": food,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let updated: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(updated["amount_cents"], 750);

    let (status, _) = client.delete(&format!("/api/expenses/{}", id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = client.get(&format!("/api/expenses/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_filters() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let food = client.create_category("Food", None).await;
    let travel = client.create_category("Travel", None).await;

    client.create_expense(food, 100, "2024-04-15").await;
    client.create_expense(food, 200, "2024-05-15").await;
    client.create_expense(travel, 300, "2024-05-20").await;

    let (_, list) = client
        .get_json("/api/expenses?from_date=2024-05-01&to_date=2024-05-31")
        .await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (_, list) = client
        .get_json(&format!("/api/expenses?category_id={}", food))
        .await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let (_, list) = client.get_json("/api/expenses?limit=1").await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_expenses_are_scoped_per_user() {
    let client = TestClient::new();
    client.register_and_login("alice").await;
    let food = client.create_category("Food", None).await;
    let id = client.create_expense(food, 500, "2024-05-10").await;

    client.clear_session();
    client.register_and_login("bob").await;

    let (status, _) = client.get(&format!("/api/expenses/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = client.delete(&format!("/api/expenses/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
