//! Account endpoint integration tests

use std::collections::HashSet;

use axum::http::StatusCode;
use chrono::Duration;
use rust_decimal_macros::dec;
use serde_json::json;

use accounts_api::domain::Principal;

mod common;

use common::{admin, new_tx, now, user1, user2, JANE_DOE, JOHN_SAVINGS, JOHN_SMITH};

#[tokio::test]
async fn test_accounts_list_as_staff() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(&app, "/api/accounts/", Some(admin())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        common::result_ids(&[body.clone()]),
        vec![JOHN_SAVINGS, JOHN_SMITH, JANE_DOE]
    );
    assert!(body["next"].is_null());
    assert!(body["previous"].is_null());
}

#[tokio::test]
async fn test_accounts_list_is_scoped_to_owner() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(&app, "/api/accounts/", Some(user1())).await;
    assert_eq!(status, StatusCode::OK);
    for account in body["results"].as_array().unwrap() {
        assert_eq!(account["user"], common::USER1);
    }
    assert_eq!(common::result_ids(&[body]), vec![JOHN_SAVINGS, JOHN_SMITH]);

    let (status, body) = common::get(&app, "/api/accounts", Some(user2())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::result_ids(&[body]), vec![JANE_DOE]);
}

#[tokio::test]
async fn test_retrieve_account() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(&app, "/api/accounts/1/", Some(admin())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": 1,
            "user": 2,
            "name": "John Smith",
            "transaction_count_last_thirty_days": 119,
            "balance_change_last_thirty_days": "-1304.67",
        })
    );
}

#[tokio::test]
async fn test_retrieve_account_with_transactions_added_during_test() {
    let store = common::seeded_store().await;
    let app = common::app(store.clone());

    store
        .add_transaction(new_tx(
            JOHN_SMITH,
            now() - Duration::days(10),
            dec!(200.00),
            "Test transaction",
            "PURCHASE",
        ))
        .await
        .unwrap();

    let (status, body) = common::get(&app, "/api/accounts/1/", Some(admin())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction_count_last_thirty_days"], 120);
    assert_eq!(body["balance_change_last_thirty_days"], "-1104.67");

    store
        .add_transaction(new_tx(
            JOHN_SMITH,
            now() - Duration::days(40),
            dec!(100.00),
            "Old transaction",
            "SALE",
        ))
        .await
        .unwrap();

    let (status, body) = common::get(&app, "/api/accounts/1/", Some(admin())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction_count_last_thirty_days"], 120);
    assert_eq!(body["balance_change_last_thirty_days"], "-1104.67");
}

#[tokio::test]
async fn test_list_rows_carry_same_aggregates_as_retrieve() {
    let app = common::app(common::seeded_store().await);

    let (_, list) = common::get(&app, "/api/accounts/", Some(user1())).await;
    let (_, detail) = common::get(&app, "/api/accounts/1/", Some(user1())).await;

    let row = list["results"]
        .as_array()
        .unwrap()
        .iter()
        .find(|row| row["id"] == JOHN_SMITH)
        .cloned()
        .unwrap();
    assert_eq!(row, detail);
}

#[tokio::test]
async fn test_owner_can_retrieve_own_account() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(&app, "/api/accounts/3/", Some(user2())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jane Doe");
    assert_eq!(body["transaction_count_last_thirty_days"], 12);
    assert_eq!(body["balance_change_last_thirty_days"], "120.00");
}

#[tokio::test]
async fn test_retrieve_other_users_account_is_forbidden() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(&app, "/api/accounts/1/", Some(user2())).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error_code"], "permission_denied");
}

#[tokio::test]
async fn test_retrieve_missing_account_is_not_found() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(&app, "/api/accounts/999/", Some(user1())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "account_not_found");

    let (status, _) = common::get(&app, "/api/accounts/abc/", Some(user1())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_account_without_recent_transactions_reports_zero() {
    let store = common::seeded_store().await;
    let empty = store.add_account(common::USER2, "Empty").await;
    let app = common::app(store);

    let (status, body) = common::get(
        &app,
        &format!("/api/accounts/{}/", empty.id),
        Some(user2()),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction_count_last_thirty_days"], 0);
    assert_eq!(body["balance_change_last_thirty_days"], "0.00");
}

#[tokio::test]
async fn test_accounts_without_principal_are_rejected() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(&app, "/api/accounts/", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error_code"], "missing_principal");
}

#[tokio::test]
async fn test_account_pages_break_ties_by_id() {
    let store = common::seeded_store().await;
    let owner = Principal::user(42);
    let mut created = Vec::new();
    for k in 0..15 {
        created.push(store.add_account(owner.id, format!("Idle {}", k)).await.id);
    }
    let app = common::app(store);

    let pages = common::walk(&app, "/api/accounts/", None, owner, "next").await;

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["results"].as_array().unwrap().len(), 10);
    assert!(pages[0]["previous"].is_null());
    assert!(pages[1]["previous"].is_string());

    let ids = common::result_ids(&pages);
    created.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, created);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 15);
}

#[tokio::test]
async fn test_tampered_account_cursor_is_rejected() {
    let app = common::app(common::seeded_store().await);

    let (status, body) = common::get(
        &app,
        "/api/accounts/?cursor=eyJwIjp7InQiOjAsImkiOjF9fQ.00",
        Some(admin()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "invalid_cursor");
}

#[tokio::test]
async fn test_health_needs_no_principal() {
    let app = common::app(common::seeded_store().await);

    let (status, _) = common::get(&app, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
}
