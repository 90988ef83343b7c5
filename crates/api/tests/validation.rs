//! Requests rejected before any database access.

mod common;

use axum::http::StatusCode;
use cartshift_core::migration::CONNECTIVITY_CHECKLIST;
use common::{body_json, post_json};
use serde_json::json;

// ---------------------------------------------------------------------------
// Test: trigger validation
// ---------------------------------------------------------------------------

/// Deselecting every entity type is rejected with the operator message.
#[tokio::test]
async fn trigger_without_entities_is_rejected() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/migrations",
        json!({
            "connection_id": 1,
            "import_categories": false,
            "import_products": false,
            "import_customers": false,
            "import_suppliers": false
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "Please select at least one data type to import");
}

#[tokio::test]
async fn trigger_with_zero_batch_size_is_rejected() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/migrations",
        json!({ "connection_id": 1, "batch_size": 0 }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Batch size must be between 1 and 1000");
}

// ---------------------------------------------------------------------------
// Test: connection validation
// ---------------------------------------------------------------------------

/// A host made only of whitespace counts as missing.
#[tokio::test]
async fn connection_with_blank_host_is_rejected() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/connections",
        json!({
            "name": "Shop",
            "host": "   ",
            "database_name": "cscart",
            "username": "reader"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Host is required");
}

#[tokio::test]
async fn connection_with_bad_port_is_rejected() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/connections",
        json!({
            "name": "Shop",
            "host": "db.local",
            "port": 0,
            "database_name": "cscart",
            "username": "reader"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Only `auto` and known schema revisions are accepted.
#[tokio::test]
async fn connection_with_unknown_schema_version_is_rejected() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/connections",
        json!({
            "name": "Shop",
            "host": "db.local",
            "database_name": "cscart",
            "username": "reader",
            "schema_version": "3.0"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid schema version '3.0'"));
}

// ---------------------------------------------------------------------------
// Test: ad-hoc connection test
// ---------------------------------------------------------------------------

/// A refused connect is a negative report, not an HTTP error.
#[tokio::test]
async fn ad_hoc_test_reports_unreachable_source() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/connections/test",
        json!({
            "host": "127.0.0.1",
            "port": 1,
            "database_name": "cscart",
            "username": "reader"
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["success"], false);
    assert_eq!(json["data"]["table_count"], 0);
    let message = json["data"]["message"].as_str().unwrap();
    assert!(message.starts_with("Connection failed:"));
    assert!(message.ends_with(CONNECTIVITY_CHECKLIST));
}

#[tokio::test]
async fn ad_hoc_test_requires_host() {
    let app = common::build_test_app(common::unreachable_pool());
    let response = post_json(
        app,
        "/api/v1/connections/test",
        json!({ "host": "", "database_name": "cscart", "username": "reader" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Host is required");
}
