mod support;

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use drinks_service::drink::{Drink, Recipe};
use drinks_service::store::{DrinkChanges, MenuStore, StoreError, StoreResult};
use serde_json::json;
use support::*;

fn mocha() -> serde_json::Value {
    json!({
        "title": "Mocha",
        "recipe": [
            {"name": "espresso", "color": "brown", "parts": 1},
            {"name": "chocolate", "color": "dark", "parts": 2}
        ]
    })
}

#[tokio::test]
async fn public_listing_hides_proportions() {
    let app = seeded_app().await;
    let res = send(&app, Method::GET, "/drinks", None, None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body,
        json!({
            "success": true,
            "drinks": [{"id": 1, "title": "water", "recipe": [{"name": "water", "color": "blue"}]}]
        })
    );
}

#[tokio::test]
async fn detail_listing_requires_a_token() {
    let app = seeded_app().await;
    let res = send(&app, Method::GET, "/drinks-detail", None, None).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code.as_deref(), Some("authorization_header_missing"));
    assert_eq!(
        res.body,
        json!({
            "success": false,
            "error": 401,
            "message": "Authorization header is expected.",
            "code": "authorization_header_missing"
        })
    );
}

#[tokio::test]
async fn detail_listing_returns_long_views() {
    let app = seeded_app().await;
    let res = send(&app, Method::GET, "/drinks-detail", Some(&token(BARISTA)), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["drinks"][0]["recipe"][0]["parts"], 1);
}

#[tokio::test]
async fn malformed_authorization_headers_are_rejected() {
    let app = seeded_app().await;
    let token = token(BARISTA);
    let cases = [
        (format!("Basic {token}"), "Authorization header must start with \"Bearer\"."),
        ("Bearer".to_string(), "Token not found."),
        (format!("Bearer {token} extra"), "Authorization header must be bearer token."),
    ];

    for (value, message) in cases {
        let request = Request::builder()
            .uri("/drinks-detail")
            .header(header::AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap();
        let res = send_request(&app, request).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.error_code.as_deref(), Some("invalid_header"));
        assert_eq!(res.body["message"], message);
    }
}

#[tokio::test]
async fn bad_tokens_map_to_their_codes() {
    let app = seeded_app().await;
    let cases = [
        (expired_token(MANAGER), "token_expired"),
        (forged_token(MANAGER), "invalid_signature"),
        ("not-a-jwt".to_string(), "invalid_header"),
    ];

    for (token, code) in cases {
        let res = send(&app, Method::GET, "/drinks-detail", Some(&token), None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{code}");
        assert_eq!(res.body["code"], code);
    }
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let app = seeded_app().await;
    let res = send(&app, Method::POST, "/drinks", Some(&token(BARISTA)), Some(mocha())).await;

    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["code"], "unauthorized");
    assert_eq!(res.body["message"], "Permission not found.");

    let listed = send(&app, Method::GET, "/drinks", None, None).await;
    assert_eq!(listed.body["drinks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn token_without_permissions_claim_is_forbidden() {
    let app = seeded_app().await;
    let res = send(
        &app,
        Method::GET,
        "/drinks-detail",
        Some(&token_without_permissions_claim()),
        None,
    )
    .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_returns_the_new_drink() {
    let app = seeded_app().await;
    let res = send(&app, Method::POST, "/drinks", Some(&token(MANAGER)), Some(mocha())).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    let drinks = res.body["drinks"].as_array().unwrap();
    assert_eq!(drinks.len(), 1);
    assert_eq!(drinks[0]["id"], 2);
    assert_eq!(drinks[0]["title"], "Mocha");
    assert_eq!(drinks[0]["recipe"][1]["parts"], 2);

    let listed = send(&app, Method::GET, "/drinks", None, None).await;
    assert_eq!(listed.body["drinks"][1]["title"], "Mocha");
    assert!(listed.body["drinks"][1]["recipe"][0].get("parts").is_none());
}

#[tokio::test]
async fn create_accepts_a_single_ingredient_recipe() {
    let app = seeded_app().await;
    let body = json!({"title": "Espresso", "recipe": {"name": "espresso", "color": "brown", "parts": 1}});
    let res = send(&app, Method::POST, "/drinks", Some(&token(MANAGER)), Some(body)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["drinks"][0]["recipe"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_title_is_unprocessable() {
    let app = seeded_app().await;
    let body = json!({"title": "water", "recipe": []});
    let res = send(&app, Method::POST, "/drinks", Some(&token(MANAGER)), Some(body)).await;

    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.body["message"], "unprocessable");
}

#[tokio::test]
async fn invalid_bodies_are_unprocessable() {
    let app = seeded_app().await;
    let bodies = [
        json!({"recipe": []}),
        json!({"title": "   ", "recipe": []}),
        json!({"title": "Latte", "recipe": [{"name": "milk"}]}),
        json!({"title": "x".repeat(81), "recipe": []}),
    ];

    for body in bodies {
        let res = send(&app, Method::POST, "/drinks", Some(&token(MANAGER)), Some(body.clone())).await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }

    let listed = send(&app, Method::GET, "/drinks", None, None).await;
    assert_eq!(listed.body["drinks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn patch_changes_only_supplied_fields() {
    let app = seeded_app().await;
    let manager = token(MANAGER);
    let body = json!({"title": "sparkling water"});
    let res = send(&app, Method::PATCH, "/drinks/1", Some(&manager), Some(body)).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.body["drinks"],
        json!([{
            "id": 1,
            "title": "sparkling water",
            "recipe": [{"name": "water", "color": "blue", "parts": 1}]
        }])
    );
}

#[tokio::test]
async fn patch_missing_drink_is_not_found() {
    let app = seeded_app().await;
    let manager = token(MANAGER);
    for uri in ["/drinks/999", "/drinks/latte"] {
        let res = send(&app, Method::PATCH, uri, Some(&manager), Some(json!({"title": "x"}))).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["error"], 404);
    }
}

#[tokio::test]
async fn patch_missing_drink_wins_over_a_bad_body() {
    let app = seeded_app().await;
    let manager = token(MANAGER);

    for body in [Some(json!({"title": 5})), Some(json!({"title": "  "})), None] {
        let res = send(&app, Method::PATCH, "/drinks/999", Some(&manager), body.clone()).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{body:?}");
        assert_eq!(res.error_code.as_deref(), Some("not_found"));
    }

    let res = send(&app, Method::PATCH, "/drinks/1", Some(&manager), Some(json!({"title": 5}))).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.error_code.as_deref(), Some("invalid_body"));

    let res = send(&app, Method::PATCH, "/drinks/1", Some(&manager), None).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn wrong_method_gets_json_method_not_allowed() {
    let app = seeded_app().await;
    let res = send(&app, Method::GET, "/drinks/1", None, None).await;

    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.error_code.as_deref(), Some("method_not_allowed"));
    assert_eq!(res.body["success"], false);
    assert_eq!(res.body["error"], 405);
}

#[tokio::test]
async fn patch_checks_the_token_before_the_id() {
    let app = seeded_app().await;
    let res = send(&app, Method::PATCH, "/drinks/999", None, Some(json!({"title": "x"}))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, Method::PATCH, "/drinks/999", Some(&token(BARISTA)), Some(json!({}))).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_removes_the_drink() {
    let app = seeded_app().await;
    let manager = token(MANAGER);
    let res = send(&app, Method::DELETE, "/drinks/1", Some(&manager), None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!({"success": true, "delete": "1"}));

    let listed = send(&app, Method::GET, "/drinks", None, None).await;
    assert_eq!(listed.body["drinks"], json!([]));

    let again = send(&app, Method::DELETE, "/drinks/1", Some(&manager), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_routes_get_json_not_found() {
    let app = seeded_app().await;
    let res = send(&app, Method::GET, "/cocktails", None, None).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(
        res.body,
        json!({"success": false, "error": 404, "message": "resource not found", "code": "not_found"})
    );
}

#[tokio::test]
async fn health_and_metrics_are_public() {
    let app = seeded_app().await;
    let health = send(&app, Method::GET, "/healthz", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, json!("ok"));

    send(&app, Method::GET, "/drinks-detail", None, None).await;
    let metrics = send(&app, Method::GET, "/metrics", None, None).await;
    assert_eq!(metrics.status, StatusCode::OK);
    let text = metrics.body.as_str().unwrap();
    assert!(text.contains("http_errors_total"));
    assert!(text.contains("code=\"authorization_header_missing\",service=\"drinks-service\",status=\"401\""));
}

struct BrokenStore;

#[async_trait]
impl MenuStore for BrokenStore {
    async fn list_all(&self) -> StoreResult<Vec<Drink>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn exists(&self, _id: i64) -> StoreResult<bool> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn insert(&self, _title: String, _recipe: Recipe) -> StoreResult<Drink> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn update(&self, _id: i64, _changes: DrinkChanges) -> StoreResult<Drink> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn delete(&self, _id: i64) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn reset(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn store_failures_map_to_server_and_unprocessable_errors() {
    let app = app_with_store(Arc::new(BrokenStore));
    let manager = token(MANAGER);

    let listed = send(&app, Method::GET, "/drinks", None, None).await;
    assert_eq!(listed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(listed.body["message"], "internal server error");

    let created = send(&app, Method::POST, "/drinks", Some(&manager), Some(mocha())).await;
    assert_eq!(created.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(created.error_code.as_deref(), Some("store_unavailable"));

    let deleted = send(&app, Method::DELETE, "/drinks/1", Some(&manager), None).await;
    assert_eq!(deleted.status, StatusCode::UNPROCESSABLE_ENTITY);
}
