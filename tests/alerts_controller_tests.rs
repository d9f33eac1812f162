mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::{get, patch, post},
    Router,
};
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use stocklens::{
    controllers::alerts_controller,
    models::{AlertNotification, CurrentUser, NotificationKind},
    services::store::AlertStore,
    AppState,
};
use tower::ServiceExt;

use common::{response_json, test_state, user};

fn alerts_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/alerts/price",
            get(alerts_controller::get_price_alerts).post(alerts_controller::post_price_alert),
        )
        .route(
            "/api/alerts/price/:id",
            patch(alerts_controller::patch_price_alert).delete(alerts_controller::delete_price_alert),
        )
        .route(
            "/api/alerts/news",
            get(alerts_controller::get_news_alerts).post(alerts_controller::post_news_alert),
        )
        .route(
            "/api/alerts/news/:id",
            patch(alerts_controller::patch_news_alert).delete(alerts_controller::delete_news_alert),
        )
        .route("/api/alerts/notifications", get(alerts_controller::get_notifications))
        .route("/api/alerts/notifications/read-all", post(alerts_controller::post_notifications_read_all))
        .route("/api/alerts/notifications/:id/read", post(alerts_controller::post_notification_read))
        .route("/api/alerts/stats", get(alerts_controller::get_stats))
        .with_state(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value, as_user: Option<&CurrentUser>) -> Request<Body> {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    if let Some(u) = as_user {
        req.extensions_mut().insert(u.clone());
    }
    req
}

fn empty_request(method: &str, uri: &str, as_user: Option<&CurrentUser>) -> Request<Body> {
    let mut req = Request::builder().method(method).uri(uri).body(Body::empty()).unwrap();
    if let Some(u) = as_user {
        req.extensions_mut().insert(u.clone());
    }
    req
}

async fn create_price_alert(state: &AppState, u: &CurrentUser, body: serde_json::Value) -> serde_json::Value {
    let res = alerts_app(state.clone())
        .oneshot(json_request("POST", "/api/alerts/price", body, Some(u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    response_json(res).await
}

fn notification(user_id: ObjectId, n: usize) -> AlertNotification {
    AlertNotification::new(
        user_id,
        ObjectId::new(),
        NotificationKind::News,
        "AAPL",
        "News Alert: AAPL".into(),
        format!("story {n}"),
        1_700_000_000_000 + n as i64,
    )
    .with_article_key(format!("https://news.example/{n}"))
}

#[tokio::test]
async fn unauthenticated_requests_get_401() {
    let (state, _) = test_state();
    let res = alerts_app(state)
        .oneshot(empty_request("GET", "/api/alerts/price", None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(res).await;
    assert_eq!(body["message"], "Authentication required");
}

#[tokio::test]
async fn create_price_alert_returns_201_and_normalizes_symbol() {
    let (state, _) = test_state();
    let u = user("a@example.com");

    let body = create_price_alert(
        &state,
        &u,
        json!({ "symbol": "aapl", "alertType": "above", "targetPrice": 200.0 }),
    )
    .await;

    assert_eq!(body["symbol"], "AAPL");
    assert_eq!(body["alertType"], "above");
    assert_eq!(body["targetPrice"], 200.0);
    assert_eq!(body["isActive"], true);
    assert_eq!(body["triggered"], false);
    assert_eq!(body["userId"], u.id.to_hex());
}

#[tokio::test]
async fn invalid_price_alert_is_rejected_before_persistence() {
    let (state, store) = test_state();
    let u = user("a@example.com");

    for body in [
        json!({ "symbol": "AAPL", "alertType": "above" }),
        json!({ "symbol": "AAPL", "alertType": "change_percent", "targetPrice": 10.0 }),
        json!({ "symbol": "AAPL", "alertType": "below", "targetPrice": 10.0, "changePercent": 2.0 }),
        json!({ "symbol": "AAPL", "alertType": "sideways", "targetPrice": 10.0 }),
        json!({ "symbol": "", "alertType": "above", "targetPrice": 10.0 }),
    ] {
        let res = alerts_app(state.clone())
            .oneshot(json_request("POST", "/api/alerts/price", body, Some(&u)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    let res = alerts_app(state.clone())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/alerts/price")
                .header(header::CONTENT_TYPE, "application/json")
                .extension(u.clone())
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(store.list_price_alerts(u.id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_is_scoped_to_caller_and_active_only() {
    let (state, _) = test_state();
    let alice = user("alice@example.com");
    let bob = user("bob@example.com");

    let a1 = create_price_alert(&state, &alice, json!({ "symbol": "AAPL", "alertType": "above", "targetPrice": 1.0 })).await;
    create_price_alert(&state, &alice, json!({ "symbol": "MSFT", "alertType": "below", "targetPrice": 1.0 })).await;
    create_price_alert(&state, &bob, json!({ "symbol": "TSLA", "alertType": "change_percent", "changePercent": 3.0 })).await;

    let id = a1["id"].as_str().unwrap();
    let res = alerts_app(state.clone())
        .oneshot(json_request("PATCH", &format!("/api/alerts/price/{id}"), json!({ "isActive": false }), Some(&alice)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["isActive"], false);

    let res = alerts_app(state.clone())
        .oneshot(empty_request("GET", "/api/alerts/price", Some(&alice)))
        .await
        .unwrap();
    let list = response_json(res).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["symbol"], "MSFT");
}

#[tokio::test]
async fn deleting_another_users_alert_is_not_found_and_leaves_it_alone() {
    let (state, store) = test_state();
    let owner = user("owner@example.com");
    let intruder = user("intruder@example.com");

    let created = create_price_alert(&state, &owner, json!({ "symbol": "AAPL", "alertType": "above", "targetPrice": 200.0 })).await;
    let id = created["id"].as_str().unwrap().to_string();

    let res = alerts_app(state.clone())
        .oneshot(empty_request("DELETE", &format!("/api/alerts/price/{id}"), Some(&intruder)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(res).await["message"], "Price alert not found");

    let still_there = store.list_price_alerts(owner.id, false).await.unwrap();
    assert_eq!(still_there.len(), 1);
    assert!(still_there[0].is_active);

    let res = alerts_app(state.clone())
        .oneshot(empty_request("DELETE", &format!("/api/alerts/price/{id}"), Some(&owner)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(store.list_price_alerts(owner.id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_id_is_reported_as_not_found() {
    let (state, _) = test_state();
    let u = user("a@example.com");

    let res = alerts_app(state)
        .oneshot(empty_request("DELETE", "/api/alerts/news/12345", Some(&u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn news_alert_keywords_are_cleaned_and_patchable() {
    let (state, _) = test_state();
    let u = user("a@example.com");

    let res = alerts_app(state.clone())
        .oneshot(json_request("POST", "/api/alerts/news", json!({ "symbol": "AAPL", "keywords": ["  ", ""] }), Some(&u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = alerts_app(state.clone())
        .oneshot(json_request("POST", "/api/alerts/news", json!({ "symbol": "aapl", "keywords": [" earnings ", "merger"] }), Some(&u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created = response_json(res).await;
    assert_eq!(created["keywords"], json!(["earnings", "merger"]));

    let id = created["id"].as_str().unwrap();
    let res = alerts_app(state.clone())
        .oneshot(json_request("PATCH", &format!("/api/alerts/news/{id}"), json!({ "keywords": ["buyback"] }), Some(&u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["keywords"], json!(["buyback"]));
}

#[tokio::test]
async fn stats_count_alerts_and_unread_notifications() {
    let (state, store) = test_state();
    let u = user("stats@example.com");

    let first = create_price_alert(&state, &u, json!({ "symbol": "AAPL", "alertType": "above", "targetPrice": 1.0 })).await;
    create_price_alert(&state, &u, json!({ "symbol": "MSFT", "alertType": "above", "targetPrice": 1.0 })).await;
    create_price_alert(&state, &u, json!({ "symbol": "TSLA", "alertType": "below", "targetPrice": 1.0 })).await;

    let id = first["id"].as_str().unwrap();
    alerts_app(state.clone())
        .oneshot(json_request("PATCH", &format!("/api/alerts/price/{id}"), json!({ "isActive": false }), Some(&u)))
        .await
        .unwrap();

    for n in 0..5 {
        assert!(store.insert_news_notification(&notification(u.id, n)).await.unwrap());
    }
    // someone else's notification is not counted
    store.insert_news_notification(&notification(ObjectId::new(), 99)).await.unwrap();

    let res = alerts_app(state)
        .oneshot(empty_request("GET", "/api/alerts/stats", Some(&u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let stats = response_json(res).await;
    assert_eq!(stats["totalPriceAlerts"], 3);
    assert_eq!(stats["activePriceAlerts"], 2);
    assert_eq!(stats["totalNewsAlerts"], 0);
    assert_eq!(stats["unreadNotifications"], 5);
}

#[tokio::test]
async fn notifications_are_newest_first_and_can_be_marked_read() {
    let (state, store) = test_state();
    let u = user("reader@example.com");
    let other = user("other@example.com");

    for n in 0..3 {
        store.insert_news_notification(&notification(u.id, n)).await.unwrap();
    }

    let res = alerts_app(state.clone())
        .oneshot(empty_request("GET", "/api/alerts/notifications?limit=2", Some(&u)))
        .await
        .unwrap();
    let list = response_json(res).await;
    let list = list.as_array().unwrap().clone();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["message"], "story 2");
    assert_eq!(list[1]["message"], "story 1");

    let id = list[0]["id"].as_str().unwrap().to_string();

    // not the owner
    let res = alerts_app(state.clone())
        .oneshot(empty_request("POST", &format!("/api/alerts/notifications/{id}/read"), Some(&other)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = alerts_app(state.clone())
        .oneshot(empty_request("POST", &format!("/api/alerts/notifications/{id}/read"), Some(&u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(store.alert_stats(u.id).await.unwrap().unread_notifications, 2);

    let res = alerts_app(state.clone())
        .oneshot(empty_request("POST", "/api/alerts/notifications/read-all", Some(&u)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["updated"], 2);
    assert_eq!(store.alert_stats(u.id).await.unwrap().unread_notifications, 0);
}

#[tokio::test]
async fn bad_notification_limit_is_a_json_400() {
    let (state, _) = test_state();
    let u = user("limits@example.com");

    for uri in ["/api/alerts/notifications?limit=abc", "/api/alerts/notifications?limit=-1"] {
        let res = alerts_app(state.clone())
            .oneshot(empty_request("GET", uri, Some(&u)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert!(response_json(res).await["message"].is_string(), "{uri}");
    }
}
