mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use stocklens::routes;
use tower::ServiceExt;

use common::{response_json, test_state};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (state, _) = test_state();
    let res = routes::app(state)
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["status"], "healthy");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let (state, _) = test_state();
    let res = routes::app(state)
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(response_json(res).await["message"], "Not found");
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (state, _) = test_state();
    for uri in ["/api/auth/me", "/api/alerts/price", "/api/alerts/stats", "/api/search/apple"] {
        let res = routes::app(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn register_then_use_bearer_token() {
    let (state, _) = test_state();

    let res = routes::app(state.clone())
        .oneshot(post_json(
            "/api/auth/register",
            json!({ "email": "Jane@Example.com", "password": "secret1", "firstName": "Jane" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with("auth="));
    assert!(set_cookie.contains("HttpOnly"));

    let body = response_json(res).await;
    assert_eq!(body["user"]["email"], "jane@example.com");
    assert_eq!(body["user"]["firstName"], "Jane");
    assert!(body["user"].get("passwordHash").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    let res = routes::app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(response_json(res).await["user"]["email"], "jane@example.com");

    // the cookie works as well
    let res = routes::app(state)
        .oneshot(
            Request::builder()
                .uri("/api/alerts/stats")
                .header(header::COOKIE, format!("auth={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let (state, _) = test_state();
    let body = json!({ "email": "dup@example.com", "password": "secret1" });

    let res = routes::app(state.clone())
        .oneshot(post_json("/api/auth/register", body.clone()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = routes::app(state)
        .oneshot(post_json("/api/auth/register", json!({ "email": "DUP@example.com", "password": "secret1" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_validates_email_and_password() {
    let (state, _) = test_state();

    for body in [
        json!({ "email": "not-an-email", "password": "secret1" }),
        json!({ "email": "ok@example.com", "password": "123" }),
    ] {
        let res = routes::app(state.clone())
            .oneshot(post_json("/api/auth/register", body))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(response_json(res).await["message"].is_string());
    }
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let (state, _) = test_state();

    routes::app(state.clone())
        .oneshot(post_json("/api/auth/register", json!({ "email": "log@example.com", "password": "secret1" })))
        .await
        .unwrap();

    let res = routes::app(state.clone())
        .oneshot(post_json("/api/auth/login", json!({ "email": "log@example.com", "password": "wrong!!" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response_json(res).await["message"], "Invalid email or password");

    let res = routes::app(state.clone())
        .oneshot(post_json("/api/auth/login", json!({ "email": "nobody@example.com", "password": "secret1" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = routes::app(state)
        .oneshot(post_json("/api/auth/login", json!({ "email": "LOG@example.com", "password": "secret1" })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(response_json(res).await["token"].is_string());
}

#[tokio::test]
async fn logout_clears_the_cookie() {
    let (state, _) = test_state();
    let res = routes::app(state)
        .oneshot(post_json("/api/auth/logout", json!({})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("auth="));
    assert!(cookie.contains("Max-Age=0"));
}
