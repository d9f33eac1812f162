use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::require_user;
use crate::{
    error::AppResult,
    models::{
        alert::{
            CreateNewsAlertRequest, CreatePriceAlertRequest, NewsAlertView, PriceAlertView,
            UpdateNewsAlertRequest, UpdatePriceAlertRequest,
        },
        notification::NotificationView,
        AlertStats, CurrentUser,
    },
    services::alerts_service,
    AppState,
};

// ---------------- Price alerts ----------------

// GET /api/alerts/price
pub async fn get_price_alerts(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> AppResult<Json<Vec<PriceAlertView>>> {
    let u = require_user(user)?;
    let alerts = alerts_service::list_price_alerts(&state, u.id).await?;
    Ok(Json(alerts.iter().map(PriceAlertView::from).collect()))
}

// POST /api/alerts/price
pub async fn post_price_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    payload: Result<Json<CreatePriceAlertRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let u = require_user(user)?;
    let Json(req) = payload?;

    let alert = alerts_service::create_price_alert(&state, u.id, req).await?;
    Ok((StatusCode::CREATED, Json(PriceAlertView::from(&alert))))
}

// PATCH /api/alerts/price/:id
pub async fn patch_price_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePriceAlertRequest>, JsonRejection>,
) -> AppResult<Json<PriceAlertView>> {
    let u = require_user(user)?;
    let id = alerts_service::parse_id(&id, "Price alert")?;
    let Json(req) = payload?;

    let alert = alerts_service::update_price_alert(&state, u.id, id, req).await?;
    Ok(Json(PriceAlertView::from(&alert)))
}

// DELETE /api/alerts/price/:id
pub async fn delete_price_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let u = require_user(user)?;
    let id = alerts_service::parse_id(&id, "Price alert")?;

    alerts_service::delete_price_alert(&state, u.id, id).await?;
    Ok(Json(json!({ "message": "Price alert deleted successfully" })))
}

// ---------------- News alerts ----------------

// GET /api/alerts/news
pub async fn get_news_alerts(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> AppResult<Json<Vec<NewsAlertView>>> {
    let u = require_user(user)?;
    let alerts = alerts_service::list_news_alerts(&state, u.id).await?;
    Ok(Json(alerts.iter().map(NewsAlertView::from).collect()))
}

// POST /api/alerts/news
pub async fn post_news_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    payload: Result<Json<CreateNewsAlertRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let u = require_user(user)?;
    let Json(req) = payload?;

    let alert = alerts_service::create_news_alert(&state, u.id, req).await?;
    Ok((StatusCode::CREATED, Json(NewsAlertView::from(&alert))))
}

// PATCH /api/alerts/news/:id
pub async fn patch_news_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNewsAlertRequest>, JsonRejection>,
) -> AppResult<Json<NewsAlertView>> {
    let u = require_user(user)?;
    let id = alerts_service::parse_id(&id, "News alert")?;
    let Json(req) = payload?;

    let alert = alerts_service::update_news_alert(&state, u.id, id, req).await?;
    Ok(Json(NewsAlertView::from(&alert)))
}

// DELETE /api/alerts/news/:id
pub async fn delete_news_alert(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let u = require_user(user)?;
    let id = alerts_service::parse_id(&id, "News alert")?;

    alerts_service::delete_news_alert(&state, u.id, id).await?;
    Ok(Json(json!({ "message": "News alert deleted successfully" })))
}

// ---------------- Notifications ----------------

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub limit: Option<usize>,
}

// GET /api/alerts/notifications?limit=N
pub async fn get_notifications(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    query: Result<Query<NotificationsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<NotificationView>>> {
    let u = require_user(user)?;
    let Query(q) = query?;
    let items = alerts_service::list_notifications(&state, u.id, q.limit).await?;
    Ok(Json(items.iter().map(NotificationView::from).collect()))
}

// POST /api/alerts/notifications/:id/read
pub async fn post_notification_read(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let u = require_user(user)?;
    let id = alerts_service::parse_id(&id, "Notification")?;

    alerts_service::mark_notification_read(&state, u.id, id).await?;
    Ok(Json(json!({ "message": "Notification marked as read" })))
}

// POST /api/alerts/notifications/read-all
pub async fn post_notifications_read_all(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> AppResult<impl IntoResponse> {
    let u = require_user(user)?;
    let updated = alerts_service::mark_all_notifications_read(&state, u.id).await?;
    Ok(Json(json!({
        "message": "All notifications marked as read",
        "updated": updated,
    })))
}

// GET /api/alerts/stats
pub async fn get_stats(
    State(state): State<AppState>,
    user: Option<Extension<CurrentUser>>,
) -> AppResult<Json<AlertStats>> {
    let u = require_user(user)?;
    Ok(Json(alerts_service::alert_stats(&state, u.id).await?))
}
