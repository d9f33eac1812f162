use chrono::Utc;
use mongodb::bson::oid::ObjectId;

use crate::{
    error::{AppError, AppResult},
    events::{AppEvent, ALERTS_UPDATED, NOTIFICATIONS_UPDATED},
    models::{
        alert::{
            clean_keywords, CreateNewsAlertRequest, CreatePriceAlertRequest, UpdateNewsAlertRequest,
            UpdatePriceAlertRequest,
        },
        AlertNotification, AlertStats, NewsAlert, NewsAlertPatch, PriceAlert, PriceAlertPatch,
    },
    AppState,
};

pub const DEFAULT_NOTIFICATION_LIMIT: usize = 50;
pub const MAX_NOTIFICATION_LIMIT: usize = 200;

/// Unparseable ids are reported exactly like ids owned by someone else.
pub fn parse_id(raw: &str, what: &str) -> AppResult<ObjectId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::NotFound(format!("{what} not found")))
}

fn notify(state: &AppState, user_id: ObjectId, name: &'static str) {
    let _ = state.events_tx.send(AppEvent::new(user_id, name));
}

// ---------------- price alerts ----------------

pub async fn list_price_alerts(state: &AppState, user_id: ObjectId) -> AppResult<Vec<PriceAlert>> {
    Ok(state.alerts.list_price_alerts(user_id, true).await?)
}

pub async fn create_price_alert(
    state: &AppState,
    user_id: ObjectId,
    req: CreatePriceAlertRequest,
) -> AppResult<PriceAlert> {
    let new = req.validate()?;
    let now = Utc::now().timestamp_millis();

    let alert = PriceAlert {
        id: ObjectId::new(),
        user_id,
        symbol: new.symbol,
        alert_type: new.alert_type,
        target_price: new.target_price,
        change_percent: new.change_percent,
        is_active: true,
        triggered: false,
        triggered_at: None,
        created_at: now,
        updated_at: now,
    };

    state.alerts.insert_price_alert(&alert).await?;
    tracing::info!(alert_id = %alert.id, symbol = %alert.symbol, alert_type = %alert.alert_type, "price alert created");
    notify(state, user_id, ALERTS_UPDATED);

    Ok(alert)
}

pub async fn update_price_alert(
    state: &AppState,
    user_id: ObjectId,
    id: ObjectId,
    req: UpdatePriceAlertRequest,
) -> AppResult<PriceAlert> {
    let patch = PriceAlertPatch {
        is_active: req.is_active,
    };

    let alert = state
        .alerts
        .update_price_alert(user_id, id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("Price alert not found".into()))?;

    notify(state, user_id, ALERTS_UPDATED);
    Ok(alert)
}

pub async fn delete_price_alert(state: &AppState, user_id: ObjectId, id: ObjectId) -> AppResult<()> {
    if !state.alerts.delete_price_alert(user_id, id).await? {
        return Err(AppError::NotFound("Price alert not found".into()));
    }
    notify(state, user_id, ALERTS_UPDATED);
    Ok(())
}

// ---------------- news alerts ----------------

pub async fn list_news_alerts(state: &AppState, user_id: ObjectId) -> AppResult<Vec<NewsAlert>> {
    Ok(state.alerts.list_news_alerts(user_id, true).await?)
}

pub async fn create_news_alert(
    state: &AppState,
    user_id: ObjectId,
    req: CreateNewsAlertRequest,
) -> AppResult<NewsAlert> {
    let new = req.validate()?;
    let now = Utc::now().timestamp_millis();

    let alert = NewsAlert {
        id: ObjectId::new(),
        user_id,
        symbol: new.symbol,
        keywords: new.keywords,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.alerts.insert_news_alert(&alert).await?;
    tracing::info!(alert_id = %alert.id, symbol = %alert.symbol, "news alert created");
    notify(state, user_id, ALERTS_UPDATED);

    Ok(alert)
}

pub async fn update_news_alert(
    state: &AppState,
    user_id: ObjectId,
    id: ObjectId,
    req: UpdateNewsAlertRequest,
) -> AppResult<NewsAlert> {
    let patch = NewsAlertPatch {
        is_active: req.is_active,
        keywords: req.keywords.map(clean_keywords).transpose()?,
    };

    let alert = state
        .alerts
        .update_news_alert(user_id, id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound("News alert not found".into()))?;

    notify(state, user_id, ALERTS_UPDATED);
    Ok(alert)
}

pub async fn delete_news_alert(state: &AppState, user_id: ObjectId, id: ObjectId) -> AppResult<()> {
    if !state.alerts.delete_news_alert(user_id, id).await? {
        return Err(AppError::NotFound("News alert not found".into()));
    }
    notify(state, user_id, ALERTS_UPDATED);
    Ok(())
}

// ---------------- notifications ----------------

pub fn notification_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT)
}

pub async fn list_notifications(
    state: &AppState,
    user_id: ObjectId,
    limit: Option<usize>,
) -> AppResult<Vec<AlertNotification>> {
    Ok(state
        .alerts
        .list_notifications(user_id, notification_limit(limit))
        .await?)
}

pub async fn mark_notification_read(state: &AppState, user_id: ObjectId, id: ObjectId) -> AppResult<()> {
    if !state.alerts.mark_notification_read(user_id, id).await? {
        return Err(AppError::NotFound("Notification not found".into()));
    }
    notify(state, user_id, NOTIFICATIONS_UPDATED);
    Ok(())
}

pub async fn mark_all_notifications_read(state: &AppState, user_id: ObjectId) -> AppResult<u64> {
    let n = state.alerts.mark_all_notifications_read(user_id).await?;
    if n > 0 {
        notify(state, user_id, NOTIFICATIONS_UPDATED);
    }
    Ok(n)
}

pub async fn alert_stats(state: &AppState, user_id: ObjectId) -> AppResult<AlertStats> {
    Ok(state.alerts.alert_stats(user_id).await?)
}
