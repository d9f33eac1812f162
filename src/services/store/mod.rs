//! Persistence seams for users, alerts and notifications.
//!
//! Every read and write a handler makes is scoped by the caller's user id.
//! The evaluator-only operations (`pending_price_alerts`, `trigger_price_alert`,
//! `active_news_alerts`, `insert_news_notification`) are unscoped.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;

use crate::{
    error::StoreError,
    models::{
        AlertNotification, AlertStats, NewsAlert, NewsAlertPatch, PriceAlert, PriceAlertPatch,
        User,
    },
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Rows loaded for a sweep. `skipped` counts stored rows that could not be
/// decoded and were left out.
#[derive(Debug, Clone)]
pub struct SweepBatch<T> {
    pub items: Vec<T>,
    pub skipped: usize,
}

impl<T> SweepBatch<T> {
    pub fn complete(items: Vec<T>) -> Self {
        Self { items, skipped: 0 }
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `StoreError::Duplicate` when the email is taken.
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait AlertStore: Send + Sync {
    // ---- price alerts ----
    async fn insert_price_alert(&self, alert: &PriceAlert) -> StoreResult<()>;
    async fn list_price_alerts(&self, user_id: ObjectId, active_only: bool) -> StoreResult<Vec<PriceAlert>>;
    async fn update_price_alert(
        &self,
        user_id: ObjectId,
        id: ObjectId,
        patch: PriceAlertPatch,
    ) -> StoreResult<Option<PriceAlert>>;
    async fn delete_price_alert(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool>;

    /// Alerts with `is_active && !triggered`. Undecodable rows are skipped, not fatal.
    async fn pending_price_alerts(&self) -> StoreResult<SweepBatch<PriceAlert>>;

    /// Conditionally flips `triggered` and records the notification.
    ///
    /// Returns false without writing anything when the alert was already
    /// triggered, deactivated or deleted. On error the alert is left pending.
    async fn trigger_price_alert(
        &self,
        id: ObjectId,
        at: i64,
        notification: &AlertNotification,
    ) -> StoreResult<bool>;

    // ---- news alerts ----
    async fn insert_news_alert(&self, alert: &NewsAlert) -> StoreResult<()>;
    async fn list_news_alerts(&self, user_id: ObjectId, active_only: bool) -> StoreResult<Vec<NewsAlert>>;
    async fn update_news_alert(
        &self,
        user_id: ObjectId,
        id: ObjectId,
        patch: NewsAlertPatch,
    ) -> StoreResult<Option<NewsAlert>>;
    async fn delete_news_alert(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool>;
    async fn active_news_alerts(&self) -> StoreResult<SweepBatch<NewsAlert>>;

    /// Inserts unless a notification with the same `(alert_id, article_key)` exists.
    async fn insert_news_notification(&self, notification: &AlertNotification) -> StoreResult<bool>;

    // ---- notifications ----
    /// Newest first.
    async fn list_notifications(&self, user_id: ObjectId, limit: usize) -> StoreResult<Vec<AlertNotification>>;
    async fn mark_notification_read(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool>;
    async fn mark_all_notifications_read(&self, user_id: ObjectId) -> StoreResult<u64>;

    async fn alert_stats(&self, user_id: ObjectId) -> StoreResult<AlertStats>;
}
