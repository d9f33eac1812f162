use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tokio::sync::Mutex;

use super::{AlertStore, StoreResult, SweepBatch, UserStore};
use crate::{
    error::StoreError,
    models::{
        AlertNotification, AlertStats, NewsAlert, NewsAlertPatch, PriceAlert, PriceAlertPatch,
        User,
    },
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    price_alerts: Vec<PriceAlert>,
    news_alerts: Vec<NewsAlert>,
    // insertion order
    notifications: Vec<AlertNotification>,
}

/// Process-local store used by tests and `STORE_BACKEND=memory`.
///
/// One lock guards all tables, so every trait method is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut t = self.inner.lock().await;
        if t.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Duplicate(format!("user {}", user.email)));
        }
        t.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        let t = self.inner.lock().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let t = self.inner.lock().await;
        Ok(t.users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn insert_price_alert(&self, alert: &PriceAlert) -> StoreResult<()> {
        self.inner.lock().await.price_alerts.push(alert.clone());
        Ok(())
    }

    async fn list_price_alerts(&self, user_id: ObjectId, active_only: bool) -> StoreResult<Vec<PriceAlert>> {
        let t = self.inner.lock().await;
        let mut items: Vec<PriceAlert> = t
            .price_alerts
            .iter()
            .filter(|a| a.user_id == user_id && (!active_only || a.is_active))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_price_alert(
        &self,
        user_id: ObjectId,
        id: ObjectId,
        patch: PriceAlertPatch,
    ) -> StoreResult<Option<PriceAlert>> {
        let mut t = self.inner.lock().await;
        let Some(a) = t
            .price_alerts
            .iter_mut()
            .find(|a| a.id == id && a.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(active) = patch.is_active {
            a.is_active = active;
        }
        a.updated_at = Utc::now().timestamp_millis();
        Ok(Some(a.clone()))
    }

    async fn delete_price_alert(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool> {
        let mut t = self.inner.lock().await;
        let before = t.price_alerts.len();
        t.price_alerts.retain(|a| !(a.id == id && a.user_id == user_id));
        Ok(t.price_alerts.len() < before)
    }

    async fn pending_price_alerts(&self) -> StoreResult<SweepBatch<PriceAlert>> {
        let t = self.inner.lock().await;
        Ok(SweepBatch::complete(
            t.price_alerts
                .iter()
                .filter(|a| a.is_active && !a.triggered)
                .cloned()
                .collect(),
        ))
    }

    async fn trigger_price_alert(
        &self,
        id: ObjectId,
        at: i64,
        notification: &AlertNotification,
    ) -> StoreResult<bool> {
        let mut t = self.inner.lock().await;
        let Some(a) = t
            .price_alerts
            .iter_mut()
            .find(|a| a.id == id && a.is_active && !a.triggered)
        else {
            return Ok(false);
        };

        a.triggered = true;
        a.triggered_at = Some(at);
        a.updated_at = at;
        t.notifications.push(notification.clone());
        Ok(true)
    }

    async fn insert_news_alert(&self, alert: &NewsAlert) -> StoreResult<()> {
        self.inner.lock().await.news_alerts.push(alert.clone());
        Ok(())
    }

    async fn list_news_alerts(&self, user_id: ObjectId, active_only: bool) -> StoreResult<Vec<NewsAlert>> {
        let t = self.inner.lock().await;
        let mut items: Vec<NewsAlert> = t
            .news_alerts
            .iter()
            .filter(|a| a.user_id == user_id && (!active_only || a.is_active))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn update_news_alert(
        &self,
        user_id: ObjectId,
        id: ObjectId,
        patch: NewsAlertPatch,
    ) -> StoreResult<Option<NewsAlert>> {
        let mut t = self.inner.lock().await;
        let Some(a) = t
            .news_alerts
            .iter_mut()
            .find(|a| a.id == id && a.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(active) = patch.is_active {
            a.is_active = active;
        }
        if let Some(keywords) = patch.keywords {
            a.keywords = keywords;
        }
        a.updated_at = Utc::now().timestamp_millis();
        Ok(Some(a.clone()))
    }

    async fn delete_news_alert(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool> {
        let mut t = self.inner.lock().await;
        let before = t.news_alerts.len();
        t.news_alerts.retain(|a| !(a.id == id && a.user_id == user_id));
        Ok(t.news_alerts.len() < before)
    }

    async fn active_news_alerts(&self) -> StoreResult<SweepBatch<NewsAlert>> {
        let t = self.inner.lock().await;
        Ok(SweepBatch::complete(
            t.news_alerts.iter().filter(|a| a.is_active).cloned().collect(),
        ))
    }

    async fn insert_news_notification(&self, notification: &AlertNotification) -> StoreResult<bool> {
        let mut t = self.inner.lock().await;
        let seen = notification.article_key.is_some()
            && t.notifications.iter().any(|n| {
                n.alert_id == notification.alert_id && n.article_key == notification.article_key
            });
        if seen {
            return Ok(false);
        }
        t.notifications.push(notification.clone());
        Ok(true)
    }

    async fn list_notifications(&self, user_id: ObjectId, limit: usize) -> StoreResult<Vec<AlertNotification>> {
        let t = self.inner.lock().await;
        let mut items: Vec<AlertNotification> = t
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        // stable: equal timestamps keep newest-inserted first
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit);
        Ok(items)
    }

    async fn mark_notification_read(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool> {
        let mut t = self.inner.lock().await;
        match t
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_notifications_read(&self, user_id: ObjectId) -> StoreResult<u64> {
        let mut t = self.inner.lock().await;
        let mut changed = 0;
        for n in t.notifications.iter_mut().filter(|n| n.user_id == user_id && !n.is_read) {
            n.is_read = true;
            changed += 1;
        }
        Ok(changed)
    }

    async fn alert_stats(&self, user_id: ObjectId) -> StoreResult<AlertStats> {
        let t = self.inner.lock().await;
        let mine = |uid: &ObjectId| *uid == user_id;

        Ok(AlertStats {
            total_price_alerts: t.price_alerts.iter().filter(|a| mine(&a.user_id)).count() as u64,
            active_price_alerts: t
                .price_alerts
                .iter()
                .filter(|a| mine(&a.user_id) && a.is_active)
                .count() as u64,
            total_news_alerts: t
                .news_alerts
                .iter()
                .filter(|a| mine(&a.user_id) && a.is_active)
                .count() as u64,
            unread_notifications: t
                .notifications
                .iter()
                .filter(|n| mine(&n.user_id) && !n.is_read)
                .count() as u64,
        })
    }
}
