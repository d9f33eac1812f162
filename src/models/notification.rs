use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Price,
    News,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertNotification {
    #[serde(rename = "_id")]
    pub id: ObjectId,

    pub user_id: ObjectId,
    pub alert_id: ObjectId,
    pub alert_type: NotificationKind,
    pub symbol: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,

    // news only: identifies the article so it is notified once per alert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_key: Option<String>,
}

impl AlertNotification {
    pub fn new(
        user_id: ObjectId,
        alert_id: ObjectId,
        alert_type: NotificationKind,
        symbol: &str,
        title: String,
        message: String,
        created_at: i64,
    ) -> Self {
        Self {
            id: ObjectId::new(),
            user_id,
            alert_id,
            alert_type,
            symbol: symbol.to_string(),
            title,
            message,
            is_read: false,
            created_at,
            article_key: None,
        }
    }

    pub fn with_article_key(mut self, key: String) -> Self {
        self.article_key = Some(key);
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: String,
    pub user_id: String,
    pub alert_id: String,
    pub alert_type: NotificationKind,
    pub symbol: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: i64,
}

impl From<&AlertNotification> for NotificationView {
    fn from(n: &AlertNotification) -> Self {
        Self {
            id: n.id.to_hex(),
            user_id: n.user_id.to_hex(),
            alert_id: n.alert_id.to_hex(),
            alert_type: n.alert_type,
            symbol: n.symbol.clone(),
            title: n.title.clone(),
            message: n.message.clone(),
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// Per-user counters, recomputed on every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub total_price_alerts: u64,
    pub active_price_alerts: u64,
    pub total_news_alerts: u64,
    pub unread_notifications: u64,
}
