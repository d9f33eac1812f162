use mongodb::bson::oid::ObjectId;

pub const ALERTS_UPDATED: &str = "alertsUpdated";
pub const NOTIFICATIONS_UPDATED: &str = "notificationsUpdated";

/// Broadcast to every SSE subscriber; each stream forwards only its own user's events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppEvent {
    pub user_id: ObjectId,
    pub name: &'static str,
}

impl AppEvent {
    pub fn new(user_id: ObjectId, name: &'static str) -> Self {
        Self { user_id, name }
    }
}

pub type EventSender = tokio::sync::broadcast::Sender<AppEvent>;

pub fn channel() -> EventSender {
    let (tx, _rx) = tokio::sync::broadcast::channel(100);
    tx
}
