use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::{
    bson::{self, doc, oid::ObjectId, Bson, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client, Collection, Cursor, Database, IndexModel,
};
use serde::de::DeserializeOwned;

use super::{AlertStore, StoreResult, SweepBatch, UserStore};
use crate::{
    error::StoreError,
    models::{
        AlertNotification, AlertStats, NewsAlert, NewsAlertPatch, PriceAlert, PriceAlertPatch,
        User,
    },
};

const USERS: &str = "users";
const PRICE_ALERTS: &str = "price_alerts";
const NEWS_ALERTS: &str = "news_alerts";
const NOTIFICATIONS: &str = "alert_notifications";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

async fn collect<T>(cursor: Cursor<T>) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let items: Vec<T> = cursor.try_collect().await?;
    Ok(items)
}

/// Decodes rows one by one so a single bad document cannot hide the rest.
fn decode_rows<T: DeserializeOwned>(docs: Vec<Document>, what: &str) -> SweepBatch<T> {
    let mut items = Vec::with_capacity(docs.len());
    let mut skipped = 0;

    for raw in docs {
        let id = raw.get_object_id("_id").ok();
        match bson::from_document::<T>(raw) {
            Ok(item) => items.push(item),
            Err(e) => {
                skipped += 1;
                tracing::warn!(collection = what, id = ?id, error = %e, "skipping undecodable row");
            }
        }
    }

    SweepBatch { items, skipped }
}

fn newest_first() -> FindOptions {
    FindOptions::builder()
        .sort(doc! { "created_at": -1, "_id": -1 })
        .build()
}

fn owned_filter(user_id: ObjectId, active_only: bool) -> Document {
    let mut filter = doc! { "user_id": user_id };
    if active_only {
        filter.insert("is_active", true);
    }
    filter
}

fn return_after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build()
}

impl MongoStore {
    pub async fn connect(uri: &str, db_name: &str) -> StoreResult<Self> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::new(client.database(db_name)))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn price_alerts(&self) -> Collection<PriceAlert> {
        self.db.collection(PRICE_ALERTS)
    }

    fn news_alerts(&self) -> Collection<NewsAlert> {
        self.db.collection(NEWS_ALERTS)
    }

    fn raw(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }

    async fn sweep_rows<T: DeserializeOwned>(&self, name: &str, filter: Document) -> StoreResult<SweepBatch<T>> {
        let docs: Vec<Document> = self.raw(name).find(filter, None).await?.try_collect().await?;
        Ok(decode_rows(docs, name))
    }

    fn notifications(&self) -> Collection<AlertNotification> {
        self.db.collection(NOTIFICATIONS)
    }

    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        // users: unique email
        {
            let model = IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.db
                .collection::<Document>(USERS)
                .create_index(model, None)
                .await?;
        }

        // price alerts: sweep scan + per-user listing
        {
            let col = self.db.collection::<Document>(PRICE_ALERTS);
            col.create_index(
                IndexModel::builder()
                    .keys(doc! { "is_active": 1, "triggered": 1, "symbol": 1 })
                    .build(),
                None,
            )
            .await?;
            col.create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "created_at": -1 })
                    .build(),
                None,
            )
            .await?;
        }

        // news alerts: per-user listing
        {
            let model = IndexModel::builder()
                .keys(doc! { "user_id": 1, "is_active": 1 })
                .build();
            self.db
                .collection::<Document>(NEWS_ALERTS)
                .create_index(model, None)
                .await?;
        }

        // notifications: newest-first per user, one per (alert, article)
        {
            let col = self.db.collection::<Document>(NOTIFICATIONS);
            col.create_index(
                IndexModel::builder()
                    .keys(doc! { "user_id": 1, "created_at": -1 })
                    .build(),
                None,
            )
            .await?;

            let dedupe = IndexModel::builder()
                .keys(doc! { "alert_id": 1, "article_key": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "article_key": { "$exists": true } })
                        .build(),
                )
                .build();
            col.create_index(dedupe, None).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl UserStore for MongoStore {
    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users()
            .insert_one(user, None)
            .await
            .map_err(|e| StoreError::from_write(e, &format!("user {}", user.email)))?;
        Ok(())
    }

    async fn find_user(&self, id: ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }
}

#[async_trait]
impl AlertStore for MongoStore {
    async fn insert_price_alert(&self, alert: &PriceAlert) -> StoreResult<()> {
        self.price_alerts().insert_one(alert, None).await?;
        Ok(())
    }

    async fn list_price_alerts(&self, user_id: ObjectId, active_only: bool) -> StoreResult<Vec<PriceAlert>> {
        let cursor = self
            .price_alerts()
            .find(owned_filter(user_id, active_only), newest_first())
            .await?;
        collect(cursor).await
    }

    async fn update_price_alert(
        &self,
        user_id: ObjectId,
        id: ObjectId,
        patch: PriceAlertPatch,
    ) -> StoreResult<Option<PriceAlert>> {
        let mut set = doc! { "updated_at": Utc::now().timestamp_millis() };
        if let Some(active) = patch.is_active {
            set.insert("is_active", active);
        }

        Ok(self
            .price_alerts()
            .find_one_and_update(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": set },
                return_after(),
            )
            .await?)
    }

    async fn delete_price_alert(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool> {
        let res = self
            .price_alerts()
            .delete_one(doc! { "_id": id, "user_id": user_id }, None)
            .await?;
        Ok(res.deleted_count > 0)
    }

    async fn pending_price_alerts(&self) -> StoreResult<SweepBatch<PriceAlert>> {
        self.sweep_rows(PRICE_ALERTS, doc! { "is_active": true, "triggered": false })
            .await
    }

    async fn trigger_price_alert(
        &self,
        id: ObjectId,
        at: i64,
        notification: &AlertNotification,
    ) -> StoreResult<bool> {
        let res = self
            .price_alerts()
            .update_one(
                doc! { "_id": id, "is_active": true, "triggered": false },
                doc! { "$set": { "triggered": true, "triggered_at": at, "updated_at": at } },
                None,
            )
            .await?;

        if res.modified_count == 0 {
            return Ok(false);
        }

        if let Err(e) = self.notifications().insert_one(notification, None).await {
            // put the alert back so the next sweep can fire it
            let undo = self
                .price_alerts()
                .update_one(
                    doc! { "_id": id, "triggered": true, "triggered_at": at },
                    doc! { "$set": { "triggered": false, "triggered_at": Bson::Null } },
                    None,
                )
                .await;
            if let Err(undo_err) = undo {
                tracing::error!(alert_id = %id, error = %undo_err, "could not re-arm alert after failed notification");
            }
            return Err(e.into());
        }
        Ok(true)
    }

    async fn insert_news_alert(&self, alert: &NewsAlert) -> StoreResult<()> {
        self.news_alerts().insert_one(alert, None).await?;
        Ok(())
    }

    async fn list_news_alerts(&self, user_id: ObjectId, active_only: bool) -> StoreResult<Vec<NewsAlert>> {
        let cursor = self
            .news_alerts()
            .find(owned_filter(user_id, active_only), newest_first())
            .await?;
        collect(cursor).await
    }

    async fn update_news_alert(
        &self,
        user_id: ObjectId,
        id: ObjectId,
        patch: NewsAlertPatch,
    ) -> StoreResult<Option<NewsAlert>> {
        let mut set = doc! { "updated_at": Utc::now().timestamp_millis() };
        if let Some(active) = patch.is_active {
            set.insert("is_active", active);
        }
        if let Some(keywords) = patch.keywords {
            set.insert("keywords", keywords);
        }

        Ok(self
            .news_alerts()
            .find_one_and_update(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": set },
                return_after(),
            )
            .await?)
    }

    async fn delete_news_alert(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool> {
        let res = self
            .news_alerts()
            .delete_one(doc! { "_id": id, "user_id": user_id }, None)
            .await?;
        Ok(res.deleted_count > 0)
    }

    async fn active_news_alerts(&self) -> StoreResult<SweepBatch<NewsAlert>> {
        self.sweep_rows(NEWS_ALERTS, doc! { "is_active": true }).await
    }

    async fn insert_news_notification(&self, notification: &AlertNotification) -> StoreResult<bool> {
        match self.notifications().insert_one(notification, None).await {
            Ok(_) => Ok(true),
            Err(e) => match StoreError::from_write(e, "news notification") {
                StoreError::Duplicate(_) => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn list_notifications(&self, user_id: ObjectId, limit: usize) -> StoreResult<Vec<AlertNotification>> {
        let opts = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .limit(limit as i64)
            .build();
        let cursor = self
            .notifications()
            .find(doc! { "user_id": user_id }, opts)
            .await?;
        collect(cursor).await
    }

    async fn mark_notification_read(&self, user_id: ObjectId, id: ObjectId) -> StoreResult<bool> {
        let res = self
            .notifications()
            .update_one(
                doc! { "_id": id, "user_id": user_id },
                doc! { "$set": { "is_read": true } },
                None,
            )
            .await?;
        Ok(res.matched_count > 0)
    }

    async fn mark_all_notifications_read(&self, user_id: ObjectId) -> StoreResult<u64> {
        let res = self
            .notifications()
            .update_many(
                doc! { "user_id": user_id, "is_read": false },
                doc! { "$set": { "is_read": true } },
                None,
            )
            .await?;
        Ok(res.modified_count)
    }

    async fn alert_stats(&self, user_id: ObjectId) -> StoreResult<AlertStats> {
        let price = self.price_alerts();
        let total_price_alerts = price.count_documents(doc! { "user_id": user_id }, None).await?;
        let active_price_alerts = price
            .count_documents(doc! { "user_id": user_id, "is_active": true }, None)
            .await?;
        let total_news_alerts = self
            .news_alerts()
            .count_documents(doc! { "user_id": user_id, "is_active": true }, None)
            .await?;
        let unread_notifications = self
            .notifications()
            .count_documents(doc! { "user_id": user_id, "is_read": false }, None)
            .await?;

        Ok(AlertStats {
            total_price_alerts,
            active_price_alerts,
            total_news_alerts,
            unread_notifications,
        })
    }
}
