//! Background evaluation of price and news alerts.
//!
//! A sweep reads every pending price alert and every active news alert,
//! fetches one quote (or one news window) per distinct symbol, and turns
//! matches into notifications. Failures are isolated per symbol and per
//! alert; the next sweep is the retry.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use futures_util::{stream, StreamExt};
use mongodb::bson::oid::ObjectId;
use tokio::{task::JoinHandle, time};

use crate::{
    error::ProviderError,
    events::{AppEvent, EventSender, ALERTS_UPDATED, NOTIFICATIONS_UPDATED},
    models::{
        AlertNotification, AlertType, NewsAlert, NewsArticle, NotificationKind, PriceAlert, Quote,
    },
    services::{
        market::{MarketData, NewsSource, ProviderResult},
        store::AlertStore,
    },
};

/// Articles considered per symbol and sweep.
pub const NEWS_WINDOW: usize = 5;

#[derive(Debug, thiserror::Error)]
#[error("alert {id} is missing {field}")]
pub struct MalformedAlert {
    pub id: ObjectId,
    pub field: &'static str,
}

/// Returns the notification message when `quote` satisfies the alert.
pub fn evaluate_price_alert(alert: &PriceAlert, quote: &Quote) -> Result<Option<String>, MalformedAlert> {
    let sym = &alert.symbol;
    let price = quote.price;

    let missing = |field| MalformedAlert { id: alert.id, field };

    let message = match alert.alert_type {
        AlertType::Above => {
            let target = alert.target_price.ok_or_else(|| missing("targetPrice"))?;
            (price >= target).then(|| {
                format!("{sym} has reached your target price of ${target:.2}. Current price: ${price:.2}")
            })
        }
        AlertType::Below => {
            let target = alert.target_price.ok_or_else(|| missing("targetPrice"))?;
            (price <= target).then(|| {
                format!("{sym} has dropped to your alert price of ${target:.2}. Current price: ${price:.2}")
            })
        }
        AlertType::ChangePercent => {
            let threshold = alert.change_percent.ok_or_else(|| missing("changePercent"))?;
            let moved = quote.change_percent;
            (moved.abs() >= threshold).then(|| {
                let direction = if moved >= 0.0 { "increased" } else { "decreased" };
                format!(
                    "{sym} has {direction} by {:.2}% today, past your {threshold:.2}% threshold. Current price: ${price:.2}",
                    moved.abs()
                )
            })
        }
    };

    Ok(message)
}

/// First keyword (in the alert's order) found in the article's title or summary.
pub fn match_article<'a>(keywords: &'a [String], article: &NewsArticle) -> Option<&'a str> {
    let haystack = format!("{} {}", article.title, article.summary).to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim())
        .find(|k| !k.is_empty() && haystack.contains(&k.to_lowercase()))
}

/// Counters for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub price_alerts_checked: usize,
    pub triggered: usize,
    pub news_alerts_checked: usize,
    pub news_notifications: usize,
    pub failures: usize,
}

impl SweepReport {
    fn absorb(&mut self, other: SweepReport) {
        self.price_alerts_checked += other.price_alerts_checked;
        self.triggered += other.triggered;
        self.news_alerts_checked += other.news_alerts_checked;
        self.news_notifications += other.news_notifications;
        self.failures += other.failures;
    }
}

fn group_by_symbol<T>(items: Vec<T>, symbol: impl Fn(&T) -> &str) -> BTreeMap<String, Vec<T>> {
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(symbol(&item).to_string()).or_default().push(item);
    }
    groups
}

pub struct AlertEvaluator {
    store: Arc<dyn AlertStore>,
    market: Arc<dyn MarketData>,
    news: Arc<dyn NewsSource>,
    timeout: Duration,
    concurrency: usize,
    events_tx: Option<EventSender>,
}

impl AlertEvaluator {
    pub fn new(
        store: Arc<dyn AlertStore>,
        market: Arc<dyn MarketData>,
        news: Arc<dyn NewsSource>,
    ) -> Self {
        Self {
            store,
            market,
            news,
            timeout: Duration::from_secs(10),
            concurrency: 4,
            events_tx: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_events(mut self, tx: EventSender) -> Self {
        self.events_tx = Some(tx);
        self
    }

    fn publish(&self, user_id: ObjectId, names: &[&'static str]) {
        if let Some(tx) = &self.events_tx {
            for name in names {
                // no subscribers is fine
                let _ = tx.send(AppEvent::new(user_id, *name));
            }
        }
    }

    fn timed_out(&self, provider: &'static str) -> ProviderError {
        ProviderError::Timeout {
            provider,
            secs: self.timeout.as_secs().max(1),
        }
    }

    async fn fetch_quote(&self, symbol: &str) -> ProviderResult<Quote> {
        match time::timeout(self.timeout, self.market.quote(symbol)).await {
            Ok(res) => res,
            Err(_) => Err(self.timed_out(self.market.name())),
        }
    }

    async fn fetch_news(&self, symbol: &str) -> ProviderResult<Vec<NewsArticle>> {
        match time::timeout(self.timeout, self.news.recent_news(symbol, symbol)).await {
            Ok(res) => res,
            Err(_) => Err(self.timed_out(self.news.name())),
        }
    }

    /// One full pass over price alerts, then news alerts.
    pub async fn run_sweep(&self) -> SweepReport {
        let mut report = self.run_price_sweep().await;
        report.absorb(self.run_news_sweep().await);

        tracing::info!(
            price_alerts = report.price_alerts_checked,
            triggered = report.triggered,
            news_alerts = report.news_alerts_checked,
            news_notifications = report.news_notifications,
            failures = report.failures,
            "alert sweep finished"
        );
        report
    }

    pub async fn run_price_sweep(&self) -> SweepReport {
        let pending = match self.store.pending_price_alerts().await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "could not load pending price alerts");
                return SweepReport {
                    failures: 1,
                    ..Default::default()
                };
            }
        };

        if pending.skipped > 0 {
            tracing::warn!(skipped = pending.skipped, "some price alerts could not be read");
        }
        let start = SweepReport {
            failures: pending.skipped,
            ..Default::default()
        };
        let groups = group_by_symbol(pending.items, |a| a.symbol.as_str());

        stream::iter(groups)
            .map(|(symbol, alerts)| self.check_price_group(symbol, alerts))
            .buffer_unordered(self.concurrency)
            .fold(start, |mut acc, r| async move {
                acc.absorb(r);
                acc
            })
            .await
    }

    async fn check_price_group(&self, symbol: String, alerts: Vec<PriceAlert>) -> SweepReport {
        let mut report = SweepReport {
            price_alerts_checked: alerts.len(),
            ..Default::default()
        };

        let quote = match self.fetch_quote(&symbol).await {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(%symbol, alerts = alerts.len(), error = %e, "quote failed, skipping symbol");
                report.failures += 1;
                return report;
            }
        };

        if !quote.price.is_finite() || quote.price <= 0.0 || !quote.change_percent.is_finite() {
            tracing::warn!(%symbol, price = quote.price, "unusable quote, skipping symbol");
            report.failures += 1;
            return report;
        }

        for alert in alerts {
            let message = match evaluate_price_alert(&alert, &quote) {
                Ok(Some(m)) => m,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!(%symbol, alert_id = %alert.id, error = %e, "malformed price alert");
                    report.failures += 1;
                    continue;
                }
            };

            let now = chrono::Utc::now().timestamp_millis();
            let notification = AlertNotification::new(
                alert.user_id,
                alert.id,
                NotificationKind::Price,
                &alert.symbol,
                format!("Price Alert: {}", alert.symbol),
                message,
                now,
            );

            match self.store.trigger_price_alert(alert.id, now, &notification).await {
                Ok(true) => {
                    tracing::info!(%symbol, alert_id = %alert.id, price = quote.price, "price alert triggered");
                    report.triggered += 1;
                    self.publish(alert.user_id, &[ALERTS_UPDATED, NOTIFICATIONS_UPDATED]);
                }
                Ok(false) => {
                    tracing::debug!(alert_id = %alert.id, "price alert already handled");
                }
                Err(e) => {
                    tracing::warn!(%symbol, alert_id = %alert.id, error = %e, "could not record trigger");
                    report.failures += 1;
                }
            }
        }

        report
    }

    pub async fn run_news_sweep(&self) -> SweepReport {
        let active = match self.store.active_news_alerts().await {
            Ok(a) => a,
            Err(e) => {
                tracing::warn!(error = %e, "could not load active news alerts");
                return SweepReport {
                    failures: 1,
                    ..Default::default()
                };
            }
        };

        if active.skipped > 0 {
            tracing::warn!(skipped = active.skipped, "some news alerts could not be read");
        }
        let start = SweepReport {
            failures: active.skipped,
            ..Default::default()
        };
        let groups = group_by_symbol(active.items, |a| a.symbol.as_str());

        stream::iter(groups)
            .map(|(symbol, alerts)| self.check_news_group(symbol, alerts))
            .buffer_unordered(self.concurrency)
            .fold(start, |mut acc, r| async move {
                acc.absorb(r);
                acc
            })
            .await
    }

    async fn check_news_group(&self, symbol: String, alerts: Vec<NewsAlert>) -> SweepReport {
        let mut report = SweepReport {
            news_alerts_checked: alerts.len(),
            ..Default::default()
        };

        let articles = match self.fetch_news(&symbol).await {
            Ok(mut a) => {
                a.truncate(NEWS_WINDOW);
                a
            }
            Err(e) => {
                tracing::warn!(%symbol, alerts = alerts.len(), error = %e, "news fetch failed, skipping symbol");
                report.failures += 1;
                return report;
            }
        };

        for alert in &alerts {
            let mut notified = false;

            for article in &articles {
                let Some(keyword) = match_article(&alert.keywords, article) else {
                    continue;
                };

                let notification = AlertNotification::new(
                    alert.user_id,
                    alert.id,
                    NotificationKind::News,
                    &alert.symbol,
                    format!("News Alert: {}", alert.symbol),
                    format!("New article mentioning \"{keyword}\": {}", article.title),
                    chrono::Utc::now().timestamp_millis(),
                )
                .with_article_key(article.key());

                match self.store.insert_news_notification(&notification).await {
                    Ok(true) => {
                        report.news_notifications += 1;
                        notified = true;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!(%symbol, alert_id = %alert.id, error = %e, "could not record news notification");
                        report.failures += 1;
                    }
                }
            }

            if notified {
                self.publish(alert.user_id, &[NOTIFICATIONS_UPDATED]);
            }
        }

        report
    }
}

/// Runs a sweep every `every`. Ticks missed while a slow sweep is running are skipped.
pub fn spawn_alert_monitor(evaluator: Arc<AlertEvaluator>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            evaluator.run_sweep().await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::market::Sentiment;

    fn alert(alert_type: AlertType, target: Option<f64>, pct: Option<f64>) -> PriceAlert {
        PriceAlert {
            id: ObjectId::new(),
            user_id: ObjectId::new(),
            symbol: "AAPL".into(),
            alert_type,
            target_price: target,
            change_percent: pct,
            is_active: true,
            triggered: false,
            triggered_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn quote(price: f64, change_percent: f64) -> Quote {
        Quote {
            symbol: "AAPL".into(),
            price,
            change: 0.0,
            change_percent,
            volume: 0,
        }
    }

    fn article(title: &str, summary: &str) -> NewsArticle {
        NewsArticle {
            title: title.into(),
            summary: summary.into(),
            date: String::new(),
            url: None,
            sentiment: Sentiment::Neutral,
        }
    }

    #[test]
    fn above_fires_at_or_over_target() {
        let a = alert(AlertType::Above, Some(200.0), None);
        assert!(evaluate_price_alert(&a, &quote(199.99, 0.0)).unwrap().is_none());
        assert!(evaluate_price_alert(&a, &quote(200.0, 0.0)).unwrap().is_some());

        let msg = evaluate_price_alert(&a, &quote(201.5, 0.0)).unwrap().unwrap();
        assert!(msg.contains("AAPL"));
        assert!(msg.contains("$201.50"));
        assert!(msg.contains("$200.00"));
    }

    #[test]
    fn below_fires_at_or_under_target() {
        let a = alert(AlertType::Below, Some(150.0), None);
        assert!(evaluate_price_alert(&a, &quote(150.01, 0.0)).unwrap().is_none());
        assert!(evaluate_price_alert(&a, &quote(150.0, 0.0)).unwrap().is_some());
        assert!(evaluate_price_alert(&a, &quote(120.0, 0.0)).unwrap().is_some());
    }

    #[test]
    fn change_percent_uses_absolute_move() {
        let a = alert(AlertType::ChangePercent, None, Some(2.0));
        assert!(evaluate_price_alert(&a, &quote(100.0, 1.99)).unwrap().is_none());
        assert!(evaluate_price_alert(&a, &quote(100.0, -1.99)).unwrap().is_none());

        let up = evaluate_price_alert(&a, &quote(100.0, 2.5)).unwrap().unwrap();
        assert!(up.contains("increased by 2.50%"));

        let down = evaluate_price_alert(&a, &quote(100.0, -3.0)).unwrap().unwrap();
        assert!(down.contains("decreased by 3.00%"));
    }

    #[test]
    fn missing_threshold_is_reported() {
        let a = alert(AlertType::Above, None, None);
        assert!(evaluate_price_alert(&a, &quote(1.0, 0.0)).is_err());
    }

    #[test]
    fn first_keyword_wins_case_insensitively() {
        let kws = vec!["merger".to_string(), "EARNINGS".to_string(), "beat".to_string()];
        let a = article("Company Reports Earnings Beat", "");
        assert_eq!(match_article(&kws, &a), Some("EARNINGS"));

        let none = vec!["merger".to_string()];
        assert_eq!(match_article(&none, &a), None);
    }

    #[test]
    fn summary_is_searched_too() {
        let kws = vec!["buyback".to_string()];
        let a = article("Quarterly update", "The board approved a new Buyback program");
        assert_eq!(match_article(&kws, &a), Some("buyback"));
    }
}
