#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use http_body_util::BodyExt;
use mongodb::bson::oid::ObjectId;
use stocklens::{
    config::{Settings, StoreBackend},
    error::ProviderError,
    models::{
        market::Sentiment, CompanyOverview, CurrentUser, NewsArticle, Quote, SearchMatch,
    },
    services::{
        market::{MarketData, NewsSource, ProviderResult, Sources},
        store::MemoryStore,
    },
    AppState,
};

pub fn test_settings() -> Settings {
    Settings {
        mongodb_uri: String::new(),
        mongodb_db: String::new(),
        store_backend: StoreBackend::Memory,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "integration-test-secret".into(),
        jwt_cookie_name: "auth".into(),
        jwt_ttl_days: 1,
        cookie_secure: false,
        alpha_vantage_api_key: String::new(),
        news_api_key: String::new(),
        openai_api_key: String::new(),
        openai_model: "gpt-4o".into(),
        alert_sweep_secs: 0,
        provider_timeout_secs: 1,
        sweep_concurrency: 2,
    }
}

/// State backed by a fresh in-memory store and demo providers.
pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(test_settings(), store.clone(), store.clone(), &Sources::demo());
    (state, store)
}

pub fn user(email: &str) -> CurrentUser {
    CurrentUser {
        id: ObjectId::new(),
        email: email.to_string(),
        first_name: None,
        last_name: None,
    }
}

pub async fn response_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
}

pub fn quote(symbol: &str, price: f64, change_percent: f64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        price,
        change: 0.0,
        change_percent,
        volume: 1_000,
    }
}

pub fn article(title: &str, summary: &str, url: Option<&str>) -> NewsArticle {
    NewsArticle {
        title: title.to_string(),
        summary: summary.to_string(),
        date: "2025-01-01T00:00:00Z".to_string(),
        url: url.map(str::to_string),
        sentiment: Sentiment::Neutral,
    }
}

/// Quotes set by the test; unknown symbols fail, `hang` symbols never answer.
#[derive(Default)]
pub struct ScriptedMarket {
    quotes: Mutex<HashMap<String, Quote>>,
    hang: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl ScriptedMarket {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, q: Quote) {
        self.quotes.lock().unwrap().insert(q.symbol.clone(), q);
    }

    pub fn hang_on(&self, symbol: &str) {
        self.hang.lock().unwrap().push(symbol.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketData for ScriptedMarket {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn quote(&self, symbol: &str) -> ProviderResult<Quote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let hangs = self.hang.lock().unwrap().iter().any(|s| s == symbol);
        if hangs {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        self.quotes
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::invalid("scripted", format!("no quote for {symbol}")))
    }

    async fn overview(&self, symbol: &str) -> ProviderResult<CompanyOverview> {
        Ok(CompanyOverview {
            symbol: symbol.to_string(),
            name: format!("{symbol} Corp"),
            ..Default::default()
        })
    }

    async fn search(&self, _query: &str) -> ProviderResult<Vec<SearchMatch>> {
        Ok(Vec::new())
    }
}

/// Articles per symbol; unknown symbols fail.
#[derive(Default)]
pub struct ScriptedNews {
    articles: Mutex<HashMap<String, Vec<NewsArticle>>>,
}

impl ScriptedNews {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, symbol: &str, articles: Vec<NewsArticle>) {
        self.articles.lock().unwrap().insert(symbol.to_string(), articles);
    }
}

#[async_trait]
impl NewsSource for ScriptedNews {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn recent_news(&self, symbol: &str, _company_name: &str) -> ProviderResult<Vec<NewsArticle>> {
        self.articles
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::invalid("scripted", format!("no news for {symbol}")))
    }
}
