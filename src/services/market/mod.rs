//! Quote, fundamentals, news and LLM providers.
//!
//! Each concern is a trait so the data-source strategy can be chosen once at
//! start-up. [`Ranked`] wraps an ordered list of sources and returns the
//! first success, which is how live APIs fall back to demo data.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    error::ProviderError,
    models::{AiAnalysis, CompanyOverview, NewsArticle, Quote, SearchMatch},
};

pub mod alpha_vantage;
pub mod demo;
pub mod news_api;
pub mod openai;
pub mod sources;

pub use alpha_vantage::AlphaVantageClient;
pub use demo::DemoData;
pub use news_api::NewsApiClient;
pub use openai::OpenAiAnalyst;
pub use sources::Sources;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[async_trait]
pub trait MarketData: Send + Sync {
    fn name(&self) -> &'static str;
    async fn quote(&self, symbol: &str) -> ProviderResult<Quote>;
    async fn overview(&self, symbol: &str) -> ProviderResult<CompanyOverview>;
    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchMatch>>;
}

#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &'static str;
    /// Most recent first.
    async fn recent_news(&self, symbol: &str, company_name: &str) -> ProviderResult<Vec<NewsArticle>>;
}

#[async_trait]
pub trait Analyst: Send + Sync {
    fn name(&self) -> &'static str;
    async fn analyze_company(
        &self,
        quote: &Quote,
        overview: &CompanyOverview,
        news: &[NewsArticle],
    ) -> ProviderResult<AiAnalysis>;
    async fn score_sentiment(&self, news: Vec<NewsArticle>) -> ProviderResult<Vec<NewsArticle>>;
}

/// Sources tried in order; the first `Ok` wins.
pub struct Ranked<T: ?Sized> {
    sources: Vec<Arc<T>>,
}

impl<T: ?Sized> Ranked<T> {
    pub fn new(sources: Vec<Arc<T>>) -> Self {
        Self { sources }
    }
}

/// Shared reqwest client setup. A builder failure falls back to reqwest's
/// defaults, which have no request timeout; the sweep still bounds each call.
pub(crate) fn http_client(provider: &'static str, timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::warn!(provider, error = %e, "http client setup failed, using defaults without timeout");
        reqwest::Client::new()
    })
}

fn fell_through(kind: &str, source: &str, err: &ProviderError) {
    tracing::warn!(source, error = %err, "{kind} source failed, trying next");
}

#[async_trait]
impl MarketData for Ranked<dyn MarketData> {
    fn name(&self) -> &'static str {
        "ranked"
    }

    async fn quote(&self, symbol: &str) -> ProviderResult<Quote> {
        let mut last = ProviderError::NoSource;
        for src in &self.sources {
            match src.quote(symbol).await {
                Ok(q) => return Ok(q),
                Err(e) => {
                    fell_through("quote", src.name(), &e);
                    last = e;
                }
            }
        }
        Err(last)
    }

    async fn overview(&self, symbol: &str) -> ProviderResult<CompanyOverview> {
        let mut last = ProviderError::NoSource;
        for src in &self.sources {
            match src.overview(symbol).await {
                Ok(o) => return Ok(o),
                Err(e) => {
                    fell_through("overview", src.name(), &e);
                    last = e;
                }
            }
        }
        Err(last)
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchMatch>> {
        let mut last = ProviderError::NoSource;
        for src in &self.sources {
            match src.search(query).await {
                Ok(m) => return Ok(m),
                Err(e) => {
                    fell_through("search", src.name(), &e);
                    last = e;
                }
            }
        }
        Err(last)
    }
}

#[async_trait]
impl NewsSource for Ranked<dyn NewsSource> {
    fn name(&self) -> &'static str {
        "ranked"
    }

    async fn recent_news(&self, symbol: &str, company_name: &str) -> ProviderResult<Vec<NewsArticle>> {
        let mut last = ProviderError::NoSource;
        for src in &self.sources {
            match src.recent_news(symbol, company_name).await {
                Ok(n) => return Ok(n),
                Err(e) => {
                    fell_through("news", src.name(), &e);
                    last = e;
                }
            }
        }
        Err(last)
    }
}

#[async_trait]
impl Analyst for Ranked<dyn Analyst> {
    fn name(&self) -> &'static str {
        "ranked"
    }

    async fn analyze_company(
        &self,
        quote: &Quote,
        overview: &CompanyOverview,
        news: &[NewsArticle],
    ) -> ProviderResult<AiAnalysis> {
        let mut last = ProviderError::NoSource;
        for src in &self.sources {
            match src.analyze_company(quote, overview, news).await {
                Ok(a) => return Ok(a),
                Err(e) => {
                    fell_through("analysis", src.name(), &e);
                    last = e;
                }
            }
        }
        Err(last)
    }

    async fn score_sentiment(&self, news: Vec<NewsArticle>) -> ProviderResult<Vec<NewsArticle>> {
        let mut last = ProviderError::NoSource;
        for src in &self.sources {
            match src.score_sentiment(news.clone()).await {
                Ok(n) => return Ok(n),
                Err(e) => {
                    fell_through("sentiment", src.name(), &e);
                    last = e;
                }
            }
        }
        Err(last)
    }
}

// ---------------- formatting ----------------

/// Alpha Vantage reports missing values as "None" or "-".
pub fn clean_field(value: Option<&str>) -> Option<&str> {
    match value.map(str::trim) {
        None | Some("") | Some("None") | Some("-") => None,
        Some(v) => Some(v),
    }
}

pub fn format_value(value: Option<&str>) -> String {
    clean_field(value).unwrap_or("N/A").to_string()
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 { format!("-{out}") } else { out }
}

/// `$1.23T`, `$4.50B`, `$7.00M`, otherwise `$12,345`.
pub fn format_large_number(value: Option<&str>) -> String {
    let Some(raw) = clean_field(value) else {
        return "N/A".to_string();
    };
    let Ok(num) = raw.parse::<f64>() else {
        return "N/A".to_string();
    };

    let abs = num.abs();
    if abs >= 1e12 {
        format!("${:.2}T", num / 1e12)
    } else if abs >= 1e9 {
        format!("${:.2}B", num / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", num / 1e6)
    } else {
        format!("${}", group_thousands(num.trunc() as i64))
    }
}
