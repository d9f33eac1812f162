use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{NewsSource, ProviderResult};
use crate::{
    error::ProviderError,
    models::{market::Sentiment, NewsArticle},
};

const PROVIDER: &str = "NewsAPI";
const BASE_URL: &str = "https://newsapi.org";
const PAGE_SIZE: &str = "10";

#[derive(Clone)]
pub struct NewsApiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<ArticleWire>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArticleWire {
    title: Option<String>,
    description: Option<String>,
    published_at: Option<String>,
    url: Option<String>,
}

impl NewsApiClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        Self {
            http: super::http_client(PROVIDER, timeout),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    fn name(&self) -> &'static str {
        "news_api"
    }

    async fn recent_news(&self, symbol: &str, company_name: &str) -> ProviderResult<Vec<NewsArticle>> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(PROVIDER));
        }

        let q = if company_name.trim().is_empty() || company_name.eq_ignore_ascii_case(symbol) {
            symbol.to_string()
        } else {
            format!("{symbol} OR \"{company_name}\"")
        };

        let url = format!("{}/v2/everything", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[
                ("q", q.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", PAGE_SIZE),
                ("apiKey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                provider: PROVIDER,
                status,
                body,
            });
        }

        let body: EverythingResponse = res.json().await?;

        Ok(body
            .articles
            .into_iter()
            .filter_map(|a| {
                let title = a.title.filter(|t| !t.trim().is_empty())?;
                Some(NewsArticle {
                    title,
                    summary: a.description.unwrap_or_default(),
                    date: a.published_at.unwrap_or_default(),
                    url: a.url,
                    sentiment: Sentiment::Neutral,
                })
            })
            .collect())
    }
}
