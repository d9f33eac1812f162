use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{clean_field, MarketData, ProviderResult};
use crate::{
    error::ProviderError,
    models::{CompanyOverview, Quote, SearchMatch},
};

const PROVIDER: &str = "Alpha Vantage";
const BASE_URL: &str = "https://www.alphavantage.co";

#[derive(Clone)]
pub struct AlphaVantageClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
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

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn query(&self, params: &[(&str, &str)]) -> ProviderResult<serde_json::Value> {
        if !self.has_key() {
            return Err(ProviderError::MissingApiKey(PROVIDER));
        }

        let url = format!("{}/query", self.base_url);
        let res = self
            .http
            .get(url)
            .query(params)
            .query(&[("apikey", self.api_key.as_str())])
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

        let data: serde_json::Value = res.json().await?;

        // throttling and bad symbols come back as 200 with a message body
        for key in ["Error Message", "Note", "Information"] {
            if let Some(msg) = data.get(key).and_then(|v| v.as_str()) {
                return Err(ProviderError::invalid(PROVIDER, msg));
            }
        }

        Ok(data)
    }
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteWire {
    #[serde(rename = "01. symbol")]
    symbol: String,
    #[serde(rename = "05. price")]
    price: String,
    #[serde(rename = "06. volume", default)]
    volume: String,
    #[serde(rename = "09. change")]
    change: String,
    #[serde(rename = "10. change percent")]
    change_percent: String,
}

fn parse_num(raw: &str, field: &str) -> ProviderResult<f64> {
    let v: f64 = raw
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| ProviderError::invalid(PROVIDER, format!("bad {field}: '{raw}'")))?;
    if !v.is_finite() {
        return Err(ProviderError::invalid(PROVIDER, format!("bad {field}: '{raw}'")));
    }
    Ok(v)
}

impl GlobalQuoteWire {
    fn into_quote(self) -> ProviderResult<Quote> {
        Ok(Quote {
            price: parse_num(&self.price, "price")?,
            change: parse_num(&self.change, "change")?,
            change_percent: parse_num(&self.change_percent, "change percent")?,
            volume: self.volume.trim().parse().unwrap_or(0),
            symbol: self.symbol,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OverviewWire {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    description: Option<String>,
    industry: Option<String>,
    sector: Option<String>,
    market_capitalization: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "PEGRatio")]
    peg_ratio: Option<String>,
    price_to_book_ratio: Option<String>,
    #[serde(rename = "EPS")]
    eps: Option<String>,
    #[serde(rename = "RevenueTTM")]
    revenue_ttm: Option<String>,
    #[serde(rename = "GrossProfitTTM")]
    gross_profit_ttm: Option<String>,
    profit_margin: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY")]
    quarterly_revenue_growth_yoy: Option<String>,
    dividend_yield: Option<String>,
    dividend_per_share: Option<String>,
    dividend_date: Option<String>,
    beta: Option<String>,
    #[serde(rename = "52WeekHigh")]
    fifty_two_week_high: Option<String>,
    #[serde(rename = "52WeekLow")]
    fifty_two_week_low: Option<String>,
    analyst_target_price: Option<String>,
}

fn keep(v: Option<String>) -> Option<String> {
    clean_field(v.as_deref()).map(str::to_string)
}

#[derive(Debug, Deserialize)]
struct SearchWire {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SearchItemWire>,
}

#[derive(Debug, Deserialize)]
struct SearchItemWire {
    #[serde(rename = "1. symbol")]
    symbol: String,
    #[serde(rename = "2. name")]
    name: String,
}

#[async_trait]
impl MarketData for AlphaVantageClient {
    fn name(&self) -> &'static str {
        "alpha_vantage"
    }

    async fn quote(&self, symbol: &str) -> ProviderResult<Quote> {
        let sym = symbol.to_uppercase();
        let mut data = self
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", sym.as_str())])
            .await?;

        let raw = data
            .get_mut("Global Quote")
            .map(serde_json::Value::take)
            .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
            .ok_or_else(|| ProviderError::invalid(PROVIDER, format!("no quote for {sym}")))?;

        let wire: GlobalQuoteWire = serde_json::from_value(raw)
            .map_err(|e| ProviderError::invalid(PROVIDER, e.to_string()))?;
        wire.into_quote()
    }

    async fn overview(&self, symbol: &str) -> ProviderResult<CompanyOverview> {
        let sym = symbol.to_uppercase();
        let data = self
            .query(&[("function", "OVERVIEW"), ("symbol", sym.as_str())])
            .await?;

        let w: OverviewWire = serde_json::from_value(data)
            .map_err(|e| ProviderError::invalid(PROVIDER, e.to_string()))?;

        let Some(symbol) = keep(w.symbol) else {
            return Err(ProviderError::invalid(PROVIDER, format!("no overview for {sym}")));
        };

        Ok(CompanyOverview {
            name: keep(w.name).unwrap_or_else(|| symbol.clone()),
            symbol,
            description: keep(w.description),
            industry: keep(w.industry),
            sector: keep(w.sector),
            market_capitalization: keep(w.market_capitalization),
            pe_ratio: keep(w.pe_ratio),
            peg_ratio: keep(w.peg_ratio),
            price_to_book_ratio: keep(w.price_to_book_ratio),
            eps: keep(w.eps),
            revenue_ttm: keep(w.revenue_ttm),
            gross_profit_ttm: keep(w.gross_profit_ttm),
            profit_margin: keep(w.profit_margin),
            quarterly_revenue_growth_yoy: keep(w.quarterly_revenue_growth_yoy),
            dividend_yield: keep(w.dividend_yield),
            dividend_per_share: keep(w.dividend_per_share),
            dividend_date: keep(w.dividend_date),
            beta: keep(w.beta),
            fifty_two_week_high: keep(w.fifty_two_week_high),
            fifty_two_week_low: keep(w.fifty_two_week_low),
            analyst_target_price: keep(w.analyst_target_price),
        })
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchMatch>> {
        let data = self
            .query(&[("function", "SYMBOL_SEARCH"), ("keywords", query)])
            .await?;

        let wire: SearchWire = serde_json::from_value(data)
            .map_err(|e| ProviderError::invalid(PROVIDER, e.to_string()))?;

        Ok(wire
            .best_matches
            .into_iter()
            .filter(|m| !m.symbol.trim().is_empty())
            .take(10)
            .map(|m| SearchMatch {
                symbol: m.symbol,
                name: m.name,
            })
            .collect())
    }
}
