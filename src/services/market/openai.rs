use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{Analyst, ProviderResult};
use crate::{
    error::ProviderError,
    models::{
        market::{GrowthItem, ManagementMember, RiskItem, Sentiment},
        AiAnalysis, CompanyOverview, NewsArticle, Quote,
    },
};

const PROVIDER: &str = "OpenAI";
const BASE_URL: &str = "https://api.openai.com";

const ANALYST_SYSTEM: &str = "You are a professional financial analyst with expertise in stock analysis and investment research. Provide thorough, objective analysis based on the provided data.";
const SENTIMENT_SYSTEM: &str = "You are a financial news sentiment analyzer. Classify each article as positive, neutral, or negative for stock performance.";

#[derive(Clone)]
pub struct OpenAiAnalyst {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

// Model output is loosely typed; everything defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct AnalysisWire {
    risk_score: Option<f64>,
    analysis: Option<String>,
    competitors: Vec<String>,
    management_team: Vec<ManagementMember>,
    growth_potential: Vec<GrowthItem>,
    risks: Vec<RiskItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SentimentWire {
    articles: Vec<SentimentItem>,
}

#[derive(Debug, Deserialize)]
struct SentimentItem {
    index: usize,
    sentiment: Sentiment,
}

/// Risk score is 1 (lowest) to 10; missing scores land in the middle.
pub fn clamp_risk_score(raw: Option<f64>) -> u8 {
    match raw {
        Some(v) if v.is_finite() => v.round().clamp(1.0, 10.0) as u8,
        _ => 5,
    }
}

fn analysis_prompt(quote: &Quote, overview: &CompanyOverview, news: &[NewsArticle]) -> String {
    let na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
    let headlines: Vec<String> = news
        .iter()
        .map(|n| format!("- {}: {}", n.title, n.summary))
        .collect();

    format!(
        r#"Analyze the following company and provide a comprehensive investment analysis in JSON format:

Company: {name} ({symbol})
Current Price: ${price}
Change: {change} ({change_pct}%)
Market Cap: {cap}
Industry: {industry}
Sector: {sector}
P/E Ratio: {pe}
EPS: {eps}
Revenue TTM: {revenue}
Profit Margin: {margin}
Dividend Yield: {dividend}
Description: {description}

Recent News Headlines:
{headlines}

Respond with a JSON object with keys "riskScore" (1-10, 1 is lowest risk), "analysis" (2-3 paragraphs),
"competitors" (array of names), "managementTeam" (array of {{name, position, background}}),
"growthPotential" (array of {{category, description, type: positive|neutral|negative}}) and
"risks" (array of {{category, description, severity: low|medium|high}})."#,
        name = overview.name,
        symbol = overview.symbol,
        price = quote.price,
        change = quote.change,
        change_pct = quote.change_percent,
        cap = na(&overview.market_capitalization),
        industry = na(&overview.industry),
        sector = na(&overview.sector),
        pe = na(&overview.pe_ratio),
        eps = na(&overview.eps),
        revenue = na(&overview.revenue_ttm),
        margin = na(&overview.profit_margin),
        dividend = na(&overview.dividend_yield),
        description = na(&overview.description),
        headlines = headlines.join("\n"),
    )
}

impl OpenAiAnalyst {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self {
            http: super::http_client(PROVIDER, timeout),
            api_key,
            model,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn complete_json(&self, system: &str, prompt: String, max_tokens: u32) -> ProviderResult<String> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(PROVIDER));
        }

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt },
            ],
            "response_format": { "type": "json_object" },
            "max_tokens": max_tokens,
        });

        let res = self
            .http
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
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

        let chat: ChatResponse = res.json().await?;
        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::invalid(PROVIDER, "empty completion"))
    }
}

#[async_trait]
impl Analyst for OpenAiAnalyst {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn analyze_company(
        &self,
        quote: &Quote,
        overview: &CompanyOverview,
        news: &[NewsArticle],
    ) -> ProviderResult<AiAnalysis> {
        let content = self
            .complete_json(ANALYST_SYSTEM, analysis_prompt(quote, overview, news), 2000)
            .await?;

        let w: AnalysisWire = serde_json::from_str(&content)
            .map_err(|e| ProviderError::invalid(PROVIDER, e.to_string()))?;

        Ok(AiAnalysis {
            risk_score: clamp_risk_score(w.risk_score),
            analysis: w
                .analysis
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| "Analysis not available".to_string()),
            competitors: w.competitors,
            management_team: w.management_team,
            growth_potential: w.growth_potential,
            risks: w.risks,
        })
    }

    async fn score_sentiment(&self, mut news: Vec<NewsArticle>) -> ProviderResult<Vec<NewsArticle>> {
        if news.is_empty() {
            return Ok(news);
        }

        let listing: Vec<String> = news
            .iter()
            .enumerate()
            .map(|(i, n)| format!("{}. Title: {}\nSummary: {}", i + 1, n.title, n.summary))
            .collect();
        let prompt = format!(
            "Analyze the sentiment of these news articles:\n\n{}\n\nReturn JSON {{\"articles\": [{{\"index\": <article number>, \"sentiment\": \"positive|neutral|negative\"}}]}}",
            listing.join("\n\n")
        );

        let content = self.complete_json(SENTIMENT_SYSTEM, prompt, 1000).await?;
        let scored: SentimentWire = serde_json::from_str(&content)
            .map_err(|e| ProviderError::invalid(PROVIDER, e.to_string()))?;

        for item in scored.articles {
            if let Some(article) = item.index.checked_sub(1).and_then(|i| news.get_mut(i)) {
                article.sentiment = item.sentiment;
            }
        }
        Ok(news)
    }
}
