use serde::{Deserialize, Serialize};

/// Point-in-time quote in the provider's reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    // daily change, percent units (1.45 == 1.45%)
    pub change_percent: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyOverview {
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub market_capitalization: Option<String>,
    pub pe_ratio: Option<String>,
    pub peg_ratio: Option<String>,
    pub price_to_book_ratio: Option<String>,
    pub eps: Option<String>,
    pub revenue_ttm: Option<String>,
    pub gross_profit_ttm: Option<String>,
    pub profit_margin: Option<String>,
    pub quarterly_revenue_growth_yoy: Option<String>,
    pub dividend_yield: Option<String>,
    pub dividend_per_share: Option<String>,
    pub dividend_date: Option<String>,
    pub beta: Option<String>,
    pub fifty_two_week_high: Option<String>,
    pub fifty_two_week_low: Option<String>,
    pub analyst_target_price: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub title: String,
    pub summary: String,
    pub date: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub sentiment: Sentiment,
}

impl NewsArticle {
    /// Stable identity used to notify an article once per news alert.
    pub fn key(&self) -> String {
        match self.url.as_deref().map(str::trim) {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => self.title.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMatch {
    pub symbol: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagementMember {
    pub name: String,
    pub position: String,
    pub background: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outlook {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthItem {
    pub category: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: Outlook,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskItem {
    pub category: String,
    pub description: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAnalysis {
    pub risk_score: u8,
    pub analysis: String,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub management_team: Vec<ManagementMember>,
    #[serde(default)]
    pub growth_potential: Vec<GrowthItem>,
    #[serde(default)]
    pub risks: Vec<RiskItem>,
}

/// Dashboard payload returned by the analyze/compare endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAnalysis {
    pub symbol: String,
    pub company_name: String,
    pub current_price: f64,
    pub price_change: f64,
    pub price_change_percent: f64,

    pub market_cap: String,
    pub volume: u64,

    pub pe_ratio: String,
    pub peg_ratio: String,
    pub pb_ratio: String,
    pub eps: String,

    pub revenue: String,
    pub net_income: String,
    pub total_debt: String,
    pub free_cash_flow: String,
    pub revenue_growth: String,
    pub profit_margin: String,

    pub dividend_yield: String,
    pub dividend_annual: String,
    pub dividend_date: String,

    pub business_description: String,
    pub industry: String,
    pub sector: String,

    pub competitors: Vec<String>,
    pub management_team: Vec<ManagementMember>,
    pub growth_potential: Vec<GrowthItem>,
    pub risks: Vec<RiskItem>,
    pub recent_news: Vec<NewsArticle>,
    pub ai_risk_score: u8,
    pub ai_analysis: String,

    pub beta: String,
    pub fifty_two_week_high: String,
    pub fifty_two_week_low: String,
    pub analyst_target_price: String,

    pub last_updated: String,
}
