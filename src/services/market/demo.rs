use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::{Analyst, MarketData, NewsSource, ProviderResult};
use crate::models::{
    market::{GrowthItem, ManagementMember, Outlook, RiskItem, Sentiment, Severity},
    AiAnalysis, CompanyOverview, NewsArticle, Quote, SearchMatch,
};

/// Deterministic sample data used when no API keys are configured and as the
/// last entry of the dashboard fallback chain.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoData;

const COMPANIES: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com Inc."),
    ("TSLA", "Tesla Inc."),
    ("META", "Meta Platforms Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("NFLX", "Netflix Inc."),
    ("CRM", "Salesforce Inc."),
    ("ORCL", "Oracle Corporation"),
];

fn s(v: &str) -> Option<String> {
    Some(v.to_string())
}

fn quote(symbol: &str, price: f64, change: f64, change_percent: f64, volume: u64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        price,
        change,
        change_percent,
        volume,
    }
}

fn member(name: &str, position: &str, background: &str) -> ManagementMember {
    ManagementMember {
        name: name.into(),
        position: position.into(),
        background: background.into(),
    }
}

fn growth(category: &str, description: &str, kind: Outlook) -> GrowthItem {
    GrowthItem {
        category: category.into(),
        description: description.into(),
        kind,
    }
}

fn risk(category: &str, description: &str, severity: Severity) -> RiskItem {
    RiskItem {
        category: category.into(),
        description: description.into(),
        severity,
    }
}

impl DemoData {
    pub fn demo_quote(symbol: &str) -> Quote {
        let sym = symbol.to_uppercase();
        match sym.as_str() {
            "AAPL" => quote("AAPL", 227.52, 3.25, 1.45, 89_234_567),
            "MSFT" => quote("MSFT", 445.23, -2.17, -0.48, 23_456_789),
            "GOOGL" => quote("GOOGL", 179.85, 1.92, 1.08, 45_678_901),
            "TSLA" => quote("TSLA", 248.50, -5.75, -2.26, 78_901_234),
            _ => quote(&sym, 150.00, 2.50, 1.70, 12_345_678),
        }
    }

    pub fn demo_overview(symbol: &str) -> CompanyOverview {
        let sym = symbol.to_uppercase();
        match sym.as_str() {
            "AAPL" => CompanyOverview {
                symbol: sym,
                name: "Apple Inc.".into(),
                description: s("Apple Inc. designs, manufactures, and markets smartphones, personal computers, tablets, wearables, and accessories worldwide. It also sells various related services."),
                industry: s("Consumer Electronics"),
                sector: s("Technology"),
                market_capitalization: s("3485000000000"),
                pe_ratio: s("29.85"),
                peg_ratio: s("2.54"),
                price_to_book_ratio: s("54.1"),
                eps: s("6.13"),
                revenue_ttm: s("385603000000"),
                gross_profit_ttm: s("169148000000"),
                profit_margin: s("0.2531"),
                quarterly_revenue_growth_yoy: s("-0.043"),
                dividend_yield: s("0.0044"),
                dividend_per_share: s("0.25"),
                dividend_date: s("2024-11-14"),
                beta: s("1.24"),
                fifty_two_week_high: s("237.23"),
                fifty_two_week_low: s("164.08"),
                analyst_target_price: s("234.50"),
            },
            "MSFT" => CompanyOverview {
                symbol: sym,
                name: "Microsoft Corporation".into(),
                description: s("Microsoft Corporation develops, licenses, and supports software, services, devices, and solutions worldwide."),
                industry: s("Software"),
                sector: s("Technology"),
                market_capitalization: s("3312000000000"),
                pe_ratio: s("35.12"),
                peg_ratio: s("2.89"),
                price_to_book_ratio: s("34.1"),
                eps: s("12.05"),
                revenue_ttm: s("245122000000"),
                gross_profit_ttm: s("169721000000"),
                profit_margin: s("0.3621"),
                quarterly_revenue_growth_yoy: s("0.156"),
                dividend_yield: s("0.0074"),
                dividend_per_share: s("0.83"),
                dividend_date: s("2024-12-12"),
                beta: s("0.89"),
                fifty_two_week_high: s("468.35"),
                fifty_two_week_low: s("309.45"),
                analyst_target_price: s("475.00"),
            },
            _ => CompanyOverview {
                name: COMPANIES
                    .iter()
                    .find(|(sy, _)| *sy == sym)
                    .map(|(_, n)| n.to_string())
                    .unwrap_or_else(|| format!("{sym} Company")),
                symbol: sym,
                description: s("A technology company focused on innovative solutions and market growth."),
                industry: s("Technology"),
                sector: s("Technology"),
                market_capitalization: s("125000000000"),
                pe_ratio: s("22.5"),
                peg_ratio: s("1.8"),
                price_to_book_ratio: s("18.5"),
                eps: s("6.75"),
                revenue_ttm: s("75000000000"),
                gross_profit_ttm: s("35000000000"),
                profit_margin: s("0.15"),
                quarterly_revenue_growth_yoy: s("0.12"),
                dividend_yield: s("0.0133"),
                dividend_per_share: s("0.50"),
                dividend_date: s("2024-12-15"),
                beta: s("1.15"),
                fifty_two_week_high: s("175.00"),
                fifty_two_week_low: s("95.50"),
                analyst_target_price: s("165.00"),
            },
        }
    }

    pub fn demo_news(symbol: &str, company_name: &str) -> Vec<NewsArticle> {
        let now = Utc::now();
        let item = |title: String, summary: String, days: i64, sentiment: Sentiment| NewsArticle {
            title,
            summary,
            date: (now - Duration::days(days)).to_rfc3339(),
            url: None,
            sentiment,
        };

        vec![
            item(
                format!("{company_name} Reports Strong Q4 Earnings"),
                format!("{company_name} exceeded analyst expectations with strong quarterly results, driven by increased demand and operational efficiency."),
                1,
                Sentiment::Positive,
            ),
            item(
                format!("Analysts Upgrade {symbol} Price Target"),
                format!("Multiple investment firms have raised their price targets for {symbol} following recent strategic announcements."),
                3,
                Sentiment::Positive,
            ),
            item(
                format!("{company_name} Announces New Product Launch"),
                "The company unveiled its latest innovation, targeting emerging market opportunities with advanced technology.".to_string(),
                5,
                Sentiment::Neutral,
            ),
            item(
                format!("Market Volatility Affects Tech Stocks Including {symbol}"),
                format!("Broader market concerns have impacted technology stocks, with {symbol} experiencing some downward pressure."),
                7,
                Sentiment::Negative,
            ),
        ]
    }

    pub fn demo_analysis(symbol: &str) -> AiAnalysis {
        match symbol.to_uppercase().as_str() {
            "AAPL" => AiAnalysis {
                risk_score: 4,
                analysis: "Apple Inc. demonstrates exceptional financial strength with consistent revenue growth and strong market position in consumer electronics. Its diversified product ecosystem provides multiple revenue streams and customer retention advantages. The company faces increasing competition in key markets and regulatory scrutiny, and high valuation metrics may limit near-term appreciation.".into(),
                competitors: vec!["Samsung Electronics".into(), "Google (Alphabet)".into(), "Microsoft Corporation".into()],
                management_team: vec![
                    member("Tim Cook", "CEO", "Former COO with over 25 years at Apple, known for operational excellence and supply chain management."),
                    member("Luca Maestri", "CFO", "Former General Motors and Xerox executive who has overseen Apple's capital allocation strategy since 2013."),
                ],
                growth_potential: vec![
                    growth("Services Revenue", "App Store, iCloud and Apple Pay provide recurring revenue with higher margins.", Outlook::Positive),
                    growth("Emerging Markets", "Expansion in India and other developing markets offers significant growth potential.", Outlook::Positive),
                    growth("AR/VR Technology", "Augmented and virtual reality could open new product categories.", Outlook::Neutral),
                ],
                risks: vec![
                    risk("Market Saturation", "Smartphone market maturity in developed countries may limit iPhone growth.", Severity::Medium),
                    risk("Regulatory Pressure", "Antitrust scrutiny and App Store regulation could impact services revenue.", Severity::Medium),
                    risk("Supply Chain Dependencies", "Reliance on Asian suppliers creates geopolitical risks.", Severity::Low),
                ],
            },
            "MSFT" => AiAnalysis {
                risk_score: 3,
                analysis: "Microsoft Corporation is a dominant force in enterprise software and cloud computing, with Azure as a key growth driver. Subscription models provide predictable revenue, and leadership in AI and cloud positions the company well for future growth.".into(),
                competitors: vec!["Amazon Web Services".into(), "Google Cloud".into(), "Oracle Corporation".into()],
                management_team: vec![
                    member("Satya Nadella", "CEO", "Transformed the company toward cloud computing and AI since 2014."),
                    member("Amy Hood", "CFO", "Instrumental in capital allocation and acquisition strategy since 2013."),
                ],
                growth_potential: vec![
                    growth("Azure Cloud Services", "Rapidly growing cloud infrastructure with enterprise customer expansion.", Outlook::Positive),
                    growth("AI Integration", "AI-powered productivity tools across the product line.", Outlook::Positive),
                ],
                risks: vec![
                    risk("Cloud Competition", "Competition from AWS and Google Cloud could pressure margins.", Severity::Medium),
                    risk("Economic Sensitivity", "Enterprise spending may decline during downturns.", Severity::Low),
                ],
            },
            _ => AiAnalysis {
                risk_score: 5,
                analysis: "This company operates in a competitive technology sector with both growth opportunities and market challenges. It shows reasonable financial metrics and market positioning, though detailed analysis would require a more comprehensive data review.".into(),
                competitors: vec!["Industry Leader A".into(), "Market Competitor B".into(), "Tech Company C".into()],
                management_team: vec![
                    member("John Smith", "CEO", "Experienced technology executive with a track record of leading growth initiatives."),
                    member("Sarah Johnson", "CFO", "Financial expert with extensive experience in corporate finance and capital markets."),
                ],
                growth_potential: vec![
                    growth("Market Expansion", "Opportunities to expand into new geographical markets and customer segments.", Outlook::Positive),
                    growth("Product Innovation", "Research and development could lead to new product offerings.", Outlook::Neutral),
                ],
                risks: vec![
                    risk("Market Competition", "Pressure from established players may impact market share and pricing power.", Severity::Medium),
                    risk("Technology Disruption", "Rapid technological change could make current products obsolete.", Severity::Medium),
                ],
            },
        }
    }
}

#[async_trait]
impl MarketData for DemoData {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn quote(&self, symbol: &str) -> ProviderResult<Quote> {
        Ok(Self::demo_quote(symbol))
    }

    async fn overview(&self, symbol: &str) -> ProviderResult<CompanyOverview> {
        Ok(Self::demo_overview(symbol))
    }

    async fn search(&self, query: &str) -> ProviderResult<Vec<SearchMatch>> {
        let term = query.trim().to_lowercase();
        Ok(COMPANIES
            .iter()
            .filter(|(sym, name)| {
                sym.to_lowercase().contains(&term) || name.to_lowercase().contains(&term)
            })
            .map(|(sym, name)| SearchMatch {
                symbol: sym.to_string(),
                name: name.to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl NewsSource for DemoData {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn recent_news(&self, symbol: &str, company_name: &str) -> ProviderResult<Vec<NewsArticle>> {
        Ok(Self::demo_news(symbol, company_name))
    }
}

#[async_trait]
impl Analyst for DemoData {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn analyze_company(
        &self,
        quote: &Quote,
        _overview: &CompanyOverview,
        _news: &[NewsArticle],
    ) -> ProviderResult<AiAnalysis> {
        Ok(Self::demo_analysis(&quote.symbol))
    }

    async fn score_sentiment(&self, news: Vec<NewsArticle>) -> ProviderResult<Vec<NewsArticle>> {
        Ok(news)
    }
}
