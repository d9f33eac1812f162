use chrono::Utc;
use futures_util::future::join_all;

use crate::{
    error::{AppError, AppResult, ProviderError},
    models::{
        alert::normalize_symbol, AiAnalysis, CompanyOverview, NewsArticle, Quote, SearchMatch,
        StockAnalysis,
    },
    services::market::{format_large_number, format_value},
    AppState,
};

pub const RECENT_NEWS: usize = 5;
pub const MIN_COMPARE: usize = 2;
pub const MAX_COMPARE: usize = 4;

pub async fn search(state: &AppState, query: &str) -> AppResult<Vec<SearchMatch>> {
    let q = query.trim();
    if q.is_empty() {
        return Err(AppError::Validation("Search query is required".into()));
    }

    let mut matches = state.market.search(q).await?;
    matches.truncate(10);
    Ok(matches)
}

fn or_else(value: Option<&String>, fallback: &str) -> String {
    match value.map(|s| s.trim()) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Flattens provider records into the dashboard payload.
pub fn build_analysis(
    quote: Quote,
    overview: CompanyOverview,
    news: Vec<NewsArticle>,
    ai: AiAnalysis,
) -> StockAnalysis {
    let f = |v: &Option<String>| format_value(v.as_deref());

    StockAnalysis {
        company_name: overview.name.clone(),
        current_price: quote.price,
        price_change: quote.change,
        price_change_percent: quote.change_percent,
        market_cap: format_large_number(overview.market_capitalization.as_deref()),
        volume: quote.volume,

        pe_ratio: f(&overview.pe_ratio),
        peg_ratio: f(&overview.peg_ratio),
        pb_ratio: f(&overview.price_to_book_ratio),
        eps: f(&overview.eps),

        revenue: format_large_number(overview.revenue_ttm.as_deref()),
        net_income: format_large_number(overview.gross_profit_ttm.as_deref()),
        // not part of the company overview feed
        total_debt: "N/A".into(),
        free_cash_flow: "N/A".into(),
        revenue_growth: f(&overview.quarterly_revenue_growth_yoy),
        profit_margin: f(&overview.profit_margin),

        dividend_yield: f(&overview.dividend_yield),
        dividend_annual: f(&overview.dividend_per_share),
        dividend_date: f(&overview.dividend_date),

        business_description: or_else(overview.description.as_ref(), "No description available"),
        industry: or_else(overview.industry.as_ref(), "Unknown"),
        sector: or_else(overview.sector.as_ref(), "Unknown"),

        competitors: ai.competitors,
        management_team: ai.management_team,
        growth_potential: ai.growth_potential,
        risks: ai.risks,
        recent_news: news.into_iter().take(RECENT_NEWS).collect(),
        ai_risk_score: ai.risk_score,
        ai_analysis: ai.analysis,

        beta: f(&overview.beta),
        fifty_two_week_high: f(&overview.fifty_two_week_high),
        fifty_two_week_low: f(&overview.fifty_two_week_low),
        analyst_target_price: f(&overview.analyst_target_price),

        last_updated: Utc::now().to_rfc3339(),
        symbol: quote.symbol,
    }
}

pub async fn analyze(state: &AppState, raw_symbol: &str) -> AppResult<StockAnalysis> {
    let symbol = normalize_symbol(raw_symbol)?;

    let (quote, overview) = tokio::try_join!(
        state.market.quote(&symbol),
        state.market.overview(&symbol),
    )?;

    let news = match state.news.recent_news(&symbol, &overview.name).await {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!(%symbol, error = %e, "news unavailable, continuing without it");
            Vec::new()
        }
    };

    let news = match state.analyst.score_sentiment(news.clone()).await {
        Ok(scored) => scored,
        Err(e) => {
            tracing::warn!(%symbol, error = %e, "sentiment scoring failed, using raw news");
            news
        }
    };

    let ai = state.analyst.analyze_company(&quote, &overview, &news).await?;

    tracing::info!(%symbol, risk_score = ai.risk_score, "analysis built");
    Ok(build_analysis(quote, overview, news, ai))
}

/// Analyses for 2..=4 symbols. Symbols that fail are skipped; if all fail the
/// last upstream error is returned.
pub async fn compare(state: &AppState, symbols: &[String]) -> AppResult<Vec<StockAnalysis>> {
    let mut unique: Vec<String> = Vec::with_capacity(symbols.len());
    for raw in symbols {
        let sym = normalize_symbol(raw)?;
        if !unique.contains(&sym) {
            unique.push(sym);
        }
    }

    if !(MIN_COMPARE..=MAX_COMPARE).contains(&unique.len()) {
        return Err(AppError::Validation(format!(
            "Provide between {MIN_COMPARE} and {MAX_COMPARE} distinct symbols"
        )));
    }

    let results = join_all(unique.iter().map(|s| analyze(state, s))).await;

    let mut out = Vec::with_capacity(results.len());
    let mut last_err = None;
    for (sym, res) in unique.iter().zip(results) {
        match res {
            Ok(a) => out.push(a),
            Err(e) => {
                tracing::warn!(symbol = %sym, error = %e, "skipping symbol in comparison");
                last_err = Some(e);
            }
        }
    }

    if out.is_empty() {
        return Err(last_err.unwrap_or(AppError::Upstream(ProviderError::NoSource)));
    }
    Ok(out)
}
