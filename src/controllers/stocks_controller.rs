use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{SearchMatch, StockAnalysis},
    services::stocks_service,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub symbol: String,
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub symbols: Vec<String>,
}

// GET /api/search/:query
pub async fn get_search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> AppResult<Json<Vec<SearchMatch>>> {
    Ok(Json(stocks_service::search(&state, &query).await?))
}

// POST /api/analyze
pub async fn post_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<StockAnalysis>> {
    let Json(req) = payload?;
    Ok(Json(stocks_service::analyze(&state, &req.symbol).await?))
}

// POST /api/compare
pub async fn post_compare(
    State(state): State<AppState>,
    payload: Result<Json<CompareRequest>, JsonRejection>,
) -> AppResult<Json<Vec<StockAnalysis>>> {
    let Json(req) = payload?;
    Ok(Json(stocks_service::compare(&state, &req.symbols).await?))
}
