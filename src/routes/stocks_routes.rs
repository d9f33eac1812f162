use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::stocks_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/search/:query", get(stocks_controller::get_search))
        .route("/api/analyze", post(stocks_controller::post_analyze))
        .route("/api/compare", post(stocks_controller::post_compare))
}
