use axum::{Router, routing::{get, patch, post}};
use crate::{AppState, controllers::alerts_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route(
            "/api/alerts/price",
            get(alerts_controller::get_price_alerts).post(alerts_controller::post_price_alert),
        )
        .route(
            "/api/alerts/price/:id",
            patch(alerts_controller::patch_price_alert).delete(alerts_controller::delete_price_alert),
        )
        .route(
            "/api/alerts/news",
            get(alerts_controller::get_news_alerts).post(alerts_controller::post_news_alert),
        )
        .route(
            "/api/alerts/news/:id",
            patch(alerts_controller::patch_news_alert).delete(alerts_controller::delete_news_alert),
        )
        .route("/api/alerts/notifications", get(alerts_controller::get_notifications))
        .route("/api/alerts/notifications/read-all", post(alerts_controller::post_notifications_read_all))
        .route("/api/alerts/notifications/:id/read", post(alerts_controller::post_notification_read))
        .route("/api/alerts/stats", get(alerts_controller::get_stats))
}
