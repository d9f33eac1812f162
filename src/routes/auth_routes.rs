use axum::{Router, routing::{get, post}};
use crate::{AppState, controllers::auth_controller};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/auth/register", post(auth_controller::post_register))
        .route("/api/auth/login", post(auth_controller::post_login))
        .route("/api/auth/logout", post(auth_controller::post_logout))
        .route("/api/auth/me", get(auth_controller::get_me))
}
