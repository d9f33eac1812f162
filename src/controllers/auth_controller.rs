use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;

use super::require_user;
use crate::{
    error::AppResult,
    models::{CurrentUser, LoginRequest, RegisterRequest},
    services::auth_service,
    AppState,
};

// POST /api/auth/register
pub async fn post_register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;

    let user = auth_service::register_user(&state, req).await?;
    let token = auth_service::make_jwt(&state.settings, &user.id)?;
    let jar = jar.add(auth_service::auth_cookie(&state.settings, token.clone()));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "message": "User registered successfully",
            "user": CurrentUser::from(user),
            "token": token,
        })),
    ))
}

// POST /api/auth/login
pub async fn post_login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(req) = payload?;

    let user = auth_service::login_user(&state, req).await?;
    let token = auth_service::make_jwt(&state.settings, &user.id)?;
    let jar = jar.add(auth_service::auth_cookie(&state.settings, token.clone()));

    tracing::info!(user_id = %user.id, "user logged in");

    Ok((
        jar,
        Json(json!({
            "message": "Login successful",
            "user": CurrentUser::from(user),
            "token": token,
        })),
    ))
}

// POST /api/auth/logout
pub async fn post_logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(auth_service::clear_auth_cookie(&state.settings));
    (jar, Json(json!({ "message": "Logout successful" })))
}

// GET /api/auth/me
pub async fn get_me(user: Option<Extension<CurrentUser>>) -> AppResult<impl IntoResponse> {
    let u = require_user(user)?;
    Ok(Json(json!({ "user": u })))
}
