use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{error::AppError, models::CurrentUser, services::auth_service, AppState};

fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;

    for part in raw.split(';') {
        let mut it = part.trim().splitn(2, '=');
        let k = it.next()?.trim();
        let v = it.next()?.trim();
        if k == name && !v.is_empty() {
            return Some(v.to_string());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = raw.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// Resolves the caller from a Bearer header, falling back to the auth cookie,
/// and stores it in request extensions. Never rejects.
pub async fn inject_current_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let token = bearer_token(req.headers())
        .or_else(|| get_cookie(req.headers(), &state.settings.jwt_cookie_name));

    if let Some(user_id) = token.and_then(|t| auth_service::verify_jwt(&state.settings, &t)) {
        match state.users.find_user(user_id).await {
            Ok(Some(user)) if user.is_active => {
                req.extensions_mut().insert(CurrentUser::from(user));
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(%user_id, error = %e, "could not load user for token"),
        }
    }

    next.run(req).await
}

fn is_public_path(path: &str) -> bool {
    !path.starts_with("/api/")
        || path == "/api/health"
        || path == "/api/auth/login"
        || path == "/api/auth/register"
        || path == "/api/auth/logout"
}

pub async fn require_auth(
    State(_state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_public_path(req.uri().path()) || req.extensions().get::<CurrentUser>().is_some() {
        return next.run(req).await;
    }

    AppError::Unauthorized.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_named_cookie() {
        let mut h = HeaderMap::new();
        h.insert(header::COOKIE, HeaderValue::from_static("theme=dark; auth=abc.def; x=1"));
        assert_eq!(get_cookie(&h, "auth").as_deref(), Some("abc.def"));
        assert_eq!(get_cookie(&h, "missing"), None);
    }

    #[test]
    fn reads_bearer_token() {
        let mut h = HeaderMap::new();
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok123"));
        assert_eq!(bearer_token(&h).as_deref(), Some("tok123"));

        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&h), None);
    }

    #[test]
    fn only_auth_entry_points_are_public() {
        assert!(is_public_path("/api/health"));
        assert!(is_public_path("/api/auth/login"));
        assert!(is_public_path("/nowhere"));
        assert!(!is_public_path("/api/auth/me"));
        assert!(!is_public_path("/api/alerts/price"));
        assert!(!is_public_path("/api/analyze"));
    }
}
