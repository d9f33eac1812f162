use axum_extra::extract::cookie::{Cookie, SameSite};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    config::Settings,
    error::{AppError, AppResult, StoreError},
    models::{LoginRequest, RegisterRequest, User},
    AppState,
};

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id as hex string
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

pub fn make_jwt(settings: &Settings, user_id: &ObjectId) -> AppResult<String> {
    let exp = (Utc::now() + Duration::days(settings.jwt_ttl_days)).timestamp() as usize;

    let claims = Claims {
        sub: user_id.to_hex(),
        exp,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("could not sign token: {e}")))
}

/// User id carried by a valid, unexpired token.
pub fn verify_jwt(settings: &Settings, token: &str) -> Option<ObjectId> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &validation,
    )
    .ok()?;

    ObjectId::parse_str(&data.claims.sub).ok()
}

pub fn auth_cookie(settings: &Settings, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(settings.jwt_cookie_name.clone(), token);
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    if settings.cookie_secure {
        cookie.set_secure(true);
    }
    cookie
}

pub fn clear_auth_cookie(settings: &Settings) -> Cookie<'static> {
    let mut cookie = Cookie::new(settings.jwt_cookie_name.clone(), "");
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.make_removal();
    cookie
}

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

fn optional_name(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub async fn register_user(state: &AppState, req: RegisterRequest) -> AppResult<User> {
    let email = req.email.trim().to_lowercase();

    if !is_valid_email(&email) {
        return Err(AppError::Validation("Invalid email address".into()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.users.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists with this email".into()));
    }

    let password_hash = hash(&req.password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("could not hash password: {e}")))?;

    let user = User {
        id: ObjectId::new(),
        email,
        password_hash,
        first_name: optional_name(req.first_name),
        last_name: optional_name(req.last_name),
        is_active: true,
        created_at: Utc::now().timestamp_millis(),
    };

    // the unique index still wins a registration race
    match state.users.insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::Conflict("User already exists with this email".into()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(user_id = %user.id, "user registered");
    Ok(user)
}

pub async fn login_user(state: &AppState, req: LoginRequest) -> AppResult<User> {
    let invalid = || AppError::InvalidCredentials("Invalid email or password".into());

    let email = req.email.trim().to_lowercase();
    let user = state
        .users
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !user.is_active || !verify(&req.password, &user.password_hash).unwrap_or(false) {
        return Err(invalid());
    }

    Ok(user)
}
