use axum::extract::Extension;

use crate::{error::AppError, models::CurrentUser};

pub mod alerts_controller;
pub mod auth_controller;
pub mod home_controller;
pub mod realtime_controller;
pub mod stocks_controller;

/// The caller injected by the auth middleware.
pub(crate) fn require_user(user: Option<Extension<CurrentUser>>) -> Result<CurrentUser, AppError> {
    user.map(|Extension(u)| u).ok_or(AppError::Unauthorized)
}
