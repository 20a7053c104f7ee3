use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::json_body,
    middleware::CurrentUser,
    models::{
        parking_session::AckResponse,
        user::{LoginRequest, LoginResponse, UserResponse},
    },
    state::AppState,
    utils::{jwt::create_access_token, password::verify_password},
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let user = state
        .users
        .find_by_username(payload.username.trim())
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.into()))?;

    let matches = verify_password(&payload.password, &user.password_hash)
        .map_err(AppError::InternalServerError)?;
    if !matches {
        tracing::warn!(username = %user.username, "Login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = create_access_token(
        user.id.to_string(),
        user.username.clone(),
        user.user_type.as_str().to_string(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )
    .map_err(AppError::InternalServerError)?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        success: true,
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .find_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(UserResponse::from(user)))
}

/// Tokens are stateless; the client drops its copy.
pub async fn logout(Extension(current): Extension<CurrentUser>) -> Json<AckResponse> {
    tracing::info!(user_id = %current.id, "User logged out");
    Json(AckResponse::ok("Logged out"))
}
