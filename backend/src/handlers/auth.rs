//! Handlers for login, logout, and refresh-token rotation.

use axum::{
    extract::{Extension, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::{
    config::Config,
    error::AppError,
    models::user::{LoginRequest, LoginResponse, User, UserResponse},
    repositories::{refresh_token as token_repo, user as user_repo},
    utils::jwt::{
        create_access_token, create_refresh_token, decode_refresh_token, verify_refresh_token,
        RefreshToken,
    },
    utils::password::verify_password,
};

/// Verifies credentials and issues an access/refresh token pair.
pub async fn login(
    State((pool, config)): State<(PgPool, Config)>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = user_repo::find_user_by_username(&pool, &payload.username)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials);
    }
    if !user.is_active {
        return Err(AppError::InactiveAccount);
    }

    let response = issue_tokens(&pool, &config, user).await?;
    Ok(Json(response))
}

/// Invalidates the supplied refresh token so it can no longer mint access
/// tokens. The caller's other sessions are untouched.
pub async fn logout(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(_user): Extension<User>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let encoded = payload
        .get("refresh")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AppError::Validation(vec!["refresh: refresh token is required".to_string()])
        })?;

    let (token_id, secret) = decode_refresh_token(encoded)
        .map_err(|_| AppError::InvalidToken("Invalid token".to_string()))?;

    // An unknown id means the token was never issued or is already
    // invalidated; both surface the same way.
    let stored = token_repo::fetch_valid_refresh_token(&pool, &token_id, Utc::now())
        .await?
        .ok_or_else(|| AppError::InvalidToken("Invalid token".to_string()))?;

    if !verify_refresh_token(&secret, &stored.token_hash)? {
        return Err(AppError::InvalidToken("Invalid token".to_string()));
    }

    token_repo::delete_refresh_token(&pool, &token_id).await?;

    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// Rotates a refresh token: the old token is invalidated and a fresh pair is
/// issued. Invalidated (logged-out) tokens are rejected here.
pub async fn refresh(
    State((pool, config)): State<(PgPool, Config)>,
    Json(payload): Json<Value>,
) -> Result<Json<LoginResponse>, AppError> {
    let encoded = payload
        .get("refresh")
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            AppError::Validation(vec!["refresh: refresh token is required".to_string()])
        })?;

    let (token_id, secret) = decode_refresh_token(encoded)
        .map_err(|_| AppError::Unauthenticated("Invalid or expired refresh token".to_string()))?;

    let stored = token_repo::fetch_valid_refresh_token(&pool, &token_id, Utc::now())
        .await?
        .ok_or_else(|| {
            AppError::Unauthenticated("Invalid or expired refresh token".to_string())
        })?;

    if !verify_refresh_token(&secret, &stored.token_hash)? {
        return Err(AppError::Unauthenticated(
            "Invalid or expired refresh token".to_string(),
        ));
    }

    let user = user_repo::find_user_by_id(&pool, &stored.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Unknown user".to_string()))?;
    if !user.is_active {
        return Err(AppError::InactiveAccount);
    }

    token_repo::delete_refresh_token(&pool, &token_id).await?;
    let response = issue_tokens(&pool, &config, user).await?;
    Ok(Json(response))
}

async fn issue_tokens(
    pool: &PgPool,
    config: &Config,
    user: User,
) -> Result<LoginResponse, AppError> {
    let access = create_access_token(
        user.id.clone(),
        user.username.clone(),
        &config.jwt_secret,
        config.jwt_expiration_hours,
    )?;

    let refresh_token: RefreshToken =
        create_refresh_token(user.id.clone(), config.refresh_token_expiration_days)?;
    token_repo::insert_refresh_token(pool, &refresh_token).await?;

    Ok(LoginResponse {
        access,
        refresh: refresh_token.encoded(),
        user: UserResponse::from(user),
    })
}
