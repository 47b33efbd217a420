//! Handlers for registration and the user collection.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::{
        user::{RegisterRequest, UpdateUserRequest, User, UserResponse},
        Page, PageQuery, PAGE_SIZE,
    },
    repositories::user as user_repo,
    utils::password::hash_password,
};

/// Open registration. The password is hashed before storage and never logged
/// or echoed back.
pub async fn register(
    State((pool, _config)): State<(PgPool, Config)>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    if user_repo::username_taken(&pool, &payload.username).await? {
        return Err(AppError::Validation(vec![
            "username: already in use".to_string(),
        ]));
    }
    if user_repo::email_taken(&pool, &payload.email).await? {
        return Err(AppError::Validation(vec![
            "email: already in use".to_string(),
        ]));
    }

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(
        payload.username,
        payload.email,
        password_hash,
        payload.first_name,
        payload.last_name,
    );
    user_repo::insert_user(&pool, &user).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// Lists users visible to the caller: staff see everyone, others only
/// themselves.
pub async fn list_users(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(user): Extension<User>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<UserResponse>>, AppError> {
    let (users, count) = user_repo::list_visible_users(
        &pool,
        &user.id,
        user.is_staff,
        PAGE_SIZE,
        query.offset(),
    )
    .await?;
    Ok(Json(Page::new(count, users)))
}

pub async fn get_user(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(caller): Extension<User>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    if !can_access_user(&caller, &user_id) {
        return Err(user_not_found());
    }
    let user = user_repo::find_user_by_id(&pool, &user_id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

/// Partial profile update; a supplied password is re-hashed. Foreign users
/// 404 for non-staff callers rather than revealing their existence.
pub async fn update_user(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(caller): Extension<User>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    payload.validate()?;

    if !can_access_user(&caller, &user_id) {
        return Err(user_not_found());
    }
    let mut user = user_repo::find_user_by_id(&pool, &user_id)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(username) = payload.username {
        if username != user.username && user_repo::username_taken(&pool, &username).await? {
            return Err(AppError::Validation(vec![
                "username: already in use".to_string(),
            ]));
        }
        user.username = username;
    }
    if let Some(email) = payload.email {
        if !email.eq_ignore_ascii_case(&user.email) && user_repo::email_taken(&pool, &email).await?
        {
            return Err(AppError::Validation(vec![
                "email: already in use".to_string(),
            ]));
        }
        user.email = email;
    }
    if let Some(password) = payload.password {
        user.password_hash = hash_password(&password)?;
    }
    if let Some(first_name) = payload.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        user.last_name = last_name;
    }
    user.updated_at = Utc::now();

    user_repo::update_user(&pool, &user).await?;
    Ok(Json(user.into()))
}

/// Deletes a user account. Items, change logs, and refresh tokens cascade.
pub async fn delete_user(
    State((pool, _config)): State<(PgPool, Config)>,
    Extension(caller): Extension<User>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !can_access_user(&caller, &user_id) {
        return Err(user_not_found());
    }
    if !user_repo::delete_user(&pool, &user_id).await? {
        return Err(user_not_found());
    }
    tracing::info!(user_id = %user_id, deleted_by = %caller.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Self-or-staff rule for single-user operations.
fn can_access_user(caller: &User, target_id: &str) -> bool {
    caller.is_staff || caller.id == target_id
}

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(staff: bool) -> User {
        let mut user = User::new(
            "alice".into(),
            "alice@example.com".into(),
            "hash".into(),
            String::new(),
            String::new(),
        );
        user.is_staff = staff;
        user
    }

    #[test]
    fn non_staff_can_access_only_themselves() {
        let caller = test_user(false);
        let own_id = caller.id.clone();
        assert!(can_access_user(&caller, &own_id));
        assert!(!can_access_user(&caller, "someone-else"));
    }

    #[test]
    fn staff_can_access_anyone() {
        let caller = test_user(true);
        assert!(can_access_user(&caller, "someone-else"));
    }
}
