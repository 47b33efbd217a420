//! Data access for user accounts.

use sqlx::PgPool;

use crate::models::user::{User, UserResponse};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            is_staff, is_active, created_at, updated_at";

pub async fn insert_user(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO users \
         (id, username, email, password_hash, first_name, last_name, is_staff, is_active, \
         created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.is_staff)
    .bind(user.is_active)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(pool)
    .await
    .map(|_| ())
}

pub async fn update_user(pool: &PgPool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET username = $1, email = $2, password_hash = $3, first_name = $4, \
         last_name = $5, updated_at = $6 WHERE id = $7",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.updated_at)
    .bind(&user.id)
    .execute(pool)
    .await
    .map(|_| ())
}

/// Deletes a user. Their items, change-log rows, and refresh tokens cascade
/// at the database level. Returns `false` when no such user exists.
pub async fn delete_user(pool: &PgPool, user_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE id = $1",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn find_user_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {} FROM users WHERE username = $1",
        USER_COLUMNS
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

/// Case-insensitive email uniqueness check.
pub async fn email_taken(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}

pub async fn username_taken(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i32,)> = sqlx::query_as("SELECT 1 FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Users visible to the caller: everyone for staff, only the caller
/// otherwise.
pub async fn list_visible_users(
    pool: &PgPool,
    caller_id: &str,
    is_staff: bool,
    limit: i64,
    offset: i64,
) -> Result<(Vec<UserResponse>, i64), sqlx::Error> {
    if is_staff {
        let users = sqlx::query_as::<_, UserResponse>(
            "SELECT id, username, email, first_name, last_name, is_staff \
             FROM users ORDER BY username ASC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok((users, total))
    } else {
        let users = sqlx::query_as::<_, UserResponse>(
            "SELECT id, username, email, first_name, last_name, is_staff \
             FROM users WHERE id = $1",
        )
        .bind(caller_id)
        .fetch_all(pool)
        .await?;
        let total = users.len() as i64;
        Ok((offset_page(users, limit, offset), total))
    }
}

/// In-memory page slice for result sets fetched without SQL pagination, so
/// pages past the end come back empty instead of repeating rows.
fn offset_page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}
