use anyhow::Result;
use chrono::{Datelike, Utc};
use rand::Rng;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::models::user::{UserProfile, UserRow, STATUS_ACTIVE};

const ID_ATTEMPTS: usize = 10;

/// A candidate id of the form `YYYY` followed by six random digits.
pub fn candidate_user_id<R: Rng>(year: i32, rng: &mut R) -> i64 {
    i64::from(year) * 1_000_000 + rng.gen_range(100_000..1_000_000)
}

/// Smallest id issued for `year` when random picks keep colliding.
pub fn fallback_floor(year: i32) -> i64 {
    i64::from(year) * 1_000_000
}

/// Generates a user id not yet present in `users`.
pub async fn generate_unique_user_id(pool: &PgPool) -> Result<i64> {
    let year = Utc::now().year();

    for _ in 0..ID_ATTEMPTS {
        let candidate = candidate_user_id(year, &mut rand::thread_rng());
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE user_id = $1)")
                .bind(candidate)
                .fetch_one(pool)
                .await?;
        if !taken {
            return Ok(candidate);
        }
    }

    let max_id: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(user_id), $1) FROM users")
        .bind(fallback_floor(year))
        .fetch_one(pool)
        .await?;
    warn!("User id space crowded after {ID_ATTEMPTS} attempts; falling back to {}", max_id + 1);
    Ok(max_id + 1)
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
        .bind(username)
        .fetch_one(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<UserRow>, sqlx::Error> {
    sqlx::query_as::<_, UserRow>(
        r#"
        SELECT user_id, username, password_hash, province, school_name, status, created_at
        FROM users
        WHERE username = $1
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub struct NewUser<'a> {
    pub user_id: i64,
    pub username: &'a str,
    pub password_hash: &'a str,
    pub province: &'a str,
    pub school_name: &'a str,
}

pub async fn insert_user(pool: &PgPool, user: NewUser<'_>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, username, password_hash, province, school_name, status)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user.user_id)
    .bind(user.username)
    .bind(user.password_hash)
    .bind(user.province)
    .bind(user.school_name)
    .bind(STATUS_ACTIVE)
    .execute(pool)
    .await?;

    info!("Registered user {} ({})", user.user_id, user.username);
    Ok(())
}

/// Fields left as `None` keep their stored value.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub province: Option<String>,
    pub school_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.province.is_none() && self.school_name.is_none()
    }
}

/// Applies `update` and returns the resulting profile, or `None` if the user is gone.
pub async fn update_profile(
    pool: &PgPool,
    user_id: i64,
    update: &ProfileUpdate,
) -> Result<Option<UserProfile>, sqlx::Error> {
    sqlx::query_as::<_, UserProfile>(
        r#"
        UPDATE users
        SET username    = COALESCE($1, username),
            province    = COALESCE($2, province),
            school_name = COALESCE($3, school_name)
        WHERE user_id = $4
        RETURNING user_id, username, province, school_name
        "#,
    )
    .bind(update.username.as_deref())
    .bind(update.province.as_deref())
    .bind(update.school_name.as_deref())
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
