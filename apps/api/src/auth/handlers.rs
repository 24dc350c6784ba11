//! Axum route handlers for registration and login.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::{Validate, ValidationError};

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::auth::token::issue_token;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::{UserProfile, STATUS_DISABLED};
use crate::state::AppState;
use crate::users::repository::{
    find_by_username, generate_unique_user_id, insert_user, username_exists, NewUser,
};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 5, max = 20), custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 48, message = "province required"))]
    pub province: String,
    #[validate(length(min = 1, max = 255, message = "schoolName required"))]
    pub school_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(length(min = 5, max = 20), custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

/// Usernames are ASCII letters, digits and underscores.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    req.validate()?;

    if username_exists(&state.db, &req.username).await? {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    let user_id = generate_unique_user_id(&state.db).await?;
    let password_hash = hash_password_blocking(req.password).await?;

    insert_user(
        &state.db,
        NewUser {
            user_id,
            username: &req.username,
            password_hash: &password_hash,
            province: &req.province,
            school_name: &req.school_name,
        },
    )
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Username or ID already exists"))?;

    Ok(Json(RegisterResponse {
        message: "Register successful".to_string(),
        user_id,
    }))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    req.validate()?;

    let user = find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    if user.status == STATUS_DISABLED {
        warn!("Login refused for disabled account {}", user.user_id);
        return Err(AppError::Forbidden("Account disabled".to_string()));
    }

    if !verify_password_blocking(req.password, user.password_hash.clone()).await? {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let profile = UserProfile::from(&user);
    let token = issue_token(&state.config.jwt, &profile)?;
    info!("User {} logged in", profile.user_id);

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user: profile,
    }))
}
