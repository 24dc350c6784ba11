use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::handlers::validate_username;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::UserProfile;
use crate::state::AppState;
use crate::users::repository::{update_profile, ProfileUpdate};

const MAX_PROVINCE_LEN: usize = 48;
const MAX_SCHOOL_NAME_LEN: usize = 255;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    pub username: Option<String>,
    pub province: Option<String>,
    pub school_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

/// Trims every field and checks it. Blank province/school name count as absent;
/// a blank username is an error.
pub fn normalize_profile(req: ProfileRequest) -> Result<ProfileUpdate, AppError> {
    let username = req.username.map(|u| u.trim().to_string());
    if let Some(username) = &username {
        let len = username.chars().count();
        if !(5..=20).contains(&len) || validate_username(username).is_err() {
            return Err(AppError::Validation(
                "username must be 5-20 letters, digits or underscores".to_string(),
            ));
        }
    }

    let province = non_blank(req.province);
    if province
        .as_ref()
        .is_some_and(|p| p.chars().count() > MAX_PROVINCE_LEN)
    {
        return Err(AppError::Validation(format!(
            "province must be at most {MAX_PROVINCE_LEN} characters"
        )));
    }

    let school_name = non_blank(req.school_name);
    if school_name
        .as_ref()
        .is_some_and(|s| s.chars().count() > MAX_SCHOOL_NAME_LEN)
    {
        return Err(AppError::Validation(format!(
            "schoolName must be at most {MAX_SCHOOL_NAME_LEN} characters"
        )));
    }

    let update = ProfileUpdate {
        username,
        province,
        school_name,
    };
    if update.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }
    Ok(update)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /api/v1/user/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<ProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let update = normalize_profile(req)?;

    let profile = update_profile(&state.db, user.user_id, &update)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Username already exists"))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!("Updated profile for user {}", profile.user_id);

    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".to_string(),
        user: profile,
    }))
}
