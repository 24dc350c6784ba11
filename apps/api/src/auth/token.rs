use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::errors::AppError;
use crate::models::user::UserProfile;

/// HS256 token claims: standard `sub`/`iat`/`exp` plus the public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    pub province: String,
    pub school_name: String,
    pub iat: i64,
    pub exp: i64,
}

pub fn issue_token(config: &JwtConfig, profile: &UserProfile) -> Result<String, AppError> {
    let now = Utc::now();
    let expires_at = now
        .checked_add_signed(config.ttl)
        .ok_or_else(|| anyhow::anyhow!("Token lifetime overflows the clock"))?;
    let claims = Claims {
        sub: profile.user_id.to_string(),
        user_id: profile.user_id,
        username: profile.username.clone(),
        province: profile.province.clone(),
        school_name: profile.school_name.clone(),
        iat: now.timestamp(),
        exp: expires_at.timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Token signing failed: {e}").into())
}

pub fn verify_token(config: &JwtConfig, token: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AppError::Unauthorized(format!("invalid token: {e}")))?;

    if data.claims.sub != data.claims.user_id.to_string() {
        return Err(AppError::Unauthorized(
            "token subject does not match user".to_string(),
        ));
    }
    Ok(data.claims)
}
