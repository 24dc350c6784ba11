use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::score::StudentScoreRow;
use crate::recommend::engine::RankingConfig;
use crate::scores::repository::{insert_score, scores_for_student, NewScore};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreRequest {
    pub student_id: i64,
    #[validate(range(min = 1977, max = 2100))]
    pub exam_year: i32,
    #[validate(length(min = 1, max = 48, message = "province required"))]
    pub province: String,
    pub total_score: i32,
    #[validate(range(min = 1))]
    pub rank_in_province: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreResponse {
    pub message: String,
    pub score_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ScoreListResponse {
    pub data: Vec<StudentScoreRow>,
}

/// Boundary checks beyond the derived rules: ownership and the score domain.
pub fn check_submission(
    req: &SubmitScoreRequest,
    caller: &AuthUser,
    domain: &RankingConfig,
) -> Result<(), AppError> {
    req.validate()?;
    if req.province.trim().is_empty() {
        return Err(AppError::Validation("province required".to_string()));
    }

    if req.student_id != caller.user_id {
        return Err(AppError::Forbidden(
            "Cannot submit score for other user".to_string(),
        ));
    }
    if !(domain.score_min..=domain.score_max).contains(&req.total_score) {
        return Err(AppError::Validation(format!(
            "totalScore must be between {} and {}",
            domain.score_min, domain.score_max
        )));
    }
    Ok(())
}

/// POST /api/v1/student-score
pub async fn handle_submit_score(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<SubmitScoreRequest>,
) -> Result<Json<SubmitScoreResponse>, AppError> {
    check_submission(&req, &user, &state.config.ranking)?;

    let score_id = insert_score(
        &state.db,
        NewScore {
            student_id: req.student_id,
            exam_year: req.exam_year,
            province: req.province.trim(),
            total_score: req.total_score,
            rank_in_province: req.rank_in_province,
        },
    )
    .await?;

    Ok(Json(SubmitScoreResponse {
        message: "Score submitted".to_string(),
        score_id,
    }))
}

/// GET /api/v1/student-score/mine
pub async fn handle_my_scores(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ScoreListResponse>, AppError> {
    let data = scores_for_student(&state.db, user.user_id).await?;
    Ok(Json(ScoreListResponse { data }))
}
