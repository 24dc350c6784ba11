use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StudentScoreRow {
    pub score_id: i64,
    pub student_id: i64,
    pub exam_year: i32,
    pub province: String,
    pub total_score: i32,
    pub rank_in_province: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// The score a recommendation is computed against.
#[derive(Debug, Clone, FromRow)]
pub struct LatestScore {
    pub total_score: i32,
}
