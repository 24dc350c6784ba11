use sqlx::PgPool;
use tracing::info;

use crate::models::score::{LatestScore, StudentScoreRow};

pub struct NewScore<'a> {
    pub student_id: i64,
    pub exam_year: i32,
    pub province: &'a str,
    pub total_score: i32,
    pub rank_in_province: Option<i32>,
}

/// Appends a score submission. Scores are never updated or deleted.
pub async fn insert_score(pool: &PgPool, score: NewScore<'_>) -> Result<i64, sqlx::Error> {
    let score_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO student_score (student_id, exam_year, province, total_score, rank_in_province)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING score_id
        "#,
    )
    .bind(score.student_id)
    .bind(score.exam_year)
    .bind(score.province)
    .bind(score.total_score)
    .bind(score.rank_in_province)
    .fetch_one(pool)
    .await?;

    info!(
        "Recorded score {score_id} for student {} ({} in {})",
        score.student_id, score.total_score, score.exam_year
    );
    Ok(score_id)
}

// Submissions are append-only; the newest row wins, score_id breaks same-instant ties.
const LATEST_SCORE_SQL: &str = r#"
    SELECT total_score
    FROM student_score
    WHERE student_id = $1
    ORDER BY created_at DESC, score_id DESC
    LIMIT 1
"#;

/// The student's most recently submitted score, if any.
pub async fn latest_score(pool: &PgPool, student_id: i64) -> Result<Option<LatestScore>, sqlx::Error> {
    sqlx::query_as::<_, LatestScore>(LATEST_SCORE_SQL)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub async fn scores_for_student(
    pool: &PgPool,
    student_id: i64,
) -> Result<Vec<StudentScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentScoreRow>(
        r#"
        SELECT score_id, student_id, exam_year, province, total_score, rank_in_province, created_at
        FROM student_score
        WHERE student_id = $1
        ORDER BY exam_year DESC, created_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
