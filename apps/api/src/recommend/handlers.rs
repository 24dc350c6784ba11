//! Axum route handler for the Recommendation API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::pagination::{PageMeta, Pagination, DEFAULT_PAGE_SIZE};
use crate::recommend::candidates::{fetch_candidates, CandidateFilter};
use crate::recommend::engine::{ExcludedCandidate, RankedCandidate};
use crate::scores::repository::latest_score;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[validate(length(min = 1, max = 64))]
    pub province: Option<String>,
    pub major_ids: Option<Vec<i64>>,
    #[validate(range(min = 1))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 200))]
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendMeta {
    #[serde(flatten)]
    pub page: PageMeta,
    pub total_score: i32,
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub data: Vec<RankedCandidate>,
    /// Candidates that could not be ranked, with the reason.
    pub excluded: Vec<ExcludedCandidate>,
    pub meta: RecommendMeta,
}

impl RecommendRequest {
    /// Validates the body and splits it into a candidate filter and a page window.
    /// A blank province means "any province"; an empty `majorIds` means "any major".
    pub fn into_parts(mut self) -> Result<(CandidateFilter, Pagination), AppError> {
        self.province = self
            .province
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self.validate()?;

        if let Some(ids) = &self.major_ids {
            if ids.iter().any(|id| *id <= 0) {
                return Err(AppError::Validation(
                    "majorIds must be positive integers".to_string(),
                ));
            }
        }

        let page = Pagination::new(
            self.page.unwrap_or(1),
            self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        );
        let filter = CandidateFilter {
            province: self.province,
            major_ids: self.major_ids.filter(|ids| !ids.is_empty()),
        };
        Ok((filter, page))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handler
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/recommend
///
/// Ranks colleges against the caller's most recent score. Candidates without a
/// cutoff, or superseded by a newer record, are returned under `excluded`.
pub async fn handle_recommend(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(req): AppJson<RecommendRequest>,
) -> Result<Json<RecommendResponse>, AppError> {
    let (filter, page) = req.into_parts()?;

    let score = latest_score(&state.db, user.user_id)
        .await?
        .ok_or(AppError::NoScore)?;

    let candidates = fetch_candidates(&state.db, &filter).await?;
    let candidate_count = candidates.len();

    let ranking = state
        .ranker
        .rank(f64::from(score.total_score), candidates)?;

    info!(
        "Ranked {} of {} candidates for user {} (score {}, backend {})",
        ranking.ranked.len(),
        candidate_count,
        user.user_id,
        score.total_score,
        state.ranker.backend()
    );

    let paged = page.slice(&ranking.ranked);
    Ok(Json(RecommendResponse {
        data: paged.data,
        excluded: ranking.excluded,
        meta: RecommendMeta {
            page: paged.meta,
            total_score: score.total_score,
        },
    }))
}
