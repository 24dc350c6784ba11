use sqlx::PgPool;
use tracing::debug;

use crate::recommend::engine::AdmissionCandidate;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct CandidateFilter {
    pub province: Option<String>,
    /// `None` means every major, including records without one.
    pub major_ids: Option<Vec<i64>>,
}

/// Admission cutoffs joined with their college, newest year first.
pub async fn fetch_candidates(
    pool: &PgPool,
    filter: &CandidateFilter,
) -> Result<Vec<AdmissionCandidate>, sqlx::Error> {
    let candidates = sqlx::query_as::<_, AdmissionCandidate>(
        r#"
        SELECT ci.college_id, ci.college_code, ci.college_name, cas.province, ci.college_level,
               cas.major_id, cas.major_name, cas.min_score, cas.min_rank, cas.admission_year
        FROM college_info ci
        JOIN college_admission_score cas ON ci.college_id = cas.college_id
        WHERE ($1::text IS NULL OR cas.province = $1)
          AND ($2::bigint[] IS NULL OR cas.major_id = ANY($2))
        ORDER BY cas.admission_year DESC, ci.college_id ASC, cas.admission_id ASC
        "#,
    )
    .bind(filter.province.as_deref())
    .bind(filter.major_ids.as_deref())
    .fetch_all(pool)
    .await?;

    debug!("Loaded {} recommendation candidates for {:?}", candidates.len(), filter);
    Ok(candidates)
}
