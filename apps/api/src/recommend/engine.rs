//! Recommendation ranking: pluggable, trait-based ranker that scores admission
//! candidates against a student's total score.
//!
//! Default: `BandedRanker` (pure, synchronous, deterministic).
//!
//! `AppState` holds an `Arc<dyn Ranker>`, built at startup from `RankingConfig`.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// One historical cutoff joined with its college. Everything except
/// `min_score`, `admission_year`, `college_id` and `major_id` is passthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionCandidate {
    pub college_id: i64,
    pub college_code: i32,
    pub college_name: String,
    pub province: String,
    pub college_level: Option<String>,
    pub major_id: Option<i64>,
    pub major_name: Option<String>,
    pub min_score: Option<i32>,
    pub min_rank: Option<i32>,
    pub admission_year: i32,
}

/// Coarse admission likelihood. Declaration order is severity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedCandidate {
    #[serde(flatten)]
    pub candidate: AdmissionCandidate,
    pub delta: i32,
    pub match_degree: u8, // 0 – 100
    pub risk: Risk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// No cutoff score recorded; the candidate cannot be scored.
    MissingCutoff,
    /// An older (or laxer) record for the same college and major.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedCandidate {
    #[serde(flatten)]
    pub candidate: AdmissionCandidate,
    pub reason: ExclusionReason,
}

/// Output of a ranking pass. `ranked.len() + excluded.len()` always equals
/// the number of input candidates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub ranked: Vec<RankedCandidate>,
    pub excluded: Vec<ExcludedCandidate>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RankingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid ranking configuration: {0}")]
    InvalidConfig(String),
}

/// Tunable parameters of the banded ranking curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Inclusive bounds of a valid total score.
    pub score_min: i32,
    pub score_max: i32,
    /// |delta| at which the match degree saturates at 0 or 100.
    pub saturation: i32,
    /// delta >= this is low risk.
    pub low_risk_margin: i32,
    /// delta < -this is high risk.
    pub high_risk_margin: i32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            score_min: 0,
            score_max: 750,
            saturation: 30,
            low_risk_margin: 15,
            high_risk_margin: 15,
        }
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<(), RankingError> {
        if self.score_min > self.score_max {
            return Err(RankingError::InvalidConfig(format!(
                "score_min {} exceeds score_max {}",
                self.score_min, self.score_max
            )));
        }
        if self.saturation <= 0 {
            return Err(RankingError::InvalidConfig(
                "saturation must be positive".to_string(),
            ));
        }
        if self.low_risk_margin < 0 || self.high_risk_margin < 0 {
            return Err(RankingError::InvalidConfig(
                "risk margins must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap ranking backends without touching the handler.
///
/// Implementations must stay pure: no I/O, no interior mutability, so one
/// instance can serve concurrent requests.
pub trait Ranker: Send + Sync {
    fn rank(
        &self,
        total_score: f64,
        candidates: Vec<AdmissionCandidate>,
    ) -> Result<Ranking, RankingError>;

    /// Backend label, surfaced in logs.
    fn backend(&self) -> &'static str;
}

/// Linear match degree between ±saturation, banded risk.
#[derive(Debug, Clone, Default)]
pub struct BandedRanker {
    config: RankingConfig,
}

impl BandedRanker {
    pub fn new(config: RankingConfig) -> Result<Self, RankingError> {
        config.validate()?;
        Ok(Self { config })
    }
}

impl Ranker for BandedRanker {
    fn rank(
        &self,
        total_score: f64,
        candidates: Vec<AdmissionCandidate>,
    ) -> Result<Ranking, RankingError> {
        rank_candidates(&self.config, total_score, candidates)
    }

    fn backend(&self) -> &'static str {
        "banded"
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core ranking algorithm
// ────────────────────────────────────────────────────────────────────────────

/// Ranks `candidates` against `total_score`.
///
/// 1. Candidates without a cutoff are excluded (`MissingCutoff`).
/// 2. Per (college, major) the most recent year is kept; ties go to the larger
///    cutoff, then to the earlier input position. The rest are `Superseded`.
/// 3. Kept candidates are sorted by match degree (desc), risk severity (asc),
///    then input order.
pub fn rank_candidates(
    config: &RankingConfig,
    total_score: f64,
    candidates: Vec<AdmissionCandidate>,
) -> Result<Ranking, RankingError> {
    let score = validate_score(config, total_score)?;

    let mut excluded: Vec<(usize, ExcludedCandidate)> = Vec::new();
    let mut scorable: Vec<(usize, AdmissionCandidate, i32)> = Vec::new();

    for (position, candidate) in candidates.into_iter().enumerate() {
        match candidate.min_score {
            Some(min_score) => scorable.push((position, candidate, min_score)),
            None => excluded.push((
                position,
                ExcludedCandidate {
                    candidate,
                    reason: ExclusionReason::MissingCutoff,
                },
            )),
        }
    }

    let mut representatives: HashMap<(i64, Option<i64>), usize> = HashMap::new();
    for (slot, (_, candidate, min_score)) in scorable.iter().enumerate() {
        let key = (candidate.college_id, candidate.major_id);
        let replace = match representatives.get(&key) {
            Some(&current) => {
                let (_, held, held_min) = &scorable[current];
                (candidate.admission_year, *min_score) > (held.admission_year, *held_min)
            }
            None => true,
        };
        if replace {
            representatives.insert(key, slot);
        }
    }
    let kept: HashSet<usize> = representatives.into_values().collect();

    let mut ranked = Vec::with_capacity(kept.len());
    for (slot, (position, candidate, min_score)) in scorable.into_iter().enumerate() {
        if !kept.contains(&slot) {
            excluded.push((
                position,
                ExcludedCandidate {
                    candidate,
                    reason: ExclusionReason::Superseded,
                },
            ));
            continue;
        }

        let delta = score.saturating_sub(min_score);
        ranked.push(RankedCandidate {
            candidate,
            delta,
            match_degree: match_degree(delta, config.saturation),
            risk: risk_band(delta, config),
        });
    }

    // Stable: equal keys keep input order.
    ranked.sort_by(|a, b| {
        b.match_degree
            .cmp(&a.match_degree)
            .then_with(|| a.risk.cmp(&b.risk))
    });
    excluded.sort_by_key(|(position, _)| *position);

    Ok(Ranking {
        ranked,
        excluded: excluded.into_iter().map(|(_, e)| e).collect(),
    })
}

/// Rejects scores that are non-finite, fractional or outside the configured domain.
fn validate_score(config: &RankingConfig, total_score: f64) -> Result<i32, RankingError> {
    if !total_score.is_finite() {
        return Err(RankingError::InvalidInput(format!(
            "total score must be a finite number, got {total_score}"
        )));
    }
    if total_score.fract() != 0.0 {
        return Err(RankingError::InvalidInput(format!(
            "total score must be a whole number, got {total_score}"
        )));
    }
    if total_score < f64::from(config.score_min) || total_score > f64::from(config.score_max) {
        return Err(RankingError::InvalidInput(format!(
            "total score {total_score} is outside [{}, {}]",
            config.score_min, config.score_max
        )));
    }
    Ok(total_score as i32)
}

/// Maps delta linearly onto 0–100, saturating at ±`saturation`.
pub fn match_degree(delta: i32, saturation: i32) -> u8 {
    let s = f64::from(saturation.max(1));
    let clamped = f64::from(delta).clamp(-s, s);
    ((clamped + s) / (2.0 * s) * 100.0).round() as u8
}

pub fn risk_band(delta: i32, config: &RankingConfig) -> Risk {
    if delta >= config.low_risk_margin {
        Risk::Low
    } else if delta < -config.high_risk_margin {
        Risk::High
    } else {
        Risk::Medium
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(college_id: i64, min_score: Option<i32>, year: i32) -> AdmissionCandidate {
        AdmissionCandidate {
            college_id,
            college_code: 10_000 + college_id as i32,
            college_name: format!("College {college_id}"),
            province: "Zhejiang".to_string(),
            college_level: Some("undergraduate".to_string()),
            major_id: None,
            major_name: None,
            min_score,
            min_rank: None,
            admission_year: year,
        }
    }

    fn with_major(mut c: AdmissionCandidate, major_id: i64) -> AdmissionCandidate {
        c.major_id = Some(major_id);
        c
    }

    fn rank(total_score: f64, candidates: Vec<AdmissionCandidate>) -> Ranking {
        rank_candidates(&RankingConfig::default(), total_score, candidates).unwrap()
    }

    #[test]
    fn test_reference_scenario() {
        let ranking = rank(
            550.0,
            vec![
                candidate(1, Some(500), 2023),
                candidate(2, Some(560), 2023),
                candidate(3, None, 2023),
            ],
        );

        assert_eq!(ranking.ranked.len(), 2);
        assert_eq!(ranking.ranked[0].candidate.college_id, 1);
        assert_eq!(ranking.ranked[0].delta, 50);
        assert_eq!(ranking.ranked[0].match_degree, 100);
        assert_eq!(ranking.ranked[0].risk, Risk::Low);
        assert_eq!(ranking.ranked[1].candidate.college_id, 2);
        assert_eq!(ranking.ranked[1].delta, -10);
        assert_eq!(ranking.ranked[1].risk, Risk::Medium);
        assert!(ranking.ranked[0].match_degree > ranking.ranked[1].match_degree);

        assert_eq!(ranking.excluded.len(), 1);
        assert_eq!(ranking.excluded[0].candidate.college_id, 3);
        assert_eq!(ranking.excluded[0].reason, ExclusionReason::MissingCutoff);
    }

    #[test]
    fn test_empty_candidates_is_not_an_error() {
        let ranking = rank(600.0, vec![]);
        assert!(ranking.ranked.is_empty());
        assert!(ranking.excluded.is_empty());
    }

    #[test]
    fn test_rejects_non_finite_score() {
        let config = RankingConfig::default();
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = rank_candidates(&config, bad, vec![candidate(1, Some(500), 2023)]);
            assert!(matches!(result, Err(RankingError::InvalidInput(_))));
        }
    }

    #[test]
    fn test_rejects_fractional_and_out_of_domain_scores() {
        let config = RankingConfig::default();
        for bad in [550.5, -1.0, 751.0] {
            let result = rank_candidates(&config, bad, vec![]);
            assert!(
                matches!(result, Err(RankingError::InvalidInput(_))),
                "expected {bad} to be rejected"
            );
        }
        assert!(rank_candidates(&config, 0.0, vec![]).is_ok());
        assert!(rank_candidates(&config, 750.0, vec![]).is_ok());
    }

    #[test]
    fn test_zero_delta_is_medium_risk() {
        let ranking = rank(550.0, vec![candidate(1, Some(550), 2023)]);
        assert_eq!(ranking.ranked[0].delta, 0);
        assert_eq!(ranking.ranked[0].risk, Risk::Medium);
        assert_eq!(ranking.ranked[0].match_degree, 50);
    }

    #[test]
    fn test_risk_band_boundaries() {
        let config = RankingConfig::default();
        assert_eq!(risk_band(15, &config), Risk::Low);
        assert_eq!(risk_band(14, &config), Risk::Medium);
        assert_eq!(risk_band(-15, &config), Risk::Medium);
        assert_eq!(risk_band(-16, &config), Risk::High);
    }

    #[test]
    fn test_match_degree_is_monotonic_and_bounded() {
        let mut previous = 0u8;
        for delta in -200..=200 {
            let degree = match_degree(delta, 30);
            assert!(degree <= 100);
            assert!(degree >= previous, "degree dropped at delta {delta}");
            previous = degree;
        }
        assert_eq!(match_degree(-30, 30), 0);
        assert_eq!(match_degree(-500, 30), 0);
        assert_eq!(match_degree(30, 30), 100);
        assert_eq!(match_degree(500, 30), 100);
    }

    #[test]
    fn test_no_silent_drops() {
        let candidates = vec![
            with_major(candidate(1, Some(600), 2021), 7),
            with_major(candidate(1, Some(610), 2022), 7),
            with_major(candidate(1, Some(590), 2023), 7),
            with_major(candidate(1, Some(590), 2023), 8),
            candidate(2, None, 2023),
            candidate(3, Some(520), 2023),
            candidate(3, None, 2024),
        ];
        let total = candidates.len();
        let ranking = rank(580.0, candidates);
        assert_eq!(ranking.ranked.len() + ranking.excluded.len(), total);
        assert_eq!(ranking.ranked.len(), 3);
    }

    #[test]
    fn test_most_recent_year_represents_college_major() {
        let ranking = rank(
            560.0,
            vec![
                with_major(candidate(1, Some(600), 2022), 7),
                with_major(candidate(1, Some(540), 2023), 7),
            ],
        );
        assert_eq!(ranking.ranked.len(), 1);
        assert_eq!(ranking.ranked[0].candidate.admission_year, 2023);
        assert_eq!(ranking.excluded.len(), 1);
        assert_eq!(ranking.excluded[0].candidate.admission_year, 2022);
        assert_eq!(ranking.excluded[0].reason, ExclusionReason::Superseded);
    }

    #[test]
    fn test_same_year_tie_keeps_stricter_cutoff() {
        let ranking = rank(
            560.0,
            vec![candidate(1, Some(540), 2023), candidate(1, Some(565), 2023)],
        );
        assert_eq!(ranking.ranked.len(), 1);
        assert_eq!(ranking.ranked[0].candidate.min_score, Some(565));
        assert_eq!(ranking.ranked[0].delta, -5);
    }

    #[test]
    fn test_different_majors_are_ranked_separately() {
        let ranking = rank(
            560.0,
            vec![
                with_major(candidate(1, Some(540), 2023), 7),
                with_major(candidate(1, Some(580), 2023), 8),
            ],
        );
        assert_eq!(ranking.ranked.len(), 2);
        assert!(ranking.excluded.is_empty());
    }

    #[test]
    fn test_equal_match_degree_keeps_input_order() {
        // Both saturate at 100 / low risk.
        let ranking = rank(
            600.0,
            vec![candidate(1, Some(560), 2023), candidate(2, Some(500), 2023)],
        );
        assert_eq!(ranking.ranked[0].match_degree, 100);
        assert_eq!(ranking.ranked[1].match_degree, 100);
        assert_eq!(ranking.ranked[0].candidate.college_id, 1);
        assert_eq!(ranking.ranked[1].candidate.college_id, 2);
    }

    #[test]
    fn test_equal_match_degree_prefers_lower_risk() {
        let config = RankingConfig {
            saturation: 1000,
            ..RankingConfig::default()
        };
        // delta 14 and 15 both round to 51, but only 15 is low risk.
        let ranking = rank_candidates(
            &config,
            515.0,
            vec![candidate(1, Some(501), 2023), candidate(2, Some(500), 2023)],
        )
        .unwrap();
        assert_eq!(ranking.ranked[0].match_degree, ranking.ranked[1].match_degree);
        assert_eq!(ranking.ranked[0].candidate.college_id, 2);
        assert_eq!(ranking.ranked[0].risk, Risk::Low);
        assert_eq!(ranking.ranked[1].risk, Risk::Medium);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let candidates = vec![
            candidate(4, Some(530), 2023),
            candidate(1, Some(570), 2022),
            candidate(2, None, 2023),
            candidate(1, Some(565), 2023),
            candidate(3, Some(548), 2023),
        ];
        let first = rank(550.0, candidates.clone());
        let second = rank(550.0, candidates);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_excluded_keeps_input_order() {
        let ranking = rank(
            550.0,
            vec![
                candidate(9, None, 2023),
                candidate(1, Some(500), 2021),
                candidate(5, None, 2023),
                candidate(1, Some(520), 2023),
            ],
        );
        let ids: Vec<(i64, ExclusionReason)> = ranking
            .excluded
            .iter()
            .map(|e| (e.candidate.college_id, e.reason))
            .collect();
        assert_eq!(
            ids,
            vec![
                (9, ExclusionReason::MissingCutoff),
                (1, ExclusionReason::Superseded),
                (5, ExclusionReason::MissingCutoff),
            ]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let ranking = rank(550.0, vec![candidate(1, Some(500), 2023)]);
        let value = serde_json::to_value(&ranking.ranked[0]).unwrap();
        assert_eq!(value["collegeId"], 1);
        assert_eq!(value["minScore"], 500);
        assert_eq!(value["matchDegree"], 100);
        assert_eq!(value["risk"], "low");
    }

    #[test]
    fn test_config_validation() {
        assert!(RankingConfig::default().validate().is_ok());
        let inverted = RankingConfig {
            score_min: 800,
            ..RankingConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(RankingError::InvalidConfig(_))));
        let flat = RankingConfig {
            saturation: 0,
            ..RankingConfig::default()
        };
        assert!(BandedRanker::new(flat).is_err());
    }

    #[test]
    fn test_banded_ranker_delegates() {
        let ranker = BandedRanker::new(RankingConfig::default()).unwrap();
        assert_eq!(ranker.backend(), "banded");
        let ranking = ranker
            .rank(550.0, vec![candidate(1, Some(560), 2023)])
            .unwrap();
        assert_eq!(ranking.ranked[0].delta, -10);
    }
}
