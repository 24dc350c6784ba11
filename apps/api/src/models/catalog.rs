use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row shape for college list pages.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollegeSummary {
    pub college_code: i32,
    pub college_name: String,
    pub is_985: bool,
    pub is_211: bool,
    pub is_dfc: bool,
    pub province: String,
    pub city_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CollegeRow {
    pub college_id: i64,
    pub college_code: i32,
    pub college_name: String,
    pub is_985: bool,
    pub is_211: bool,
    pub is_dfc: bool,
    pub province: String,
    pub city_name: Option<String>,
    pub college_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionScoreRow {
    pub admission_id: i64,
    pub major_name: Option<String>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub admission_type: Option<String>,
    pub province: String,
    pub admission_year: i32,
    pub min_score: Option<i32>,
    pub min_rank: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MajorRow {
    pub major_id: i64,
    pub major_name: String,
    pub major_type: Option<String>,
    pub base_intro: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlanRow {
    pub plan_id: i64,
    pub college_code: i32,
    pub major_id: Option<i64>,
    pub province: String,
    pub admission_year: i32,
    pub plan_count: i32,
    pub description: Option<String>,
}

/// Admission outcomes of one high school's graduating class.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SchoolEnrollmentRow {
    pub school_enrollment_id: i64,
    pub college_name: String,
    pub graduation_year: i32,
    pub admission_count: Option<i32>,
    pub min_score: Option<i32>,
    pub min_rank: Option<i32>,
}
