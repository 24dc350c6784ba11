//! Axum route handlers for the reference-data API.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::catalog::repository::{
    college_admissions, contains_pattern, count_colleges, count_majors, count_plans,
    count_school_enrollment, find_college, find_major, find_school_enrollment, list_colleges,
    list_majors, list_plans, list_school_enrollment, CollegeFilter, PlanFilter,
};
use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::models::catalog::{
    AdmissionScoreRow, CollegeRow, CollegeSummary, MajorRow, PlanRow, SchoolEnrollmentRow,
};
use crate::pagination::{lenient_int, PageQuery, Paged, Pagination};
use crate::state::AppState;

const MAX_MAJOR_QUERY_CHARS: usize = 100;
const MAX_SCHOOL_NAME_CHARS: usize = 200;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollegeListQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub province: Option<String>,
    pub is985: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdmissionsQuery {
    pub province: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MajorListQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanListQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub college_code: Option<String>,
    pub major_id: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentQuery {
    #[serde(flatten)]
    pub page: PageQuery,
    pub school_enrollment_id: Option<String>,
    pub school_name: Option<String>,
    pub graduation_year: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Single<T> {
    pub data: T,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum EnrollmentResponse {
    Single(Single<SchoolEnrollmentRow>),
    Page(Paged<SchoolEnrollmentRow>),
}

/// How a school-enrollment request selects its rows.
#[derive(Debug, PartialEq, Eq)]
pub enum EnrollmentLookup {
    ById(i64),
    BySchool {
        school_name: String,
        graduation_year: Option<i32>,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Query-string interpretation
// ────────────────────────────────────────────────────────────────────────────

fn present(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

/// `1`, `true` or any non-zero number is true; `0`, `false` or junk is false.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    let raw = present(raw)?;
    Some(match raw.to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => lenient_int(Some(raw)).is_some_and(|n| n != 0),
    })
}

/// Optional numeric filter: absent or blank is `None`; anything unparsable is an error.
fn int_filter<T: TryFrom<i64>>(raw: Option<&str>, name: &str) -> Result<Option<T>, AppError> {
    let Some(raw) = present(raw) else {
        return Ok(None);
    };
    lenient_int(Some(raw))
        .and_then(|n| T::try_from(n).ok())
        .map(Some)
        .ok_or_else(|| AppError::Validation(format!("Invalid {name}")))
}

fn path_int<T: TryFrom<i64>>(raw: &str, name: &str) -> Result<T, AppError> {
    int_filter(Some(raw), name)?.ok_or_else(|| AppError::Validation(format!("Invalid {name}")))
}

fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

pub fn college_filter(query: &CollegeListQuery) -> CollegeFilter {
    CollegeFilter {
        province: present(query.province.as_deref()).map(str::to_string),
        is_985: parse_flag(query.is985.as_deref()),
        name_pattern: present(query.q.as_deref()).map(contains_pattern),
    }
}

pub fn plan_filter(query: &PlanListQuery) -> Result<PlanFilter, AppError> {
    Ok(PlanFilter {
        college_code: int_filter(query.college_code.as_deref(), "collegeCode")?,
        major_id: int_filter(query.major_id.as_deref(), "majorId")?,
        year: int_filter(query.year.as_deref(), "year")?,
    })
}

pub fn enrollment_lookup(query: &EnrollmentQuery) -> Result<EnrollmentLookup, AppError> {
    if let Some(raw_id) = present(query.school_enrollment_id.as_deref()) {
        return match lenient_int(Some(raw_id)) {
            Some(id) if id > 0 => Ok(EnrollmentLookup::ById(id)),
            _ => Err(AppError::Validation(
                "Invalid schoolEnrollmentId".to_string(),
            )),
        };
    }

    let school_name = present(query.school_name.as_deref()).ok_or_else(|| {
        AppError::Validation("Either schoolEnrollmentId or schoolName is required".to_string())
    })?;

    let graduation_year = match present(query.graduation_year.as_deref()) {
        None => None,
        Some(raw) => match lenient_int(Some(raw)).and_then(|y| i32::try_from(y).ok()) {
            Some(year) if year > 0 => Some(year),
            _ => {
                return Err(AppError::Validation(
                    "Invalid graduationYear".to_string(),
                ))
            }
        },
    };

    Ok(EnrollmentLookup::BySchool {
        school_name: truncate_chars(school_name, MAX_SCHOOL_NAME_CHARS),
        graduation_year,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/colleges
pub async fn handle_list_colleges(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CollegeListQuery>,
) -> Result<Json<Paged<CollegeSummary>>, AppError> {
    let page = Pagination::from_query(&query.page);
    let filter = college_filter(&query);

    let total = count_colleges(&state.db, &filter).await?;
    let rows = list_colleges(&state.db, &filter, &page).await?;
    Ok(Json(page.wrap(rows, total)))
}

/// GET /api/v1/colleges/:college_code
pub async fn handle_get_college(
    State(state): State<AppState>,
    Path(college_code): Path<String>,
) -> Result<Json<Single<CollegeRow>>, AppError> {
    let college_code: i32 = path_int(&college_code, "collegeCode")?;
    let college = find_college(&state.db, college_code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("College {college_code} not found")))?;
    Ok(Json(Single { data: college }))
}

/// GET /api/v1/colleges/:college_code/admissions
pub async fn handle_college_admissions(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(college_code): Path<String>,
    AppQuery(query): AppQuery<AdmissionsQuery>,
) -> Result<Json<Single<Vec<AdmissionScoreRow>>>, AppError> {
    let college_code: i32 = path_int(&college_code, "collegeCode")?;
    let year: Option<i32> = int_filter(query.year.as_deref(), "year")?;
    let province = present(query.province.as_deref());

    let rows = college_admissions(&state.db, college_code, province, year).await?;
    Ok(Json(Single { data: rows }))
}

/// GET /api/v1/majors
pub async fn handle_list_majors(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<MajorListQuery>,
) -> Result<Json<Paged<MajorRow>>, AppError> {
    let page = Pagination::from_query(&query.page);
    let pattern = present(query.q.as_deref())
        .map(|q| contains_pattern(&truncate_chars(q, MAX_MAJOR_QUERY_CHARS)));

    let total = count_majors(&state.db, pattern.as_deref()).await?;
    let rows = list_majors(&state.db, pattern.as_deref(), &page).await?;
    Ok(Json(page.wrap(rows, total)))
}

/// GET /api/v1/majors/:major_id
pub async fn handle_get_major(
    State(state): State<AppState>,
    Path(major_id): Path<String>,
) -> Result<Json<Single<MajorRow>>, AppError> {
    let major_id: i64 = path_int(&major_id, "majorId")?;
    let major = find_major(&state.db, major_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Major {major_id} not found")))?;
    Ok(Json(Single { data: major }))
}

/// GET /api/v1/plans
pub async fn handle_list_plans(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PlanListQuery>,
) -> Result<Json<Paged<PlanRow>>, AppError> {
    let page = Pagination::from_query(&query.page);
    let filter = plan_filter(&query)?;

    let total = count_plans(&state.db, &filter).await?;
    let rows = list_plans(&state.db, &filter, &page).await?;
    Ok(Json(page.wrap(rows, total)))
}

/// GET /api/v1/school-enrollment
///
/// Either a single record by `schoolEnrollmentId`, or a page of records for
/// `schoolName` (optionally narrowed to one `graduationYear`).
pub async fn handle_school_enrollment(
    State(state): State<AppState>,
    _user: AuthUser,
    AppQuery(query): AppQuery<EnrollmentQuery>,
) -> Result<Json<EnrollmentResponse>, AppError> {
    match enrollment_lookup(&query)? {
        EnrollmentLookup::ById(id) => {
            let row = find_school_enrollment(&state.db, id)
                .await?
                .ok_or_else(|| AppError::NotFound("Record not found".to_string()))?;
            Ok(Json(EnrollmentResponse::Single(Single { data: row })))
        }
        EnrollmentLookup::BySchool {
            school_name,
            graduation_year,
        } => {
            let page = Pagination::from_query(&query.page);
            let total = count_school_enrollment(&state.db, &school_name, graduation_year).await?;
            let rows =
                list_school_enrollment(&state.db, &school_name, graduation_year, &page).await?;
            Ok(Json(EnrollmentResponse::Page(page.wrap(rows, total))))
        }
    }
}
