use sqlx::PgPool;

use crate::models::catalog::{
    AdmissionScoreRow, CollegeRow, CollegeSummary, MajorRow, PlanRow, SchoolEnrollmentRow,
};
use crate::pagination::Pagination;

/// Escapes LIKE metacharacters and wraps the term for a substring match.
pub fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

// ────────────────────────────────────────────────────────────────────────────
// Colleges
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct CollegeFilter {
    pub province: Option<String>,
    pub is_985: Option<bool>,
    /// Already passed through `contains_pattern`.
    pub name_pattern: Option<String>,
}

pub async fn count_colleges(pool: &PgPool, filter: &CollegeFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM college_info
        WHERE ($1::text IS NULL OR province = $1)
          AND ($2::bool IS NULL OR is_985 = $2)
          AND ($3::text IS NULL OR college_name ILIKE $3 ESCAPE '\')
        "#,
    )
    .bind(filter.province.as_deref())
    .bind(filter.is_985)
    .bind(filter.name_pattern.as_deref())
    .fetch_one(pool)
    .await
}

pub async fn list_colleges(
    pool: &PgPool,
    filter: &CollegeFilter,
    page: &Pagination,
) -> Result<Vec<CollegeSummary>, sqlx::Error> {
    sqlx::query_as::<_, CollegeSummary>(
        r#"
        SELECT college_code, college_name, is_985, is_211, is_dfc, province, city_name
        FROM college_info
        WHERE ($1::text IS NULL OR province = $1)
          AND ($2::bool IS NULL OR is_985 = $2)
          AND ($3::text IS NULL OR college_name ILIKE $3 ESCAPE '\')
        ORDER BY college_code ASC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(filter.province.as_deref())
    .bind(filter.is_985)
    .bind(filter.name_pattern.as_deref())
    .bind(page.page_size)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

pub async fn find_college(pool: &PgPool, college_code: i32) -> Result<Option<CollegeRow>, sqlx::Error> {
    sqlx::query_as::<_, CollegeRow>(
        r#"
        SELECT college_id, college_code, college_name, is_985, is_211, is_dfc,
               province, city_name, college_level
        FROM college_info
        WHERE college_code = $1
        "#,
    )
    .bind(college_code)
    .fetch_optional(pool)
    .await
}

pub async fn college_admissions(
    pool: &PgPool,
    college_code: i32,
    province: Option<&str>,
    year: Option<i32>,
) -> Result<Vec<AdmissionScoreRow>, sqlx::Error> {
    sqlx::query_as::<_, AdmissionScoreRow>(
        r#"
        SELECT admission_id, major_name, type, province, admission_year, min_score, min_rank
        FROM college_admission_score
        WHERE college_code = $1
          AND ($2::text IS NULL OR province = $2)
          AND ($3::int IS NULL OR admission_year = $3)
        ORDER BY admission_year DESC, admission_id ASC
        "#,
    )
    .bind(college_code)
    .bind(province)
    .bind(year)
    .fetch_all(pool)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Majors
// ────────────────────────────────────────────────────────────────────────────

pub async fn count_majors(pool: &PgPool, name_pattern: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM major_info
        WHERE ($1::text IS NULL OR major_name ILIKE $1 ESCAPE '\')
        "#,
    )
    .bind(name_pattern)
    .fetch_one(pool)
    .await
}

pub async fn list_majors(
    pool: &PgPool,
    name_pattern: Option<&str>,
    page: &Pagination,
) -> Result<Vec<MajorRow>, sqlx::Error> {
    sqlx::query_as::<_, MajorRow>(
        r#"
        SELECT major_id, major_name, major_type, base_intro
        FROM major_info
        WHERE ($1::text IS NULL OR major_name ILIKE $1 ESCAPE '\')
        ORDER BY major_name ASC, major_id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(name_pattern)
    .bind(page.page_size)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

pub async fn find_major(pool: &PgPool, major_id: i64) -> Result<Option<MajorRow>, sqlx::Error> {
    sqlx::query_as::<_, MajorRow>(
        "SELECT major_id, major_name, major_type, base_intro FROM major_info WHERE major_id = $1",
    )
    .bind(major_id)
    .fetch_optional(pool)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Enrollment plans
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PlanFilter {
    pub college_code: Option<i32>,
    pub major_id: Option<i64>,
    pub year: Option<i32>,
}

pub async fn count_plans(pool: &PgPool, filter: &PlanFilter) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM college_plan
        WHERE ($1::int IS NULL OR college_code = $1)
          AND ($2::bigint IS NULL OR major_id = $2)
          AND ($3::int IS NULL OR admission_year = $3)
        "#,
    )
    .bind(filter.college_code)
    .bind(filter.major_id)
    .bind(filter.year)
    .fetch_one(pool)
    .await
}

pub async fn list_plans(
    pool: &PgPool,
    filter: &PlanFilter,
    page: &Pagination,
) -> Result<Vec<PlanRow>, sqlx::Error> {
    sqlx::query_as::<_, PlanRow>(
        r#"
        SELECT plan_id, college_code, major_id, province, admission_year, plan_count, description
        FROM college_plan
        WHERE ($1::int IS NULL OR college_code = $1)
          AND ($2::bigint IS NULL OR major_id = $2)
          AND ($3::int IS NULL OR admission_year = $3)
        ORDER BY admission_year DESC, plan_id ASC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(filter.college_code)
    .bind(filter.major_id)
    .bind(filter.year)
    .bind(page.page_size)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// School enrollment
// ────────────────────────────────────────────────────────────────────────────

pub async fn find_school_enrollment(
    pool: &PgPool,
    id: i64,
) -> Result<Option<SchoolEnrollmentRow>, sqlx::Error> {
    sqlx::query_as::<_, SchoolEnrollmentRow>(
        r#"
        SELECT school_enrollment_id, college_name, graduation_year, admission_count,
               min_score, min_rank
        FROM school_enrollment
        WHERE school_enrollment_id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn count_school_enrollment(
    pool: &PgPool,
    school_name: &str,
    graduation_year: Option<i32>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM school_enrollment
        WHERE college_name = $1
          AND ($2::int IS NULL OR graduation_year = $2)
        "#,
    )
    .bind(school_name)
    .bind(graduation_year)
    .fetch_one(pool)
    .await
}

pub async fn list_school_enrollment(
    pool: &PgPool,
    school_name: &str,
    graduation_year: Option<i32>,
    page: &Pagination,
) -> Result<Vec<SchoolEnrollmentRow>, sqlx::Error> {
    sqlx::query_as::<_, SchoolEnrollmentRow>(
        r#"
        SELECT school_enrollment_id, college_name, graduation_year, admission_count,
               min_score, min_rank
        FROM school_enrollment
        WHERE college_name = $1
          AND ($2::int IS NULL OR graduation_year = $2)
        ORDER BY graduation_year DESC, school_enrollment_id ASC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(school_name)
    .bind(graduation_year)
    .bind(page.page_size)
    .bind(page.offset)
    .fetch_all(pool)
    .await
}
