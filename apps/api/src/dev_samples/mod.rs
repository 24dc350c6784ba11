//! Development-only table sampler. Mounted only when `ENABLE_DEV_SAMPLES` is set.
//!
//! Table names come from the closed `SampleTable` set, so nothing from the
//! query string is ever spliced into SQL.

use std::collections::BTreeMap;
use std::str::FromStr;

use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::warn;

use crate::errors::AppError;
use crate::extract::AppQuery;
use crate::pagination::lenient_int;
use crate::state::AppState;

const DEFAULT_SAMPLE_SIZE: i64 = 5;
const MAX_SAMPLE_SIZE: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SampleTable {
    CollegeInfo,
    MajorInfo,
    CollegeAdmissionScore,
    CollegePlan,
    SchoolEnrollment,
    Users,
    StudentScore,
}

impl SampleTable {
    pub const ALL: [SampleTable; 7] = [
        SampleTable::CollegeInfo,
        SampleTable::MajorInfo,
        SampleTable::CollegeAdmissionScore,
        SampleTable::CollegePlan,
        SampleTable::SchoolEnrollment,
        SampleTable::Users,
        SampleTable::StudentScore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SampleTable::CollegeInfo => "college_info",
            SampleTable::MajorInfo => "major_info",
            SampleTable::CollegeAdmissionScore => "college_admission_score",
            SampleTable::CollegePlan => "college_plan",
            SampleTable::SchoolEnrollment => "school_enrollment",
            SampleTable::Users => "users",
            SampleTable::StudentScore => "student_score",
        }
    }
}

impl FromStr for SampleTable {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleTable::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleQuery {
    pub tables: Option<String>,
    pub sample_size: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TableReport {
    #[serde(rename_all = "camelCase")]
    Sample {
        columns: Vec<String>,
        samples: Vec<Value>,
        row_count: i64,
    },
    Failed {
        error: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleMeta {
    pub requested_tables: Vec<&'static str>,
    pub sample_size: i64,
}

#[derive(Debug, Serialize)]
pub struct SampleResponse {
    pub data: BTreeMap<&'static str, TableReport>,
    pub meta: SampleMeta,
}

/// All tables when `raw` is blank; otherwise the known names it lists, in
/// order, without duplicates. Unknown names are dropped.
pub fn parse_tables(raw: Option<&str>) -> Result<Vec<SampleTable>, AppError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Ok(SampleTable::ALL.to_vec());
    }

    let mut tables = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        match name.parse::<SampleTable>() {
            Ok(table) if !tables.contains(&table) => tables.push(table),
            Ok(_) => {}
            Err(()) => warn!("Dropping unknown dev-sample table '{name}'"),
        }
    }

    if tables.is_empty() {
        return Err(AppError::Validation("No valid tables requested".to_string()));
    }
    Ok(tables)
}

pub fn sample_size(raw: Option<&str>) -> i64 {
    lenient_int(raw)
        .unwrap_or(DEFAULT_SAMPLE_SIZE)
        .clamp(1, MAX_SAMPLE_SIZE)
}

async fn sample_table(pool: &PgPool, table: SampleTable, limit: i64) -> Result<TableReport, sqlx::Error> {
    let name = table.as_str();

    let columns: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT column_name::text
        FROM information_schema.columns
        WHERE table_schema = current_schema()
          AND table_name = $1
          AND column_name <> 'password_hash'
        ORDER BY ordinal_position
        "#,
    )
    .bind(name)
    .fetch_all(pool)
    .await?;

    let samples: Vec<Value> = sqlx::query_scalar(&format!(
        "SELECT to_jsonb(t) - 'password_hash' FROM {name} t LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    let row_count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {name}"))
        .fetch_one(pool)
        .await?;

    Ok(TableReport::Sample {
        columns,
        samples,
        row_count,
    })
}

/// GET /api/v1/dev-samples
pub async fn handle_dev_samples(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SampleQuery>,
) -> Result<Json<SampleResponse>, AppError> {
    let tables = parse_tables(query.tables.as_deref())?;
    let limit = sample_size(query.sample_size.as_deref());

    let mut data = BTreeMap::new();
    for table in &tables {
        // One failing table is reported in place; the rest still return.
        let report = match sample_table(&state.db, *table, limit).await {
            Ok(report) => report,
            Err(e) => {
                warn!("Dev sample for {} failed: {e}", table.as_str());
                TableReport::Failed {
                    error: e.to_string(),
                }
            }
        };
        data.insert(table.as_str(), report);
    }

    Ok(Json(SampleResponse {
        data,
        meta: SampleMeta {
            requested_tables: tables.iter().map(|t| t.as_str()).collect(),
            sample_size: limit,
        },
    }))
}
