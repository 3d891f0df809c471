//! services/api/src/web/attendance.rs
//!
//! Attendance sheets, optimistic writes and the aggregate statistics.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use preschool_core::attendance::{
    self, resolve_statuses, ClassDayStats, DayReport, MonthReport, RangeReport, StudentSummary,
};
use preschool_core::dates::{self, parse_date};
use preschool_core::domain::{
    AttendanceEntry, AttendanceRecord, AttendanceStatus, ClassName, Student,
};
use preschool_core::ports::StudentFilter;
use preschool_core::validation::validate_attendance_entries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{attendance_failure, bad_date, invalid, port_failure, HandlerResult};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::{parse_class, today};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize)]
pub struct SheetRow {
    pub roll_number: String,
    pub name: String,
    pub status: AttendanceStatus,
    pub remarks: Option<String>,
}

/// One class on one date as a teacher marks it. `version` is what a
/// subsequent write must send as `expected_version`.
#[derive(Serialize)]
pub struct DailySheet {
    pub class: ClassName,
    pub date: NaiveDate,
    pub version: Option<i64>,
    pub marked_by: Option<Uuid>,
    pub updated_at: Option<DateTime<Utc>>,
    pub rows: Vec<SheetRow>,
    pub stats: ClassDayStats,
    pub percentage: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveAttendanceRequest {
    #[schema(value_type = Vec<Object>)]
    pub entries: Vec<AttendanceEntry>,
    /// Version read with the sheet; omit when no record existed yet.
    pub expected_version: Option<i64>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateQuery {
    /// Defaults to today.
    pub date: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MonthQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Serialize)]
pub struct DailyStatsResponse {
    #[serde(flatten)]
    pub report: DayReport,
    pub percentages: BTreeMap<ClassName, u32>,
}

#[derive(Serialize)]
pub struct RangeStatsResponse {
    #[serde(flatten)]
    pub report: RangeReport,
    pub percentages: BTreeMap<ClassName, u32>,
}

#[derive(Serialize)]
pub struct MonthlyStatsResponse {
    #[serde(flatten)]
    pub report: MonthReport,
    pub percentages: BTreeMap<ClassName, u32>,
}

#[derive(Serialize)]
pub struct StudentAttendanceResponse {
    pub roll_number: String,
    pub class: ClassName,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub summary: StudentSummary,
}

fn parse_path_date(raw: &str) -> HandlerResult<NaiveDate> {
    parse_date(raw).map_err(bad_date)
}

/// Missing bounds default to the current month up to today.
fn resolve_range(query: &RangeQuery) -> HandlerResult<(NaiveDate, NaiveDate)> {
    let now = today();
    let start = match &query.start {
        Some(raw) => parse_path_date(raw)?,
        None => dates::month_bounds(now.year(), now.month())
            .map_err(bad_date)?
            .0,
    };
    let end = match &query.end {
        Some(raw) => parse_path_date(raw)?,
        None => now,
    };
    dates::checked_range(start, end).map_err(bad_date)?;
    Ok((start, end))
}

//=========================================================================================
// Sheet Handlers
//=========================================================================================

/// GET /attendance/{class}/{date} - The class roster with each student's status (staff only)
#[utoipa::path(
    get,
    path = "/attendance/{class}/{date}",
    params(
        ("class" = String, Path, description = "play, nursery, lkg, ukg or 1st"),
        ("date" = String, Path, description = "YYYY-MM-DD or MM/DD/YYYY")
    ),
    responses(
        (status = 200, description = "Daily sheet with the record version"),
        (status = 400, description = "Unknown class or bad date")
    )
)]
pub async fn daily_sheet_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((class, date)): Path<(String, String)>,
) -> HandlerResult<Json<DailySheet>> {
    current.require_staff()?;
    let class = parse_class(&class)?;
    let date = parse_path_date(&date)?;

    let (mut students, record) = load_sheet_inputs(&state, class, date).await?;
    students.sort_by(|a, b| a.roll_number.cmp(&b.roll_number));
    let names: BTreeMap<&str, String> = students
        .iter()
        .map(|s| (s.roll_number.as_str(), s.full_name()))
        .collect();
    let roster: Vec<String> = students.iter().map(|s| s.roll_number.clone()).collect();

    let stats = attendance::class_day_stats(&roster, record.as_ref());
    let rows = resolve_statuses(&roster, record.as_ref())
        .into_iter()
        .map(|entry| SheetRow {
            name: names
                .get(entry.roll_number.as_str())
                .cloned()
                .unwrap_or_default(),
            roll_number: entry.roll_number,
            status: entry.status,
            remarks: entry.remarks,
        })
        .collect();

    Ok(Json(DailySheet {
        class,
        date,
        version: record.as_ref().map(|r| r.version),
        marked_by: record.as_ref().map(|r| r.marked_by),
        updated_at: record.as_ref().map(|r| r.updated_at),
        rows,
        percentage: stats.percentage(),
        stats,
    }))
}

async fn load_sheet_inputs(
    state: &AppState,
    class: ClassName,
    date: NaiveDate,
) -> HandlerResult<(Vec<Student>, Option<AttendanceRecord>)> {
    let students = state
        .db
        .list_students(StudentFilter::active_in(class))
        .await
        .map_err(|e| port_failure("list students", e))?;
    let record = state
        .db
        .get_attendance(class, date)
        .await
        .map_err(|e| port_failure("load attendance", e))?;
    Ok((students, record))
}

/// PUT /attendance/{class}/{date} - Record attendance (staff only)
///
/// Rejected with 409 when the stored record changed since `expected_version`
/// was read, including when a record was created in the meantime.
#[utoipa::path(
    put,
    path = "/attendance/{class}/{date}",
    params(
        ("class" = String, Path, description = "play, nursery, lkg, ukg or 1st"),
        ("date" = String, Path, description = "YYYY-MM-DD or MM/DD/YYYY")
    ),
    request_body = SaveAttendanceRequest,
    responses(
        (status = 200, description = "Stored record with its new version"),
        (status = 409, description = "Stale write"),
        (status = 422, description = "Entries not on the roster, duplicated, or a future date")
    )
)]
pub async fn save_attendance_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path((class, date)): Path<(String, String)>,
    Json(req): Json<SaveAttendanceRequest>,
) -> HandlerResult<Json<AttendanceRecord>> {
    current.require_staff()?;
    let class = parse_class(&class)?;
    let date = parse_path_date(&date)?;

    let students = state
        .db
        .list_students(StudentFilter::active_in(class))
        .await
        .map_err(|e| port_failure("list students", e))?;
    let roster: Vec<String> = students.into_iter().map(|s| s.roll_number).collect();
    validate_attendance_entries(&req.entries, &roster, date, today()).map_err(invalid)?;

    let record = AttendanceRecord {
        class,
        date,
        entries: req.entries,
        marked_by: current.user.user_id,
        version: req.expected_version.unwrap_or(0),
        updated_at: Utc::now(),
    };
    let saved = state
        .db
        .save_attendance(record, req.expected_version)
        .await
        .map_err(|e| port_failure("save attendance", e))?;
    info!(class = %class, date = %date, version = saved.version, "attendance saved");
    Ok(Json(saved))
}

//=========================================================================================
// Statistics Handlers
//=========================================================================================

/// GET /attendance/stats/daily - Per-class counts for one date (staff only)
#[utoipa::path(
    get,
    path = "/attendance/stats/daily",
    params(DateQuery),
    responses((status = 200, description = "Per-class totals and percentages"))
)]
pub async fn daily_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<DateQuery>,
) -> HandlerResult<Json<DailyStatsResponse>> {
    current.require_staff()?;
    let date = match &query.date {
        Some(raw) => parse_path_date(raw)?,
        None => today(),
    };
    let report = attendance::load_daily(state.db.as_ref(), date)
        .await
        .map_err(|e| attendance_failure("compute daily attendance", e))?;
    let percentages = report
        .classes
        .iter()
        .map(|(class, stats)| (*class, stats.percentage()))
        .collect();
    Ok(Json(DailyStatsResponse {
        report,
        percentages,
    }))
}

/// GET /attendance/stats/range - Day-by-day counts and per-class totals (staff only)
#[utoipa::path(
    get,
    path = "/attendance/stats/range",
    params(RangeQuery),
    responses(
        (status = 200, description = "Per-day stats plus per-class summary"),
        (status = 400, description = "Inverted or overlong range")
    )
)]
pub async fn range_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<RangeQuery>,
) -> HandlerResult<Json<RangeStatsResponse>> {
    current.require_staff()?;
    let (start, end) = resolve_range(&query)?;
    let report = attendance::load_range(state.db.as_ref(), start, end)
        .await
        .map_err(|e| attendance_failure("compute attendance range", e))?;
    let percentages = report
        .summary
        .iter()
        .map(|(class, summary)| (*class, summary.percentage()))
        .collect();
    Ok(Json(RangeStatsResponse {
        report,
        percentages,
    }))
}

/// GET /attendance/stats/monthly - A calendar month with its working days (staff only)
#[utoipa::path(
    get,
    path = "/attendance/stats/monthly",
    params(MonthQuery),
    responses(
        (status = 200, description = "Month stats"),
        (status = 400, description = "Invalid month")
    )
)]
pub async fn monthly_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<MonthQuery>,
) -> HandlerResult<Json<MonthlyStatsResponse>> {
    current.require_staff()?;
    let report = attendance::load_month(state.db.as_ref(), query.year, query.month)
        .await
        .map_err(|e| attendance_failure("compute monthly attendance", e))?;
    let percentages = report
        .range
        .summary
        .iter()
        .map(|(class, summary)| (*class, summary.percentage()))
        .collect();
    Ok(Json(MonthlyStatsResponse {
        report,
        percentages,
    }))
}

/// GET /students/{roll}/attendance - One student's attendance over a range
#[utoipa::path(
    get,
    path = "/students/{roll}/attendance",
    params(("roll" = String, Path, description = "Roll number"), RangeQuery),
    responses(
        (status = 200, description = "Counts over days on which the class was marked"),
        (status = 403, description = "Another student's record"),
        (status = 404, description = "No such student")
    )
)]
pub async fn student_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(roll): Path<String>,
    Query(query): Query<RangeQuery>,
) -> HandlerResult<Json<StudentAttendanceResponse>> {
    current.require_access_to(&roll)?;
    let (start, end) = resolve_range(&query)?;
    let student = state
        .db
        .get_student_by_roll(&roll)
        .await
        .map_err(|e| port_failure("load student", e))?;
    let records = state
        .db
        .list_attendance_between(start, end)
        .await
        .map_err(|e| port_failure("load attendance", e))?;
    let summary = attendance::student_summary(&roll, student.class, &records, start, end)
        .map_err(bad_date)?;

    Ok(Json(StudentAttendanceResponse {
        roll_number: roll,
        class: student.class,
        start,
        end,
        summary,
    }))
}
