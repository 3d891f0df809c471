//! services/api/src/web/reports.rs
//!
//! Academic reports. Every response carries the derived per-subject grades
//! and the overall summary next to the stored marks.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use preschool_core::domain::{AcademicReport, SubjectMarks, Term};
use preschool_core::grading::{summarize_report, ReportSummary};
use preschool_core::validation::{validate_academic_year, validate_subjects};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{invalid, port_failure, HandlerResult};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct CreateReportRequest {
    pub roll_number: String,
    /// `term1`, `term2`, `term3` or `final`.
    #[schema(value_type = String)]
    pub term: Term,
    /// e.g. `2024-25`.
    pub academic_year: String,
    #[schema(value_type = Vec<Object>)]
    pub subjects: Vec<SubjectMarks>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateReportRequest {
    #[schema(value_type = Vec<Object>)]
    pub subjects: Vec<SubjectMarks>,
}

#[derive(Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: AcademicReport,
    pub summary: ReportSummary,
}

impl From<AcademicReport> for ReportView {
    fn from(report: AcademicReport) -> Self {
        let summary = summarize_report(&report);
        Self { report, summary }
    }
}

fn trimmed(subjects: Vec<SubjectMarks>) -> Vec<SubjectMarks> {
    subjects
        .into_iter()
        .map(|s| SubjectMarks {
            subject: s.subject.trim().to_string(),
            ..s
        })
        .collect()
}

/// POST /reports - Create a report for a student (staff only)
#[utoipa::path(
    post,
    path = "/reports",
    request_body = CreateReportRequest,
    responses(
        (status = 201, description = "Report with grades"),
        (status = 404, description = "No such student"),
        (status = 409, description = "A report for this term and year already exists"),
        (status = 422, description = "Invalid marks")
    )
)]
pub async fn create_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateReportRequest>,
) -> HandlerResult<impl IntoResponse> {
    current.require_staff()?;
    validate_academic_year(&req.academic_year).map_err(invalid)?;
    validate_subjects(&req.subjects).map_err(invalid)?;

    state
        .db
        .get_student_by_roll(&req.roll_number)
        .await
        .map_err(|e| port_failure("load student", e))?;
    let existing = state
        .db
        .list_reports_for_student(&req.roll_number)
        .await
        .map_err(|e| port_failure("list reports", e))?;
    if existing
        .iter()
        .any(|r| r.term == req.term && r.academic_year == req.academic_year)
    {
        return Err((
            StatusCode::CONFLICT,
            format!(
                "{} already has a {} report for {}",
                req.roll_number,
                req.term.as_str(),
                req.academic_year
            ),
        ));
    }

    let now = Utc::now();
    let report = state
        .db
        .create_report(AcademicReport {
            id: Uuid::new_v4(),
            roll_number: req.roll_number,
            term: req.term,
            academic_year: req.academic_year,
            subjects: trimmed(req.subjects),
            created_by: current.user.snapshot(),
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .map_err(|e| port_failure("create report", e))?;
    info!(report_id = %report.id, roll_number = %report.roll_number, "report created");

    Ok((StatusCode::CREATED, Json(ReportView::from(report))))
}

/// GET /reports/{id} - One report (staff, or the student it belongs to)
#[utoipa::path(
    get,
    path = "/reports/{id}",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report with grades"),
        (status = 403, description = "Another student's report"),
        (status = 404, description = "No such report")
    )
)]
pub async fn get_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(report_id): Path<Uuid>,
) -> HandlerResult<Json<ReportView>> {
    let report = state
        .db
        .get_report(report_id)
        .await
        .map_err(|e| port_failure("load report", e))?;
    current.require_access_to(&report.roll_number)?;
    Ok(Json(ReportView::from(report)))
}

/// GET /students/{roll}/reports - All reports of a student, oldest first
#[utoipa::path(
    get,
    path = "/students/{roll}/reports",
    params(("roll" = String, Path, description = "Roll number")),
    responses(
        (status = 200, description = "Reports with grades"),
        (status = 403, description = "Another student's reports")
    )
)]
pub async fn list_student_reports_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(roll): Path<String>,
) -> HandlerResult<Json<Vec<ReportView>>> {
    current.require_access_to(&roll)?;
    let reports = state
        .db
        .list_reports_for_student(&roll)
        .await
        .map_err(|e| port_failure("list reports", e))?;
    Ok(Json(reports.into_iter().map(ReportView::from).collect()))
}

/// PUT /reports/{id} - Replace the marks of a report (staff only)
#[utoipa::path(
    put,
    path = "/reports/{id}",
    params(("id" = Uuid, Path, description = "Report id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "Updated report with grades"),
        (status = 404, description = "No such report"),
        (status = 422, description = "Invalid marks")
    )
)]
pub async fn update_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<UpdateReportRequest>,
) -> HandlerResult<Json<ReportView>> {
    current.require_staff()?;
    validate_subjects(&req.subjects).map_err(invalid)?;

    let mut report = state
        .db
        .get_report(report_id)
        .await
        .map_err(|e| port_failure("load report", e))?;
    report.subjects = trimmed(req.subjects);
    report.updated_by = Some(current.user.snapshot());
    report.updated_at = Utc::now();

    state
        .db
        .update_report(&report)
        .await
        .map_err(|e| port_failure("update report", e))?;
    Ok(Json(ReportView::from(report)))
}

/// DELETE /reports/{id} - Delete a report (admin only)
#[utoipa::path(
    delete,
    path = "/reports/{id}",
    params(("id" = Uuid, Path, description = "Report id")),
    responses(
        (status = 204, description = "Report deleted"),
        (status = 404, description = "No such report")
    )
)]
pub async fn delete_report_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(report_id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    current.require_admin()?;
    state
        .db
        .delete_report(report_id)
        .await
        .map_err(|e| port_failure("delete report", e))?;
    Ok(StatusCode::NO_CONTENT)
}
