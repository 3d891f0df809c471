//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the health check.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

use crate::error::{port_failure, HandlerResult};
use crate::web::state::AppState;
use crate::web::{
    assessments, attendance, auth, events, finance, preferences, remarks, reports, students,
    users,
};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::signup_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        users::list_users_handler,
        users::create_user_handler,
        users::delete_user_handler,
        users::bulk_create_users_handler,
        students::list_students_handler,
        students::create_student_handler,
        students::get_student_handler,
        students::update_student_handler,
        students::delete_student_handler,
        students::bulk_import_handler,
        attendance::daily_sheet_handler,
        attendance::save_attendance_handler,
        attendance::daily_stats_handler,
        attendance::range_stats_handler,
        attendance::monthly_stats_handler,
        attendance::student_summary_handler,
        reports::create_report_handler,
        reports::get_report_handler,
        reports::list_student_reports_handler,
        reports::update_report_handler,
        reports::delete_report_handler,
        remarks::create_remark_handler,
        remarks::list_student_remarks_handler,
        remarks::delete_remark_handler,
        events::announcements_handler,
        events::list_events_handler,
        events::get_event_handler,
        events::create_event_handler,
        events::update_event_handler,
        events::delete_event_handler,
        finance::list_finance_handler,
        finance::create_finance_handler,
        finance::delete_finance_handler,
        preferences::get_preferences_handler,
        preferences::update_preferences_handler,
        preferences::pending_announcements_handler,
        preferences::dismiss_announcement_handler,
        assessments::list_instruments_handler,
        assessments::questions_handler,
        assessments::score_handler,
        assessments::create_session_handler,
        assessments::get_session_handler,
        assessments::start_session_handler,
        assessments::answer_handler,
        assessments::reset_session_handler,
        assessments::discard_session_handler,
    ),
    components(
        schemas(
            HealthResponse,
            auth::SignupRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            users::CreateUserRequest,
            users::BulkUserItem,
            students::UpdateStudentRequest,
            students::DeleteStudentResponse,
            attendance::SaveAttendanceRequest,
            reports::CreateReportRequest,
            reports::UpdateReportRequest,
            remarks::CreateRemarkRequest,
            events::EventRequest,
            finance::FinancialRecordRequest,
            preferences::UpdatePreferencesRequest,
            assessments::ScoreRequest,
            assessments::CreateSessionRequest,
            assessments::AnswerRequest,
        )
    ),
    tags(
        (name = "Pre-school API", description = "Attendance, assessments, reports and school administration.")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Liveness plus a round trip to the record store
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service and store reachable", body = HealthResponse),
        (status = 500, description = "Store unreachable")
    )
)]
pub async fn health_handler(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<(StatusCode, Json<HealthResponse>)> {
    state
        .db
        .count_users()
        .await
        .map_err(|e| port_failure("reach the record store", e))?;
    Ok((StatusCode::OK, Json(HealthResponse { status: "ok" })))
}
