pub mod assessments;
pub mod attendance;
pub mod auth;
pub mod events;
pub mod finance;
pub mod middleware;
pub mod preferences;
pub mod remarks;
pub mod reports;
pub mod rest;
pub mod state;
pub mod students;
pub mod users;

pub use middleware::{require_auth, CurrentUser};
pub use rest::ApiDoc;
pub use state::AppState;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use preschool_core::domain::ClassName;
use std::sync::Arc;

use crate::error::HandlerResult;

/// The school's calendar date; attendance and remarks cannot be dated after it.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn parse_class(raw: &str) -> HandlerResult<ClassName> {
    raw.parse::<ClassName>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

/// Builds every route of the service over the given state.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/announcements", get(events::announcements_handler))
        .route("/assessments", get(assessments::list_instruments_handler))
        .route(
            "/assessments/{instrument}/questions",
            get(assessments::questions_handler),
        )
        .route(
            "/assessments/{instrument}/score",
            post(assessments::score_handler),
        )
        .route(
            "/assessments/sessions",
            post(assessments::create_session_handler),
        )
        .route(
            "/assessments/sessions/{id}",
            get(assessments::get_session_handler).delete(assessments::discard_session_handler),
        )
        .route(
            "/assessments/sessions/{id}/start",
            post(assessments::start_session_handler),
        )
        .route(
            "/assessments/sessions/{id}/answer",
            post(assessments::answer_handler),
        )
        .route(
            "/assessments/sessions/{id}/reset",
            post(assessments::reset_session_handler),
        );

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/preferences",
            get(preferences::get_preferences_handler).put(preferences::update_preferences_handler),
        )
        .route(
            "/preferences/announcements",
            get(preferences::pending_announcements_handler),
        )
        .route(
            "/preferences/announcements/{id}/dismiss",
            post(preferences::dismiss_announcement_handler),
        )
        .route(
            "/users",
            get(users::list_users_handler).post(users::create_user_handler),
        )
        .route("/users/bulk", post(users::bulk_create_users_handler))
        .route("/users/{id}", delete(users::delete_user_handler))
        .route(
            "/students",
            get(students::list_students_handler).post(students::create_student_handler),
        )
        .route("/students/bulk", post(students::bulk_import_handler))
        .route(
            "/students/{roll}",
            get(students::get_student_handler)
                .put(students::update_student_handler)
                .delete(students::delete_student_handler),
        )
        .route(
            "/students/{roll}/attendance",
            get(attendance::student_summary_handler),
        )
        .route(
            "/students/{roll}/reports",
            get(reports::list_student_reports_handler),
        )
        .route(
            "/students/{roll}/remarks",
            get(remarks::list_student_remarks_handler),
        )
        .route(
            "/attendance/stats/daily",
            get(attendance::daily_stats_handler),
        )
        .route(
            "/attendance/stats/range",
            get(attendance::range_stats_handler),
        )
        .route(
            "/attendance/stats/monthly",
            get(attendance::monthly_stats_handler),
        )
        .route(
            "/attendance/{class}/{date}",
            get(attendance::daily_sheet_handler).put(attendance::save_attendance_handler),
        )
        .route("/reports", post(reports::create_report_handler))
        .route(
            "/reports/{id}",
            get(reports::get_report_handler)
                .put(reports::update_report_handler)
                .delete(reports::delete_report_handler),
        )
        .route("/remarks", post(remarks::create_remark_handler))
        .route("/remarks/{id}", delete(remarks::delete_remark_handler))
        .route(
            "/events",
            get(events::list_events_handler).post(events::create_event_handler),
        )
        .route(
            "/events/{id}",
            get(events::get_event_handler)
                .put(events::update_event_handler)
                .delete(events::delete_event_handler),
        )
        .route(
            "/finance",
            get(finance::list_finance_handler).post(finance::create_finance_handler),
        )
        .route("/finance/{id}", delete(finance::delete_finance_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
