//! services/api/src/web/remarks.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use preschool_core::domain::{Remark, RemarkKind};
use preschool_core::validation::validate_remark;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{invalid, port_failure, HandlerResult};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::today;

#[derive(Deserialize, ToSchema)]
pub struct CreateRemarkRequest {
    pub roll_number: String,
    pub subject: String,
    pub text: String,
    /// `positive`, `negative` or `neutral`.
    #[schema(value_type = String)]
    pub kind: RemarkKind,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

/// POST /remarks - Write a remark about a student (staff only)
#[utoipa::path(
    post,
    path = "/remarks",
    request_body = CreateRemarkRequest,
    responses(
        (status = 201, description = "Remark stored"),
        (status = 404, description = "No such student"),
        (status = 422, description = "Invalid remark")
    )
)]
pub async fn create_remark_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateRemarkRequest>,
) -> HandlerResult<impl IntoResponse> {
    current.require_staff()?;
    let today = today();
    let remark = Remark {
        id: Uuid::new_v4(),
        roll_number: req.roll_number,
        subject: req.subject.trim().to_string(),
        text: req.text.trim().to_string(),
        kind: req.kind,
        date: req.date.unwrap_or(today),
        author: current.user.user_id,
    };
    validate_remark(&remark, today).map_err(invalid)?;

    state
        .db
        .get_student_by_roll(&remark.roll_number)
        .await
        .map_err(|e| port_failure("load student", e))?;
    let remark = state
        .db
        .create_remark(remark)
        .await
        .map_err(|e| port_failure("create remark", e))?;
    Ok((StatusCode::CREATED, Json(remark)))
}

/// GET /students/{roll}/remarks - Remarks about a student, newest first
#[utoipa::path(
    get,
    path = "/students/{roll}/remarks",
    params(("roll" = String, Path, description = "Roll number")),
    responses(
        (status = 200, description = "Remarks"),
        (status = 403, description = "Another student's remarks")
    )
)]
pub async fn list_student_remarks_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(roll): Path<String>,
) -> HandlerResult<Json<Vec<Remark>>> {
    current.require_access_to(&roll)?;
    let remarks = state
        .db
        .list_remarks_for_student(&roll)
        .await
        .map_err(|e| port_failure("list remarks", e))?;
    Ok(Json(remarks))
}

/// DELETE /remarks/{id} - Delete a remark (staff only)
#[utoipa::path(
    delete,
    path = "/remarks/{id}",
    params(("id" = Uuid, Path, description = "Remark id")),
    responses(
        (status = 204, description = "Remark deleted"),
        (status = 404, description = "No such remark")
    )
)]
pub async fn delete_remark_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(remark_id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    current.require_staff()?;
    state
        .db
        .delete_remark(remark_id)
        .await
        .map_err(|e| port_failure("delete remark", e))?;
    Ok(StatusCode::NO_CONTENT)
}
