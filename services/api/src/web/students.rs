//! services/api/src/web/students.rs
//!
//! Student enrolment: CRUD, bulk import and the cascade from a deleted
//! student to its paired account.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use preschool_core::bulk::{run_bulk, BulkStep};
use preschool_core::domain::{ClassName, NewStudent, ParentInfo, Student};
use preschool_core::ports::{DatabaseService, StudentFilter};
use preschool_core::validation::{validate_new_student, validate_student};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{invalid, port_failure, HandlerResult};
use crate::web::middleware::{recheck_admin_session, CurrentUser};
use crate::web::state::AppState;
use crate::web::{parse_class, today};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentListQuery {
    /// Restrict to one class (`play`, `nursery`, `lkg`, `ukg`, `1st`).
    pub class: Option<String>,
    /// Include students who have left (default false).
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateStudentRequest {
    pub first_name: String,
    pub last_name: String,
    #[schema(value_type = String)]
    pub class: ClassName,
    pub age: u8,
    #[schema(value_type = Object)]
    pub parent: ParentInfo,
    pub admission_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Serialize, ToSchema)]
pub struct DeleteStudentResponse {
    pub roll_number: String,
    /// Paired student accounts removed after the student record.
    pub accounts_removed: u64,
    /// Set when the student was deleted but removing the account failed.
    pub account_cleanup_error: Option<String>,
}

//=========================================================================================
// Enrolment (shared with bulk user creation)
//=========================================================================================

/// Validates and stores a new student, allocating the next roll number for
/// the class prefix when none is given.
pub async fn enroll_student(
    db: &dyn DatabaseService,
    new_student: NewStudent,
    today: NaiveDate,
) -> HandlerResult<Student> {
    validate_new_student(&new_student, today).map_err(invalid)?;

    let roll_number = match &new_student.roll_number {
        Some(roll) => roll.clone(),
        None => db
            .allocate_roll_number(new_student.class)
            .await
            .map_err(|e| port_failure("allocate roll number", e))?,
    };

    let student = db
        .create_student(new_student.into_student(Uuid::new_v4(), roll_number))
        .await
        .map_err(|e| port_failure("create student", e))?;
    info!(roll_number = %student.roll_number, class = %student.class, "student enrolled");
    Ok(student)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /students - List students (staff only)
#[utoipa::path(
    get,
    path = "/students",
    params(StudentListQuery),
    responses(
        (status = 200, description = "Students ordered by roll number"),
        (status = 400, description = "Unknown class"),
        (status = 403, description = "Not staff")
    )
)]
pub async fn list_students_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<StudentListQuery>,
) -> HandlerResult<Json<Vec<Student>>> {
    current.require_staff()?;
    let class = query.class.as_deref().map(parse_class).transpose()?;
    let mut students = state
        .db
        .list_students(StudentFilter {
            class,
            active_only: !query.include_inactive,
        })
        .await
        .map_err(|e| port_failure("list students", e))?;
    students.sort_by(|a, b| a.roll_number.cmp(&b.roll_number));
    Ok(Json(students))
}

/// POST /students - Enrol a student (admin only)
#[utoipa::path(
    post,
    path = "/students",
    request_body = Object,
    responses(
        (status = 201, description = "Student created"),
        (status = 409, description = "Roll number taken"),
        (status = 422, description = "Invalid student")
    )
)]
pub async fn create_student_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<NewStudent>,
) -> HandlerResult<impl IntoResponse> {
    current.require_admin()?;
    let student = enroll_student(state.db.as_ref(), req, today()).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /students/{roll} - One student (staff, or the student themself)
#[utoipa::path(
    get,
    path = "/students/{roll}",
    params(("roll" = String, Path, description = "Roll number, e.g. LKG-001")),
    responses(
        (status = 200, description = "The student"),
        (status = 403, description = "Another student's record"),
        (status = 404, description = "No such student")
    )
)]
pub async fn get_student_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(roll): Path<String>,
) -> HandlerResult<Json<Student>> {
    current.require_access_to(&roll)?;
    let student = state
        .db
        .get_student_by_roll(&roll)
        .await
        .map_err(|e| port_failure("load student", e))?;
    Ok(Json(student))
}

/// PUT /students/{roll} - Update a student (admin only); the roll number never changes
#[utoipa::path(
    put,
    path = "/students/{roll}",
    params(("roll" = String, Path, description = "Roll number")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Updated student"),
        (status = 404, description = "No such student"),
        (status = 422, description = "Invalid student")
    )
)]
pub async fn update_student_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(roll): Path<String>,
    Json(req): Json<UpdateStudentRequest>,
) -> HandlerResult<Json<Student>> {
    current.require_admin()?;
    let existing = state
        .db
        .get_student_by_roll(&roll)
        .await
        .map_err(|e| port_failure("load student", e))?;

    let updated = Student {
        id: existing.id,
        roll_number: existing.roll_number,
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name.trim().to_string(),
        class: req.class,
        age: req.age,
        parent: req.parent,
        admission_date: req.admission_date,
        is_active: req.is_active,
    };
    validate_student(&updated, today()).map_err(invalid)?;

    state
        .db
        .update_student(&updated)
        .await
        .map_err(|e| port_failure("update student", e))?;
    Ok(Json(updated))
}

/// DELETE /students/{roll} - Remove a student, then its paired account (admin only)
///
/// The two deletions are independent: when the account cleanup fails the
/// student stays deleted and the failure is reported in the response.
#[utoipa::path(
    delete,
    path = "/students/{roll}",
    params(("roll" = String, Path, description = "Roll number")),
    responses(
        (status = 200, description = "Student deleted", body = DeleteStudentResponse),
        (status = 404, description = "No such student")
    )
)]
pub async fn delete_student_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(roll): Path<String>,
) -> HandlerResult<Json<DeleteStudentResponse>> {
    current.require_admin()?;
    state
        .db
        .delete_student(&roll)
        .await
        .map_err(|e| port_failure("delete student", e))?;

    let (accounts_removed, account_cleanup_error) =
        match state.db.delete_users_for_roll_number(&roll).await {
            Ok(n) => (n, None),
            Err(e) => {
                warn!(roll_number = %roll, error = %e, "student deleted but account cleanup failed");
                (0, Some(e.to_string()))
            }
        };

    Ok(Json(DeleteStudentResponse {
        roll_number: roll,
        accounts_removed,
        account_cleanup_error,
    }))
}

//=========================================================================================
// Bulk Import
//=========================================================================================

struct StudentImport {
    state: Arc<AppState>,
    session_id: String,
    today: NaiveDate,
}

#[async_trait]
impl BulkStep for StudentImport {
    type Item = NewStudent;
    type Output = Student;

    fn label(&self, item: &NewStudent) -> String {
        match &item.roll_number {
            Some(roll) => roll.clone(),
            None => format!("{} {} ({})", item.first_name, item.last_name, item.class),
        }
    }

    async fn precondition(&self) -> Result<(), String> {
        recheck_admin_session(self.state.db.as_ref(), &self.session_id).await
    }

    async fn apply(&self, item: NewStudent) -> Result<Student, String> {
        enroll_student(self.state.db.as_ref(), item, self.today)
            .await
            .map_err(|(_, reason)| reason)
    }
}

/// POST /students/bulk - Enrol many students, continuing past failures (admin only)
#[utoipa::path(
    post,
    path = "/students/bulk",
    request_body = Vec<Object>,
    responses(
        (status = 200, description = "Per-item outcome: succeeded, failures, aborted, skipped"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn bulk_import_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(items): Json<Vec<NewStudent>>,
) -> HandlerResult<impl IntoResponse> {
    current.require_admin()?;
    let step = StudentImport {
        state: state.clone(),
        session_id: current.session_id.clone(),
        today: today(),
    };
    let report = run_bulk(&step, items).await;
    Ok(Json(report))
}
