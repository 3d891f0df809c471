//! services/api/src/web/users.rs
//!
//! Account administration. Only admins create and delete accounts; student
//! accounts are paired with an existing student through its roll number.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use preschool_core::bulk::{run_bulk, BulkStep};
use preschool_core::domain::{NewStudent, NewUser, Role, User};
use preschool_core::ports::DatabaseService;
use preschool_core::validation::validate_account;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{invalid, port_failure, HandlerResult};
use crate::web::auth::hash_password;
use crate::web::middleware::{recheck_admin_session, CurrentUser};
use crate::web::state::AppState;
use crate::web::students::enroll_student;
use crate::web::today;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// `admin`, `teacher` or `student`.
    pub role: Option<String>,
}

#[derive(Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    #[schema(value_type = String)]
    pub role: Role,
    /// Required for student accounts; the student must already exist.
    pub roll_number: Option<String>,
}

/// One row of a bulk user job. A student account may bring its student
/// along, in which case the student is enrolled first.
#[derive(Deserialize, ToSchema)]
pub struct BulkUserItem {
    #[serde(flatten)]
    pub account: CreateUserRequest,
    #[schema(value_type = Object)]
    pub student: Option<NewStudent>,
}

//=========================================================================================
// Account Creation (shared with the bulk job)
//=========================================================================================

async fn create_account(db: &dyn DatabaseService, req: CreateUserRequest) -> HandlerResult<User> {
    validate_account(
        &req.email,
        &req.password,
        &req.display_name,
        req.role,
        req.roll_number.as_deref(),
    )
    .map_err(invalid)?;

    if let Some(roll) = &req.roll_number {
        db.get_student_by_roll(roll)
            .await
            .map_err(|e| port_failure("load student", e))?;
    }

    let user = db
        .create_user(NewUser {
            email: req.email,
            hashed_password: hash_password(&req.password)?,
            display_name: req.display_name.trim().to_string(),
            role: req.role,
            roll_number: req.roll_number,
        })
        .await
        .map_err(|e| port_failure("create user", e))?;
    info!(user_id = %user.user_id, role = user.role.as_str(), "account created");
    Ok(user)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /users - List accounts (admin only)
#[utoipa::path(
    get,
    path = "/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Accounts ordered by email"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<UserListQuery>,
) -> HandlerResult<Json<Vec<User>>> {
    current.require_admin()?;
    let role = query
        .role
        .as_deref()
        .map(str::parse::<Role>)
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let users = state
        .db
        .list_users(role)
        .await
        .map_err(|e| port_failure("list users", e))?;
    Ok(Json(users))
}

/// POST /users - Create an account (admin only)
#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 404, description = "Student roll number not found"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid account")
    )
)]
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateUserRequest>,
) -> HandlerResult<impl IntoResponse> {
    current.require_admin()?;
    let user = create_account(state.db.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// DELETE /users/{id} - Delete an account (admin only, not your own)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = Uuid, Path, description = "Account id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 404, description = "No such account"),
        (status = 409, description = "Cannot delete the account in use")
    )
)]
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(user_id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    current.require_admin()?;
    if user_id == current.user.user_id {
        return Err((
            StatusCode::CONFLICT,
            "You cannot delete your own account".to_string(),
        ));
    }
    state
        .db
        .delete_user(user_id)
        .await
        .map_err(|e| port_failure("delete user", e))?;
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Bulk Creation
//=========================================================================================

struct UserImport {
    state: Arc<AppState>,
    session_id: String,
    today: NaiveDate,
}

#[async_trait]
impl BulkStep for UserImport {
    type Item = BulkUserItem;
    type Output = User;

    fn label(&self, item: &BulkUserItem) -> String {
        item.account.email.clone()
    }

    async fn precondition(&self) -> Result<(), String> {
        recheck_admin_session(self.state.db.as_ref(), &self.session_id).await
    }

    async fn apply(&self, item: BulkUserItem) -> Result<User, String> {
        let db = self.state.db.as_ref();
        let mut account = item.account;

        let enrolled = match item.student {
            Some(new_student) if account.role == Role::Student => {
                let student = enroll_student(db, new_student, self.today)
                    .await
                    .map_err(|(_, reason)| format!("student: {}", reason))?;
                account.roll_number = Some(student.roll_number.clone());
                Some(student.roll_number)
            }
            Some(_) => return Err("only student accounts can enrol a student".to_string()),
            None => None,
        };

        match create_account(db, account).await {
            Ok(user) => Ok(user),
            Err((_, reason)) => {
                let Some(roll) = enrolled else {
                    return Err(reason);
                };
                // Undo the enrolment so a retry starts clean.
                match db.delete_student(&roll).await {
                    Ok(()) => Err(format!("{} (student {} removed again)", reason, roll)),
                    Err(e) => {
                        warn!(roll_number = %roll, error = %e, "failed to remove student after account failure");
                        Err(format!("{} (student {} could not be removed: {})", reason, roll, e))
                    }
                }
            }
        }
    }
}

/// POST /users/bulk - Create many accounts, continuing past failures (admin only)
#[utoipa::path(
    post,
    path = "/users/bulk",
    responses(
        (status = 200, description = "Per-item outcome: succeeded, failures, aborted, skipped"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn bulk_create_users_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(items): Json<Vec<BulkUserItem>>,
) -> HandlerResult<impl IntoResponse> {
    current.require_admin()?;
    let step = UserImport {
        state: state.clone(),
        session_id: current.session_id.clone(),
        today: today(),
    };
    Ok(Json(run_bulk(&step, items).await))
}
