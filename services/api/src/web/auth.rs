//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for first-admin signup, login, logout and the
//! current account.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use preschool_core::domain::{NewUser, Role, User};
use preschool_core::validation::validate_account;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{invalid, port_failure, HandlerResult};
use crate::web::middleware::{session_cookie, CurrentUser, SESSION_COOKIE};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    /// One of `admin`, `teacher`, `student`.
    pub role: String,
    pub roll_number: Option<String>,
}

impl From<User> for AuthResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            email: user.email,
            display_name: user.display_name,
            role: user.role.as_str().to_string(),
            roll_number: user.roll_number,
        }
    }
}

//=========================================================================================
// Shared Helpers
//=========================================================================================

pub fn hash_password(password: &str) -> HandlerResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })
}

/// Creates an auth session for the user and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, user_id: Uuid) -> HandlerResult<String> {
    let auth_session_id = Uuid::new_v4().to_string();
    let lifetime = Duration::days(state.config.auth_session_days);
    let expires_at = Utc::now() + lifetime;

    state
        .db
        .create_auth_session(&auth_session_id, user_id, expires_at)
        .await
        .map_err(|e| port_failure("create session", e))?;

    Ok(format!(
        "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        auth_session_id,
        lifetime.num_seconds()
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/signup - Create the first (admin) account
///
/// Only available while no account exists; afterwards admins create accounts.
#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Admin account created", body = AuthResponse),
        (status = 403, description = "Signup is closed"),
        (status = 422, description = "Invalid request"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignupRequest>,
) -> HandlerResult<impl IntoResponse> {
    // 1. Signup only bootstraps the first account
    let existing = state
        .db
        .count_users()
        .await
        .map_err(|e| port_failure("count users", e))?;
    if existing > 0 {
        return Err((
            StatusCode::FORBIDDEN,
            "Signup is closed; ask an administrator for an account".to_string(),
        ));
    }

    // 2. Validate and hash
    validate_account(&req.email, &req.password, &req.display_name, Role::Admin, None)
        .map_err(invalid)?;
    let password_hash = hash_password(&req.password)?;

    // 3. Create user
    let user = state
        .db
        .create_user(NewUser {
            email: req.email,
            hashed_password: password_hash,
            display_name: req.display_name.trim().to_string(),
            role: Role::Admin,
            roll_number: None,
        })
        .await
        .map_err(|e| port_failure("create user", e))?;
    info!(user_id = %user.user_id, "first administrator account created");

    // 4. Session cookie
    let cookie = start_session(&state, user.user_id).await?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(user)),
    ))
}

/// POST /auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> HandlerResult<impl IntoResponse> {
    let rejected = || {
        (
            StatusCode::UNAUTHORIZED,
            "Invalid email or password".to_string(),
        )
    };

    // 1. Get user by email
    let user_creds = state
        .db
        .get_user_by_email(&req.email)
        .await
        .map_err(|_| rejected())?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Authentication error".to_string(),
        )
    })?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| rejected())?;

    // 3. Session cookie
    let user = state
        .db
        .get_user(user_creds.user_id)
        .await
        .map_err(|e| port_failure("load user", e))?;
    let cookie = start_session(&state, user.user_id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(user)),
    ))
}

/// POST /auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HandlerResult<impl IntoResponse> {
    let auth_session_id = session_cookie(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?;

    state
        .db
        .delete_auth_session(auth_session_id)
        .await
        .map_err(|e| port_failure("logout", e))?;

    let cookie = format!(
        "{}=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0",
        SESSION_COOKIE
    );
    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)]))
}

/// GET /auth/me - The account behind the current session
#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current account", body = AuthResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(Extension(current): Extension<CurrentUser>) -> Json<AuthResponse> {
    Json(AuthResponse::from(current.user))
}
