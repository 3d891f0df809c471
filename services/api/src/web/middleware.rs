//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes, plus the role checks
//! handlers use once the caller is known.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use preschool_core::domain::{Role, User};
use preschool_core::ports::DatabaseService;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::{forbidden, HandlerError};
use crate::web::state::AppState;

pub const SESSION_COOKIE: &str = "session";

/// The authenticated caller, inserted into request extensions by `require_auth`.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub user: User,
    pub session_id: String,
}

impl CurrentUser {
    pub fn require_admin(&self) -> Result<(), HandlerError> {
        match self.user.role {
            Role::Admin => Ok(()),
            _ => Err(forbidden()),
        }
    }

    pub fn require_staff(&self) -> Result<(), HandlerError> {
        if self.user.role.is_staff() {
            Ok(())
        } else {
            Err(forbidden())
        }
    }

    /// Staff may see any student; a student account only its own roll number.
    pub fn require_access_to(&self, roll_number: &str) -> Result<(), HandlerError> {
        if self.user.role.is_staff() || self.user.roll_number.as_deref() == Some(roll_number) {
            Ok(())
        } else {
            Err(forbidden())
        }
    }
}

/// Re-authenticates the acting admin before each step of a bulk job.
pub async fn recheck_admin_session(db: &dyn DatabaseService, session_id: &str) -> Result<(), String> {
    let user_id = db
        .validate_auth_session(session_id)
        .await
        .map_err(|e| format!("admin session is no longer valid: {}", e))?;
    let user = db
        .get_user(user_id)
        .await
        .map_err(|e| format!("admin account could not be loaded: {}", e))?;
    if user.role != Role::Admin {
        return Err("acting account is no longer an administrator".to_string());
    }
    Ok(())
}

/// Reads the session id out of the `Cookie` header.
pub fn session_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())?
        .split(';')
        .find_map(|c| c.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .filter(|id| !id.is_empty())
}

/// Middleware that validates the auth session cookie and loads the caller.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Parse session ID from cookie
    let auth_session_id = session_cookie(req.headers())
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_string();

    // 2. Validate auth session, get user_id
    let user_id = state
        .db
        .validate_auth_session(&auth_session_id)
        .await
        .map_err(|e| {
            warn!("Rejected auth session: {}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 3. Load the account; a session whose user was deleted is no longer valid
    let user = state.db.get_user(user_id).await.map_err(|e| {
        error!("Failed to load user {} for a valid session: {}", user_id, e);
        StatusCode::UNAUTHORIZED
    })?;

    // 4. Insert the caller into request extensions
    req.extensions_mut().insert(CurrentUser {
        user,
        session_id: auth_session_id,
    });

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
