//! services/api/src/web/preferences.rs
//!
//! Per-account display language and dismissed announcements.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use preschool_core::domain::{Event, Language, UserPreferences};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{port_failure, HandlerResult};
use crate::web::events::current_announcements;
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct UpdatePreferencesRequest {
    /// `en` or `hi`.
    #[schema(value_type = String)]
    pub language: Language,
}

async fn load(state: &AppState, current: &CurrentUser) -> HandlerResult<UserPreferences> {
    state
        .db
        .get_preferences(current.user.user_id)
        .await
        .map_err(|e| port_failure("load preferences", e))
}

/// GET /preferences
#[utoipa::path(
    get,
    path = "/preferences",
    responses((status = 200, description = "The caller's preferences"))
)]
pub async fn get_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> HandlerResult<Json<UserPreferences>> {
    Ok(Json(load(&state, &current).await?))
}

/// PUT /preferences - Change the display language
#[utoipa::path(
    put,
    path = "/preferences",
    request_body = UpdatePreferencesRequest,
    responses((status = 200, description = "Updated preferences"))
)]
pub async fn update_preferences_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdatePreferencesRequest>,
) -> HandlerResult<Json<UserPreferences>> {
    let mut prefs = load(&state, &current).await?;
    prefs.language = req.language;
    state
        .db
        .save_preferences(&prefs)
        .await
        .map_err(|e| port_failure("save preferences", e))?;
    Ok(Json(prefs))
}

/// GET /preferences/announcements - Current announcements the caller has not dismissed
#[utoipa::path(
    get,
    path = "/preferences/announcements",
    responses((status = 200, description = "Undismissed announcements"))
)]
pub async fn pending_announcements_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
) -> HandlerResult<Json<Vec<Event>>> {
    let prefs = load(&state, &current).await?;
    let pending = current_announcements(&state)
        .await?
        .into_iter()
        .filter(|e| !prefs.dismissed_announcements.contains(&e.id))
        .collect();
    Ok(Json(pending))
}

/// POST /preferences/announcements/{id}/dismiss - Hide an announcement; repeating is harmless
#[utoipa::path(
    post,
    path = "/preferences/announcements/{id}/dismiss",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Updated preferences"),
        (status = 404, description = "No such event")
    )
)]
pub async fn dismiss_announcement_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
) -> HandlerResult<Json<UserPreferences>> {
    state
        .db
        .get_event(event_id)
        .await
        .map_err(|e| port_failure("load event", e))?;
    let mut prefs = load(&state, &current).await?;
    if prefs.dismiss(event_id) {
        state
            .db
            .save_preferences(&prefs)
            .await
            .map_err(|e| port_failure("save preferences", e))?;
    }
    Ok(Json(prefs))
}
