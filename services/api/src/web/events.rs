//! services/api/src/web/events.rs
//!
//! School calendar events. Events flagged as announcements are also listed
//! publicly on `/announcements`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDate;
use preschool_core::dates::parse_date;
use preschool_core::domain::Event;
use preschool_core::validation::validate_event;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{bad_date, invalid, port_failure, HandlerResult};
use crate::web::middleware::CurrentUser;
use crate::web::state::AppState;
use crate::web::today;

#[derive(Deserialize, ToSchema)]
pub struct EventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub location: Option<String>,
    #[serde(default)]
    pub is_announcement: bool,
}

impl EventRequest {
    fn into_event(self, id: Uuid, created_by: Uuid) -> Event {
        Event {
            id,
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location.filter(|l| !l.trim().is_empty()),
            is_announcement: self.is_announcement,
            created_by,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    /// Only events that have not ended before this date (default today).
    pub from: Option<String>,
    /// List past events too.
    #[serde(default)]
    pub all: bool,
}

/// Announcements that have not yet ended, soonest first.
pub async fn current_announcements(state: &AppState) -> HandlerResult<Vec<Event>> {
    let events = state
        .db
        .list_events(Some(today()))
        .await
        .map_err(|e| port_failure("list events", e))?;
    Ok(events.into_iter().filter(|e| e.is_announcement).collect())
}

/// GET /announcements - Public list of current announcements
#[utoipa::path(
    get,
    path = "/announcements",
    responses((status = 200, description = "Announcements ordered by start date"))
)]
pub async fn announcements_handler(
    State(state): State<Arc<AppState>>,
) -> HandlerResult<Json<Vec<Event>>> {
    Ok(Json(current_announcements(&state).await?))
}

/// GET /events - Upcoming events
#[utoipa::path(
    get,
    path = "/events",
    params(EventListQuery),
    responses((status = 200, description = "Events ordered by start date"))
)]
pub async fn list_events_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventListQuery>,
) -> HandlerResult<Json<Vec<Event>>> {
    let from = match (query.all, &query.from) {
        (true, _) => None,
        (false, Some(raw)) => Some(parse_date(raw).map_err(bad_date)?),
        (false, None) => Some(today()),
    };
    let events = state
        .db
        .list_events(from)
        .await
        .map_err(|e| port_failure("list events", e))?;
    Ok(Json(events))
}

/// GET /events/{id}
#[utoipa::path(
    get,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "The event"),
        (status = 404, description = "No such event")
    )
)]
pub async fn get_event_handler(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> HandlerResult<Json<Event>> {
    let event = state
        .db
        .get_event(event_id)
        .await
        .map_err(|e| port_failure("load event", e))?;
    Ok(Json(event))
}

/// POST /events - Create an event (admin only)
#[utoipa::path(
    post,
    path = "/events",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created"),
        (status = 422, description = "Invalid event")
    )
)]
pub async fn create_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<EventRequest>,
) -> HandlerResult<impl IntoResponse> {
    current.require_admin()?;
    let event = req.into_event(Uuid::new_v4(), current.user.user_id);
    validate_event(&event).map_err(invalid)?;
    let event = state
        .db
        .create_event(event)
        .await
        .map_err(|e| port_failure("create event", e))?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// PUT /events/{id} - Replace an event (admin only)
#[utoipa::path(
    put,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event updated"),
        (status = 404, description = "No such event"),
        (status = 422, description = "Invalid event")
    )
)]
pub async fn update_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
    Json(req): Json<EventRequest>,
) -> HandlerResult<Json<Event>> {
    current.require_admin()?;
    let existing = state
        .db
        .get_event(event_id)
        .await
        .map_err(|e| port_failure("load event", e))?;
    let event = req.into_event(event_id, existing.created_by);
    validate_event(&event).map_err(invalid)?;
    state
        .db
        .update_event(&event)
        .await
        .map_err(|e| port_failure("update event", e))?;
    Ok(Json(event))
}

/// DELETE /events/{id} - Delete an event (admin only)
#[utoipa::path(
    delete,
    path = "/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "No such event")
    )
)]
pub async fn delete_event_handler(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Path(event_id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    current.require_admin()?;
    state
        .db
        .delete_event(event_id)
        .await
        .map_err(|e| port_failure("delete event", e))?;
    Ok(StatusCode::NO_CONTENT)
}
