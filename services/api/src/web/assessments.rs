//! services/api/src/web/assessments.rs
//!
//! Developmental screening: question sets, one-shot scoring of a full answer
//! map, and guided question-by-question sessions held in memory. These
//! endpoints are public; nothing here is persisted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use preschool_core::assessment::{
    score, Answer, AnswerSet, AssessmentError, AssessmentResult, AssessmentSession, Instrument,
    Question, QuestionSet, Scale, SessionPhase,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{assessment_failure, HandlerError, HandlerResult};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize)]
pub struct InstrumentInfo {
    pub instrument: Instrument,
    pub scale: Scale,
    pub question_count: usize,
    pub vocabulary: &'static [Answer],
}

impl From<Instrument> for InstrumentInfo {
    fn from(instrument: Instrument) -> Self {
        let set = instrument.question_set();
        Self {
            instrument,
            scale: set.scale,
            question_count: set.len(),
            vocabulary: set.scale.vocabulary(),
        }
    }
}

#[derive(Serialize)]
pub struct QuestionsResponse {
    #[serde(flatten)]
    pub set: QuestionSet,
    pub vocabulary: &'static [Answer],
}

#[derive(Deserialize, ToSchema)]
pub struct ScoreRequest {
    /// Question id to answer word, e.g. `{"1": "yes", "2": "no"}`.
    #[schema(value_type = Object)]
    pub answers: AnswerSet,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// `mchat`, `motor_skills`, `speech_language` or `social_skills`.
    pub instrument: String,
}

#[derive(Deserialize, ToSchema)]
pub struct AnswerRequest {
    #[schema(value_type = String)]
    pub answer: Answer,
}

/// Snapshot of a guided session returned by every session endpoint.
#[derive(Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub instrument: Instrument,
    pub phase: SessionPhase,
    pub current_question: Option<Question>,
    pub answered: usize,
    pub total: usize,
}

impl SessionView {
    fn of(session_id: Uuid, session: &AssessmentSession) -> Self {
        Self {
            session_id,
            instrument: session.question_set().instrument,
            phase: session.phase().clone(),
            current_question: session.current_question().copied(),
            answered: session.answers().len(),
            total: session.question_set().len(),
        }
    }
}

fn parse_instrument(raw: &str) -> HandlerResult<Instrument> {
    raw.parse::<Instrument>().map_err(assessment_failure)
}

fn unknown_session(id: Uuid) -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        format!("Assessment session {} not found or expired", id),
    )
}

//=========================================================================================
// Stateless Handlers
//=========================================================================================

/// GET /assessments - Available instruments and their answer scales
#[utoipa::path(
    get,
    path = "/assessments",
    responses((status = 200, description = "Instruments"))
)]
pub async fn list_instruments_handler() -> Json<Vec<InstrumentInfo>> {
    Json(Instrument::ALL.into_iter().map(InstrumentInfo::from).collect())
}

/// GET /assessments/{instrument}/questions
#[utoipa::path(
    get,
    path = "/assessments/{instrument}/questions",
    params(("instrument" = String, Path, description = "Instrument name")),
    responses(
        (status = 200, description = "Questions in order with the accepted answers"),
        (status = 404, description = "Unknown instrument")
    )
)]
pub async fn questions_handler(Path(instrument): Path<String>) -> HandlerResult<Json<QuestionsResponse>> {
    let set = parse_instrument(&instrument)?.question_set();
    Ok(Json(QuestionsResponse {
        vocabulary: set.scale.vocabulary(),
        set,
    }))
}

/// POST /assessments/{instrument}/score - Score a complete answer map
#[utoipa::path(
    post,
    path = "/assessments/{instrument}/score",
    params(("instrument" = String, Path, description = "Instrument name")),
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Score, risk tier and guidance"),
        (status = 404, description = "Unknown instrument"),
        (status = 422, description = "Missing, unknown or out-of-scale answers")
    )
)]
pub async fn score_handler(
    Path(instrument): Path<String>,
    Json(req): Json<ScoreRequest>,
) -> HandlerResult<Json<AssessmentResult>> {
    let set = parse_instrument(&instrument)?.question_set();
    let result = score(&set, &req.answers).map_err(assessment_failure)?;
    Ok(Json(result))
}

//=========================================================================================
// Guided Session Handlers
//=========================================================================================

/// POST /assessments/sessions - Open a guided session in the idle state
#[utoipa::path(
    post,
    path = "/assessments/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created"),
        (status = 404, description = "Unknown instrument")
    )
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> HandlerResult<impl IntoResponse> {
    let instrument = parse_instrument(&req.instrument)?;
    let session = AssessmentSession::new(instrument.question_set());
    let view_before_insert = SessionView::of(Uuid::nil(), &session);
    let session_id = state.assessments.insert(session).await;
    info!(%session_id, %instrument, "assessment session opened");
    Ok((
        StatusCode::CREATED,
        Json(SessionView {
            session_id,
            ..view_before_insert
        }),
    ))
}

/// GET /assessments/sessions/{id}
#[utoipa::path(
    get,
    path = "/assessments/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session state"),
        (status = 404, description = "Unknown or expired session")
    )
)]
pub async fn get_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SessionView>> {
    state
        .assessments
        .with_session(id, |s| SessionView::of(id, s))
        .await
        .map(Json)
        .ok_or_else(|| unknown_session(id))
}

/// POST /assessments/sessions/{id}/start - Move from idle to the first question
#[utoipa::path(
    post,
    path = "/assessments/sessions/{id}/start",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session in progress"),
        (status = 404, description = "Unknown or expired session"),
        (status = 409, description = "Already started"),
        (status = 422, description = "Instrument has no questions")
    )
)]
pub async fn start_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SessionView>> {
    state
        .assessments
        .with_session(id, |s| {
            if s.start() {
                return Ok(SessionView::of(id, s));
            }
            if s.question_set().is_empty() {
                Err(assessment_failure(AssessmentError::EmptyQuestionSet(
                    s.question_set().instrument,
                )))
            } else {
                Err((
                    StatusCode::CONFLICT,
                    "The assessment has already started; reset it first".to_string(),
                ))
            }
        })
        .await
        .ok_or_else(|| unknown_session(id))?
        .map(Json)
}

/// POST /assessments/sessions/{id}/answer - Answer the current question
#[utoipa::path(
    post,
    path = "/assessments/sessions/{id}/answer",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Next question, or the result once complete"),
        (status = 404, description = "Unknown or expired session"),
        (status = 409, description = "Session is not in progress"),
        (status = 422, description = "Answer outside the instrument's scale")
    )
)]
pub async fn answer_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> HandlerResult<Json<SessionView>> {
    state
        .assessments
        .with_session(id, |s| {
            s.answer(req.answer).map_err(assessment_failure)?;
            Ok(SessionView::of(id, s))
        })
        .await
        .ok_or_else(|| unknown_session(id))?
        .map(Json)
}

/// POST /assessments/sessions/{id}/reset - Back to idle with no answers
#[utoipa::path(
    post,
    path = "/assessments/sessions/{id}/reset",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session idle"),
        (status = 404, description = "Unknown or expired session")
    )
)]
pub async fn reset_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> HandlerResult<Json<SessionView>> {
    state
        .assessments
        .with_session(id, |s| {
            s.reset();
            SessionView::of(id, s)
        })
        .await
        .map(Json)
        .ok_or_else(|| unknown_session(id))
}

/// DELETE /assessments/sessions/{id} - Discard a session
#[utoipa::path(
    delete,
    path = "/assessments/sessions/{id}",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown or expired session")
    )
)]
pub async fn discard_session_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> HandlerResult<StatusCode> {
    if state.assessments.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown_session(id))
    }
}
