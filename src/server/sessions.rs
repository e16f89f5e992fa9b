//! `/api/sessions`: server-held learner state.
//!
//! Every mutating endpoint answers with the updated profile and the progress
//! notifications raised by the request.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::api::{Upload, present};
use super::{ApiError, AppState};
use crate::gamification::{ProgressEvent, UserProfile};
use crate::roleplay::{ChoiceOutcome, DialogueView};
use crate::session::registry::SharedSession;
use crate::session::{ChatMessage, LearnerSession, ProfileUpdate, PronunciationAttempt, SessionSnapshot};
use crate::services::Translation;

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
pub struct Notification {
    pub message: String,
    pub event: ProgressEvent,
}

impl From<ProgressEvent> for Notification {
    fn from(event: ProgressEvent) -> Self {
        Self {
            message: event.message(),
            event,
        }
    }
}

/// Result of a session request plus the state it left behind.
#[derive(Debug, Serialize)]
pub struct SessionReply<T> {
    pub result: T,
    pub profile: UserProfile,
    pub notifications: Vec<Notification>,
}

impl<T> SessionReply<T> {
    fn new(result: T, session: &mut LearnerSession) -> Json<Self> {
        Json(Self {
            result,
            profile: session.profile().clone(),
            notifications: session
                .drain_events()
                .into_iter()
                .map(Notification::from)
                .collect(),
        })
    }
}

/// An error raised after the session already changed. Rewards paid before
/// the failure travel with the error response.
#[derive(Debug)]
pub struct SessionFailure {
    error: ApiError,
    notifications: Vec<Notification>,
}

impl SessionFailure {
    fn new(error: ApiError, session: &mut LearnerSession) -> Self {
        Self {
            error,
            notifications: session
                .drain_events()
                .into_iter()
                .map(Notification::from)
                .collect(),
        }
    }
}

impl From<ApiError> for SessionFailure {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            notifications: Vec::new(),
        }
    }
}

impl From<JsonRejection> for SessionFailure {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::from(rejection).into()
    }
}

impl IntoResponse for SessionFailure {
    fn into_response(self) -> Response {
        let (status, mut body) = self.error.into_parts();
        if !self.notifications.is_empty() {
            body["notifications"] = json!(self.notifications);
        }
        (status, Json(body)).into_response()
    }
}

type SessionResult<T> = Result<Json<SessionReply<T>>, SessionFailure>;

fn lookup(state: &AppState, id: Uuid) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(&id)
        .ok_or_else(|| ApiError::NotFound(format!("session {id} not found")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Created {
    session_id: Uuid,
    profile: UserProfile,
}

pub async fn create(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Created>) {
    let (session_id, session) = state.sessions.create();
    let profile = session.lock().await.profile().clone();
    (StatusCode::CREATED, Json(Created { session_id, profile }))
}

pub async fn snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionSnapshot> {
    let session = lookup(&state, id)?;
    let snapshot = session.lock().await.snapshot();
    Ok(Json(snapshot))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("session {id} not found")))
    }
}

// ── Profile ──────────────────────────────────────────────────────

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserProfile> {
    let session = lookup(&state, id)?;
    let profile = session.lock().await.profile().clone();
    Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRequest {
    name: Option<String>,
    current_language: Option<String>,
    native_language: Option<String>,
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult<UserProfile> {
    let Json(req) = payload?;
    let session = lookup(&state, id)?;
    let mut session = session.lock().await;
    session.update_profile(ProfileUpdate {
        name: req.name,
        current_language: present(req.current_language),
        native_language: present(req.native_language),
    })?;
    Ok(Json(session.profile().clone()))
}

// ── Chat & translation ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    message: Option<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<MessageRequest>, JsonRejection>,
) -> SessionResult<ChatMessage> {
    let Json(req) = payload?;
    let Some(message) = present(req.message) else {
        return Err(ApiError::missing_fields("message").into());
    };
    let session = lookup(&state, id)?;
    let mut session = session.lock().await;

    match session.send_message(&state.services, &message).await {
        Ok(reply) => Ok(SessionReply::new(reply, &mut session)),
        Err(e) => {
            let error = ApiError::session(e, "Failed to process chat message");
            Err(SessionFailure::new(error, &mut session))
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTranslateRequest {
    text: Option<String>,
    target_language: Option<String>,
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SessionTranslateRequest>, JsonRejection>,
) -> SessionResult<Translation> {
    let Json(req) = payload?;
    let (Some(text), Some(target)) = (present(req.text), present(req.target_language)) else {
        return Err(ApiError::missing_fields("text, targetLanguage").into());
    };
    let session = lookup(&state, id)?;
    let mut session = session.lock().await;

    match session.translate(&state.services, &text, &target).await {
        Ok(translation) => Ok(SessionReply::new(translation, &mut session)),
        Err(e) => {
            let error = ApiError::session(e, "Failed to translate text");
            Err(SessionFailure::new(error, &mut session))
        }
    }
}

// ── Pronunciation ────────────────────────────────────────────────

pub async fn score_pronunciation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Result<Multipart, MultipartRejection>,
) -> SessionResult<PronunciationAttempt> {
    let mut upload = Upload::read(multipart).await?;
    let audio = upload.require_audio()?;
    let Some(exercise_id) = upload.field("exerciseId") else {
        return Err(ApiError::missing_fields("exerciseId").into());
    };
    let session = lookup(&state, id)?;
    let mut session = session.lock().await;

    let scored = session
        .score_pronunciation(&state.services, &state.exercises, &exercise_id, &audio)
        .await;
    match scored {
        Ok(attempt) => Ok(SessionReply::new(attempt, &mut session)),
        Err(e) => {
            let error = ApiError::session(e, "Failed to score pronunciation");
            Err(SessionFailure::new(error, &mut session))
        }
    }
}

// ── Role-play ────────────────────────────────────────────────────

pub async fn roleplay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<DialogueView> {
    let session = lookup(&state, id)?;
    let view = session.lock().await.dialogue().view();
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    scenario_id: Option<String>,
}

pub async fn select_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<SelectRequest>, JsonRejection>,
) -> ApiResult<DialogueView> {
    let Json(req) = payload?;
    let Some(scenario_id) = present(req.scenario_id) else {
        return Err(ApiError::missing_fields("scenarioId"));
    };
    let session = lookup(&state, id)?;
    let view = session
        .lock()
        .await
        .select_scenario(&state.scenarios, &scenario_id)?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    response_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Step {
    outcome: ChoiceOutcome,
    view: DialogueView,
}

pub async fn respond(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    payload: Result<Json<RespondRequest>, JsonRejection>,
) -> ApiResult<SessionReply<Step>> {
    let Json(req) = payload?;
    let Some(response_id) = present(req.response_id) else {
        return Err(ApiError::missing_fields("responseId"));
    };
    let session = lookup(&state, id)?;
    let mut session = session.lock().await;

    let outcome = session.respond(&response_id)?;
    let view = session.dialogue().view();
    Ok(SessionReply::new(Step { outcome, view }, &mut session))
}

pub async fn exit_scenario(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<DialogueView> {
    let session = lookup(&state, id)?;
    let mut session = session.lock().await;
    if !session.exit_scenario() {
        return Err(ApiError::Dialogue(
            crate::roleplay::DialogueError::NoActiveScenario,
        ));
    }
    Ok(Json(session.dialogue().view()))
}
