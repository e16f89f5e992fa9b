//! Stateless endpoints: mock services and reference data.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{ApiError, AppState};
use crate::exercises::{ExerciseDifficulty, PronunciationExercise};
use crate::gamification::BadgeDefinition;
use crate::languages::{self, Language};
use crate::roleplay::ScenarioSummary;
use crate::services::{ChatReply, PronunciationScore, Translation};

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Treat missing and blank values alike.
pub(super) fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parsed `multipart/form-data` upload: the `audio` file plus text fields.
#[derive(Debug, Default)]
pub(super) struct Upload {
    pub audio: Option<Bytes>,
    fields: HashMap<String, String>,
}

impl Upload {
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> Result<Self, ApiError> {
        let mut multipart = multipart?;
        let mut upload = Upload::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "audio" {
                upload.audio = Some(field.bytes().await?);
            } else {
                upload.fields.insert(name, field.text().await?);
            }
        }
        Ok(upload)
    }

    pub fn field(&self, name: &str) -> Option<String> {
        present(self.fields.get(name).cloned())
    }

    pub fn require_audio(&mut self) -> Result<Bytes, ApiError> {
        self.audio
            .take()
            .filter(|audio| !audio.is_empty())
            .ok_or_else(|| ApiError::BadRequest("No audio file provided".to_string()))
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

// ── Mock services ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    message: Option<String>,
    target_language: Option<String>,
    user_language: Option<String>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatReply> {
    let Json(req) = payload?;
    let (Some(message), Some(target)) = (present(req.message), present(req.target_language))
    else {
        return Err(ApiError::missing_fields("message, targetLanguage"));
    };
    let user_language = present(req.user_language).unwrap_or_else(|| "en".to_string());

    let reply = state
        .services
        .chat(&message, &target, &user_language)
        .await
        .map_err(|e| ApiError::service("Failed to process chat message", e))?;
    Ok(Json(reply))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    text: Option<String>,
    target_language: Option<String>,
    source_language: Option<String>,
}

pub async fn translate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> ApiResult<Translation> {
    let Json(req) = payload?;
    let (Some(text), Some(target)) = (present(req.text), present(req.target_language)) else {
        return Err(ApiError::missing_fields("text, targetLanguage"));
    };
    let source = present(req.source_language);

    let translation = state
        .services
        .translate(&text, &target, source.as_deref())
        .await
        .map_err(|e| ApiError::service("Failed to translate text", e))?;
    Ok(Json(translation))
}

pub async fn speech_to_text(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Value> {
    let mut upload = Upload::read(multipart).await?;
    let audio = upload.require_audio()?;
    let language = upload.field("language").unwrap_or_else(|| "en".to_string());
    debug!(bytes = audio.len(), %language, "Speech upload");

    let text = state
        .services
        .speech_to_text(&audio, &language)
        .await
        .map_err(|e| ApiError::service("Failed to convert speech to text", e))?;
    Ok(Json(json!({ "text": text })))
}

#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    text: Option<String>,
    language: Option<String>,
}

pub async fn text_to_speech(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SpeakRequest>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(req) = payload?;
    let (Some(text), Some(language)) = (present(req.text), present(req.language)) else {
        return Err(ApiError::missing_fields("text, language"));
    };

    let audio_url = state
        .services
        .text_to_speech(&text, &language)
        .await
        .map_err(|e| ApiError::service("Failed to convert text to speech", e))?;
    Ok(Json(json!({ "audioUrl": audio_url })))
}

pub async fn score_pronunciation(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<PronunciationScore> {
    let mut upload = Upload::read(multipart).await?;
    let audio = upload.require_audio()?;
    let (Some(expected), Some(language)) = (upload.field("expectedText"), upload.field("language"))
    else {
        return Err(ApiError::missing_fields("expectedText, language"));
    };

    let score = state
        .services
        .score_pronunciation(&audio, &expected, &language)
        .await
        .map_err(|e| ApiError::service("Failed to score pronunciation", e))?;
    Ok(Json(score))
}

// ── Reference data ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LanguageQuery {
    q: Option<String>,
}

pub async fn list_languages(
    query: Result<Query<LanguageQuery>, QueryRejection>,
) -> ApiResult<Vec<Language>> {
    let Query(query) = query?;
    let term = query.q.unwrap_or_default();
    Ok(Json(languages::search(&term).into_iter().copied().collect()))
}

pub async fn list_badges(State(state): State<Arc<AppState>>) -> Json<Vec<BadgeDefinition>> {
    Json(state.badges.iter().copied().collect())
}

pub async fn list_scenarios(State(state): State<Arc<AppState>>) -> Json<Vec<ScenarioSummary>> {
    Json(state.scenarios.summaries())
}

#[derive(Debug, Deserialize)]
pub struct ExerciseQuery {
    difficulty: Option<ExerciseDifficulty>,
}

pub async fn list_exercises(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ExerciseQuery>, QueryRejection>,
) -> ApiResult<Vec<PronunciationExercise>> {
    let Query(query) = query?;
    let exercises = match query.difficulty {
        Some(difficulty) => state.exercises.by_difficulty(difficulty).cloned().collect(),
        None => state.exercises.all().to_vec(),
    };
    Ok(Json(exercises))
}
