//! One learner's state: progression, role-play position and chat log.
//!
//! A session wires the mock services to the reward rules of the app. All
//! mutation happens through `&mut self`; the HTTP layer keeps each session
//! behind its own lock (see [`registry`]).

pub mod registry;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::exercises::{ExerciseCatalog, ExerciseDifficulty};
use crate::gamification::badges::{
    CONVERSATIONALIST, FIRST_CHAT, NATIVE_SPEAKER, POLYGLOT, PRONUNCIATION_MASTER,
};
use crate::gamification::{ProfileDefaults, ProfileError, ProgressEvent, ProgressionStore, UserProfile};
use crate::roleplay::{ChoiceOutcome, DialogueEngine, DialogueError, DialogueView, ScenarioLibrary};
use crate::services::{PronunciationScore, Services, Translation};

pub use registry::SessionRegistry;

/// XP for the very first chat message of a session.
pub const FIRST_CHAT_XP: u32 = 10;
/// XP for every answered chat message.
pub const REPLY_XP: u32 = 5;
pub const TRANSLATION_XP: u32 = 3;
/// Overall score needed for the pronunciation badge.
pub const MASTER_SCORE: u8 = 90;
/// Distinct chat languages needed for the polyglot badge.
pub const POLYGLOT_LANGUAGES: usize = 5;
/// Answered chat messages needed for the conversationalist badge.
pub const CONVERSATIONALIST_REPLIES: u32 = 10;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("message must not be empty")]
    EmptyMessage,

    #[error("unknown exercise {0:?}")]
    UnknownExercise(String),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Dialogue(#[from] DialogueError),

    #[error("{0:#}")]
    Service(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl ChatMessage {
    fn new(text: impl Into<String>, sender: Sender, language: &str, audio_url: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
            language: language.to_string(),
            audio_url,
        }
    }
}

/// Optional profile fields to replace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub current_language: Option<String>,
    pub native_language: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationAttempt {
    pub exercise_id: String,
    pub score: PronunciationScore,
    pub xp_awarded: u32,
}

/// Everything a client needs to render the session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub profile: UserProfile,
    pub chat_language: String,
    pub messages: Vec<ChatMessage>,
    pub roleplay: DialogueView,
}

pub struct LearnerSession {
    id: Uuid,
    created_at: DateTime<Utc>,
    progression: ProgressionStore,
    dialogue: DialogueEngine,
    messages: Vec<ChatMessage>,
    chat_language: String,
    chat_languages: BTreeSet<String>,
    replies: u32,
}

impl LearnerSession {
    pub fn new(defaults: ProfileDefaults, badge_threshold: usize) -> Self {
        let chat_language = defaults.current_language.clone();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            progression: ProgressionStore::new(defaults),
            dialogue: DialogueEngine::with_badge_threshold(badge_threshold),
            messages: Vec::new(),
            chat_language,
            chat_languages: BTreeSet::new(),
            replies: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn profile(&self) -> &UserProfile {
        self.progression.profile()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn chat_language(&self) -> &str {
        &self.chat_language
    }

    pub fn dialogue(&self) -> &DialogueEngine {
        &self.dialogue
    }

    // ── Chat ────────────────────────────────────────────────────

    /// Send a chat message in the current chat language and log the reply.
    ///
    /// The user message is logged (and the first-chat reward paid) before
    /// the service is called, so a failed reply still counts as a chat.
    pub async fn send_message(
        &mut self,
        services: &Services,
        text: &str,
    ) -> Result<ChatMessage, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let language = self.chat_language.clone();
        let first = self.messages.is_empty();
        self.messages
            .push(ChatMessage::new(text, Sender::User, &language, None));
        if first {
            self.progression.unlock_badge(FIRST_CHAT);
            self.progression.award_xp(FIRST_CHAT_XP);
        }

        self.chat_languages.insert(language.clone());
        if self.chat_languages.len() >= POLYGLOT_LANGUAGES {
            self.progression.unlock_badge(POLYGLOT);
        }

        let native = self.progression.profile().native_language.clone();
        let reply = services
            .chat(text, &language, &native)
            .await
            .map_err(SessionError::Service)?;

        let message = ChatMessage::new(reply.message, Sender::Bot, &language, reply.audio_url);
        self.messages.push(message.clone());
        self.replies += 1;
        self.progression.award_xp(REPLY_XP);
        if self.replies >= CONVERSATIONALIST_REPLIES {
            self.progression.unlock_badge(CONVERSATIONALIST);
        }

        debug!(session_id = %self.id, %language, replies = self.replies, "Chat reply logged");
        Ok(message)
    }

    /// Translate `text` and log the result as a bot message.
    pub async fn translate(
        &mut self,
        services: &Services,
        text: &str,
        target_language: &str,
    ) -> Result<Translation, SessionError> {
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let translation = services
            .translate(text, target_language, None)
            .await
            .map_err(SessionError::Service)?;

        self.messages.push(ChatMessage::new(
            format!("Translation to {}: {}", target_language, translation.translated_text),
            Sender::Bot,
            target_language,
            None,
        ));
        self.progression.award_xp(TRANSLATION_XP);
        Ok(translation)
    }

    /// Switch the chat language, which is also the profile's current language.
    pub fn set_language(&mut self, code: &str) {
        info!(session_id = %self.id, language = code, "Chat language changed");
        self.chat_language = code.to_string();
        self.progression.set_current_language(code);
    }

    // ── Pronunciation ───────────────────────────────────────────

    pub async fn score_pronunciation(
        &mut self,
        services: &Services,
        exercises: &ExerciseCatalog,
        exercise_id: &str,
        audio: &[u8],
    ) -> Result<PronunciationAttempt, SessionError> {
        let exercise = exercises
            .get(exercise_id)
            .ok_or_else(|| SessionError::UnknownExercise(exercise_id.to_string()))?;

        let score = services
            .score_pronunciation(audio, &exercise.text, &exercise.language)
            .await
            .map_err(SessionError::Service)?;

        let xp_awarded = u32::from(score.overall) * 2;
        self.progression.award_xp(xp_awarded);
        if score.overall >= MASTER_SCORE {
            self.progression.unlock_badge(PRONUNCIATION_MASTER);
        }
        if exercise.difficulty == ExerciseDifficulty::Native {
            self.progression.unlock_badge(NATIVE_SPEAKER);
        }

        info!(
            session_id = %self.id,
            exercise_id,
            overall = score.overall,
            xp_awarded,
            "Pronunciation scored"
        );
        Ok(PronunciationAttempt {
            exercise_id: exercise.id.clone(),
            score,
            xp_awarded,
        })
    }

    // ── Role-play ───────────────────────────────────────────────

    pub fn select_scenario(
        &mut self,
        library: &ScenarioLibrary,
        scenario_id: &str,
    ) -> Result<DialogueView, SessionError> {
        let scenario = library
            .get(scenario_id)
            .ok_or_else(|| DialogueError::UnknownScenario(scenario_id.to_string()))?;
        self.dialogue.select_scenario(scenario);
        Ok(self.dialogue.view())
    }

    pub fn respond(&mut self, response_id: &str) -> Result<ChoiceOutcome, SessionError> {
        Ok(self
            .dialogue
            .choose_response(response_id, &mut self.progression)?)
    }

    /// Leave the active scenario; false when none was active.
    pub fn exit_scenario(&mut self) -> bool {
        self.dialogue.abandon()
    }

    // ── Profile ─────────────────────────────────────────────────

    /// Apply a partial update. Nothing changes when the name is rejected.
    pub fn update_profile(&mut self, update: ProfileUpdate) -> Result<(), SessionError> {
        if let Some(name) = update.name {
            self.progression.set_name(name)?;
        }
        if let Some(code) = update.current_language {
            self.set_language(&code);
        }
        if let Some(code) = update.native_language {
            self.progression.set_native_language(code);
        }
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<ProgressEvent> {
        self.progression.drain_events()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            created_at: self.created_at,
            profile: self.progression.profile().clone(),
            chat_language: self.chat_language.clone(),
            messages: self.messages.clone(),
            roleplay: self.dialogue.view(),
        }
    }
}
