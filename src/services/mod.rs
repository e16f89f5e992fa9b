//! Chat, translation, speech and pronunciation services.
//!
//! Every service is an async trait so the HTTP layer and the learner session
//! never depend on a concrete backend. The only backend shipped is a set of
//! mocks that sleep for a while and return canned, randomized results.

pub mod chat;
pub mod pronunciation;
pub mod simulation;
pub mod speech;
pub mod translation;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ServicesConfig;
use simulation::Simulation;

// ── Results ──────────────────────────────────────────────────────

/// Reply produced for one chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    pub translated_message: String,
    pub detected_language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
    pub detected_language: String,
    /// 0.0 ..= 1.0
    pub confidence: f64,
}

/// Percentages (0-100) for one recorded attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PronunciationScore {
    pub accuracy: u8,
    pub fluency: u8,
    pub completeness: u8,
    pub overall: u8,
    pub feedback: String,
}

// ── Traits ───────────────────────────────────────────────────────

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Answer `message`, rendered in `target_language`.
    async fn reply(
        &self,
        message: &str,
        target_language: &str,
        user_language: &str,
    ) -> Result<ChatReply>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<Translation>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Transcribe recorded audio.
    async fn speech_to_text(&self, audio: &[u8], language: &str) -> Result<String>;

    /// Synthesize `text` and return a playable URL.
    async fn text_to_speech(&self, text: &str, language: &str) -> Result<String>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait PronunciationService: Send + Sync {
    async fn score(
        &self,
        audio: &[u8],
        expected_text: &str,
        language: &str,
    ) -> Result<PronunciationScore>;

    fn name(&self) -> &str;
}

// ── Bundle ───────────────────────────────────────────────────────

/// The full set of services, each call bounded by a timeout.
#[derive(Clone)]
pub struct Services {
    pub chat: Arc<dyn ChatService>,
    pub translation: Arc<dyn TranslationService>,
    pub speech: Arc<dyn SpeechService>,
    pub pronunciation: Arc<dyn PronunciationService>,
    timeout: Duration,
}

impl Services {
    /// Create services from configuration.
    ///
    /// Supported `provider` values:
    /// - `"mock"`: simulated latency and canned responses.
    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        let timeout = config.request_timeout()?;
        match config.provider.as_str() {
            "mock" => Ok(Self::mock(config.seed, config.latency_multiplier).with_timeout(timeout)),
            other => bail!("unknown services provider: {other:?} (expected \"mock\")"),
        }
    }

    /// Mock services sharing one simulation (RNG + latency scaling).
    pub fn mock(seed: Option<u64>, latency_multiplier: f64) -> Self {
        let sim = Arc::new(Simulation::new(seed, latency_multiplier));
        Self {
            chat: Arc::new(chat::MockChatService::new(sim.clone())),
            translation: Arc::new(translation::MockTranslationService::new(sim.clone())),
            speech: Arc::new(speech::MockSpeechService::new(sim.clone())),
            pronunciation: Arc::new(pronunciation::MockPronunciationService::new(sim)),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn chat(
        &self,
        message: &str,
        target_language: &str,
        user_language: &str,
    ) -> Result<ChatReply> {
        self.bounded("chat", self.chat.reply(message, target_language, user_language))
            .await
    }

    pub async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<Translation> {
        self.bounded(
            "translation",
            self.translation
                .translate(text, target_language, source_language),
        )
        .await
    }

    pub async fn speech_to_text(&self, audio: &[u8], language: &str) -> Result<String> {
        self.bounded("speech-to-text", self.speech.speech_to_text(audio, language))
            .await
    }

    pub async fn text_to_speech(&self, text: &str, language: &str) -> Result<String> {
        self.bounded("text-to-speech", self.speech.text_to_speech(text, language))
            .await
    }

    pub async fn score_pronunciation(
        &self,
        audio: &[u8],
        expected_text: &str,
        language: &str,
    ) -> Result<PronunciationScore> {
        self.bounded(
            "pronunciation",
            self.pronunciation.score(audio, expected_text, language),
        )
        .await
    }

    async fn bounded<T>(
        &self,
        service: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, call)
            .await
            .with_context(|| format!("{service} service timed out after {:?}", self.timeout))?
    }
}
