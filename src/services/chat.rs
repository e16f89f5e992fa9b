//! Mock chat service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::simulation::Simulation;
use super::speech::audio_data_url;
use super::{ChatReply, ChatService};

const REPLY_MIN_DELAY_MS: u64 = 1000;
const REPLY_JITTER_MS: u64 = 1000;
const TRANSLATE_DELAY: Duration = Duration::from_millis(300);
const AUDIO_DELAY: Duration = Duration::from_millis(500);

const CANNED_REPLIES: &[&str] = &[
    "That's a great question! Let me help you with that.",
    "I understand what you're asking. Here's what I think...",
    "Interesting point! Let me share some insights.",
    "I can definitely help you with that topic.",
    "That's a common question, and I'm happy to explain.",
    "Great to hear from you! Let me provide some information.",
];

/// Tag `text` as if it had been translated into `language`.
///
/// English is returned unchanged.
pub fn render_in(text: &str, language: &str) -> String {
    let prefix = match language {
        "en" => return text.to_string(),
        "hi" => "[Hindi] ",
        "es" => "[Español] ",
        "fr" => "[Français] ",
        "de" => "[Deutsch] ",
        "zh" => "[中文] ",
        "ja" => "[日本語] ",
        "ar" => "[العربية] ",
        other => return format!("[{other}] {text}"),
    };
    format!("{prefix}{text}")
}

pub struct MockChatService {
    sim: Arc<Simulation>,
}

impl MockChatService {
    pub fn new(sim: Arc<Simulation>) -> Self {
        Self { sim }
    }
}

#[async_trait]
impl ChatService for MockChatService {
    async fn reply(
        &self,
        message: &str,
        target_language: &str,
        user_language: &str,
    ) -> Result<ChatReply> {
        self.sim
            .delay_with_jitter(REPLY_MIN_DELAY_MS, REPLY_JITTER_MS)
            .await;
        let reply = self
            .sim
            .pick(CANNED_REPLIES)
            .copied()
            .unwrap_or(CANNED_REPLIES[0]);

        self.sim.delay(TRANSLATE_DELAY).await;
        let translated = render_in(reply, target_language);

        self.sim.delay(AUDIO_DELAY).await;
        let audio_url = audio_data_url(&translated)?;

        debug!(
            target_language,
            user_language,
            message_chars = message.chars().count(),
            "Mock chat reply"
        );
        Ok(ChatReply {
            message: translated.clone(),
            translated_message: translated,
            detected_language: user_language.to_string(),
            audio_url: Some(audio_url),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_prefixes() {
        assert_eq!(render_in("Hi", "en"), "Hi");
        assert_eq!(render_in("Hi", "es"), "[Español] Hi");
        assert_eq!(render_in("Hi", "ja"), "[日本語] Hi");
        assert_eq!(render_in("Hi", "pt"), "[pt] Hi");
    }

    #[tokio::test]
    async fn reply_is_canned_and_rendered() {
        let service = MockChatService::new(Arc::new(Simulation::instant(2)));
        let reply = service.reply("Hola", "fr", "es").await.unwrap();

        let body = reply.message.strip_prefix("[Français] ").unwrap();
        assert!(CANNED_REPLIES.contains(&body), "{body}");
        assert_eq!(reply.message, reply.translated_message);
        assert_eq!(reply.detected_language, "es");
        assert!(
            reply
                .audio_url
                .as_deref()
                .is_some_and(|url| url.starts_with("data:audio/wav;base64,"))
        );
    }

    #[tokio::test]
    async fn seeded_replies_repeat() {
        let a = MockChatService::new(Arc::new(Simulation::instant(77)));
        let b = MockChatService::new(Arc::new(Simulation::instant(77)));
        for _ in 0..3 {
            assert_eq!(
                a.reply("x", "en", "en").await.unwrap(),
                b.reply("x", "en", "en").await.unwrap()
            );
        }
    }
}
