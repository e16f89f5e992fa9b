//! Mock translation service.
//!
//! "Translates" by tagging the text with the target language name. Source
//! language detection always answers the caller's hint, or English.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use super::simulation::Simulation;
use super::{Translation, TranslationService};

const TRANSLATION_DELAY: Duration = Duration::from_millis(500);

/// Prefix marking a mock translation into `language`.
pub fn translation_prefix(language: &str) -> String {
    let name = match language {
        "hi" => "Hindi",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ar" => "Arabic",
        other => return format!("[{other} Translation] "),
    };
    format!("[{name} Translation] ")
}

pub struct MockTranslationService {
    sim: Arc<Simulation>,
}

impl MockTranslationService {
    pub fn new(sim: Arc<Simulation>) -> Self {
        Self { sim }
    }
}

#[async_trait]
impl TranslationService for MockTranslationService {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: Option<&str>,
    ) -> Result<Translation> {
        self.sim.delay(TRANSLATION_DELAY).await;

        let detected_language = source_language.unwrap_or("en").to_string();
        let confidence = self.sim.uniform(0.95, 0.05);

        let translated_text = if target_language == detected_language {
            text.to_string()
        } else {
            format!("{}{}", translation_prefix(target_language), text)
        };

        debug!(target_language, %detected_language, "Mock translation");
        Ok(Translation {
            translated_text,
            detected_language,
            confidence,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MockTranslationService {
        MockTranslationService::new(Arc::new(Simulation::instant(5)))
    }

    #[tokio::test]
    async fn prefixes_known_language() {
        let t = service().translate("Good morning", "es", None).await.unwrap();
        assert_eq!(t.translated_text, "[Spanish Translation] Good morning");
        assert_eq!(t.detected_language, "en");
        assert!((0.95..1.0).contains(&t.confidence));
    }

    #[tokio::test]
    async fn unknown_language_uses_code() {
        let t = service().translate("Hi", "sw", Some("en")).await.unwrap();
        assert_eq!(t.translated_text, "[sw Translation] Hi");
    }

    #[tokio::test]
    async fn same_language_is_untouched() {
        let t = service().translate("Hola", "es", Some("es")).await.unwrap();
        assert_eq!(t.translated_text, "Hola");
        assert_eq!(t.detected_language, "es");
    }
}
