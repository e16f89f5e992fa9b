//! Mock speech service.
//!
//! Speech-to-text ignores the audio content and returns a canned phrase in
//! the requested language. Text-to-speech produces real (silent) WAV audio
//! whose duration scales with the text length, delivered as a data URL.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use super::SpeechService;
use super::simulation::Simulation;

const TTS_DELAY: Duration = Duration::from_millis(800);
const STT_MIN_DELAY_MS: u64 = 1000;
const STT_JITTER_MS: u64 = 1000;

/// Mock audio is kept tiny: 8 kHz mono 16-bit.
const SAMPLE_RATE: u32 = 8000;
const MS_PER_CHAR: u64 = 60;
const MIN_DURATION_MS: u64 = 200;
const MAX_DURATION_MS: u64 = 3000;

const EN_PHRASES: &[&str] = &[
    "Hello, how are you today?",
    "Can you help me with this?",
    "What time is it?",
    "Thank you very much",
    "Good morning everyone",
];
const HI_PHRASES: &[&str] = &[
    "नमस्ते, आप कैसे हैं?",
    "क्या आप मेरी मदद कर सकते हैं?",
    "समय क्या हुआ है?",
];
const ES_PHRASES: &[&str] = &["Hola, ¿cómo estás?", "¿Puedes ayudarme?", "Muchas gracias"];

/// Canned transcriptions for a language, English when there are none.
pub fn transcriptions_for(language: &str) -> &'static [&'static str] {
    match language {
        "hi" => HI_PHRASES,
        "es" => ES_PHRASES,
        _ => EN_PHRASES,
    }
}

/// Silent mono WAV whose length follows the text length.
pub fn silent_wav(text: &str) -> Result<Vec<u8>> {
    let chars = text.chars().count() as u64;
    let duration_ms = (chars * MS_PER_CHAR).clamp(MIN_DURATION_MS, MAX_DURATION_MS);
    let sample_count = u64::from(SAMPLE_RATE) * duration_ms / 1000;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("failed to start WAV writer")?;
        for _ in 0..sample_count {
            writer.write_sample(0i16)?;
        }
        writer.finalize().context("failed to finalize WAV")?;
    }
    Ok(cursor.into_inner())
}

/// `data:` URL carrying [`silent_wav`] audio.
pub fn audio_data_url(text: &str) -> Result<String> {
    let wav = silent_wav(text)?;
    Ok(format!("data:audio/wav;base64,{}", STANDARD.encode(wav)))
}

pub struct MockSpeechService {
    sim: Arc<Simulation>,
}

impl MockSpeechService {
    pub fn new(sim: Arc<Simulation>) -> Self {
        Self { sim }
    }
}

#[async_trait]
impl SpeechService for MockSpeechService {
    async fn speech_to_text(&self, audio: &[u8], language: &str) -> Result<String> {
        if audio.is_empty() {
            bail!("no audio provided");
        }
        self.sim
            .delay_with_jitter(STT_MIN_DELAY_MS, STT_JITTER_MS)
            .await;

        let phrases = transcriptions_for(language);
        let text = self.sim.pick(phrases).copied().unwrap_or(EN_PHRASES[0]);
        debug!(language, bytes = audio.len(), "Mock transcription");
        Ok(text.to_string())
    }

    async fn text_to_speech(&self, text: &str, language: &str) -> Result<String> {
        self.sim.delay(TTS_DELAY).await;
        debug!(language, chars = text.chars().count(), "Mock synthesis");
        audio_data_url(text)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> MockSpeechService {
        MockSpeechService::new(Arc::new(Simulation::instant(11)))
    }

    #[tokio::test]
    async fn transcribes_to_language_phrase() {
        let text = service().speech_to_text(b"RIFF....", "es").await.unwrap();
        assert!(ES_PHRASES.contains(&text.as_str()), "{text}");
    }

    #[tokio::test]
    async fn unknown_language_falls_back_to_english() {
        let text = service().speech_to_text(&[1, 2, 3], "fr").await.unwrap();
        assert!(EN_PHRASES.contains(&text.as_str()), "{text}");
    }

    #[tokio::test]
    async fn empty_audio_is_rejected() {
        assert!(service().speech_to_text(&[], "en").await.is_err());
    }

    #[tokio::test]
    async fn tts_returns_wav_data_url() {
        let url = service().text_to_speech("hello", "en").await.unwrap();
        let payload = url.strip_prefix("data:audio/wav;base64,").unwrap();
        let wav = STANDARD.decode(payload).unwrap();
        assert_eq!(&wav[..4], b"RIFF");

        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().sample_rate, SAMPLE_RATE);
        // 5 chars * 60 ms = 300 ms
        assert_eq!(reader.duration(), SAMPLE_RATE * 300 / 1000);
    }

    #[test]
    fn duration_is_clamped() {
        let short = hound::WavReader::new(Cursor::new(silent_wav("a").unwrap())).unwrap();
        assert_eq!(short.duration(), SAMPLE_RATE * 200 / 1000);

        let long_text = "x".repeat(500);
        let long = hound::WavReader::new(Cursor::new(silent_wav(&long_text).unwrap())).unwrap();
        assert_eq!(long.duration(), SAMPLE_RATE * 3);
    }
}
