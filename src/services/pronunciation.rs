//! Mock pronunciation scoring.

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tracing::debug;

use super::simulation::Simulation;
use super::{PronunciationScore, PronunciationService};

const SCORE_MIN_DELAY_MS: u64 = 1500;
const SCORE_JITTER_MS: u64 = 1000;

/// Feedback line for an overall score.
pub fn feedback_for(overall: u8) -> &'static str {
    match overall {
        90.. => "Excellent pronunciation! You sound very natural and confident.",
        80..=89 => "Great job! Your pronunciation is quite good with just minor areas to improve.",
        70..=79 => "Good effort! Focus on clarity and rhythm to improve your pronunciation.",
        60..=69 => "Keep practicing! Try to speak more slowly and clearly.",
        _ => "Don't worry, pronunciation takes time to develop. Keep practicing regularly!",
    }
}

pub struct MockPronunciationService {
    sim: Arc<Simulation>,
}

impl MockPronunciationService {
    pub fn new(sim: Arc<Simulation>) -> Self {
        Self { sim }
    }

    fn sample(&self, low: f64, span: f64) -> u8 {
        self.sim.uniform(low, span).round() as u8
    }
}

#[async_trait]
impl PronunciationService for MockPronunciationService {
    async fn score(
        &self,
        audio: &[u8],
        expected_text: &str,
        language: &str,
    ) -> Result<PronunciationScore> {
        if audio.is_empty() {
            bail!("no audio provided");
        }
        self.sim
            .delay_with_jitter(SCORE_MIN_DELAY_MS, SCORE_JITTER_MS)
            .await;

        let accuracy = self.sample(70.0, 25.0);
        let fluency = self.sample(65.0, 30.0);
        let completeness = self.sample(75.0, 20.0);
        let sum = u32::from(accuracy) + u32::from(fluency) + u32::from(completeness);
        let overall = (f64::from(sum) / 3.0).round() as u8;

        debug!(language, expected_text, overall, "Mock pronunciation score");
        Ok(PronunciationScore {
            accuracy,
            fluency,
            completeness,
            overall,
            feedback: feedback_for(overall).to_string(),
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}
