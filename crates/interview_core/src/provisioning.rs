//! crates/interview_core/src/provisioning.rs
//!
//! Turns a placeholder slot into a real question by asking the generation service.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::domain::Question;
use crate::error::{SessionError, SessionResult};
use crate::ports::QuestionGenerationService;

/// Fills placeholder slots. Failures are propagated as-is; no question is invented here.
#[derive(Clone)]
pub struct QuestionProvisioner {
    generator: Arc<dyn QuestionGenerationService>,
}

impl QuestionProvisioner {
    pub fn new(generator: Arc<dyn QuestionGenerationService>) -> Self {
        Self { generator }
    }

    /// Requests a question for `slot` and returns it under a fresh identifier.
    /// The generator's difficulty wins; if it sent none, the slot's difficulty is kept.
    pub async fn provision(&self, slot: &Question, skills: &[String]) -> SessionResult<Question> {
        let generated = self
            .generator
            .generate_question(skills, slot.difficulty)
            .await
            .map_err(SessionError::GenerationFailed)?;

        let difficulty = generated.difficulty.unwrap_or(slot.difficulty);
        info!("Provisioned {} question for slot {}.", difficulty, slot.id);

        Ok(Question {
            id: format!("q-{}", Uuid::new_v4()),
            prompt: Some(generated.question),
            difficulty,
            answer: None,
            score: None,
            feedback: None,
            reference_solution: Some(generated.solution).filter(|s| !s.is_empty()),
            time_spent_secs: 0,
            submitted_at: None,
        })
    }
}
