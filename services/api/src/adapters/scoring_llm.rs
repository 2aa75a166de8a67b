//! services/api/src/adapters/scoring_llm.rs
//!
//! This module contains the adapter for the answer-scoring LLM.
//! It implements the `ScoringService` port from the `core` crate.

use async_trait::async_trait;
use interview_core::{
    llm::evaluation_or_fallback,
    ports::{PortResult, ScoringService},
    Evaluation,
};

use crate::adapters::chat::ChatModel;

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert technical interview evaluator.
Assess the candidate's answer to the given question for correctness, clarity and completeness.
Point out inaccuracies and suggest improvements in a few sentences.

Respond with ONLY a JSON object in this exact format:
{"score": <integer from 0 to 100>, "feedback": "<constructive feedback>"}"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ScoringService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiScoringAdapter {
    chat: ChatModel,
}

impl OpenAiScoringAdapter {
    pub fn new(chat: ChatModel) -> Self {
        Self { chat }
    }
}

fn user_prompt(question: &str, answer: &str) -> String {
    format!(
        "Here is the interview question:\n\"{}\"\n\nHere is the candidate's answer:\n\"{}\"\n\nPlease provide your evaluation now.",
        question, answer
    )
}

//=========================================================================================
// `ScoringService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ScoringService for OpenAiScoringAdapter {
    /// Scores an answer. A reply that can't be read gets the fallback evaluation;
    /// only transport failures are errors.
    async fn score_answer(&self, question: &str, answer: &str) -> PortResult<Evaluation> {
        let reply = self
            .chat
            .complete(SYSTEM_INSTRUCTIONS, user_prompt(question, answer), 0.2)
            .await?;
        Ok(evaluation_or_fallback(&reply))
    }
}
