//! services/api/src/adapters/question_llm.rs
//!
//! This module contains the adapter for the question-generating LLM.
//! It implements the `QuestionGenerationService` port from the `core` crate.

use async_trait::async_trait;
use interview_core::{
    allotted_secs,
    llm::question_or_fallback,
    ports::{PortResult, QuestionGenerationService},
    Difficulty, GeneratedQuestion,
};
use tracing::info;

use crate::adapters::chat::ChatModel;

const SYSTEM_INSTRUCTIONS: &str = "You write technical interview questions for full-stack (React/Node.js) developers. \
Questions must be practical, relevant, and answerable within the stated time limit. \
Always reply with a single JSON object and nothing else.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `QuestionGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiQuestionAdapter {
    chat: ChatModel,
}

impl OpenAiQuestionAdapter {
    pub fn new(chat: ChatModel) -> Self {
        Self { chat }
    }
}

fn user_prompt(skills: &[String], difficulty: Difficulty) -> String {
    let focus = if skills.is_empty() {
        "general frontend development".to_string()
    } else {
        format!("focused on: {}", skills.join(", "))
    };
    format!(
        "Generate 1 technical interview question for a developer {} with {} difficulty.\n\
         It must be answerable within {} seconds.\n\n\
         Use this exact format:\n\
         {{\"question\": \"The interview question text\", \"difficulty\": \"EASY|MEDIUM|HARD\", \
         \"solution\": \"A concise and effective solution or explanation\"}}",
        focus,
        difficulty,
        allotted_secs(difficulty)
    )
}

//=========================================================================================
// `QuestionGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl QuestionGenerationService for OpenAiQuestionAdapter {
    async fn generate_question(
        &self,
        skills: &[String],
        difficulty: Difficulty,
    ) -> PortResult<GeneratedQuestion> {
        info!("Requesting a {} question from {}.", difficulty, self.chat.model());
        let reply = self
            .chat
            .complete(SYSTEM_INSTRUCTIONS, user_prompt(skills, difficulty), 0.8)
            .await?;
        Ok(question_or_fallback(&reply))
    }
}
