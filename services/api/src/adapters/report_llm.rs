//! services/api/src/adapters/report_llm.rs
//!
//! This module contains the adapter for the report-writing LLM.
//! It implements the `ReportService` port from the `core` crate.

use std::fmt::Write as _;

use async_trait::async_trait;
use interview_core::{
    llm::report_or_fallback,
    ports::{PortResult, ReportService},
    summarize, CandidateProfile, EvaluationReport, Question,
};

use crate::adapters::chat::ChatModel;

const SYSTEM_INSTRUCTIONS: &str = r#"You are an expert technical interviewer creating a comprehensive evaluation report.
Respond with ONLY a JSON object with this structure:
{
  "overallScore": number (0-100),
  "summary": "Brief overall assessment",
  "strengths": ["List of key strengths"],
  "weaknesses": ["List of areas for improvement"],
  "recommendations": ["Specific recommendations for improvement"],
  "questionAnalysis": [
    {
      "questionNumber": number,
      "difficulty": "EASY|MEDIUM|HARD",
      "score": number,
      "feedback": "string",
      "timeSpent": number,
      "strengths": ["string"],
      "improvements": ["string"]
    }
  ],
  "finalRecommendation": "HIRE|MAYBE|NO_HIRE",
  "nextSteps": ["Recommended next steps for the candidate"]
}"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ReportService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiReportAdapter {
    chat: ChatModel,
}

impl OpenAiReportAdapter {
    pub fn new(chat: ChatModel) -> Self {
        Self { chat }
    }
}

fn user_prompt(questions: &[Question], candidate: &CandidateProfile) -> String {
    let summary = summarize(questions);
    let mut prompt = format!(
        "Candidate Information:\n- Name: {}\n- Email: {}\n- Skills: {}\n\n\
         Interview Results:\n- Total Questions: {}\n- Questions Answered: {}\n- Average Score: {}%\n\n\
         Detailed Question Analysis:\n",
        candidate.name,
        candidate.email,
        candidate.skills.join(", "),
        summary.total_questions,
        summary.answered,
        summary.average_score
    );

    for (i, q) in questions.iter().enumerate() {
        let answer = q.answer.as_deref().filter(|a| !a.trim().is_empty());
        let _ = write!(
            prompt,
            "\nQuestion {} ({}):\nQuestion: {}\nAnswer: {}\nScore: {}%\nFeedback: {}\nTime Spent: {} seconds\n",
            i + 1,
            q.difficulty,
            q.prompt.as_deref().unwrap_or(""),
            answer.unwrap_or("No answer provided"),
            q.score.unwrap_or(0),
            q.feedback.as_deref().unwrap_or("No feedback available"),
            q.time_spent_secs
        );
    }
    prompt
}

//=========================================================================================
// `ReportService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ReportService for OpenAiReportAdapter {
    async fn generate_report(
        &self,
        questions: &[Question],
        candidate: &CandidateProfile,
    ) -> PortResult<EvaluationReport> {
        let reply = self
            .chat
            .complete(SYSTEM_INSTRUCTIONS, user_prompt(questions, candidate), 0.3)
            .await?;
        Ok(report_or_fallback(&reply, questions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn prompt_lists_each_question() {
        let candidate = CandidateProfile {
            id: Uuid::new_v4(),
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: String::new(),
            skills: vec!["Node.js".to_string()],
        };
        let mut answered = Question::placeholder(0, 2);
        answered.prompt = Some("What is the event loop?".to_string());
        answered.record_outcome("It schedules callbacks".to_string(), 80, "Good".to_string(), 12, Utc::now());
        let mut skipped = Question::placeholder(1, 2);
        skipped.prompt = Some("Explain streams.".to_string());
        skipped.record_outcome(String::new(), 0, "Time up!".to_string(), 20, Utc::now());

        let prompt = user_prompt(&[answered, skipped], &candidate);
        assert!(prompt.contains("- Name: Grace Hopper"));
        assert!(prompt.contains("- Questions Answered: 1"));
        assert!(prompt.contains("- Average Score: 80%"));
        assert!(prompt.contains("Question 2 (MEDIUM):"));
        assert!(prompt.contains("Answer: No answer provided"));
    }
}
