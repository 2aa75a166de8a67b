//! crates/interview_core/src/ports.rs
//!
//! Defines the service contracts (traits) the interview session depends on.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific storage backends and AI providers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    CandidateProfile, Difficulty, Evaluation, EvaluationReport, GeneratedQuestion,
    InterviewRecord, InterviewState, Question,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable key-value storage for one session. Last write wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get_candidate(&self) -> PortResult<Option<CandidateProfile>>;

    async fn put_candidate(&self, candidate: &CandidateProfile) -> PortResult<()>;

    async fn get_interview_state(&self) -> PortResult<Option<InterviewState>>;

    async fn put_interview_state(&self, state: &InterviewState) -> PortResult<()>;

    /// Stores a snapshot of a single question, keyed by its id.
    async fn put_question(&self, question: &Question) -> PortResult<()>;

    async fn list_questions(&self) -> PortResult<Vec<Question>>;

    /// Removes every record belonging to this session.
    async fn clear(&self) -> PortResult<()>;
}

#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Scores a candidate's answer to a question.
    async fn score_answer(&self, question: &str, answer: &str) -> PortResult<Evaluation>;
}

#[async_trait]
pub trait QuestionGenerationService: Send + Sync {
    /// Generates one question of the requested difficulty for the given skills.
    async fn generate_question(
        &self,
        skills: &[String],
        difficulty: Difficulty,
    ) -> PortResult<GeneratedQuestion>;
}

#[async_trait]
pub trait InterviewRecordService: Send + Sync {
    /// Persists a completed interview and returns its record id.
    async fn save_interview(
        &self,
        questions: &[Question],
        candidate: &CandidateProfile,
    ) -> PortResult<Uuid>;

    async fn get_interview(&self, record_id: Uuid) -> PortResult<InterviewRecord>;

    async fn find_interview_by_email(&self, email: &str) -> PortResult<Option<InterviewRecord>>;

    async fn list_interviews(&self) -> PortResult<Vec<InterviewRecord>>;
}

#[async_trait]
pub trait ReportService: Send + Sync {
    /// Produces a structured evaluation of a completed interview.
    async fn generate_report(
        &self,
        questions: &[Question],
        candidate: &CandidateProfile,
    ) -> PortResult<EvaluationReport>;
}

/// Wall clock in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}
