//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for a running interview session.

use chrono::{DateTime, Utc};
use interview_core::{
    Difficulty, EvaluationReport, Question, ResultSummary, SessionSnapshot, Stage,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attaches the connection to a session. This must be the first message sent.
    Init { session_key: Uuid },

    /// The candidate's in-progress answer; submitted automatically when time runs out.
    UpdateDraft { text: String },

    SubmitAnswer { answer: String },

    /// Moves on from a reviewed question.
    Advance,

    PauseToggle,

    /// Retries whatever failed last: loading a question or saving the interview.
    Retry,

    /// Asks for the evaluation report of a completed interview.
    RequestReport,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the session was loaded and reconciled.
    SessionInitialized {
        session_key: Uuid,
        snapshot: SnapshotView,
    },

    /// The full session view after any state change.
    Snapshot { snapshot: SnapshotView },

    /// Sent every second while the clock runs.
    Tick { remaining_secs: u32 },

    /// The clock reached zero; the draft is being submitted.
    TimeExpired,

    /// The answer was accepted and is being scored.
    Submitting { question_id: String },

    /// No candidate profile for this session; the client should go to onboarding.
    NotOnboarded,

    InterviewComplete {
        record_id: Option<Uuid>,
        summary: ResultSummary,
    },

    Report { report: EvaluationReport },

    /// Reports an error to the client, which should display an error message.
    Error { message: String },
}

//=========================================================================================
// Views
//=========================================================================================

/// A question as the candidate may see it. The reference solution stays on the server.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub id: String,
    pub prompt: Option<String>,
    pub difficulty: Difficulty,
    pub answer: Option<String>,
    pub score: Option<u8>,
    pub feedback: Option<String>,
    pub time_spent_secs: u32,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            prompt: q.prompt.clone(),
            difficulty: q.difficulty,
            answer: q.answer.clone(),
            score: q.score,
            feedback: q.feedback.clone(),
            time_spent_secs: q.time_spent_secs,
            submitted_at: q.submitted_at,
        }
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SnapshotView {
    pub stage: Stage,
    /// 1-based, for display.
    pub question_number: usize,
    pub total_questions: usize,
    pub remaining_secs: u32,
    pub is_paused: bool,
    pub question: Option<QuestionView>,
    pub summary: Option<ResultSummary>,
    pub record_id: Option<Uuid>,
    pub last_error: Option<String>,
}

impl From<SessionSnapshot> for SnapshotView {
    fn from(s: SessionSnapshot) -> Self {
        Self {
            stage: s.stage,
            question_number: s.current_index + 1,
            total_questions: s.total_questions,
            remaining_secs: s.remaining_secs,
            is_paused: s.is_paused,
            question: s.current_question.as_ref().map(QuestionView::from),
            summary: s.summary,
            record_id: s.record_id,
            last_error: s.last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "submit_answer", "answer": "A hook"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::SubmitAnswer { ref answer } if answer == "A hook"));

        let msg: ClientMessage = serde_json::from_str(r#"{"type": "pause_toggle"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::PauseToggle));
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "reset"}"#).is_err());
    }

    #[test]
    fn question_view_hides_reference_solution() {
        let mut q = Question::placeholder(0, 6);
        q.prompt = Some("What is a hook?".to_string());
        q.reference_solution = Some("A function starting with use".to_string());

        let value = serde_json::to_value(QuestionView::from(&q)).unwrap();
        assert_eq!(value["difficulty"], json!("EASY"));
        assert!(value.get("reference_solution").is_none());
    }

    #[test]
    fn server_messages_are_tagged() {
        let value = serde_json::to_value(ServerMessage::Tick { remaining_secs: 42 }).unwrap();
        assert_eq!(value, json!({"type": "tick", "remaining_secs": 42}));
        let value = serde_json::to_value(ServerMessage::NotOnboarded).unwrap();
        assert_eq!(value, json!({"type": "not_onboarded"}));
    }
}
