//! crates/interview_core/src/domain.rs
//!
//! Defines the core data structures of a mock interview session.
//! These structs are independent of any database or transport; they derive
//! `serde` only so the session store can snapshot them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of question slots in a standard interview.
pub const TOTAL_QUESTIONS: usize = 6;

/// Feedback recorded when the clock runs out with no answer.
pub const TIME_UP_FEEDBACK: &str = "Time up! No answer submitted.";

//=========================================================================================
// Difficulty
//=========================================================================================

/// The difficulty of a question slot. Also decides the answer time budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Parses a label such as `"MEDIUM"`. Returns `None` for anything unrecognised.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "EASY" => Some(Difficulty::Easy),
            "MEDIUM" => Some(Difficulty::Medium),
            "HARD" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Lenient parse: unknown labels are treated as `Easy`.
    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or(Difficulty::Easy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    /// Difficulty of slot `index` out of `total`, assigned by thirds.
    /// For six slots this yields EASY, EASY, MEDIUM, MEDIUM, HARD, HARD.
    pub fn for_slot(index: usize, total: usize) -> Self {
        if total == 0 {
            return Difficulty::Easy;
        }
        match index * 3 / total {
            0 => Difficulty::Easy,
            1 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Candidate
//=========================================================================================

/// The candidate taking the interview. Created once at onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
}

//=========================================================================================
// Question
//=========================================================================================

/// A single question slot.
///
/// Starts as a placeholder (no prompt), gets populated by provisioning, and is
/// written exactly once on submission. After `submitted_at` is set the answer,
/// score, feedback and time spent are frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub prompt: Option<String>,
    pub difficulty: Difficulty,
    pub answer: Option<String>,
    pub score: Option<u8>,
    pub feedback: Option<String>,
    pub reference_solution: Option<String>,
    pub time_spent_secs: u32,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Question {
    /// Creates the placeholder for slot `index`.
    pub fn placeholder(index: usize, total: usize) -> Self {
        Self {
            id: format!("placeholder-{}", index),
            prompt: None,
            difficulty: Difficulty::for_slot(index, total),
            answer: None,
            score: None,
            feedback: None,
            reference_solution: None,
            time_spent_secs: 0,
            submitted_at: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.prompt.is_none()
    }

    /// True once an answer (or a timeout) has been recorded.
    pub fn is_resolved(&self) -> bool {
        self.submitted_at.is_some()
    }

    /// True if the candidate actually wrote something.
    pub fn is_answered(&self) -> bool {
        self.answer
            .as_deref()
            .map(|a| !a.trim().is_empty())
            .unwrap_or(false)
    }

    /// Records the outcome for this question. Returns `false` and leaves the
    /// question untouched if it was already resolved.
    pub fn record_outcome(
        &mut self,
        answer: String,
        score: u8,
        feedback: String,
        time_spent_secs: u32,
        at: DateTime<Utc>,
    ) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.answer = Some(answer);
        self.score = Some(score.min(100));
        self.feedback = Some(feedback);
        self.time_spent_secs = time_spent_secs;
        self.submitted_at = Some(at);
        true
    }
}

//=========================================================================================
// Interview state
//=========================================================================================

/// The persisted progress of one interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewState {
    pub id: Uuid,
    pub questions: Vec<Question>,
    pub current_index: usize,
    /// Absolute deadline in epoch millis; 0 means the clock is not running.
    pub timer_ends_at: i64,
    /// Remaining milliseconds frozen at the moment of pausing.
    pub paused_remaining_ms: Option<i64>,
    pub is_paused: bool,
    pub is_complete: bool,
    /// Identifier returned by the record API once the interview was reported.
    pub record_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InterviewState {
    /// A fresh interview with `total` placeholder slots and a stopped clock.
    pub fn new(total: usize, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            questions: (0..total).map(|i| Question::placeholder(i, total)).collect(),
            current_index: 0,
            timer_ends_at: 0,
            paused_remaining_ms: None,
            is_paused: false,
            is_complete: false,
            record_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pads the question list with placeholders up to `total`. Returns true if
    /// anything was added.
    pub fn pad_to(&mut self, total: usize) -> bool {
        let before = self.questions.len();
        for i in before..total {
            self.questions.push(Question::placeholder(i, total));
        }
        self.questions.len() != before
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub fn current_mut(&mut self) -> Option<&mut Question> {
        self.questions.get_mut(self.current_index)
    }

    pub fn is_last(&self) -> bool {
        self.current_index + 1 >= self.questions.len()
    }
}

//=========================================================================================
// External service payloads
//=========================================================================================

/// Score and feedback returned by the scoring service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub score: u8,
    pub feedback: String,
}

/// A question returned by the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub question: String,
    pub difficulty: Option<Difficulty>,
    pub solution: String,
}

/// A completed interview as held by the record API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewRecord {
    pub id: Uuid,
    pub candidate: CandidateProfile,
    pub questions: Vec<Question>,
    pub score: u32,
    pub completed_at: DateTime<Utc>,
}

/// Final hiring verdict of an evaluation report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HireRecommendation {
    Hire,
    Maybe,
    NoHire,
}

impl HireRecommendation {
    pub fn from_average(average: u32) -> Self {
        if average >= 80 {
            HireRecommendation::Hire
        } else if average >= 60 {
            HireRecommendation::Maybe
        } else {
            HireRecommendation::NoHire
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalysis {
    pub question_number: u32,
    pub difficulty: Difficulty,
    pub score: u32,
    pub feedback: String,
    pub time_spent: u32,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub improvements: Vec<String>,
}

/// The structured report produced after an interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationReport {
    pub overall_score: u32,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub question_analysis: Vec<QuestionAnalysis>,
    pub final_recommendation: HireRecommendation,
    #[serde(default)]
    pub next_steps: Vec<String>,
}
