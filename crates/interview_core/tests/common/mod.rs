//! Fake port implementations shared by the session tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use interview_core::llm::evaluation_or_fallback;
use interview_core::{
    CandidateProfile, Difficulty, Evaluation, GeneratedQuestion, InterviewRecord,
    InterviewRecordService, InterviewSession, ManualClock, MemorySessionStore, PortError,
    PortResult, Question, QuestionGenerationService, ScoringService, SessionServices,
};
use uuid::Uuid;

pub const START_MILLIS: i64 = 1_700_000_000_000;

pub fn candidate() -> CandidateProfile {
    CandidateProfile {
        id: Uuid::new_v4(),
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: "+44 20 7946 0000".to_string(),
        skills: vec!["React".to_string(), "Node.js".to_string()],
    }
}

//=========================================================================================
// Generator
//=========================================================================================

#[derive(Default)]
pub struct ScriptedGenerator {
    calls: AtomicUsize,
    fail: AtomicBool,
    difficulty: Mutex<Option<Difficulty>>,
}

impl ScriptedGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Forces the difficulty reported back for every generated question.
    pub fn set_difficulty(&self, difficulty: Difficulty) {
        *self.difficulty.lock().unwrap() = Some(difficulty);
    }
}

#[async_trait]
impl QuestionGenerationService for ScriptedGenerator {
    async fn generate_question(
        &self,
        skills: &[String],
        difficulty: Difficulty,
    ) -> PortResult<GeneratedQuestion> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("generator offline".to_string()));
        }
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let forced = *self.difficulty.lock().unwrap();
        Ok(GeneratedQuestion {
            question: format!("Question {} about {}", n, skills.join(", ")),
            difficulty: Some(forced.unwrap_or(difficulty)),
            solution: format!("Solution {}", n),
        })
    }
}

//=========================================================================================
// Scorer
//=========================================================================================

#[derive(Clone)]
pub enum ScorerReply {
    Fixed(u8, &'static str),
    /// Raw model text, run through the same fallback parser the adapters use.
    Raw(&'static str),
    Fail,
}

pub struct ScriptedScorer {
    reply: Mutex<ScorerReply>,
    seen: Mutex<Vec<(String, String)>>,
}

impl Default for ScriptedScorer {
    fn default() -> Self {
        Self {
            reply: Mutex::new(ScorerReply::Fixed(85, "Good answer.")),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedScorer {
    pub fn set_reply(&self, reply: ScorerReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_answer(&self) -> Option<String> {
        self.seen.lock().unwrap().last().map(|(_, a)| a.clone())
    }
}

#[async_trait]
impl ScoringService for ScriptedScorer {
    async fn score_answer(&self, question: &str, answer: &str) -> PortResult<Evaluation> {
        self.seen
            .lock()
            .unwrap()
            .push((question.to_string(), answer.to_string()));
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            ScorerReply::Fixed(score, feedback) => Ok(Evaluation {
                score,
                feedback: feedback.to_string(),
            }),
            ScorerReply::Raw(text) => Ok(evaluation_or_fallback(text)),
            ScorerReply::Fail => Err(PortError::Unexpected("scoring timed out".to_string())),
        }
    }
}

//=========================================================================================
// Record API
//=========================================================================================

pub struct RecordingRecords {
    pub record_id: Uuid,
    attempts: AtomicUsize,
    fail: AtomicBool,
    saved: Mutex<Vec<Vec<Question>>>,
}

impl Default for RecordingRecords {
    fn default() -> Self {
        Self {
            record_id: Uuid::new_v4(),
            attempts: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            saved: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingRecords {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn saved(&self) -> Vec<Vec<Question>> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl InterviewRecordService for RecordingRecords {
    async fn save_interview(
        &self,
        questions: &[Question],
        _candidate: &CandidateProfile,
    ) -> PortResult<Uuid> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("database unavailable".to_string()));
        }
        self.saved.lock().unwrap().push(questions.to_vec());
        Ok(self.record_id)
    }

    async fn get_interview(&self, record_id: Uuid) -> PortResult<InterviewRecord> {
        Err(PortError::NotFound(format!("Interview {} not found", record_id)))
    }

    async fn find_interview_by_email(&self, _email: &str) -> PortResult<Option<InterviewRecord>> {
        Ok(None)
    }

    async fn list_interviews(&self) -> PortResult<Vec<InterviewRecord>> {
        Ok(Vec::new())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub struct Harness {
    pub store: Arc<MemorySessionStore>,
    pub clock: Arc<ManualClock>,
    pub generator: Arc<ScriptedGenerator>,
    pub scorer: Arc<ScriptedScorer>,
    pub records: Arc<RecordingRecords>,
}

impl Harness {
    /// A harness whose store already holds an onboarded candidate.
    pub fn onboarded() -> Self {
        Self::with_store(MemorySessionStore::with_candidate(candidate()))
    }

    pub fn with_store(store: MemorySessionStore) -> Self {
        Self {
            store: Arc::new(store),
            clock: Arc::new(ManualClock::new(START_MILLIS)),
            generator: Arc::new(ScriptedGenerator::default()),
            scorer: Arc::new(ScriptedScorer::default()),
            records: Arc::new(RecordingRecords::default()),
        }
    }

    pub fn services(&self) -> SessionServices {
        SessionServices {
            store: self.store.clone(),
            generator: self.generator.clone(),
            scorer: self.scorer.clone(),
            records: self.records.clone(),
            clock: self.clock.clone(),
        }
    }

    /// A new session object over the same store, as after a page reload.
    pub fn session(&self, total_questions: usize) -> InterviewSession {
        InterviewSession::new(self.services(), total_questions)
    }
}
