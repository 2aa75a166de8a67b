//! crates/interview_core/src/store.rs
//!
//! An in-process `SessionStore`. Useful for tests and for hosts that don't need
//! state to outlive the process.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{CandidateProfile, InterviewState, Question};
use crate::ports::{PortError, PortResult, SessionStore};

#[derive(Default)]
struct Tables {
    candidate: Option<CandidateProfile>,
    interview: Option<InterviewState>,
    questions: BTreeMap<String, Question>,
}

#[derive(Default)]
pub struct MemorySessionStore {
    tables: Mutex<Tables>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds an onboarded candidate.
    pub fn with_candidate(candidate: CandidateProfile) -> Self {
        let store = Self::default();
        if let Ok(mut tables) = store.tables.lock() {
            tables.candidate = Some(candidate);
        }
        store
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("session store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_candidate(&self) -> PortResult<Option<CandidateProfile>> {
        Ok(self.lock()?.candidate.clone())
    }

    async fn put_candidate(&self, candidate: &CandidateProfile) -> PortResult<()> {
        self.lock()?.candidate = Some(candidate.clone());
        Ok(())
    }

    async fn get_interview_state(&self) -> PortResult<Option<InterviewState>> {
        Ok(self.lock()?.interview.clone())
    }

    async fn put_interview_state(&self, state: &InterviewState) -> PortResult<()> {
        self.lock()?.interview = Some(state.clone());
        Ok(())
    }

    async fn put_question(&self, question: &Question) -> PortResult<()> {
        self.lock()?
            .questions
            .insert(question.id.clone(), question.clone());
        Ok(())
    }

    async fn list_questions(&self) -> PortResult<Vec<Question>> {
        Ok(self.lock()?.questions.values().cloned().collect())
    }

    async fn clear(&self) -> PortResult<()> {
        *self.lock()? = Tables::default();
        Ok(())
    }
}
