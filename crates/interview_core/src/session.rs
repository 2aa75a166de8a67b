//! crates/interview_core/src/session.rs
//!
//! The interview session state machine.
//!
//! One `InterviewSession` drives one candidate through the question slots:
//! provisioning each slot, running its countdown, collecting and scoring the
//! answer, and finally reporting the completed interview. Every transition
//! writes the new state through the `SessionStore` before returning, so a host
//! can rebuild the session at any point with `initialize`.
//!
//! ```text
//! Loading -> AwaitingAnswer -> Submitting -> Reviewing -> AwaitingAnswer | Complete
//!                  \______________ time expired ______/
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::clock::to_datetime;
use crate::domain::{
    CandidateProfile, Evaluation, EvaluationReport, InterviewState, Question, TIME_UP_FEEDBACK,
};
use crate::error::{SessionError, SessionResult};
use crate::ports::{
    Clock, InterviewRecordService, PortResult, QuestionGenerationService, ReportService,
    ScoringService, SessionStore,
};
use crate::provisioning::QuestionProvisioner;
use crate::results::{summarize, ResultSummary};
use crate::timer::{allotted_secs, deadline_after, remaining_secs, Countdown, Tick};

//=========================================================================================
// Collaborators
//=========================================================================================

/// The ports a session talks to, bundled so hosts can share them between sessions.
#[derive(Clone)]
pub struct SessionServices {
    pub store: Arc<dyn SessionStore>,
    pub generator: Arc<dyn QuestionGenerationService>,
    pub scorer: Arc<dyn ScoringService>,
    pub records: Arc<dyn InterviewRecordService>,
    pub clock: Arc<dyn Clock>,
}

//=========================================================================================
// Stages and outcomes
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Loading,
    AwaitingAnswer,
    Submitting,
    /// The current question is resolved; waiting for the candidate to move on.
    Reviewing,
    Complete,
}

/// An answer that has been accepted and is waiting on the scoring service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringRequest {
    pub question_id: String,
    pub question: String,
    pub answer: String,
    pub time_spent_secs: u32,
}

/// Result of trying to submit an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Nothing happened: wrong stage, or an empty answer with time left.
    Rejected,
    /// Time was up and the answer was empty; the question was auto-failed.
    TimedOut,
    /// The answer must be scored and handed back via `complete_submission`.
    Pending(ScoringRequest),
}

/// What one run of the clock observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClockEvent {
    Idle,
    Running { remaining: u32 },
    /// Time ran out and the draft went through `begin_submission`.
    Expired(Submission),
}

impl ClockEvent {
    pub fn tick(&self) -> Tick {
        match self {
            ClockEvent::Idle => Tick::Idle,
            ClockEvent::Running { remaining } => Tick::Running {
                remaining: *remaining,
            },
            ClockEvent::Expired(_) => Tick::Expired,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The current question isn't resolved yet; nothing changed.
    NotReady,
    NextQuestion { index: usize },
    Completed { record_id: Uuid },
}

/// A serialisable view of the session for the UI layer.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub stage: Stage,
    pub current_index: usize,
    pub total_questions: usize,
    pub remaining_secs: u32,
    pub is_paused: bool,
    pub current_question: Option<Question>,
    pub summary: Option<ResultSummary>,
    pub record_id: Option<Uuid>,
    pub last_error: Option<String>,
}

//=========================================================================================
// The session
//=========================================================================================

pub struct InterviewSession {
    services: SessionServices,
    provisioner: QuestionProvisioner,
    total_questions: usize,
    stage: Stage,
    candidate: Option<CandidateProfile>,
    state: Option<InterviewState>,
    countdown: Countdown,
    draft: String,
    last_error: Option<String>,
}

impl InterviewSession {
    /// Creates an uninitialized session. Call `initialize` before anything else.
    pub fn new(services: SessionServices, total_questions: usize) -> Self {
        let provisioner = QuestionProvisioner::new(services.generator.clone());
        Self {
            services,
            provisioner,
            total_questions: total_questions.max(1),
            stage: Stage::Loading,
            candidate: None,
            state: None,
            countdown: Countdown::stopped(0),
            draft: String::new(),
            last_error: None,
        }
    }

    //-------------------------------------------------------------------------------------
    // Accessors
    //-------------------------------------------------------------------------------------

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn state(&self) -> Option<&InterviewState> {
        self.state.as_ref()
    }

    pub fn candidate(&self) -> Option<&CandidateProfile> {
        self.candidate.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.state.as_ref().and_then(InterviewState::current)
    }

    /// Remaining seconds as last displayed.
    pub fn remaining_secs(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn is_paused(&self) -> bool {
        self.state.as_ref().map(|s| s.is_paused).unwrap_or(false)
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn summary(&self) -> Option<ResultSummary> {
        self.state.as_ref().map(|s| summarize(&s.questions))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            stage: self.stage,
            current_index: self.state.as_ref().map(|s| s.current_index).unwrap_or(0),
            total_questions: self
                .state
                .as_ref()
                .map(|s| s.questions.len())
                .unwrap_or(self.total_questions),
            remaining_secs: self.countdown.remaining(),
            is_paused: self.is_paused(),
            current_question: self.current_question().cloned(),
            summary: match self.stage {
                Stage::Complete => self.summary(),
                _ => None,
            },
            record_id: self.state.as_ref().and_then(|s| s.record_id),
            last_error: self.last_error.clone(),
        }
    }

    //-------------------------------------------------------------------------------------
    // Internal helpers
    //-------------------------------------------------------------------------------------

    fn now(&self) -> i64 {
        self.services.clock.now_millis()
    }

    fn state_ref(&self) -> SessionResult<&InterviewState> {
        self.state.as_ref().ok_or(SessionError::NotInitialized)
    }

    fn state_mut(&mut self) -> SessionResult<&mut InterviewState> {
        self.state.as_mut().ok_or(SessionError::NotInitialized)
    }

    fn current_cloned(&self) -> SessionResult<Question> {
        self.state_ref()?
            .current()
            .cloned()
            .ok_or(SessionError::NotInitialized)
    }

    async fn persist(&mut self) -> SessionResult<()> {
        let now = to_datetime(self.now());
        let state = self.state.as_mut().ok_or(SessionError::NotInitialized)?;
        state.updated_at = now;
        self.services
            .store
            .put_interview_state(state)
            .await
            .map_err(SessionError::StorageUnavailable)
    }

    async fn snapshot_question(&self, question: &Question) -> SessionResult<()> {
        self.services
            .store
            .put_question(question)
            .await
            .map_err(SessionError::StorageUnavailable)
    }

    /// Puts the current question on a fresh clock and opens it for answers.
    fn open_current(&mut self, now: i64) -> SessionResult<()> {
        let allotted = allotted_secs(self.current_cloned()?.difficulty);
        let state = self.state_mut()?;
        state.timer_ends_at = deadline_after(now, allotted);
        state.is_paused = false;
        state.paused_remaining_ms = None;
        self.countdown = Countdown::start(now, allotted);
        self.draft.clear();
        self.stage = Stage::AwaitingAnswer;
        Ok(())
    }

    /// Stops the clock after the current question was resolved.
    fn close_current(&mut self, remaining: u32) -> SessionResult<()> {
        let state = self.state_mut()?;
        state.is_paused = true;
        state.timer_ends_at = 0;
        state.paused_remaining_ms = None;
        self.countdown = Countdown::stopped(remaining);
        self.draft.clear();
        self.stage = Stage::Reviewing;
        Ok(())
    }

    /// Generates the question for the current (placeholder) slot and starts its clock.
    async fn provision_current(&mut self) -> SessionResult<()> {
        self.stage = Stage::Loading;
        let slot = self.current_cloned()?;
        let skills = self
            .candidate
            .as_ref()
            .map(|c| c.skills.clone())
            .unwrap_or_default();

        let question = match self.provisioner.provision(&slot, &skills).await {
            Ok(question) => question,
            Err(e) => {
                error!("Failed to provision question for slot {}: {}", slot.id, e);
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let now = self.now();
        {
            let state = self.state_mut()?;
            let index = state.current_index;
            state.questions[index] = question.clone();
        }
        self.open_current(now)?;
        self.persist().await?;
        self.snapshot_question(&question).await
    }

    /// The auto-fail path: empty answer, zero score, full allotted time.
    async fn apply_timeout(&mut self) -> SessionResult<()> {
        let at = to_datetime(self.now());
        let resolved = {
            let state = self.state_mut()?;
            let index = state.current_index;
            let question = state
                .current_mut()
                .ok_or(SessionError::NotInitialized)?;
            let allotted = allotted_secs(question.difficulty);
            if !question.record_outcome(String::new(), 0, TIME_UP_FEEDBACK.to_string(), allotted, at) {
                warn!("Question {} was already resolved; timeout ignored.", index);
            }
            question.clone()
        };
        info!("Time up on question {}; recorded as unanswered.", resolved.id);
        self.close_current(0)?;
        self.persist().await?;
        self.snapshot_question(&resolved).await
    }

    //-------------------------------------------------------------------------------------
    // Operations
    //-------------------------------------------------------------------------------------

    /// Loads (or creates) the interview from the store and reconciles the clock
    /// against the current time. Safe to call again after a failure.
    pub async fn initialize(&mut self) -> SessionResult<Stage> {
        self.stage = Stage::Loading;
        self.last_error = None;
        self.draft.clear();

        let store = self.services.store.clone();
        let candidate = store
            .get_candidate()
            .await
            .map_err(SessionError::StorageUnavailable)?
            .ok_or(SessionError::NotOnboarded)?;
        self.candidate = Some(candidate);

        let now = self.now();
        let (mut state, mut dirty) = match store
            .get_interview_state()
            .await
            .map_err(SessionError::StorageUnavailable)?
        {
            Some(mut state) => {
                let padded = state.pad_to(self.total_questions);
                (state, padded)
            }
            None => {
                info!("No interview in progress; starting a new one.");
                (InterviewState::new(self.total_questions, to_datetime(now)), true)
            }
        };
        if state.current_index >= state.questions.len() {
            warn!(
                "Stored index {} out of range; clamping.",
                state.current_index
            );
            state.current_index = state.questions.len() - 1;
            dirty = true;
        }
        self.state = Some(state);
        if dirty {
            self.persist().await?;
        }

        let state = self.state_ref()?;
        if state.is_complete {
            self.countdown = Countdown::stopped(0);
            self.stage = Stage::Complete;
            return Ok(self.stage);
        }

        let current = self.current_cloned()?;
        let allotted = allotted_secs(current.difficulty);

        if current.is_placeholder() {
            self.provision_current().await?;
            return Ok(self.stage);
        }

        if current.is_resolved() {
            self.close_current(allotted.saturating_sub(current.time_spent_secs))?;
            return Ok(self.stage);
        }

        let (is_paused, deadline, frozen) = {
            let state = self.state_ref()?;
            (state.is_paused, state.timer_ends_at, state.paused_remaining_ms)
        };

        if is_paused {
            let budget_ms = i64::from(allotted) * 1000;
            let remaining_ms = frozen.unwrap_or(budget_ms).min(budget_ms);
            if remaining_ms <= 0 {
                self.apply_timeout().await?;
            } else {
                self.countdown = Countdown::frozen(remaining_ms);
                self.stage = Stage::AwaitingAnswer;
            }
            return Ok(self.stage);
        }

        if deadline == 0 {
            // Never let a reload hand out a clock that isn't anchored to a deadline.
            self.open_current(now)?;
            self.persist().await?;
            return Ok(self.stage);
        }

        if remaining_secs(deadline, now) == 0 {
            self.apply_timeout().await?;
        } else {
            self.countdown = Countdown::resume(deadline, now);
            self.stage = Stage::AwaitingAnswer;
        }
        Ok(self.stage)
    }

    /// Records the candidate's in-progress answer. It is submitted automatically
    /// if the clock runs out.
    pub fn update_draft(&mut self, text: &str) {
        if self.stage == Stage::AwaitingAnswer {
            self.draft = text.to_string();
        }
    }

    /// First half of a submission. Validates the answer and either rejects it,
    /// auto-fails the question, or returns the request to send for scoring.
    pub async fn begin_submission(&mut self, text: &str) -> SessionResult<Submission> {
        if self.stage != Stage::AwaitingAnswer {
            warn!("Submission ignored in stage {:?}.", self.stage);
            return Ok(Submission::Rejected);
        }

        let remaining = self.countdown.remaining_at(self.now());
        if text.trim().is_empty() {
            if remaining > 0 {
                return Ok(Submission::Rejected);
            }
            self.apply_timeout().await?;
            return Ok(Submission::TimedOut);
        }

        let question = self.current_cloned()?;
        let allotted = allotted_secs(question.difficulty);
        let request = ScoringRequest {
            question_id: question.id,
            question: question.prompt.unwrap_or_default(),
            answer: text.to_string(),
            time_spent_secs: allotted.saturating_sub(remaining),
        };
        self.draft = text.to_string();
        self.stage = Stage::Submitting;
        info!("Submitting answer for question {}.", request.question_id);
        Ok(Submission::Pending(request))
    }

    /// Second half of a submission: applies the scoring result.
    ///
    /// On a service error the session returns to `AwaitingAnswer` and the error
    /// is returned; the candidate has to resubmit.
    pub async fn complete_submission(
        &mut self,
        request: ScoringRequest,
        result: PortResult<Evaluation>,
    ) -> SessionResult<()> {
        if self.stage != Stage::Submitting {
            warn!("Scoring result arrived in stage {:?}; dropped.", self.stage);
            return Ok(());
        }
        let current = self.current_cloned()?;
        if current.id != request.question_id {
            warn!(
                "Scoring result for {} does not match current question {}; dropped.",
                request.question_id, current.id
            );
            return Ok(());
        }

        let evaluation = match result {
            Ok(evaluation) => evaluation,
            Err(e) => {
                error!("Scoring failed for question {}: {}", current.id, e);
                self.stage = Stage::AwaitingAnswer;
                let err = SessionError::ScoringFailed(e);
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        let at = to_datetime(self.now());
        let allotted = allotted_secs(current.difficulty);
        let resolved = {
            let question = self
                .state_mut()?
                .current_mut()
                .ok_or(SessionError::NotInitialized)?;
            question.record_outcome(
                request.answer,
                evaluation.score,
                evaluation.feedback,
                request.time_spent_secs,
                at,
            );
            question.clone()
        };
        self.last_error = None;
        self.close_current(allotted.saturating_sub(resolved.time_spent_secs))?;
        self.persist().await?;
        self.snapshot_question(&resolved).await
    }

    /// Scores a pending submission with the session's scorer and applies the result.
    async fn score_pending(&mut self, submission: &Submission) -> SessionResult<()> {
        if let Submission::Pending(request) = submission {
            let result = self
                .services
                .scorer
                .score_answer(&request.question, &request.answer)
                .await;
            self.complete_submission(request.clone(), result).await?;
        }
        Ok(())
    }

    /// Submits an answer and waits for the session's scorer.
    pub async fn submit_answer(&mut self, text: &str) -> SessionResult<Submission> {
        let submission = self.begin_submission(text).await?;
        self.score_pending(&submission).await?;
        Ok(submission)
    }

    /// Advances the countdown. Only runs while an answer is awaited and not paused.
    pub fn tick(&mut self) -> Tick {
        if self.stage != Stage::AwaitingAnswer || self.is_paused() {
            return Tick::Idle;
        }
        let now = self.now();
        let tick = self.countdown.tick(now);
        if tick == Tick::Expired {
            info!("Timer expired.");
        }
        tick
    }

    /// `tick`, plus starting the submission of the current draft when the
    /// clock runs out. A `Pending` submission is left for the caller to score.
    pub async fn run_clock(&mut self) -> SessionResult<ClockEvent> {
        match self.tick() {
            Tick::Idle => Ok(ClockEvent::Idle),
            Tick::Running { remaining } => Ok(ClockEvent::Running { remaining }),
            Tick::Expired => {
                let draft = std::mem::take(&mut self.draft);
                let submission = self.begin_submission(&draft).await?;
                Ok(ClockEvent::Expired(submission))
            }
        }
    }

    /// `run_clock`, scoring an expired draft with the session's scorer.
    pub async fn handle_tick(&mut self) -> SessionResult<Tick> {
        let event = self.run_clock().await?;
        if let ClockEvent::Expired(submission) = &event {
            self.score_pending(submission).await?;
        }
        Ok(event.tick())
    }

    /// Moves to the next slot, or completes the interview after the last one.
    pub async fn advance(&mut self) -> SessionResult<AdvanceOutcome> {
        let ready = self.stage == Stage::Reviewing
            && self.current_question().map(Question::is_resolved).unwrap_or(false);
        if !ready {
            warn!("Cannot move to next question: current question not processed.");
            return Ok(AdvanceOutcome::NotReady);
        }

        if self.state_ref()?.is_last() {
            return self.complete().await;
        }

        let index = {
            let state = self.state_mut()?;
            state.current_index += 1;
            state.current_index
        };
        self.draft.clear();
        let next = self.current_cloned()?;
        info!("Moving to question {}.", index + 1);

        if next.is_placeholder() {
            self.persist().await?;
            self.provision_current().await?;
        } else if next.is_resolved() {
            let allotted = allotted_secs(next.difficulty);
            self.close_current(allotted.saturating_sub(next.time_spent_secs))?;
            self.persist().await?;
        } else {
            let now = self.now();
            self.open_current(now)?;
            self.persist().await?;
        }
        Ok(AdvanceOutcome::NextQuestion { index })
    }

    async fn complete(&mut self) -> SessionResult<AdvanceOutcome> {
        {
            let state = self.state_mut()?;
            state.is_complete = true;
            state.is_paused = true;
            state.timer_ends_at = 0;
            state.paused_remaining_ms = None;
        }
        self.countdown = Countdown::stopped(0);
        self.stage = Stage::Complete;
        self.persist().await?;
        info!("Interview complete.");

        let record_id = self.report_completion().await?;
        Ok(AdvanceOutcome::Completed { record_id })
    }

    /// Sends the completed interview to the record API, unless that already happened.
    /// Can be called again after a `RecordFailed` error.
    pub async fn report_completion(&mut self) -> SessionResult<Uuid> {
        let state = self.state_ref()?;
        if let Some(record_id) = state.record_id {
            return Ok(record_id);
        }
        if !state.is_complete {
            warn!("Interview is not complete; nothing to report.");
            return Err(SessionError::NotComplete);
        }
        let candidate = self.candidate.clone().ok_or(SessionError::NotOnboarded)?;

        let result = self
            .services
            .records
            .save_interview(&state.questions, &candidate)
            .await;
        let record_id = match result {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to save interview record: {}", e);
                let err = SessionError::RecordFailed(e);
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        self.state_mut()?.record_id = Some(record_id);
        self.last_error = None;
        self.persist().await?;
        info!("Interview saved as record {}.", record_id);
        Ok(record_id)
    }

    /// Flips the paused flag. Returns the new flag. Has no effect unless an
    /// answer is being awaited.
    pub async fn pause_toggle(&mut self) -> SessionResult<bool> {
        if self.stage != Stage::AwaitingAnswer {
            warn!("Pause toggle ignored in stage {:?}.", self.stage);
            return Ok(self.is_paused());
        }

        let now = self.now();
        let pausing = !self.is_paused();
        if pausing {
            if self.countdown.remaining_ms_at(now) == 0 {
                // The next tick takes the expiry path.
                warn!("Pause ignored; no time left.");
                return Ok(false);
            }
            let remaining_ms = self.countdown.stop(now);
            let state = self.state_mut()?;
            state.is_paused = true;
            state.timer_ends_at = 0;
            state.paused_remaining_ms = Some(remaining_ms);
            info!("Paused with {}ms remaining.", remaining_ms);
        } else {
            let remaining_ms = self.countdown.remaining_ms_at(now);
            let deadline = now.saturating_add(remaining_ms);
            let state = self.state_mut()?;
            state.is_paused = false;
            state.timer_ends_at = deadline;
            state.paused_remaining_ms = None;
            self.countdown = Countdown::resume(deadline, now);
            info!("Resumed with {}ms remaining.", remaining_ms);
        }
        self.persist().await?;
        Ok(pausing)
    }

    /// Asks the report service to evaluate the completed interview.
    pub async fn report(&self, reports: &dyn ReportService) -> SessionResult<EvaluationReport> {
        let state = self.state_ref()?;
        let candidate = self.candidate.as_ref().ok_or(SessionError::NotOnboarded)?;
        reports
            .generate_report(&state.questions, candidate)
            .await
            .map_err(SessionError::ReportFailed)
    }

    /// Ends the session and wipes its store.
    pub async fn teardown(&mut self) -> SessionResult<()> {
        self.services
            .store
            .clear()
            .await
            .map_err(SessionError::StorageUnavailable)?;
        self.state = None;
        self.candidate = None;
        self.countdown = Countdown::stopped(0);
        self.draft.clear();
        self.stage = Stage::Loading;
        info!("Session torn down.");
        Ok(())
    }
}
