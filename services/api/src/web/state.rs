//! services/api/src/web/state.rs
//!
//! Defines the application's shared and connection-specific states.

use crate::adapters::FileSessionStores;
use crate::config::Config;
use interview_core::ports::{
    Clock, InterviewRecordService, QuestionGenerationService, ReportService, ScoringService,
};
use interview_core::{InterviewSession, SessionServices};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: FileSessionStores,
    pub records: Arc<dyn InterviewRecordService>,
    pub generator: Arc<dyn QuestionGenerationService>,
    pub scorer: Arc<dyn ScoringService>,
    pub reports: Arc<dyn ReportService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// The ports for the session identified by `session_key`.
    pub fn session_services(&self, session_key: Uuid) -> SessionServices {
        SessionServices {
            store: Arc::new(self.stores.open(session_key)),
            generator: self.generator.clone(),
            scorer: self.scorer.clone(),
            records: self.records.clone(),
            clock: self.clock.clone(),
        }
    }

    /// A fresh, uninitialized session object for `session_key`.
    pub fn open_session(&self, session_key: Uuid) -> InterviewSession {
        InterviewSession::new(
            self.session_services(session_key),
            self.config.total_questions,
        )
    }
}

//=========================================================================================
// ConnectionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active WebSocket connection.
pub struct ConnectionState {
    pub session_key: Uuid,
    pub session: InterviewSession,
    /// Stops the tick task when the connection goes away.
    pub cancellation_token: CancellationToken,
}

impl ConnectionState {
    pub fn new(app_state: &AppState, session_key: Uuid) -> Self {
        Self {
            session_key,
            session: app_state.open_session(session_key),
            cancellation_token: CancellationToken::new(),
        }
    }
}
