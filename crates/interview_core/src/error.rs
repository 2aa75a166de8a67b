//! crates/interview_core/src/error.rs
//!
//! Errors surfaced by the interview session to its host.

use crate::ports::PortError;

/// Everything that can go wrong while driving an interview session.
///
/// Time running out is not an error; it is handled as a regular transition.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No candidate profile in the store; the host should send the user to onboarding.
    #[error("Candidate has not completed onboarding")]
    NotOnboarded,

    #[error("Session has not been initialized")]
    NotInitialized,

    #[error("Interview is not complete")]
    NotComplete,

    #[error("Question generation failed: {0}")]
    GenerationFailed(#[source] PortError),

    #[error("Answer scoring failed: {0}")]
    ScoringFailed(#[source] PortError),

    #[error("Saving the interview record failed: {0}")]
    RecordFailed(#[source] PortError),

    #[error("Report generation failed: {0}")]
    ReportFailed(#[source] PortError),

    /// The session store could not be read or written. Fatal for the session.
    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(#[source] PortError),
}

pub type SessionResult<T> = Result<T, SessionError>;
