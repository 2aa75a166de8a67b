pub mod clock;
pub mod domain;
pub mod error;
pub mod llm;
pub mod ports;
pub mod provisioning;
pub mod results;
pub mod session;
pub mod store;
pub mod timer;

pub use clock::{ManualClock, SystemClock};
pub use domain::{
    CandidateProfile, Difficulty, Evaluation, EvaluationReport, GeneratedQuestion,
    HireRecommendation, InterviewRecord, InterviewState, Question, QuestionAnalysis,
    TIME_UP_FEEDBACK, TOTAL_QUESTIONS,
};
pub use error::{SessionError, SessionResult};
pub use ports::{
    Clock, InterviewRecordService, PortError, PortResult, QuestionGenerationService,
    ReportService, ScoringService, SessionStore,
};
pub use results::{summarize, ResultSummary};
pub use session::{
    AdvanceOutcome, ClockEvent, InterviewSession, ScoringRequest, SessionServices,
    SessionSnapshot, Stage, Submission,
};
pub use store::MemorySessionStore;
pub use timer::{allotted_secs, remaining_secs, Countdown, Tick};
