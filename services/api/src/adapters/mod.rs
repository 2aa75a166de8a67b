pub mod chat;
pub mod db;
pub mod question_llm;
pub mod report_llm;
pub mod scoring_llm;
pub mod session_store;

pub use chat::ChatModel;
pub use db::DbAdapter;
pub use question_llm::OpenAiQuestionAdapter;
pub use report_llm::OpenAiReportAdapter;
pub use scoring_llm::OpenAiScoringAdapter;
pub use session_store::{FileSessionStore, FileSessionStores};
