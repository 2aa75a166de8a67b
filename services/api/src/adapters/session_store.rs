//! services/api/src/adapters/session_store.rs
//!
//! A `SessionStore` backed by JSON files, one directory per session key:
//!
//! ```text
//! <root>/<session_key>/candidate.json
//! <root>/<session_key>/interview.json
//! <root>/<session_key>/questions/<question_id>.json
//! ```
//!
//! Every write goes to a temporary file first and is renamed into place, so a
//! crash never leaves a half-written record behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use interview_core::ports::{PortError, PortResult, SessionStore};
use interview_core::{CandidateProfile, InterviewState, Question};
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const CANDIDATE_FILE: &str = "candidate.json";
const INTERVIEW_FILE: &str = "interview.json";
const QUESTIONS_DIR: &str = "questions";

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("{}: {}", path.display(), e))
}

/// Opens per-session stores under a common root directory.
#[derive(Clone, Debug)]
pub struct FileSessionStores {
    root: PathBuf,
}

impl FileSessionStores {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn open(&self, session_key: Uuid) -> FileSessionStore {
        FileSessionStore {
            dir: self.root.join(session_key.to_string()),
        }
    }
}

/// The store of a single session.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    async fn read<T: DeserializeOwned>(&self, path: PathBuf) -> PortResult<Option<T>> {
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| PortError::Unexpected(format!("{}: {}", path.display(), e)))
    }

    async fn write<T: Serialize>(&self, path: PathBuf, value: &T) -> PortResult<()> {
        let parent = path.parent().unwrap_or(&self.dir).to_path_buf();
        fs::create_dir_all(&parent)
            .await
            .map_err(|e| io_error(&parent, e))?;

        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let tmp = path.with_extension(format!("json.{}.tmp", Uuid::new_v4().simple()));
        fs::write(&tmp, bytes).await.map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, &path).await.map_err(|e| io_error(&path, e))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }

    fn question_path(&self, id: &str) -> PathBuf {
        // Question ids are generated by us, but keep them from escaping the directory.
        let safe: String = id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(QUESTIONS_DIR).join(format!("{}.json", safe))
    }
}

//=========================================================================================
// `SessionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get_candidate(&self) -> PortResult<Option<CandidateProfile>> {
        self.read(self.dir.join(CANDIDATE_FILE)).await
    }

    async fn put_candidate(&self, candidate: &CandidateProfile) -> PortResult<()> {
        self.write(self.dir.join(CANDIDATE_FILE), candidate).await
    }

    async fn get_interview_state(&self) -> PortResult<Option<InterviewState>> {
        self.read(self.dir.join(INTERVIEW_FILE)).await
    }

    async fn put_interview_state(&self, state: &InterviewState) -> PortResult<()> {
        self.write(self.dir.join(INTERVIEW_FILE), state).await
    }

    async fn put_question(&self, question: &Question) -> PortResult<()> {
        self.write(self.question_path(&question.id), question).await
    }

    async fn list_questions(&self) -> PortResult<Vec<Question>> {
        let dir = self.dir.join(QUESTIONS_DIR);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&dir, e)),
        };

        let mut questions = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir, e))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match self.read::<Question>(path.clone()).await {
                Ok(Some(question)) => questions.push(question),
                Ok(None) => {}
                Err(e) => warn!("Skipping unreadable question snapshot: {}", e),
            }
        }
        questions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(questions)
    }

    async fn clear(&self) -> PortResult<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.dir, e)),
        }
    }
}
