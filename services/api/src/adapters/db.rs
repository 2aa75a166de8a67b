//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `InterviewRecordService` port from the `core` crate. It handles all
//! interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use interview_core::ports::{InterviewRecordService, PortError, PortResult};
use interview_core::{summarize, CandidateProfile, Difficulty, InterviewRecord, Question};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

const INTERVIEW_COLUMNS: &str = "i.id, i.score, i.completed_at, \
     c.id AS candidate_id, c.name, c.email, c.phone, c.skills";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `InterviewRecordService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn questions_for(&self, interview_id: Uuid) -> PortResult<Vec<Question>> {
        let records = sqlx::query_as::<_, QuestionRecord>(
            "SELECT question_key, question_number, difficulty, question, solution, answer, \
             score, feedback, time_spent, submitted_at \
             FROM interview_questions WHERE interview_id = $1 ORDER BY question_number ASC",
        )
        .bind(interview_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(QuestionRecord::to_domain).collect())
    }

    async fn with_questions(&self, record: InterviewRow) -> PortResult<InterviewRecord> {
        let questions = self.questions_for(record.id).await?;
        Ok(record.to_domain(questions))
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct InterviewRow {
    id: Uuid,
    score: i32,
    completed_at: DateTime<Utc>,
    candidate_id: Uuid,
    name: String,
    email: String,
    phone: String,
    skills: Vec<String>,
}

impl InterviewRow {
    fn to_domain(self, questions: Vec<Question>) -> InterviewRecord {
        InterviewRecord {
            id: self.id,
            candidate: CandidateProfile {
                id: self.candidate_id,
                name: self.name,
                email: self.email,
                phone: self.phone,
                skills: self.skills,
            },
            questions,
            score: self.score.max(0) as u32,
            completed_at: self.completed_at,
        }
    }
}

#[derive(FromRow)]
struct QuestionRecord {
    question_key: String,
    #[allow(dead_code)]
    question_number: i32,
    difficulty: String,
    question: String,
    solution: Option<String>,
    answer: Option<String>,
    score: Option<i32>,
    feedback: Option<String>,
    time_spent: i32,
    submitted_at: Option<DateTime<Utc>>,
}

impl QuestionRecord {
    fn to_domain(self) -> Question {
        Question {
            id: self.question_key,
            prompt: Some(self.question),
            difficulty: Difficulty::from_label(&self.difficulty),
            answer: self.answer,
            score: self.score.map(|s| s.clamp(0, 100) as u8),
            feedback: self.feedback,
            reference_solution: self.solution,
            time_spent_secs: self.time_spent.max(0) as u32,
            submitted_at: self.submitted_at,
        }
    }
}

//=========================================================================================
// `InterviewRecordService` Trait Implementation
//=========================================================================================

#[async_trait]
impl InterviewRecordService for DbAdapter {
    /// Writes the candidate, the interview and its questions in one transaction.
    async fn save_interview(
        &self,
        questions: &[Question],
        candidate: &CandidateProfile,
    ) -> PortResult<Uuid> {
        let interview_id = Uuid::new_v4();
        let score = summarize(questions).average_score as i32;

        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO candidates (id, name, email, phone, skills) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET name = EXCLUDED.name, email = EXCLUDED.email, \
             phone = EXCLUDED.phone, skills = EXCLUDED.skills",
        )
        .bind(candidate.id)
        .bind(&candidate.name)
        .bind(&candidate.email)
        .bind(&candidate.phone)
        .bind(&candidate.skills)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO interviews (id, candidate_id, status, score, completed_at) \
             VALUES ($1, $2, 'COMPLETED', $3, $4)",
        )
        .bind(interview_id)
        .bind(candidate.id)
        .bind(score)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        for (i, q) in questions.iter().enumerate() {
            sqlx::query(
                "INSERT INTO interview_questions (id, interview_id, question_key, question_number, \
                 difficulty, question, solution, answer, score, feedback, time_spent, submitted_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            )
            .bind(Uuid::new_v4())
            .bind(interview_id)
            .bind(&q.id)
            .bind(i as i32 + 1)
            .bind(q.difficulty.as_str())
            .bind(q.prompt.as_deref().unwrap_or(""))
            .bind(q.reference_solution.as_deref())
            .bind(q.answer.as_deref())
            .bind(q.score.map(i32::from))
            .bind(q.feedback.as_deref())
            .bind(q.time_spent_secs as i32)
            .bind(q.submitted_at)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        info!(
            "Saved interview {} for {} with {} questions.",
            interview_id,
            candidate.email,
            questions.len()
        );
        Ok(interview_id)
    }

    async fn get_interview(&self, record_id: Uuid) -> PortResult<InterviewRecord> {
        let record = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {} FROM interviews i JOIN candidates c ON c.id = i.candidate_id WHERE i.id = $1",
            INTERVIEW_COLUMNS
        ))
        .bind(record_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Interview {} not found", record_id))
            }
            _ => unexpected(e),
        })?;
        self.with_questions(record).await
    }

    async fn find_interview_by_email(&self, email: &str) -> PortResult<Option<InterviewRecord>> {
        let record = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {} FROM interviews i JOIN candidates c ON c.id = i.candidate_id \
             WHERE lower(c.email) = lower($1) ORDER BY i.completed_at DESC LIMIT 1",
            INTERVIEW_COLUMNS
        ))
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match record {
            Some(record) => Ok(Some(self.with_questions(record).await?)),
            None => Ok(None),
        }
    }

    async fn list_interviews(&self) -> PortResult<Vec<InterviewRecord>> {
        let records = sqlx::query_as::<_, InterviewRow>(&format!(
            "SELECT {} FROM interviews i JOIN candidates c ON c.id = i.candidate_id \
             ORDER BY i.completed_at DESC",
            INTERVIEW_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut interviews = Vec::with_capacity(records.len());
        for record in records {
            interviews.push(self.with_questions(record).await?);
        }
        Ok(interviews)
    }
}
