//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use interview_core::{
    ports::PortError, CandidateProfile, Difficulty, EvaluationReport, HireRecommendation,
    InterviewRecord, Question, SessionStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        save_interview_handler,
        get_interview_handler,
        find_interview_handler,
        dashboard_handler,
        report_handler,
        crate::web::ws_handler::ws_handler,
    ),
    components(
        schemas(
            CreateSessionRequest,
            CreateSessionResponse,
            SaveInterviewRequest,
            SaveInterviewResponse,
            QuestionPayload,
            CandidateResponse,
            QuestionResponse,
            InterviewResponse,
            ReportRequest,
            ReportResponse,
            QuestionAnalysisResponse,
        )
    ),
    tags(
        (name = "Interview API", description = "Onboarding, interview records and evaluation reports.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Request and Response Structs
//=========================================================================================

/// Onboarding details submitted before the interview starts.
#[derive(Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub skills: Vec<String>,
}

/// The response payload sent after successfully creating a session.
#[derive(Serialize, ToSchema)]
pub struct CreateSessionResponse {
    session_key: Uuid,
    candidate_id: Uuid,
}

#[derive(Deserialize, ToSchema)]
pub struct QuestionPayload {
    #[serde(default)]
    pub id: Option<String>,
    pub question: String,
    /// EASY, MEDIUM or HARD; anything else is read as EASY.
    pub difficulty: String,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub time_spent: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct SaveInterviewRequest {
    pub candidate: CreateSessionRequest,
    #[serde(default)]
    pub candidate_id: Option<Uuid>,
    pub questions: Vec<QuestionPayload>,
}

#[derive(Serialize, ToSchema)]
pub struct SaveInterviewResponse {
    interview_id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct CandidateResponse {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    skills: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct QuestionResponse {
    question_number: usize,
    difficulty: String,
    question: String,
    answer: Option<String>,
    score: Option<u8>,
    feedback: Option<String>,
    time_spent: u32,
}

#[derive(Serialize, ToSchema)]
pub struct InterviewResponse {
    id: Uuid,
    score: u32,
    completed_at: DateTime<Utc>,
    candidate: CandidateResponse,
    questions: Vec<QuestionResponse>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    email: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReportRequest {
    interview_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalysisResponse {
    question_number: u32,
    difficulty: String,
    score: u32,
    feedback: String,
    time_spent: u32,
    strengths: Vec<String>,
    improvements: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    overall_score: u32,
    summary: String,
    strengths: Vec<String>,
    weaknesses: Vec<String>,
    recommendations: Vec<String>,
    question_analysis: Vec<QuestionAnalysisResponse>,
    /// HIRE, MAYBE or NO_HIRE.
    final_recommendation: String,
    next_steps: Vec<String>,
}

//=========================================================================================
// Conversions
//=========================================================================================

impl From<InterviewRecord> for InterviewResponse {
    fn from(record: InterviewRecord) -> Self {
        Self {
            id: record.id,
            score: record.score,
            completed_at: record.completed_at,
            candidate: CandidateResponse {
                id: record.candidate.id,
                name: record.candidate.name,
                email: record.candidate.email,
                phone: record.candidate.phone,
                skills: record.candidate.skills,
            },
            questions: record
                .questions
                .into_iter()
                .enumerate()
                .map(|(i, q)| QuestionResponse {
                    question_number: i + 1,
                    difficulty: q.difficulty.to_string(),
                    question: q.prompt.unwrap_or_default(),
                    answer: q.answer,
                    score: q.score,
                    feedback: q.feedback,
                    time_spent: q.time_spent_secs,
                })
                .collect(),
        }
    }
}

fn recommendation_label(r: HireRecommendation) -> &'static str {
    match r {
        HireRecommendation::Hire => "HIRE",
        HireRecommendation::Maybe => "MAYBE",
        HireRecommendation::NoHire => "NO_HIRE",
    }
}

impl From<EvaluationReport> for ReportResponse {
    fn from(report: EvaluationReport) -> Self {
        Self {
            overall_score: report.overall_score,
            summary: report.summary,
            strengths: report.strengths,
            weaknesses: report.weaknesses,
            recommendations: report.recommendations,
            question_analysis: report
                .question_analysis
                .into_iter()
                .map(|a| QuestionAnalysisResponse {
                    question_number: a.question_number,
                    difficulty: a.difficulty.to_string(),
                    score: a.score,
                    feedback: a.feedback,
                    time_spent: a.time_spent,
                    strengths: a.strengths,
                    improvements: a.improvements,
                })
                .collect(),
            final_recommendation: recommendation_label(report.final_recommendation).to_string(),
            next_steps: report.next_steps,
        }
    }
}

impl QuestionPayload {
    fn into_question(self, index: usize) -> Question {
        let submitted = self.answer.is_some() || self.score.is_some();
        Question {
            id: self.id.unwrap_or_else(|| format!("q-{}", index + 1)),
            prompt: Some(self.question),
            difficulty: Difficulty::from_label(&self.difficulty),
            answer: self.answer,
            score: self.score.map(|s| s.min(100)),
            feedback: self.feedback,
            reference_solution: None,
            time_spent_secs: self.time_spent,
            submitted_at: submitted.then(Utc::now),
        }
    }
}

fn port_error_response(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::Unexpected(msg) => {
            error!("{}: {}", context, msg);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

fn validate_candidate(req: &CreateSessionRequest) -> Result<(), (StatusCode, String)> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "name is required".to_string()));
    }
    if !req.email.contains('@') {
        return Err((StatusCode::BAD_REQUEST, "a valid email is required".to_string()));
    }
    Ok(())
}

fn to_profile(id: Uuid, req: CreateSessionRequest) -> CandidateProfile {
    CandidateProfile {
        id,
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.phone.trim().to_string(),
        skills: req
            .skills
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Onboard a candidate and open a new interview session.
///
/// A candidate who already has a recorded interview cannot start another one.
#[utoipa::path(
    post,
    path = "/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created successfully", body = CreateSessionResponse),
        (status = 400, description = "Missing name or email"),
        (status = 409, description = "An interview for this email already exists"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_candidate(&req)?;

    let existing = app_state
        .records
        .find_interview_by_email(req.email.trim())
        .await
        .map_err(|e| port_error_response("Failed to check for an existing interview", e))?;
    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            "An interview for this email has already been completed".to_string(),
        ));
    }

    let session_key = Uuid::new_v4();
    let candidate = to_profile(Uuid::new_v4(), req);
    app_state
        .stores
        .open(session_key)
        .put_candidate(&candidate)
        .await
        .map_err(|e| port_error_response("Failed to create session", e))?;

    info!("Created session {} for {}.", session_key, candidate.email);
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_key,
            candidate_id: candidate.id,
        }),
    ))
}

/// Store a completed interview.
#[utoipa::path(
    post,
    path = "/interviews",
    request_body = SaveInterviewRequest,
    responses(
        (status = 201, description = "Interview saved", body = SaveInterviewResponse),
        (status = 400, description = "Missing candidate or questions"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn save_interview_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<SaveInterviewRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    validate_candidate(&req.candidate)?;
    if req.questions.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "questions are required".to_string()));
    }

    let candidate = to_profile(req.candidate_id.unwrap_or_else(Uuid::new_v4), req.candidate);
    let questions: Vec<Question> = req
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| q.into_question(i))
        .collect();

    let interview_id = app_state
        .records
        .save_interview(&questions, &candidate)
        .await
        .map_err(|e| port_error_response("Failed to save interview data", e))?;
    Ok((StatusCode::CREATED, Json(SaveInterviewResponse { interview_id })))
}

/// Fetch one interview with its candidate and questions.
#[utoipa::path(
    get,
    path = "/interviews/{id}",
    params(("id" = Uuid, Path, description = "The interview id.")),
    responses(
        (status = 200, description = "The interview", body = InterviewResponse),
        (status = 404, description = "Interview not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_interview_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewResponse>, (StatusCode, String)> {
    let record = app_state
        .records
        .get_interview(id)
        .await
        .map_err(|e| port_error_response("Failed to fetch interview data", e))?;
    Ok(Json(record.into()))
}

/// Find the interview taken by a candidate email.
#[utoipa::path(
    get,
    path = "/interviews",
    params(EmailQuery),
    responses(
        (status = 200, description = "The interview", body = InterviewResponse),
        (status = 400, description = "Email is required"),
        (status = 404, description = "Interview not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn find_interview_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<InterviewResponse>, (StatusCode, String)> {
    let email = query
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| (StatusCode::BAD_REQUEST, "Email is required".to_string()))?;

    let record = app_state
        .records
        .find_interview_by_email(&email)
        .await
        .map_err(|e| port_error_response("Failed to fetch interview by email", e))?
        .ok_or_else(|| (StatusCode::NOT_FOUND, "Interview not found".to_string()))?;
    Ok(Json(record.into()))
}

/// List every recorded interview, newest first.
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "All interviews", body = [InterviewResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn dashboard_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Vec<InterviewResponse>>, (StatusCode, String)> {
    let records = app_state
        .records
        .list_interviews()
        .await
        .map_err(|e| port_error_response("Failed to load dashboard", e))?;
    Ok(Json(records.into_iter().map(InterviewResponse::from).collect()))
}

/// Generate the evaluation report for a recorded interview.
#[utoipa::path(
    post,
    path = "/report",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "The evaluation report", body = ReportResponse),
        (status = 404, description = "Interview not found"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn report_handler(
    State(app_state): State<Arc<AppState>>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, (StatusCode, String)> {
    let record = app_state
        .records
        .get_interview(req.interview_id)
        .await
        .map_err(|e| port_error_response("Failed to fetch interview data", e))?;
    let report = app_state
        .reports
        .generate_report(&record.questions, &record.candidate)
        .await
        .map_err(|e| port_error_response("Failed to generate report", e))?;
    Ok(Json(report.into()))
}
