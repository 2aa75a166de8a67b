//! services/api/src/web/submit_task.rs
//!
//! Scores one answer without holding the session lock while the scoring
//! service works, so ticks and other messages keep flowing.

use crate::web::{
    protocol::{ServerMessage, SnapshotView},
    state::{AppState, ConnectionState},
    ws_handler::{send_message, WsSender},
};
use interview_core::{SessionResult, Submission};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Submits `answer` for the current question and reports the outcome to the client.
pub async fn submission_process(
    app_state: Arc<AppState>,
    connection_lock: Arc<Mutex<ConnectionState>>,
    ws_sender: WsSender,
    answer: String,
) -> SessionResult<()> {
    let submission = connection_lock
        .lock()
        .await
        .session
        .begin_submission(&answer)
        .await?;
    finish_submission(app_state, connection_lock, ws_sender, submission).await
}

/// Carries a started submission to the end: scores a `Pending` one with the
/// lock released, then sends the resulting snapshot.
pub async fn finish_submission(
    app_state: Arc<AppState>,
    connection_lock: Arc<Mutex<ConnectionState>>,
    ws_sender: WsSender,
    submission: Submission,
) -> SessionResult<()> {
    let request = match submission {
        Submission::Pending(request) => request,
        Submission::TimedOut => {
            let connection = connection_lock.lock().await;
            let snapshot = SnapshotView::from(connection.session.snapshot());
            send_message(&ws_sender, &ServerMessage::Snapshot { snapshot }).await;
            return Ok(());
        }
        Submission::Rejected => {
            info!("Submission rejected.");
            return Ok(());
        }
    };

    send_message(
        &ws_sender,
        &ServerMessage::Submitting {
            question_id: request.question_id.clone(),
        },
    )
    .await;

    let result = app_state
        .scorer
        .score_answer(&request.question, &request.answer)
        .await;

    let mut connection = connection_lock.lock().await;
    let outcome = connection.session.complete_submission(request, result).await;
    let snapshot = SnapshotView::from(connection.session.snapshot());
    send_message(&ws_sender, &ServerMessage::Snapshot { snapshot }).await;
    outcome
}
