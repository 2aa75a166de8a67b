//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! One connection drives one interview session; the tick and submission
//! workers it spawns share the session through a mutex.

use crate::web::{
    protocol::{ClientMessage, ServerMessage, SnapshotView},
    state::{AppState, ConnectionState},
    submit_task::submission_process,
    tick_task::tick_process,
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use interview_core::{AdvanceOutcome, SessionError, Stage};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinSet};
use tracing::{error, info, warn};

/// The sending half of a socket, shared between the connection's tasks.
pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Serializes and sends one message. Returns `false` if the client is gone.
pub async fn send_message(ws_sender: &WsSender, msg: &ServerMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return true;
        }
    };
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}

async fn send_snapshot(ws_sender: &WsSender, connection: &ConnectionState) -> bool {
    let snapshot = SnapshotView::from(connection.session.snapshot());
    send_message(ws_sender, &ServerMessage::Snapshot { snapshot }).await
}

/// The handler for upgrading HTTP requests to WebSocket connections.
#[utoipa::path(
    get,
    path = "/ws",
    responses(
        (status = 101, description = "Switching to the interview session protocol")
    )
)]
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Initialization Phase ---
    let session_key = match receiver.next().await {
        Some(Ok(Message::Text(init_json))) => match serde_json::from_str::<ClientMessage>(&init_json) {
            Ok(ClientMessage::Init { session_key }) => session_key,
            _ => {
                error!("First message was not a valid Init message.");
                send_message(
                    &ws_sender,
                    &ServerMessage::Error {
                        message: "The first message must be init.".to_string(),
                    },
                )
                .await;
                return;
            }
        },
        _ => {
            error!("Client disconnected before sending Init message.");
            return;
        }
    };

    info!("Initializing session {}.", session_key);
    let connection_lock = Arc::new(Mutex::new(ConnectionState::new(&app_state, session_key)));
    {
        let mut connection = connection_lock.lock().await;
        match connection.session.initialize().await {
            Ok(stage) => {
                info!("Session {} initialized in stage {:?}.", session_key, stage);
                let snapshot = SnapshotView::from(connection.session.snapshot());
                if !send_message(
                    &ws_sender,
                    &ServerMessage::SessionInitialized {
                        session_key,
                        snapshot,
                    },
                )
                .await
                {
                    error!("Failed to send session initialized message.");
                    return;
                }
            }
            Err(SessionError::NotOnboarded) => {
                warn!("Session {} has no candidate profile.", session_key);
                send_message(&ws_sender, &ServerMessage::NotOnboarded).await;
                return;
            }
            Err(e @ SessionError::StorageUnavailable(_)) => {
                error!("Session {} storage failed: {}", session_key, e);
                send_message(&ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                return;
            }
            Err(e) => {
                // Recoverable (e.g. question generation); the client may send `retry`.
                error!("Failed to initialize session {}: {}", session_key, e);
                send_message(&ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                send_snapshot(&ws_sender, &connection).await;
            }
        }
    }

    // --- 2. Tick Task ---
    let token = connection_lock.lock().await.cancellation_token.clone();
    let tick_handle = {
        let app_state = app_state.clone();
        let connection_lock = connection_lock.clone();
        let ws_sender = ws_sender.clone();
        let token = token.clone();
        tokio::spawn(async move {
            tick_process(app_state, connection_lock, ws_sender, token).await;
        })
    };

    // --- 3. Main Message Loop ---
    let mut submissions: JoinSet<()> = JoinSet::new();
    loop {
        match receiver.next().await {
            Some(Ok(Message::Text(text))) => {
                handle_text_message(
                    text.to_string(),
                    &app_state,
                    &connection_lock,
                    &ws_sender,
                    &mut submissions,
                )
                .await;
            }
            Some(Ok(Message::Close(_))) => {
                info!("Client sent close message.");
                break;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
            None => {
                info!("Client disconnected.");
                break;
            }
        }
    }

    // --- 4. Cleanup ---
    token.cancel();
    let _ = tick_handle.await;
    drain_submissions(&mut submissions).await;
    info!("WebSocket connection for session {} closed.", session_key);
}

/// Waits for every spawned submission. Scoring calls in flight are allowed to
/// finish and persist their results.
async fn drain_submissions(submissions: &mut JoinSet<()>) {
    while let Some(joined) = submissions.join_next().await {
        if let Err(e) = joined {
            error!("Submission task failed: {}", e);
        }
    }
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: String,
    app_state: &Arc<AppState>,
    connection_lock: &Arc<Mutex<ConnectionState>>,
    ws_sender: &WsSender,
    submissions: &mut JoinSet<()>,
) {
    let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
            return;
        }
    };

    match client_msg {
        ClientMessage::UpdateDraft { text } => {
            connection_lock.lock().await.session.update_draft(&text);
        }
        ClientMessage::SubmitAnswer { answer } => {
            let app_state = app_state.clone();
            let connection_lock = connection_lock.clone();
            let ws_sender = ws_sender.clone();
            submissions.spawn(async move {
                if let Err(e) =
                    submission_process(app_state, connection_lock, ws_sender.clone(), answer).await
                {
                    error!("Submission failed: {}", e);
                    send_message(&ws_sender, &ServerMessage::Error { message: e.to_string() })
                        .await;
                }
            });
        }
        ClientMessage::Advance => {
            let mut connection = connection_lock.lock().await;
            match connection.session.advance().await {
                Ok(AdvanceOutcome::NotReady) => {
                    warn!("Advance ignored; current question not processed.");
                }
                Ok(AdvanceOutcome::NextQuestion { index }) => {
                    info!("Advanced to question {}.", index + 1);
                    send_snapshot(ws_sender, &connection).await;
                }
                Ok(AdvanceOutcome::Completed { record_id }) => {
                    send_completion(ws_sender, &connection, Some(record_id)).await;
                }
                Err(e) => {
                    error!("Advance failed: {}", e);
                    send_message(ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                    if connection.session.stage() == Stage::Complete {
                        send_completion(ws_sender, &connection, None).await;
                    } else {
                        send_snapshot(ws_sender, &connection).await;
                    }
                }
            }
        }
        ClientMessage::PauseToggle => {
            let mut connection = connection_lock.lock().await;
            match connection.session.pause_toggle().await {
                Ok(paused) => {
                    info!("Session paused: {}", paused);
                    send_snapshot(ws_sender, &connection).await;
                }
                Err(e) => {
                    error!("Pause toggle failed: {}", e);
                    send_message(ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                }
            }
        }
        ClientMessage::Retry => {
            let mut connection = connection_lock.lock().await;
            let result = match connection.session.stage() {
                Stage::Loading => connection.session.initialize().await.map(|_| ()),
                Stage::Complete => connection.session.report_completion().await.map(|_| ()),
                stage => {
                    info!("Nothing to retry in stage {:?}.", stage);
                    Ok(())
                }
            };
            if let Err(e) = result {
                error!("Retry failed: {}", e);
                send_message(ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
            }
            if connection.session.stage() == Stage::Complete {
                let record_id = connection.session.state().and_then(|s| s.record_id);
                send_completion(ws_sender, &connection, record_id).await;
            } else {
                send_snapshot(ws_sender, &connection).await;
            }
        }
        ClientMessage::RequestReport => {
            let connection = connection_lock.lock().await;
            if connection.session.stage() != Stage::Complete {
                send_message(
                    ws_sender,
                    &ServerMessage::Error {
                        message: "The interview is not complete yet.".to_string(),
                    },
                )
                .await;
                return;
            }
            match connection.session.report(app_state.reports.as_ref()).await {
                Ok(report) => {
                    send_message(ws_sender, &ServerMessage::Report { report }).await;
                }
                Err(e) => {
                    error!("Report generation failed: {}", e);
                    send_message(ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                }
            }
        }
        ClientMessage::Init { .. } => {
            warn!("Received subsequent Init message, which is ignored.");
        }
    }
}

async fn send_completion(
    ws_sender: &WsSender,
    connection: &ConnectionState,
    record_id: Option<uuid::Uuid>,
) {
    let summary = connection.session.summary().unwrap_or_else(|| interview_core::summarize(&[]));
    send_message(ws_sender, &ServerMessage::InterviewComplete { record_id, summary }).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn cleanup_waits_for_every_submission() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut submissions = JoinSet::new();
        for delay in [30, 10, 20] {
            let finished = finished.clone();
            submissions.spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            });
        }

        drain_submissions(&mut submissions).await;

        assert_eq!(finished.load(Ordering::SeqCst), 3);
        assert!(submissions.is_empty());
    }
}
