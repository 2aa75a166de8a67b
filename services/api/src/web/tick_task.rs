//! services/api/src/web/tick_task.rs
//!
//! The once-per-second worker that drives the countdown of one connection.

use crate::web::{
    protocol::ServerMessage,
    state::{AppState, ConnectionState},
    submit_task::finish_submission,
    ws_handler::{send_message, WsSender},
};
use interview_core::ClockEvent;
use std::{sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Ticks the session until `cancellation_token` fires or the client goes away.
///
/// When the clock runs out the current draft is submitted through the same
/// path as a manual submission.
pub async fn tick_process(
    app_state: Arc<AppState>,
    connection_lock: Arc<Mutex<ConnectionState>>,
    ws_sender: WsSender,
    cancellation_token: CancellationToken,
) {
    info!("Tick process started.");
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Tick process cancelled.");
                return;
            }
            _ = interval.tick() => {}
        }

        let event = connection_lock.lock().await.session.run_clock().await;

        let delivered = match event {
            Err(e) => {
                error!("Tick failed: {}", e);
                send_message(&ws_sender, &ServerMessage::Error { message: e.to_string() }).await
            }
            Ok(ClockEvent::Idle) => true,
            Ok(ClockEvent::Running { remaining }) => {
                send_message(&ws_sender, &ServerMessage::Tick { remaining_secs: remaining }).await
            }
            Ok(ClockEvent::Expired(submission)) => {
                let delivered = send_message(&ws_sender, &ServerMessage::Tick { remaining_secs: 0 }).await
                    && send_message(&ws_sender, &ServerMessage::TimeExpired).await;
                if let Err(e) = finish_submission(
                    app_state.clone(),
                    connection_lock.clone(),
                    ws_sender.clone(),
                    submission,
                )
                .await
                {
                    error!("Auto-submission failed: {}", e);
                    send_message(&ws_sender, &ServerMessage::Error { message: e.to_string() }).await;
                }
                delivered
            }
        };

        if !delivered {
            info!("Client unreachable; stopping tick process.");
            return;
        }
    }
}
