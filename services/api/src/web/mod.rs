pub mod protocol;
pub mod rest;
pub mod state;
pub mod submit_task;
pub mod tick_task;
pub mod ws_handler;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use rest::{
    create_session_handler, dashboard_handler, find_interview_handler, get_interview_handler,
    report_handler, save_interview_handler,
};
pub use ws_handler::ws_handler;

/// All API routes, without middleware layers.
pub fn router(app_state: Arc<state::AppState>) -> Router {
    Router::new()
        .route("/sessions", post(create_session_handler))
        .route("/ws", get(ws_handler))
        .route(
            "/interviews",
            post(save_interview_handler).get(find_interview_handler),
        )
        .route("/interviews/{id}", get(get_interview_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/report", post(report_handler))
        .with_state(app_state)
}
