//! HTTP API for the weather assistant.
//!
//! Endpoints:
//! - `POST /chat` - send a message, get the assistant's reply
//! - `GET /sessions/{id}` - memory information for a session
//! - `DELETE /sessions/{id}` - clear a conversation
//! - `GET /health` - liveness probe

mod routes;
mod types;

pub use routes::AppState;
pub use types::{ChatRequest, ChatResponse, SessionInfo};

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::agent::Agent;
use crate::config::Config;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(routes::chat))
        .route(
            "/sessions/:id",
            get(routes::session_info).delete(routes::clear_session),
        )
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the agent and serve the API until shutdown.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let agent = Arc::new(Agent::new(&config)?);
    let state = AppState::new(agent, config.memory_window);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
