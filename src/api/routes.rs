//! HTTP route handlers and the in-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::agent::Agent;
use crate::llm::ChatMessage;
use crate::memory::MemoryWindow;

use super::types::{ChatRequest, ChatResponse, SessionInfo};

/// What the user sees when a turn fails; details go to the log only.
const GENERIC_FAILURE_REPLY: &str =
    "I'm sorry, something went wrong while answering that. Please try again.";

/// One conversation's state. The mutex serializes turns: a session's
/// history is owned by at most one in-flight turn.
pub struct Session {
    pub history: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AppState {
    agent: Arc<Agent>,
    memory_window: usize,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<Session>>>>>,
}

impl AppState {
    pub fn new(agent: Arc<Agent>, memory_window: usize) -> Self {
        Self {
            agent,
            memory_window,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn get_or_create_session(&self, id: Uuid) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Session {
                    history: Vec::new(),
                    updated_at: Utc::now(),
                }))
            })
            .clone()
    }

    async fn get_session(&self, id: Uuid) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(&id).cloned()
    }

    async fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }
}

/// `POST /chat`
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
    let session = state.get_or_create_session(session_id).await;
    let mut session = session.lock().await;

    let reply = match state
        .agent
        .chat(&mut session.history, &request.message)
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Turn failed for session {}: {}", session_id, e);
            GENERIC_FAILURE_REPLY.to_string()
        }
    };
    session.updated_at = Utc::now();

    Json(ChatResponse { session_id, reply })
}

/// `GET /sessions/{id}`
pub async fn session_info(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionInfo>, StatusCode> {
    let session = state.get_session(id).await.ok_or(StatusCode::NOT_FOUND)?;
    let session = session.lock().await;

    Ok(Json(SessionInfo {
        session_id: id,
        message_count: session.history.len(),
        exchange_count: MemoryWindow::count_exchanges(&session.history),
        memory_window: state.memory_window,
        updated_at: session.updated_at.to_rfc3339(),
    }))
}

/// `DELETE /sessions/{id}`
pub async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.remove_session(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// `GET /health`
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmClient, LlmError, ToolDef};
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;

    struct CannedLlm;

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolDef],
        ) -> Result<ChatMessage, LlmError> {
            Ok(ChatMessage::assistant("canned"))
        }
    }

    fn state() -> AppState {
        let agent = Agent::from_parts(Arc::new(CannedLlm), ToolRegistry::new(), 5, 8);
        AppState::new(Arc::new(agent), 5)
    }

    #[tokio::test]
    async fn sessions_are_created_on_demand_and_removable() {
        let state = state();
        let id = Uuid::new_v4();

        assert!(state.get_session(id).await.is_none());
        state.get_or_create_session(id).await;
        assert!(state.get_session(id).await.is_some());

        assert!(state.remove_session(id).await);
        assert!(!state.remove_session(id).await);
    }

    #[tokio::test]
    async fn repeated_lookups_share_one_session() {
        let state = state();
        let id = Uuid::new_v4();

        let first = state.get_or_create_session(id).await;
        first.lock().await.history.push(ChatMessage::user("hello"));

        let second = state.get_or_create_session(id).await;
        assert_eq!(second.lock().await.history.len(), 1);
    }
}
