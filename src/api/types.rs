//! API request and response types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to send a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The user's message
    pub message: String,

    /// Session to continue; omitted to start a new conversation
    pub session_id: Option<Uuid>,
}

/// Response to a chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// Session identifier (newly generated for a first message)
    pub session_id: Uuid,

    /// The assistant's reply
    pub reply: String,
}

/// Memory information for one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session_id: Uuid,

    /// Messages currently held for the session
    pub message_count: usize,

    /// Conversation exchanges currently held
    pub exchange_count: usize,

    /// Maximum exchanges retained by the memory window
    pub memory_window: usize,

    /// Last activity (ISO 8601)
    pub updated_at: String,
}
