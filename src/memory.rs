//! Conversation memory window.
//!
//! Bounds LLM input size by keeping only the most recent exchanges. An
//! exchange is one user message plus every assistant/tool message that
//! follows it, up to the next user message. The system message is always
//! retained, and an exchange is never split: tool results stay attached to
//! the assistant message that requested them and the user message that
//! started the exchange.

use crate::llm::{ChatMessage, Role};

/// Trimming policy: keep the system message plus the last `max_exchanges`
/// complete exchanges.
#[derive(Debug, Clone, Copy)]
pub struct MemoryWindow {
    max_exchanges: usize,
}

impl MemoryWindow {
    pub fn new(max_exchanges: usize) -> Self {
        Self { max_exchanges }
    }

    pub fn max_exchanges(&self) -> usize {
        self.max_exchanges
    }

    /// Produce the trimmed history.
    ///
    /// Pure function: relative order is preserved within the system and
    /// conversation groups, and applying it twice yields the same result as
    /// applying it once.
    pub fn trim(&self, messages: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut system: Vec<ChatMessage> = Vec::new();
        let mut conversation: Vec<&ChatMessage> = Vec::new();

        for msg in messages {
            if msg.role == Role::System {
                system.push(msg.clone());
            } else {
                conversation.push(msg);
            }
        }

        // Walk backwards; a user message closes the exchange being built.
        // The trailing assistant/tool run (no user message after it yet)
        // is part of the newest exchange and travels with it.
        let mut kept: Vec<ChatMessage> = Vec::new();
        let mut current: Vec<ChatMessage> = Vec::new();
        let mut closed = 0usize;

        for msg in conversation.into_iter().rev() {
            current.push((*msg).clone());
            if msg.role == Role::User {
                closed += 1;
                if closed <= self.max_exchanges {
                    kept.extend(current.drain(..));
                } else {
                    break;
                }
            }
        }

        // `kept` was built newest-first.
        kept.reverse();
        system.extend(kept);
        system
    }

    /// Number of exchanges (user-message starts) in a history.
    pub fn count_exchanges(messages: &[ChatMessage]) -> usize {
        messages.iter().filter(|m| m.role == Role::User).count()
    }
}
