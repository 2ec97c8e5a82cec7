//! Agent module - the conversational turn loop.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Append the user message and trim the conversation memory
//! 2. Call the LLM with the available weather tools
//! 3. If the LLM requests tool calls, execute them in order and feed the
//!    results back
//! 4. Repeat until the LLM produces a final text answer or the round cap
//!    is reached

mod agent_loop;
mod prompt;

pub use agent_loop::{Agent, AgentError};
pub use prompt::build_system_prompt;
