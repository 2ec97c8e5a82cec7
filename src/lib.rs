//! # Weather Agent
//!
//! A conversational weather assistant driven by an LLM tool loop.
//!
//! This library provides:
//! - An HTTP API for chatting with the assistant
//! - A bounded turn loop that lets the model call weather tools
//! - A sliding memory window over the conversation history
//! - Clients for OpenWeatherMap and IP-based geolocation
//!
//! ## Architecture
//!
//! The agent follows the "tools in a loop" pattern:
//! 1. Receive a user message, trim the conversation to the memory window
//! 2. Call the LLM with the message history and available tools
//! 3. Execute any requested tool calls, feed the results back
//! 4. Repeat until the model answers in plain text (bounded by a round cap)
//!
//! ## Example
//!
//! ```rust,ignore
//! use weather_agent::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::new(&config)?;
//! let mut history = Vec::new();
//! let reply = agent.chat(&mut history, "What's the weather in Paris?").await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod memory;
pub mod tools;
pub mod weather_api;

pub use config::Config;
