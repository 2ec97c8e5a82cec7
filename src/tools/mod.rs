//! Tool registry and the weather tool implementations.
//!
//! Tools are thin wrappers around the weather/geolocation clients. They
//! never raise across the dispatch boundary: argument problems, network
//! failures and unexpected statuses all come back as `{"error": ...}`
//! shaped values, which the turn loop feeds to the model as ordinary tool
//! results.

mod air_pollution;
mod location;
mod weather;

pub use air_pollution::AirPollution;
pub use location::{CurrentLocation, LocationCoordinates};
pub use weather::{CurrentWeather, Forecast};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::ToolDef;
use crate::weather_api::{IpLocator, OwmClient};

/// A tool callable by the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

/// Maps tool names to handlers.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry with the full weather tool set wired to the given clients.
    pub fn with_weather_tools(owm: Arc<OwmClient>, locator: Arc<IpLocator>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CurrentWeather::new(owm.clone())));
        registry.register(Arc::new(Forecast::new(owm.clone())));
        registry.register(Arc::new(AirPollution::new(owm.clone())));
        registry.register(Arc::new(LocationCoordinates::new(owm)));
        registry.register(Arc::new(CurrentLocation::new(locator)));
        registry
    }

    /// Associate a tool with its name. A later registration for the same
    /// name replaces the earlier one, keeping its position.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(existing) = self
            .tools
            .iter_mut()
            .find(|t| t.name() == tool.name())
        {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name() == name)
    }

    pub fn list_tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    /// Tool definitions to advertise to the model.
    pub fn schemas(&self) -> Vec<ToolDef> {
        self.tools
            .iter()
            .map(|tool| ToolDef {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Run a tool by name. Never fails: unknown names and handler errors
    /// are returned as error-shaped values.
    pub async fn dispatch(&self, name: &str, args: Value) -> Value {
        let Some(tool) = self.tools.iter().find(|t| t.name() == name) else {
            return json!({"error": format!("Unknown tool: {}", name)});
        };

        match tool.execute(args).await {
            Ok(value) => value,
            Err(e) => json!({"error": format!("{}", e)}),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
