//! System prompt template for the weather assistant.

use crate::tools::ToolRegistry;

/// Build the system prompt with tool definitions and the current date.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let tool_descriptions = tools
        .list_tools()
        .iter()
        .map(|t| format!("- **{}**: {}", t.name(), t.description()))
        .collect::<Vec<_>>()
        .join("\n");

    let current_datetime = chrono::Local::now().format("%A, %d %B %Y %I:%M %p");

    format!(
        r#"You are a friendly weather information assistant. Current date and time: {current_datetime}

Your job is to talk naturally with the user while giving accurate weather updates. Keep your tone conversational, like you're chatting with someone, but always base your answers on the tools you have.

## Your Tools

{tool_descriptions}

## Guidelines

- Speak clearly and directly, avoid lists or bullet points.
- When someone asks about air quality, first grab the location coordinates, then check the air quality.
- If the user does not mention a city name, use their current location instead.
- Stay focused only on weather and details about yourself as the assistant.
- If the user brings up anything outside of weather, reply with: "I can only assist with weather-related queries.""#,
        current_datetime = current_datetime,
        tool_descriptions = tool_descriptions
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::weather_api::{IpLocator, OwmClient};
    use std::sync::Arc;

    #[test]
    fn prompt_lists_every_registered_tool() {
        let config = Config::for_testing("llm".into(), "owm".into());
        let owm = Arc::new(OwmClient::new(&config.weather).unwrap());
        let locator = Arc::new(IpLocator::new(&config.weather).unwrap());
        let registry = ToolRegistry::with_weather_tools(owm, locator);

        let prompt = build_system_prompt(&registry);
        for name in [
            "get_weather",
            "get_forecast",
            "get_air_pollution",
            "get_location_coordinates",
            "current_location",
        ] {
            assert!(prompt.contains(name), "prompt missing tool {}", name);
        }
    }
}
