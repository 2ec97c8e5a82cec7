//! Geocoding and IP-based location tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::weather_api::{IpLocator, OwmClient};

use super::Tool;

/// Resolve a place name into geographic coordinates.
pub struct LocationCoordinates {
    client: Arc<OwmClient>,
}

impl LocationCoordinates {
    pub fn new(client: Arc<OwmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for LocationCoordinates {
    fn name(&self) -> &str {
        "get_location_coordinates"
    }

    fn description(&self) -> &str {
        "Get geographical coordinates (latitude, longitude) for a city or location name. Returns a list of matching locations."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "location_name": {
                    "type": "string",
                    "description": "Name of the city or location"
                },
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 1, max: 5)"
                }
            },
            "required": ["location_name"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let name = args["location_name"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'location_name' argument"))?;
        let limit = args["limit"].as_u64().unwrap_or(1);

        Ok(self.client.geocode(name, limit).await)
    }
}

/// Locate the user by their IP address.
pub struct CurrentLocation {
    locator: Arc<IpLocator>,
}

impl CurrentLocation {
    pub fn new(locator: Arc<IpLocator>) -> Self {
        Self { locator }
    }
}

#[async_trait]
impl Tool for CurrentLocation {
    fn name(&self) -> &str {
        "current_location"
    }

    fn description(&self) -> &str {
        "Get the user's current location based on their IP address. Returns latitude, longitude, city, region and country, or null if the location cannot be determined."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
        Ok(self.locator.current_location().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Units, WeatherConfig};
    use std::time::Duration;

    fn config() -> WeatherConfig {
        WeatherConfig {
            api_key: "test-key".to_string(),
            units: Units::Metric,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn geocoding_requires_location_name() {
        let tool = LocationCoordinates::new(Arc::new(OwmClient::new(&config()).unwrap()));
        let err = tool.execute(json!({"limit": 3})).await.unwrap_err();
        assert!(err.to_string().contains("'location_name'"));
    }

    #[test]
    fn current_location_takes_no_required_arguments() {
        let tool = CurrentLocation::new(Arc::new(IpLocator::new(&config()).unwrap()));
        let schema = tool.parameters_schema();
        assert!(schema.get("required").is_none());
    }
}
