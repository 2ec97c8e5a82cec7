//! Air pollution tool.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::weather_api::OwmClient;

use super::Tool;

/// Air quality data for geographic coordinates.
pub struct AirPollution {
    client: Arc<OwmClient>,
}

impl AirPollution {
    pub fn new(client: Arc<OwmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for AirPollution {
    fn name(&self) -> &str {
        "get_air_pollution"
    }

    fn description(&self) -> &str {
        "Get air pollution data for specific coordinates. Use get_location_coordinates first to resolve a place name into latitude and longitude."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "lat": {
                    "type": "number",
                    "description": "Latitude of the location"
                },
                "lon": {
                    "type": "number",
                    "description": "Longitude of the location"
                }
            },
            "required": ["lat", "lon"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let lat = args["lat"]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("Missing or non-numeric 'lat' argument"))?;
        let lon = args["lon"]
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("Missing or non-numeric 'lon' argument"))?;

        Ok(self.client.air_pollution(lat, lon).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Units, WeatherConfig};
    use std::time::Duration;

    fn tool() -> AirPollution {
        let config = WeatherConfig {
            api_key: "test-key".to_string(),
            units: Units::Metric,
            timeout: Duration::from_secs(5),
        };
        AirPollution::new(Arc::new(OwmClient::new(&config).unwrap()))
    }

    #[tokio::test]
    async fn rejects_missing_coordinates() {
        let err = tool().execute(json!({"lat": 50.1})).await.unwrap_err();
        assert!(err.to_string().contains("'lon'"));

        let err = tool()
            .execute(json!({"lat": "not-a-number", "lon": 2.0}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'lat'"));
    }
}
