//! Current weather and forecast tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::weather_api::OwmClient;

use super::Tool;

/// Current weather conditions for a city.
pub struct CurrentWeather {
    client: Arc<OwmClient>,
}

impl CurrentWeather {
    pub fn new(client: Arc<OwmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for CurrentWeather {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather data for a given city: temperature, conditions, humidity and wind."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "Name of the city to get weather data for"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let city = args["city"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'city' argument"))?;

        Ok(self.client.current_weather(city).await)
    }
}

/// 5-day weather forecast with 3-hour intervals.
pub struct Forecast {
    client: Arc<OwmClient>,
}

impl Forecast {
    pub fn new(client: Arc<OwmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for Forecast {
    fn name(&self) -> &str {
        "get_forecast"
    }

    fn description(&self) -> &str {
        "Get the 5-day weather forecast in 3-hour intervals for a given city."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "Name of the city to get forecast data for"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let city = args["city"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'city' argument"))?;

        Ok(self.client.forecast(city).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Units, WeatherConfig};
    use std::time::Duration;

    fn owm() -> Arc<OwmClient> {
        let config = WeatherConfig {
            api_key: "test-key".to_string(),
            units: Units::Metric,
            timeout: Duration::from_secs(5),
        };
        Arc::new(OwmClient::new(&config).unwrap())
    }

    #[tokio::test]
    async fn missing_city_argument_is_an_error() {
        let tool = CurrentWeather::new(owm());
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(err.to_string().contains("Missing 'city'"));
    }

    #[test]
    fn schemas_require_city() {
        let weather = CurrentWeather::new(owm());
        assert_eq!(weather.parameters_schema()["required"][0], "city");

        let forecast = Forecast::new(owm());
        assert_eq!(forecast.name(), "get_forecast");
        assert_eq!(forecast.parameters_schema()["required"][0], "city");
    }
}
