//! Configuration management for the weather agent.
//!
//! Configuration can be set via environment variables:
//! - `LLM_PROVIDER` - Optional. One of `openai`, `azure`, `anthropic`. Defaults to `openai`.
//! - `LLM_MODEL` - Optional. Model identifier for the provider. Defaults per provider.
//! - `LLM_API_KEY` - API key for the LLM provider. Falls back to the provider-specific
//!   variable (`OPENAI_API_KEY`, `AZURE_OPENAI_API_KEY`, `ANTHROPIC_API_KEY`).
//! - `LLM_BASE_URL` - Optional. Base URL override for OpenAI-compatible gateways.
//! - `AZURE_OPENAI_ENDPOINT` / `AZURE_OPENAI_DEPLOYMENT` - Required for the `azure` provider.
//! - `OPENWEATHER_API_KEY` - Required. OpenWeatherMap API key.
//! - `WEATHER_UNITS` - Optional. `metric`, `imperial`, or `standard`. Defaults to `metric`.
//! - `WEATHER_TIMEOUT_SECS` - Optional. Weather/geolocation request timeout. Defaults to `5`.
//! - `LLM_TIMEOUT_SECS` - Optional. LLM request timeout. Defaults to `60`.
//! - `MEMORY_WINDOW` - Optional. Conversation exchanges kept in memory. Defaults to `5`.
//! - `MAX_TOOL_ROUNDS` - Optional. Maximum LLM/tool round trips per turn. Defaults to `8`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `3000`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Azure,
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding the API key for this backend.
    pub fn api_key_env_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::Azure => "AZURE_OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    /// Default model when `LLM_MODEL` is not set.
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "gpt-4o-mini",
            LlmProvider::Azure => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "azure" => Ok(LlmProvider::Azure),
            "anthropic" | "claude" => Ok(LlmProvider::Anthropic),
            other => Err(format!(
                "unknown provider '{}', expected one of: openai, azure, anthropic",
                other
            )),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Azure => "azure",
            LlmProvider::Anthropic => "anthropic",
        };
        f.write_str(name)
    }
}

/// Measurement units for OpenWeatherMap requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Metric,
    Imperial,
    /// Kelvin, the API default.
    Standard,
}

impl Units {
    /// Value of the `units` query parameter.
    pub fn as_query_param(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            "standard" | "kelvin" => Ok(Units::Standard),
            other => Err(format!(
                "unknown units '{}', expected one of: metric, imperial, standard",
                other
            )),
        }
    }
}

/// LLM provider configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Selected backend
    pub provider: LlmProvider,

    /// Model identifier in the backend's naming scheme
    pub model: String,

    /// API key for the backend
    pub api_key: String,

    /// Base URL override (OpenAI-compatible gateways)
    pub base_url: Option<String>,

    /// Azure resource endpoint, e.g. `https://my-resource.openai.azure.com`
    pub azure_endpoint: Option<String>,

    /// Azure deployment name
    pub azure_deployment: Option<String>,

    /// Request timeout for LLM calls
    pub timeout: Duration,
}

/// Weather/geolocation service configuration.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: String,

    /// Measurement units for weather data
    pub units: Units,

    /// Request timeout for weather and geolocation calls
    pub timeout: Duration,
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// LLM provider settings
    pub llm: LlmConfig,

    /// Weather service settings
    pub weather: WeatherConfig,

    /// Conversation exchanges retained by the memory window
    pub memory_window: usize,

    /// Maximum LLM/tool round trips per user turn
    pub max_tool_rounds: usize,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if the LLM API key or
    /// `OPENWEATHER_API_KEY` is not set, and `ConfigError::InvalidValue` for
    /// unparseable numeric or enum values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let provider = std::env::var("LLM_PROVIDER")
            .unwrap_or_else(|_| "openai".to_string())
            .parse::<LlmProvider>()
            .map_err(|e| ConfigError::InvalidValue("LLM_PROVIDER".to_string(), e))?;

        let api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var(provider.api_key_env_var()))
            .map_err(|_| ConfigError::MissingEnvVar(provider.api_key_env_var().to_string()))?;

        let model = std::env::var("LLM_MODEL")
            .unwrap_or_else(|_| provider.default_model().to_string());

        let azure_endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").ok();
        let azure_deployment = std::env::var("AZURE_OPENAI_DEPLOYMENT").ok();

        // The azure client cannot build a request URL without these.
        if provider == LlmProvider::Azure {
            if azure_endpoint.is_none() {
                return Err(ConfigError::MissingEnvVar("AZURE_OPENAI_ENDPOINT".to_string()));
            }
            if azure_deployment.is_none() {
                return Err(ConfigError::MissingEnvVar("AZURE_OPENAI_DEPLOYMENT".to_string()));
            }
        }

        let llm_timeout = parse_env_secs("LLM_TIMEOUT_SECS", 60)?;

        let llm = LlmConfig {
            provider,
            model,
            api_key,
            base_url: std::env::var("LLM_BASE_URL").ok(),
            azure_endpoint,
            azure_deployment,
            timeout: llm_timeout,
        };

        let weather_api_key = std::env::var("OPENWEATHER_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("OPENWEATHER_API_KEY".to_string()))?;

        let units = std::env::var("WEATHER_UNITS")
            .unwrap_or_else(|_| "metric".to_string())
            .parse::<Units>()
            .map_err(|e| ConfigError::InvalidValue("WEATHER_UNITS".to_string(), e))?;

        let weather = WeatherConfig {
            api_key: weather_api_key,
            units,
            timeout: parse_env_secs("WEATHER_TIMEOUT_SECS", 5)?,
        };

        let memory_window = std::env::var("MEMORY_WINDOW")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("MEMORY_WINDOW".to_string(), format!("{}", e)))?;

        let max_tool_rounds = std::env::var("MAX_TOOL_ROUNDS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_TOOL_ROUNDS".to_string(), format!("{}", e))
            })?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        Ok(Self {
            llm,
            weather,
            memory_window,
            max_tool_rounds,
            host,
            port,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn for_testing(llm_api_key: String, weather_api_key: String) -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::OpenAi,
                model: "gpt-4o-mini".to_string(),
                api_key: llm_api_key,
                base_url: None,
                azure_endpoint: None,
                azure_deployment: None,
                timeout: Duration::from_secs(60),
            },
            weather: WeatherConfig {
                api_key: weather_api_key,
                units: Units::Metric,
                timeout: Duration::from_secs(5),
            },
            memory_window: 5,
            max_tool_rounds: 8,
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

fn parse_env_secs(var: &str, default: u64) -> Result<Duration, ConfigError> {
    let secs = std::env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue(var.to_string(), format!("{}", e)))?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_known_names() {
        assert_eq!("openai".parse::<LlmProvider>().unwrap(), LlmProvider::OpenAi);
        assert_eq!("Azure".parse::<LlmProvider>().unwrap(), LlmProvider::Azure);
        assert_eq!(
            "anthropic".parse::<LlmProvider>().unwrap(),
            LlmProvider::Anthropic
        );
        // Alias accepted by the original provider factory
        assert_eq!(
            "claude".parse::<LlmProvider>().unwrap(),
            LlmProvider::Anthropic
        );
    }

    #[test]
    fn provider_rejects_unknown_name() {
        let err = "mistral".parse::<LlmProvider>().unwrap_err();
        assert!(err.contains("mistral"));
    }

    #[test]
    fn units_parse_and_map_to_query_param() {
        assert_eq!("metric".parse::<Units>().unwrap(), Units::Metric);
        assert_eq!("imperial".parse::<Units>().unwrap(), Units::Imperial);
        assert_eq!("kelvin".parse::<Units>().unwrap(), Units::Standard);
        assert_eq!(Units::Standard.as_query_param(), "standard");
    }

    #[test]
    fn testing_config_has_sane_defaults() {
        let config = Config::for_testing("llm-key".into(), "owm-key".into());
        assert_eq!(config.memory_window, 5);
        assert_eq!(config.max_tool_rounds, 8);
        assert_eq!(config.llm.provider, LlmProvider::OpenAi);
        assert_eq!(config.weather.units, Units::Metric);
    }
}
