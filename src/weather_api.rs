//! OpenWeatherMap and IP-geolocation clients.
//!
//! Explicitly constructed client objects owning their HTTP connection pool
//! and a bounded result cache. Every call returns a JSON value: on failure
//! an `{"error": ...}` shaped payload rather than an `Err`, so callers can
//! hand results straight to the model.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use lru::LruCache;
use serde_json::{json, Value};

use crate::config::WeatherConfig;

const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const GEOCODING_URL: &str = "https://api.openweathermap.org/geo/1.0/direct";
const IPINFO_URL: &str = "https://ipinfo.io/json";

const CACHE_CAPACITY: usize = 256;

/// OpenWeatherMap client: current weather, forecast, air pollution and
/// geocoding.
pub struct OwmClient {
    http: reqwest::Client,
    api_key: String,
    units: &'static str,
    /// Results memoized by normalized arguments; entries are immutable
    /// once written.
    cache: Mutex<LruCache<String, Value>>,
}

impl OwmClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            units: config.units.as_query_param(),
            cache: Mutex::new(LruCache::new(NonZeroUsize::new(CACHE_CAPACITY).unwrap())),
        })
    }

    /// Current weather for a city.
    pub async fn current_weather(&self, city: &str) -> Value {
        let key = format!("weather:{}", normalize_name(city));
        if let Some(cached) = self.cache_get(&key) {
            return cached;
        }

        let url = format!("{}/weather", OPENWEATHER_BASE_URL);
        let result = self
            .get_json(&url, &[("q", city), ("appid", &self.api_key), ("units", self.units)])
            .await;

        self.cache_success(&key, &result);
        result
    }

    /// 5-day forecast in 3-hour intervals for a city.
    pub async fn forecast(&self, city: &str) -> Value {
        let key = format!("forecast:{}", normalize_name(city));
        if let Some(cached) = self.cache_get(&key) {
            return cached;
        }

        let url = format!("{}/forecast", OPENWEATHER_BASE_URL);
        let result = self
            .get_json(&url, &[("q", city), ("appid", &self.api_key), ("units", self.units)])
            .await;

        self.cache_success(&key, &result);
        result
    }

    /// Air pollution data for coordinates.
    pub async fn air_pollution(&self, lat: f64, lon: f64) -> Value {
        let key = format!("pollution:{}", normalize_coords(lat, lon));
        if let Some(cached) = self.cache_get(&key) {
            return cached;
        }

        let url = format!("{}/air_pollution", OPENWEATHER_BASE_URL);
        let lat_s = lat.to_string();
        let lon_s = lon.to_string();
        let result = self
            .get_json(&url, &[("lat", lat_s.as_str()), ("lon", lon_s.as_str()), ("appid", &self.api_key)])
            .await;

        self.cache_success(&key, &result);
        result
    }

    /// Geocode a location name. Returns a JSON array of matches; the limit
    /// is clamped to 1..=5.
    pub async fn geocode(&self, location_name: &str, limit: u64) -> Value {
        let limit = limit.clamp(1, 5);
        let key = format!("geo:{}:{}", normalize_name(location_name), limit);
        if let Some(cached) = self.cache_get(&key) {
            return cached;
        }

        let limit_s = limit.to_string();
        let result = self
            .get_json(
                GEOCODING_URL,
                &[("q", location_name), ("limit", limit_s.as_str()), ("appid", &self.api_key)],
            )
            .await;

        // The geocoding endpoint answers with an array; keep the error
        // shape list-valued to match.
        let result = match result {
            Value::Array(items) => Value::Array(items),
            Value::Object(obj) if obj.contains_key("error") => json!([Value::Object(obj)]),
            other => json!([other]),
        };

        self.cache_success(&key, &result);
        result
    }

    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Value {
        let response = match self.http.get(url).query(params).send().await {
            Ok(response) => response,
            Err(e) => return json!({"error": format!("Network error: {}", e)}),
        };

        let status = response.status();
        if !status.is_success() {
            return json!({"error": format!("Network error: HTTP status {}", status)});
        }

        match response.json::<Value>().await {
            Ok(value) => value,
            Err(e) => json!({"error": format!("Unexpected error: {}", e)}),
        }
    }

    fn cache_get(&self, key: &str) -> Option<Value> {
        let mut cache = self.cache.lock().ok()?;
        cache.get(key).cloned()
    }

    fn cache_success(&self, key: &str, value: &Value) {
        if is_error_value(value) {
            return;
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key.to_string(), value.clone());
        }
    }
}

/// IP-based geolocation via ipinfo.io.
///
/// The first answer is cached for the process lifetime, including a failed
/// lookup.
pub struct IpLocator {
    http: reqwest::Client,
    cached: tokio::sync::Mutex<Option<Value>>,
}

impl IpLocator {
    pub fn new(config: &WeatherConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            cached: tokio::sync::Mutex::new(None),
        })
    }

    /// Locate the current machine by IP. Returns an object with latitude,
    /// longitude, city, region and country, or `null` when unavailable.
    pub async fn current_location(&self) -> Value {
        let mut cached = self.cached.lock().await;
        if let Some(value) = cached.as_ref() {
            return value.clone();
        }

        let located = self.lookup().await;
        *cached = Some(located.clone());
        located
    }

    async fn lookup(&self) -> Value {
        let response = match self.http.get(IPINFO_URL).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("IP geolocation failed: {}", e);
                return Value::Null;
            }
        };

        if !response.status().is_success() {
            tracing::warn!("IP geolocation returned HTTP {}", response.status());
            return Value::Null;
        }

        let data: Value = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!("IP geolocation response unreadable: {}", e);
                return Value::Null;
            }
        };

        // "loc" is "lat,lon" as one string.
        let Some(loc) = data["loc"].as_str() else {
            return Value::Null;
        };
        let mut parts = loc.split(',');
        let (Some(lat), Some(lon)) = (
            parts.next().and_then(|s| s.trim().parse::<f64>().ok()),
            parts.next().and_then(|s| s.trim().parse::<f64>().ok()),
        ) else {
            return Value::Null;
        };

        json!({
            "latitude": lat,
            "longitude": lon,
            "city": data["city"].clone(),
            "region": data["region"].clone(),
            "country": data["country"].clone(),
        })
    }
}

/// Lower-cased, trimmed cache key component for city/location names.
fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Coordinates rounded to 4 decimal places for cache keying.
fn normalize_coords(lat: f64, lon: f64) -> String {
    format!("{:.4}:{:.4}", lat, lon)
}

fn is_error_value(value: &Value) -> bool {
    match value {
        Value::Object(obj) => obj.contains_key("error"),
        Value::Array(items) => items.iter().any(is_error_value),
        Value::Null => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_normalization_merges_case_and_whitespace() {
        assert_eq!(normalize_name("  Paris "), "paris");
        assert_eq!(normalize_name("NEW YORK"), "new york");
    }

    #[test]
    fn coordinate_normalization_rounds_to_four_decimals() {
        assert_eq!(normalize_coords(48.856613, 2.352222), "48.8566:2.3522");
        // Same spot within rounding distance maps to the same key
        assert_eq!(
            normalize_coords(48.85661, 2.35222),
            normalize_coords(48.856614, 2.352223)
        );
    }

    #[test]
    fn error_values_are_recognized() {
        assert!(is_error_value(&json!({"error": "timeout"})));
        assert!(is_error_value(&json!([{"error": "timeout"}])));
        assert!(is_error_value(&Value::Null));
        assert!(!is_error_value(&json!({"main": {"temp": 20.0}})));
        assert!(!is_error_value(&json!([{"lat": 1.0, "lon": 2.0}])));
    }
}
