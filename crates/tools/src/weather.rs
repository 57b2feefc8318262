//! Weather lookup tool — two-phase live query against a QWeather-style API.
//!
//! Phase 1 resolves free-form location text to a location id via the
//! geocoding endpoint; phase 2 fetches current conditions for that id.
//! The provider speaks an all-strings wire format; numeric fields are
//! parsed here, at the boundary, so everything downstream works with a
//! typed `WeatherRecord`.
//!
//! Failure shape: an unresolvable location is `NotFound`; everything else
//! (HTTP failure, non-"200" API code, malformed body, numeric-parse
//! failure) is `Transient`. A phase-2 failure after a successful phase 1
//! is still a failure — no partial record is surfaced.

use async_trait::async_trait;
use flowchat_core::error::ToolError;
use flowchat_core::event::{ToolName, ToolPayload};
use flowchat_core::record::{CurrentConditions, LocationIdentity, WeatherRecord};
use flowchat_core::tool::Tool;
use serde::Deserialize;
use tracing::{debug, warn};

pub struct WeatherTool {
    http: reqwest::Client,
    geo_base_url: String,
    weather_base_url: String,
    api_key: String,
}

impl WeatherTool {
    pub fn new(
        geo_base_url: impl Into<String>,
        weather_base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            geo_base_url: geo_base_url.into().trim_end_matches('/').to_string(),
            weather_base_url: weather_base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Resolve a location and fetch its current conditions.
    pub async fn lookup(&self, location_text: &str) -> Result<WeatherRecord, ToolError> {
        let identity = self.resolve_location(location_text).await?;
        debug!(location = %identity.name, id = %identity.id, "Resolved location");
        let now = self.current_conditions(&identity.id).await?;
        Ok(WeatherRecord {
            location: identity,
            now,
        })
    }

    async fn resolve_location(&self, location_text: &str) -> Result<LocationIdentity, ToolError> {
        let url = format!("{}/v2/city/lookup", self.geo_base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("location", location_text), ("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| ToolError::Transient(format!("geocoding request failed: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, "Geocoding endpoint returned error");
            return Err(ToolError::Transient(format!(
                "geocoding endpoint returned status {status}"
            )));
        }

        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Transient(format!("malformed geocoding response: {e}")))?;

        if body.code != "200" {
            return Err(ToolError::NotFound(format!(
                "no city matched '{location_text}'"
            )));
        }
        let Some(first) = body.location.into_iter().next() else {
            return Err(ToolError::NotFound(format!(
                "no city matched '{location_text}'"
            )));
        };

        first.into_identity()
    }

    async fn current_conditions(&self, location_id: &str) -> Result<CurrentConditions, ToolError> {
        let url = format!("{}/v7/weather/now", self.weather_base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("location", location_id), ("key", &self.api_key)])
            .send()
            .await
            .map_err(|e| ToolError::Transient(format!("weather request failed: {e}")))?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, "Weather endpoint returned error");
            return Err(ToolError::Transient(format!(
                "weather endpoint returned status {status}"
            )));
        }

        let body: NowResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Transient(format!("malformed weather response: {e}")))?;

        if body.code != "200" {
            return Err(ToolError::Transient(format!(
                "weather endpoint returned code {}",
                body.code
            )));
        }
        let Some(now) = body.now else {
            return Err(ToolError::Transient("weather response missing 'now'".into()));
        };

        now.into_conditions()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> ToolName {
        ToolName::Weather
    }

    fn description(&self) -> &str {
        "Look up current weather conditions for a location. Returns temperature, \
         conditions, humidity, wind, pressure, and visibility."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The city name or location to look up weather for"
                }
            },
            "required": ["location"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolPayload, ToolError> {
        let location = arguments["location"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'location' argument".into()))?;

        let record = self.lookup(location).await?;
        Ok(ToolPayload::Weather(record))
    }
}

// --- Wire types (all-strings format) ---

#[derive(Debug, Deserialize)]
struct GeoResponse {
    code: String,
    #[serde(default)]
    location: Vec<GeoLocation>,
}

#[derive(Debug, Deserialize)]
struct GeoLocation {
    name: String,
    id: String,
    lat: String,
    lon: String,
    #[serde(default)]
    adm1: String,
    #[serde(default)]
    adm2: String,
    #[serde(default)]
    country: String,
    #[serde(rename = "fxLink", default)]
    fx_link: String,
}

impl GeoLocation {
    /// Parse string coordinates into a typed identity.
    fn into_identity(self) -> Result<LocationIdentity, ToolError> {
        let lat = parse_f64("lat", &self.lat)?;
        let lon = parse_f64("lon", &self.lon)?;
        Ok(LocationIdentity {
            name: self.name,
            id: self.id,
            lat,
            lon,
            adm1: self.adm1,
            adm2: self.adm2,
            country: self.country,
            fx_link: self.fx_link,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NowResponse {
    code: String,
    now: Option<NowBody>,
}

#[derive(Debug, Deserialize)]
struct NowBody {
    #[serde(rename = "obsTime")]
    obs_time: String,
    temp: String,
    #[serde(rename = "feelsLike")]
    feels_like: String,
    text: String,
    #[serde(rename = "windDir")]
    wind_dir: String,
    #[serde(rename = "windScale")]
    wind_scale: String,
    #[serde(rename = "windSpeed")]
    wind_speed: String,
    humidity: String,
    precip: String,
    pressure: String,
    vis: String,
}

impl NowBody {
    /// Parse the all-strings conditions body into typed values.
    fn into_conditions(self) -> Result<CurrentConditions, ToolError> {
        Ok(CurrentConditions {
            obs_time: self.obs_time,
            temp: parse_f64("temp", &self.temp)?,
            feels_like: parse_f64("feelsLike", &self.feels_like)?,
            text: self.text,
            wind_dir: self.wind_dir,
            wind_scale: self.wind_scale,
            wind_speed: parse_f64("windSpeed", &self.wind_speed)?,
            humidity: parse_u32("humidity", &self.humidity)?,
            precip: parse_f64("precip", &self.precip)?,
            pressure: parse_f64("pressure", &self.pressure)?,
            visibility: parse_f64("vis", &self.vis)?,
        })
    }
}

fn parse_f64(field: &str, value: &str) -> Result<f64, ToolError> {
    value
        .parse()
        .map_err(|_| ToolError::Transient(format!("non-numeric '{field}' field: {value}")))
}

fn parse_u32(field: &str, value: &str) -> Result<u32, ToolError> {
    value
        .parse()
        .map_err(|_| ToolError::Transient(format!("non-numeric '{field}' field: {value}")))
}
