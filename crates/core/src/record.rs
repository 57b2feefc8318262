//! Typed tool results.
//!
//! `WeatherRecord` is a point-in-time read: created fresh per query, never
//! cached or mutated. `ExtractedUser` is model-emitted structure validated
//! strictly by serde — absent fields deserialize to `None`/empty, a
//! present-but-mistyped field (e.g. non-numeric age) fails deserialization
//! instead of coercing.

use serde::{Deserialize, Serialize};

/// A resolved location plus a snapshot of its current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    pub location: LocationIdentity,
    pub now: CurrentConditions,
}

/// Location identity from the geocoding phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationIdentity {
    pub name: String,
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    /// First-level administrative region (province / state); may be empty.
    #[serde(default)]
    pub adm1: String,
    /// Second-level administrative region (city / district); may be empty.
    #[serde(default)]
    pub adm2: String,
    #[serde(default)]
    pub country: String,
    /// Forecast page link for this location.
    #[serde(default)]
    pub fx_link: String,
}

/// Current observed conditions. Numeric fields are parsed from the
/// provider's all-strings wire format at the tool boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Observation timestamp, kept verbatim (e.g. "2024-01-12T16:20+08:00").
    pub obs_time: String,
    /// Air temperature, °C.
    pub temp: f64,
    /// Apparent temperature, °C.
    pub feels_like: f64,
    /// Condition text (e.g. "晴", "Light rain").
    pub text: String,
    /// Wind direction as text (e.g. "东北风", "NE").
    pub wind_dir: String,
    /// Wind scale on the wire ("3" or a range like "3-4"), kept as text.
    pub wind_scale: String,
    /// Wind speed, km/h.
    pub wind_speed: f64,
    /// Relative humidity, percent.
    pub humidity: u32,
    /// Precipitation in the last hour, mm.
    pub precip: f64,
    /// Atmospheric pressure, hPa.
    pub pressure: f64,
    /// Visibility, km.
    pub visibility: f64,
}

/// A person record extracted from free-form text.
///
/// The extraction prompt's instruction to omit unknown fields is a hard
/// contract: a missing field is not an error, a malformed present field is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hobbies: Vec<String>,
}

/// Nested address, each part independently optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracted_user_minimal() {
        let user: ExtractedUser = serde_json::from_str(r#"{"name":"张三"}"#).unwrap();
        assert_eq!(user.name, "张三");
        assert!(user.age.is_none());
        assert!(user.address.is_none());
        assert!(user.hobbies.is_empty());
    }

    #[test]
    fn extracted_user_full() {
        let json = r#"{
            "name": "张三",
            "age": 25,
            "email": "zhangsan@example.com",
            "phone": "13800138000",
            "address": {"city": "北京", "district": "朝阳区", "street": "建国路88号"},
            "hobbies": ["reading", "cycling"]
        }"#;
        let user: ExtractedUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.age, Some(25));
        assert_eq!(
            user.address.as_ref().unwrap().district.as_deref(),
            Some("朝阳区")
        );
        assert_eq!(user.hobbies.len(), 2);
        assert!(user.occupation.is_none());
    }

    #[test]
    fn non_numeric_age_fails_validation() {
        let result =
            serde_json::from_str::<ExtractedUser>(r#"{"name":"张三","age":"twenty-five"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn missing_name_fails_validation() {
        let result = serde_json::from_str::<ExtractedUser>(r#"{"age":25}"#);
        assert!(result.is_err());
    }
}
