//! Tool result formatting — typed results to user-visible text.
//!
//! Pure and total: every `ToolInvocationResult` renders to a string, the
//! same input always renders to the same bytes, and absent optional fields
//! are omitted rather than shown as placeholders. Failures render as the
//! captured error string verbatim.

use flowchat_core::event::{ToolInvocationResult, ToolPayload};
use flowchat_core::record::{Address, ExtractedUser, WeatherRecord};

/// Render a tool invocation result as display text.
pub fn tool_result(result: &ToolInvocationResult) -> String {
    if !result.success {
        return result
            .error
            .clone()
            .unwrap_or_else(|| "tool invocation failed".into());
    }
    match &result.payload {
        Some(ToolPayload::Weather(record)) => weather(record),
        Some(ToolPayload::User(user)) => extracted_user(user),
        None => "tool invocation failed".into(),
    }
}

fn weather(record: &WeatherRecord) -> String {
    let loc = &record.location;
    let now = &record.now;

    let mut out = String::new();

    let region: Vec<&str> = [loc.adm1.as_str(), loc.adm2.as_str()]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if region.is_empty() {
        out.push_str(&format!("Weather for {}\n", loc.name));
    } else {
        out.push_str(&format!("Weather for {} ({})\n", loc.name, region.join(" ")));
    }

    out.push_str(&format!(
        "Temperature: {}°C (feels like {}°C)\n",
        now.temp, now.feels_like
    ));
    out.push_str(&format!("Condition: {}\n", now.text));
    out.push_str(&format!("Humidity: {}%\n", now.humidity));
    out.push_str(&format!(
        "Wind: {} scale {}, {} km/h\n",
        now.wind_dir, now.wind_scale, now.wind_speed
    ));
    out.push_str(&format!("Pressure: {} hPa\n", now.pressure));
    out.push_str(&format!("Visibility: {} km\n", now.visibility));
    out.push_str(&format!("Precipitation: {} mm\n", now.precip));
    out.push_str(&format!("Observed: {}\n", now.obs_time));
    if !loc.fx_link.is_empty() {
        out.push_str(&format!("Forecast: {}\n", loc.fx_link));
    }

    out.trim_end().to_string()
}

fn extracted_user(user: &ExtractedUser) -> String {
    let mut lines = vec![format!("Name: {}", user.name)];

    if let Some(age) = user.age {
        lines.push(format!("Age: {age}"));
    }
    if let Some(email) = &user.email {
        lines.push(format!("Email: {email}"));
    }
    if let Some(phone) = &user.phone {
        lines.push(format!("Phone: {phone}"));
    }
    if let Some(address) = &user.address
        && let Some(rendered) = address_line(address)
    {
        lines.push(format!("Address: {rendered}"));
    }
    if let Some(occupation) = &user.occupation {
        lines.push(format!("Occupation: {occupation}"));
    }
    if !user.hobbies.is_empty() {
        lines.push(format!("Hobbies: {}", user.hobbies.join(", ")));
    }

    lines.join("\n")
}

fn address_line(address: &Address) -> Option<String> {
    let parts: Vec<&str> = [
        address.city.as_deref(),
        address.district.as_deref(),
        address.street.as_deref(),
    ]
    .into_iter()
    .flatten()
    .filter(|s| !s.is_empty())
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
