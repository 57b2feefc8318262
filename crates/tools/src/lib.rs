//! Built-in tool implementations for FlowChat.
//!
//! Two capabilities back the turn orchestrators: a live weather lookup
//! (two-phase geocode + current conditions) and a structured user-info
//! extraction that runs a nested model call. `render` turns either tool's
//! result into the text the consumer actually sees.

pub mod extract;
pub mod render;
pub mod weather;

use flowchat_config::AppConfig;
use flowchat_core::client::ChatClient;
use flowchat_core::tool::ToolRegistry;
use std::sync::Arc;

pub use extract::ExtractUserTool;
pub use weather::WeatherTool;

/// Create the default tool registry: weather lookup plus user extraction.
///
/// The extraction tool reuses the main chat client for its nested call;
/// the weather tool reads its endpoints and key from the config.
pub fn default_registry(config: &AppConfig, client: Arc<dyn ChatClient>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(WeatherTool::new(
        &config.weather.geo_base_url,
        &config.weather.weather_base_url,
        config.weather.api_key.clone().unwrap_or_default(),
    )));
    registry.register(Box::new(ExtractUserTool::new(
        client,
        config.model.clone(),
    )));
    registry
}
