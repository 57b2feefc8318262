//! The emitted event stream — what the consumer sees.
//!
//! `StreamEvent` is the uniform vocabulary every orchestration path emits:
//! reasoning text, final-answer text, and tool invocation results. Events
//! are append-only and delivered in strict arrival order; no event is ever
//! revised after emission.
//!
//! Ordering invariant: within one turn, a `ToolCall` event is always
//! followed by exactly one `Content` event carrying the rendered tool
//! output (or an error message), never preceded by content describing a
//! result that hasn't been computed.

use crate::record::{ExtractedUser, WeatherRecord};
use serde::{Deserialize, Serialize};

/// Events emitted during a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Model-internal deliberation text.
    Thinking { text: String },

    /// Final-answer text (or rendered tool output).
    Content { text: String },

    /// A tool was invoked; the result follows as the next `Content` event.
    ToolCall { result: ToolInvocationResult },
}

impl StreamEvent {
    pub fn thinking(text: impl Into<String>) -> Self {
        Self::Thinking { text: text.into() }
    }

    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    /// Wire event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Thinking { .. } => "thinking",
            Self::Content { .. } => "content",
            Self::ToolCall { .. } => "tool_call",
        }
    }
}

/// The closed set of tools this core can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolName {
    #[serde(rename = "getWeather")]
    Weather,
    #[serde(rename = "extractUser")]
    ExtractUser,
}

impl ToolName {
    /// The name used on the wire and in tool definitions.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Weather => "getWeather",
            Self::ExtractUser => "extractUser",
        }
    }

    /// Parse a model-supplied tool name.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "getWeather" => Some(Self::Weather),
            "extractUser" => Some(Self::ExtractUser),
            _ => None,
        }
    }

    /// Short human label used in user-facing markers.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::ExtractUser => "user info",
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// The typed output of a successful tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolPayload {
    Weather(WeatherRecord),
    User(ExtractedUser),
}

/// The outcome of one tool invocation, owned by the orchestrator that
/// produced it until handed to the formatter. Immutable once constructed.
///
/// Exactly one of `payload` / `error` is present, matching `success`.
/// The constructors are the only way to build one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocationResult {
    pub tool_name: ToolName,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<ToolPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolInvocationResult {
    /// A successful invocation carrying its typed payload.
    pub fn ok(tool_name: ToolName, payload: ToolPayload) -> Self {
        Self {
            tool_name,
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    /// A failed invocation carrying its error message.
    pub fn err(tool_name: ToolName, error: impl Into<String>) -> Self {
        Self {
            tool_name,
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_thinking() {
        let event = StreamEvent::thinking("let me see");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"thinking""#));
        assert!(json.contains(r#""text":"let me see""#));
    }

    #[test]
    fn event_serialization_content() {
        let event = StreamEvent::content("Hello");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"content""#));
    }

    #[test]
    fn event_serialization_tool_call() {
        let event = StreamEvent::ToolCall {
            result: ToolInvocationResult::err(ToolName::Weather, "no match"),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"tool_call""#));
        assert!(json.contains(r#""toolName":"getWeather""#));
    }

    #[test]
    fn event_type_names() {
        assert_eq!(StreamEvent::thinking("x").event_type(), "thinking");
        assert_eq!(StreamEvent::content("x").event_type(), "content");
        assert_eq!(
            StreamEvent::ToolCall {
                result: ToolInvocationResult::err(ToolName::ExtractUser, "x"),
            }
            .event_type(),
            "tool_call"
        );
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"content","text":"hi"}"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event, StreamEvent::content("hi"));
    }

    #[test]
    fn tool_name_wire_roundtrip() {
        assert_eq!(ToolName::Weather.wire_name(), "getWeather");
        assert_eq!(ToolName::from_wire("extractUser"), Some(ToolName::ExtractUser));
        assert_eq!(ToolName::from_wire("shell"), None);
    }

    #[test]
    fn result_constructors_enforce_exclusivity() {
        let ok = ToolInvocationResult::err(ToolName::Weather, "boom");
        assert!(!ok.success);
        assert!(ok.payload.is_none());
        assert_eq!(ok.error.as_deref(), Some("boom"));
    }

    #[test]
    fn result_serializes_camel_case() {
        let result = ToolInvocationResult::err(ToolName::Weather, "no match");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains(r#""toolName":"getWeather""#));
        assert!(json.contains(r#""success":false"#));
        assert!(!json.contains("payload"));
    }
}
