//! ChatClient trait — the abstraction over chat model backends.
//!
//! A ChatClient knows how to send a message list to a model and get a
//! response back, either complete (`invoke`) or as a stream of fragments
//! (`stream`). Tool binding is part of the request: a request carrying
//! tool definitions may come back with `tool_calls` on the message.

use crate::error::ClientError;
use crate::message::{Message, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for one model request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "qwen3:8b", "gpt-4o")
    pub model: String,

    /// The turn's messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may request; empty = plain generation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

impl ChatRequest {
    /// A plain request for the given model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Bind tool definitions to this request.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }
}

/// A complete (non-streaming) response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated message; `message.tool_calls` carries any tool
    /// invocation requests when tools were bound to the request.
    pub message: Message,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// One incremental unit of model output as delivered by the streaming
/// transport.
///
/// Textual payload arrives through either of two channels: the structured
/// `reasoning` side channel, or `content` — which may itself be raw text
/// or an array of parts. The decoder pattern-matches `FragmentContent`
/// exhaustively; there is no duck-typed shape inspection downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fragment {
    /// Primary payload delta.
    pub content: FragmentContent,

    /// Model-internal deliberation text, when the backend surfaces it as
    /// a separate field rather than inside the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Fragment {
    /// A fragment carrying only primary text.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: FragmentContent::Text(content.into()),
            reasoning: None,
        }
    }

    /// A fragment carrying only side-channel reasoning text.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            content: FragmentContent::Text(String::new()),
            reasoning: Some(text.into()),
        }
    }
}

/// The primary payload of a fragment: raw text, or a list of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl FragmentContent {
    /// Flatten to plain text. Non-text parts contribute nothing.
    pub fn flatten(&self) -> String {
        match self {
            FragmentContent::Text(s) => s.clone(),
            FragmentContent::Parts(parts) => {
                parts.iter().map(|p| p.text.as_str()).collect::<String>()
            }
        }
    }
}

/// One element of a parts-style content array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentPart {
    /// Part discriminator (e.g. "text"); kept for forward compatibility.
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub text: String,
}

/// The core ChatClient trait.
///
/// The orchestrator calls `invoke()` or `stream()` without knowing which
/// backend is in use — pure polymorphism. Implementations live in the
/// providers crate; tests use scripted mocks.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openai-compat").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn invoke(&self, request: ChatRequest) -> std::result::Result<ChatResponse, ClientError>;

    /// Send a request and get a stream of fragments. The channel closing
    /// signals stream exhaustion; an `Err` item is a transport failure.
    ///
    /// Default implementation calls `invoke()` and wraps the result as a
    /// single fragment.
    async fn stream(
        &self,
        request: ChatRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<Fragment, ClientError>>,
        ClientError,
    > {
        let response = self.invoke(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx.send(Ok(Fragment::text(response.message.content))).await;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_defaults() {
        let req = ChatRequest::new("qwen3:8b", vec![]);
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.tools.is_empty());
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn flatten_text_content() {
        let content = FragmentContent::Text("hello".into());
        assert_eq!(content.flatten(), "hello");
    }

    #[test]
    fn flatten_parts_content() {
        let content = FragmentContent::Parts(vec![
            ContentPart {
                kind: "text".into(),
                text: "hel".into(),
            },
            ContentPart {
                kind: "text".into(),
                text: "lo".into(),
            },
        ]);
        assert_eq!(content.flatten(), "hello");
    }

    #[test]
    fn content_deserializes_from_string_or_parts() {
        let text: FragmentContent = serde_json::from_str(r#""plain""#).unwrap();
        assert_eq!(text.flatten(), "plain");

        let parts: FragmentContent =
            serde_json::from_str(r#"[{"type":"text","text":"a"},{"type":"text","text":"b"}]"#)
                .unwrap();
        assert_eq!(parts.flatten(), "ab");
    }

    #[test]
    fn non_text_parts_flatten_empty() {
        let parts: FragmentContent =
            serde_json::from_str(r#"[{"type":"image_url"}]"#).unwrap();
        assert_eq!(parts.flatten(), "");
    }
}
