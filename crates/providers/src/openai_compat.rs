//! OpenAI-compatible chat client implementation.
//!
//! Works with: OpenAI, OpenRouter, Ollama (`/v1`), vLLM, and any endpoint
//! exposing an OpenAI-compatible `/v1/chat/completions`.
//!
//! Supports:
//! - Chat completions (non-streaming and streaming SSE)
//! - Tool binding / function calling on the non-streaming path
//! - The reasoning side channel (`reasoning_content` / `reasoning` deltas)
//!
//! Tool calls are surfaced only on `invoke`: the orchestrator performs
//! tool-call detection on a follow-up non-streaming request after the
//! stream drains, so the streaming path carries text deltas only.

use async_trait::async_trait;
use flowchat_config::ChatContext;
use flowchat_core::client::{ChatClient, ChatRequest, ChatResponse, ContentPart, Fragment, FragmentContent};
use flowchat_core::error::ClientError;
use flowchat_core::message::{Message, MessageToolCall, Role, ToolDefinition};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// An OpenAI-compatible chat client.
pub struct OpenAiCompatClient {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    /// Create a new OpenAI-compatible client.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            name: "openai-compat".into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Build a client from a per-turn chat context.
    pub fn from_context(ctx: &ChatContext) -> Self {
        Self::new(&ctx.base_url, ctx.api_key.clone().unwrap_or_default())
    }

    /// Convert our Message types to the wire format.
    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: match m.role {
                    Role::User => "user".into(),
                    Role::Assistant => "assistant".into(),
                    Role::System => "system".into(),
                    Role::Tool => "tool".into(),
                },
                content: Some(WireContent::Text(m.content.clone())),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| ApiToolCall {
                                id: tc.id.clone(),
                                r#type: "function".into(),
                                function: ApiFunction {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
            })
            .collect()
    }

    /// Convert tool definitions to the wire format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    fn build_body(request: &ChatRequest, stream: bool) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "temperature": request.temperature,
            "stream": stream,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }

    fn status_error(status: u16, error_body: String) -> ClientError {
        if status == 401 || status == 403 {
            return ClientError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            );
        }
        warn!(status, body = %error_body, "Chat endpoint returned error");
        ClientError::Api {
            status_code: status,
            message: error_body,
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, request: ChatRequest) -> Result<ChatResponse, ClientError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request, false);

        debug!(client = %self.name, model = %request.model, tools = request.tools.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, error_body));
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| ClientError::Api {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Api {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        let tool_calls: Vec<MessageToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| MessageToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect();

        let content = choice
            .message
            .content
            .map(|c| c.flatten())
            .unwrap_or_default();
        let mut message = Message::assistant(content);
        message.tool_calls = tool_calls;

        Ok(ChatResponse {
            message,
            model: api_response.model,
        })
    }

    async fn stream(
        &self,
        request: ChatRequest,
    ) -> Result<
        tokio::sync::mpsc::Receiver<Result<Fragment, ClientError>>,
        ClientError,
    > {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::build_body(&request, true);

        debug!(client = %self.name, model = %request.model, "Sending streaming request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            return Err(Self::status_error(status, error_body));
        }

        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let client_name = self.name.clone();

        // Read the SSE byte stream, parse one fragment per data line.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(ClientError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    // Skip empty lines and SSE comments
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    let data = data.trim();

                    // "[DONE]" signals end of stream; closing the channel
                    // is the completion signal downstream.
                    if data == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<StreamResponse>(data) {
                        Ok(stream_resp) => {
                            let Some(choice) = stream_resp.choices.into_iter().next() else {
                                continue;
                            };
                            let delta = choice.delta;

                            let reasoning = delta
                                .reasoning_content
                                .or(delta.reasoning)
                                .filter(|r| !r.is_empty());
                            let content = match delta.content {
                                Some(WireContent::Text(s)) => FragmentContent::Text(s),
                                Some(WireContent::Parts(parts)) => FragmentContent::Parts(
                                    parts
                                        .into_iter()
                                        .map(|p| ContentPart {
                                            kind: p.kind,
                                            text: p.text,
                                        })
                                        .collect(),
                                ),
                                None => FragmentContent::Text(String::new()),
                            };

                            let empty = reasoning.is_none() && content.flatten().is_empty();
                            if empty {
                                continue;
                            }

                            let fragment = Fragment { content, reasoning };
                            if tx.send(Ok(fragment)).await.is_err() {
                                return; // receiver dropped — turn abandoned
                            }
                        }
                        Err(e) => {
                            trace!(
                                client = %client_name,
                                data = %data,
                                error = %e,
                                "Ignoring unparseable SSE chunk"
                            );
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}

// --- Wire types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
}

/// Message/delta content on the wire: a plain string or an array of parts.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

impl WireContent {
    fn flatten(self) -> String {
        match self {
            WireContent::Text(s) => s,
            WireContent::Parts(parts) => parts.into_iter().map(|p| p.text).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WirePart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    #[allow(dead_code)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<WireContent>,

    /// Reasoning side channel (DeepSeek-style field name).
    #[serde(default)]
    reasoning_content: Option<String>,

    /// Reasoning side channel (OpenRouter-style field name).
    #[serde(default)]
    reasoning: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OpenAiCompatClient::new("http://localhost:11434/v1/", "");
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert_eq!(client.name(), "openai-compat");
    }

    #[test]
    fn message_conversion() {
        let messages = vec![Message::system("You are helpful"), Message::user("Hello")];
        let api_messages = OpenAiCompatClient::to_api_messages(&messages);
        assert_eq!(api_messages.len(), 2);
        assert_eq!(api_messages[0].role, "system");
        assert_eq!(api_messages[1].role, "user");
    }

    #[test]
    fn tool_definition_conversion() {
        let tools = vec![ToolDefinition {
            name: "getWeather".into(),
            description: "Look up current weather".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiCompatClient::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].function.name, "getWeather");
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn bound_request_body_carries_tools() {
        let request = ChatRequest::new("qwen3:8b", vec![Message::user("天气")]).with_tools(vec![
            ToolDefinition {
                name: "getWeather".into(),
                description: "Weather lookup".into(),
                parameters: serde_json::json!({"type": "object"}),
            },
        ]);
        let body = OpenAiCompatClient::build_body(&request, false);
        assert_eq!(body["stream"], false);
        assert_eq!(body["tools"][0]["function"]["name"], "getWeather");
    }

    #[test]
    fn plain_request_body_omits_tools() {
        let request = ChatRequest::new("qwen3:8b", vec![Message::user("hi")]);
        let body = OpenAiCompatClient::build_body(&request, true);
        assert_eq!(body["stream"], true);
        assert!(body.get("tools").is_none());
    }

    // --- SSE parsing tests ---

    #[test]
    fn parse_stream_content_delta() {
        let data = r#"{"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        match &parsed.choices[0].delta.content {
            Some(WireContent::Text(s)) => assert_eq!(s, "Hello"),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn parse_stream_reasoning_delta() {
        let data = r#"{"choices":[{"delta":{"reasoning_content":"Let me think"},"finish_reason":null}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert_eq!(
            parsed.choices[0].delta.reasoning_content.as_deref(),
            Some("Let me think")
        );
        assert!(parsed.choices[0].delta.content.is_none());
    }

    #[test]
    fn parse_stream_reasoning_alternate_field() {
        let data = r#"{"choices":[{"delta":{"reasoning":"hmm"},"finish_reason":null}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].delta.reasoning.as_deref(), Some("hmm"));
    }

    #[test]
    fn parse_stream_parts_content() {
        let data = r#"{"choices":[{"delta":{"content":[{"type":"text","text":"a"},{"type":"text","text":"b"}]},"finish_reason":null}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        match parsed.choices.into_iter().next().unwrap().delta.content {
            Some(content) => assert_eq!(content.flatten(), "ab"),
            None => panic!("expected parts content"),
        }
    }

    #[test]
    fn parse_empty_delta() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].delta.content.is_none());
        assert!(parsed.choices[0].delta.reasoning_content.is_none());
    }

    #[test]
    fn parse_invoke_response_with_tool_calls() {
        let data = r#"{
            "model": "qwen3:8b",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [
                        {"id": "call_1", "type": "function",
                         "function": {"name": "getWeather", "arguments": "{\"location\":\"北京\"}"}},
                        {"id": "call_2", "type": "function",
                         "function": {"name": "extractUser", "arguments": "{}"}}
                    ]
                }
            }]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let tcs = parsed.choices[0].message.tool_calls.as_ref().unwrap();
        assert_eq!(tcs.len(), 2);
        assert_eq!(tcs[0].function.name, "getWeather");
        assert!(tcs[0].function.arguments.contains("北京"));
    }

    #[test]
    fn parse_invoke_response_parts_content() {
        let data = r#"{
            "model": "m",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": [{"type": "text", "text": "hello"}]
                }
            }]
        }"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        let content = parsed
            .choices
            .into_iter()
            .next()
            .unwrap()
            .message
            .content
            .unwrap();
        assert_eq!(content.flatten(), "hello");
    }
}
