//! Scripted mock chat clients for orchestrator and router tests.

use async_trait::async_trait;
use flowchat_core::client::{ChatClient, ChatRequest, ChatResponse, Fragment};
use flowchat_core::error::ClientError;
use flowchat_core::message::{Message, MessageToolCall};
use std::sync::Mutex;

/// A mock client that replays scripted responses in order.
///
/// `invoke` pops from the invoke queue, `stream` pops from the stream
/// queue; each panics when its queue is exhausted. Every request is
/// recorded for later assertions.
pub struct SequentialMockClient {
    invoke_queue: Mutex<Vec<Result<ChatResponse, ClientError>>>,
    stream_queue: Mutex<Vec<Vec<Result<Fragment, ClientError>>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl SequentialMockClient {
    pub fn new(
        invoke_queue: Vec<Result<ChatResponse, ClientError>>,
        stream_queue: Vec<Vec<Result<Fragment, ClientError>>>,
    ) -> Self {
        Self {
            invoke_queue: Mutex::new(invoke_queue),
            stream_queue: Mutex::new(stream_queue),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client scripted with invoke responses only, given as content
    /// strings or transport errors.
    pub fn invokes(responses: Vec<Result<String, ClientError>>) -> Self {
        Self::new(
            responses
                .into_iter()
                .map(|r| r.map(text_response))
                .collect(),
            vec![],
        )
    }

    /// A client scripted with stream fragment batches only.
    pub fn streams(batches: Vec<Vec<Result<Fragment, ClientError>>>) -> Self {
        Self::new(vec![], batches)
    }

    /// All requests seen so far, in arrival order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for SequentialMockClient {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn invoke(&self, request: ChatRequest) -> Result<ChatResponse, ClientError> {
        self.requests.lock().unwrap().push(request);
        let mut queue = self.invoke_queue.lock().unwrap();
        if queue.is_empty() {
            panic!("SequentialMockClient: invoke queue exhausted");
        }
        queue.remove(0)
    }

    async fn stream(
        &self,
        request: ChatRequest,
    ) -> Result<tokio::sync::mpsc::Receiver<Result<Fragment, ClientError>>, ClientError> {
        self.requests.lock().unwrap().push(request);
        let batch = {
            let mut queue = self.stream_queue.lock().unwrap();
            if queue.is_empty() {
                panic!("SequentialMockClient: stream queue exhausted");
            }
            queue.remove(0)
        };

        let (tx, rx) = tokio::sync::mpsc::channel(batch.len().max(1));
        for item in batch {
            let _ = tx.send(item).await;
        }
        Ok(rx)
    }
}

/// A complete response carrying plain text and no tool calls.
pub fn text_response(text: impl Into<String>) -> ChatResponse {
    ChatResponse {
        message: Message::assistant(text),
        model: "mock-model".into(),
    }
}

/// A complete response carrying tool calls and optional text.
pub fn tool_call_response(tool_calls: Vec<MessageToolCall>, text: &str) -> ChatResponse {
    let mut message = Message::assistant(text);
    message.tool_calls = tool_calls;
    ChatResponse {
        message,
        model: "mock-model".into(),
    }
}

/// A single tool call with JSON arguments.
pub fn tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}
