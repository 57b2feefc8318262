//! Turn orchestrators — the three ways a user message becomes a stream.
//!
//! `plain_chat` forwards decoded model output as-is. `routed_chat` asks
//! the classifier first and runs the selected tool before any generation.
//! `bound_chat` lets the model itself request a tool: the turn streams
//! with tool definitions bound, then a follow-up complete request detects
//! whether the model wants a tool call.
//!
//! Failure policy: tool and classification failures become visible
//! content; a transport failure aborts the turn. Nothing is retried.

use crate::decoder::decode_fragment;
use crate::router::IntentRouter;
use crate::turn::{TurnState, TurnStream, enter};
use flowchat_config::ChatContext;
use flowchat_core::client::{ChatClient, ChatRequest, Fragment};
use flowchat_core::error::{ClientError, Error, ToolError};
use flowchat_core::event::{StreamEvent, ToolInvocationResult, ToolName};
use flowchat_core::message::Message;
use flowchat_core::route::RoutingDecision;
use flowchat_core::tool::ToolRegistry;
use flowchat_tools::render;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

type EventSender = mpsc::Sender<Result<StreamEvent, Error>>;

pub struct Orchestrator {
    ctx: ChatContext,
    client: Arc<dyn ChatClient>,
    tools: Arc<ToolRegistry>,
}

impl Orchestrator {
    pub fn new(ctx: ChatContext, client: Arc<dyn ChatClient>, tools: Arc<ToolRegistry>) -> Self {
        Self { ctx, client, tools }
    }

    /// Stream a plain model turn: no routing, no tools.
    pub fn plain_chat(&self, user_text: &str) -> TurnStream {
        let driver = Driver::from(self);
        let user_text = user_text.to_string();
        self.spawn(move |tx| async move { driver.plain(user_text, &tx).await })
    }

    /// Classify first, then either run the selected tool or fall through
    /// to a plain streamed turn.
    pub fn routed_chat(&self, user_text: &str) -> TurnStream {
        let driver = Driver::from(self);
        let user_text = user_text.to_string();
        self.spawn(move |tx| async move { driver.routed(user_text, &tx).await })
    }

    /// Stream with tool definitions bound, then let the model decide:
    /// a follow-up complete request detects any tool call.
    pub fn bound_chat(&self, user_text: &str) -> TurnStream {
        let driver = Driver::from(self);
        let user_text = user_text.to_string();
        self.spawn(move |tx| async move { driver.bound(user_text, &tx).await })
    }

    fn spawn<F, Fut>(&self, drive: F) -> TurnStream
    where
        F: FnOnce(EventSender) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(drive(tx));
        TurnStream::new(rx)
    }
}

/// Everything a driver task needs, detached from the orchestrator's
/// lifetime so the turn can outlive the call site.
struct Driver {
    ctx: ChatContext,
    client: Arc<dyn ChatClient>,
    tools: Arc<ToolRegistry>,
    router: IntentRouter,
}

impl From<&Orchestrator> for Driver {
    fn from(orchestrator: &Orchestrator) -> Self {
        let ctx = orchestrator.ctx.clone();
        let router = IntentRouter::new(
            orchestrator.client.clone(),
            ctx.classifier_model.clone(),
            ctx.classifier_temperature,
        );
        Self {
            ctx,
            client: orchestrator.client.clone(),
            tools: orchestrator.tools.clone(),
            router,
        }
    }
}

impl Driver {
    async fn plain(&self, user_text: String, tx: &EventSender) {
        enter(TurnState::Dispatching);
        let messages = vec![Message::user(user_text)];
        if self.stream_turn(messages, vec![], tx).await.is_ok() {
            enter(TurnState::Done);
        }
    }

    async fn routed(&self, user_text: String, tx: &EventSender) {
        enter(TurnState::Dispatching);
        let decision = self.router.route(&user_text).await;

        let (name, arguments) = match decision {
            RoutingDecision::Weather { location } => (
                ToolName::Weather,
                serde_json::json!({ "location": location }),
            ),
            RoutingDecision::ExtractUser { content } => {
                (ToolName::ExtractUser, serde_json::json!({ "text": content }))
            }
            RoutingDecision::None => {
                let messages = vec![Message::user(user_text)];
                if self.stream_turn(messages, vec![], tx).await.is_ok() {
                    enter(TurnState::Done);
                }
                return;
            }
        };

        enter(TurnState::ToolDetected);
        if self.run_tool(name, arguments, tx).await.is_ok() {
            enter(TurnState::Done);
        }
    }

    async fn bound(&self, user_text: String, tx: &EventSender) {
        enter(TurnState::Dispatching);
        let messages = vec![Message::user(user_text)];
        let definitions = self.tools.definitions();

        if self
            .stream_turn(messages.clone(), definitions.clone(), tx)
            .await
            .is_err()
        {
            return;
        }

        // Tool-call detection: the streaming response carries no call
        // structure, so ask again without streaming, same history.
        let request = self.request(messages).with_tools(definitions);
        let response = match self.client.invoke(request).await {
            Ok(response) => response,
            Err(e) => {
                self.fail(e, tx).await;
                return;
            }
        };

        let calls = response.message.tool_calls;
        let Some(call) = calls.first() else {
            enter(TurnState::Done);
            return;
        };
        if calls.len() > 1 {
            debug!(ignored = calls.len() - 1, "Honoring only the first tool call");
        }

        enter(TurnState::ToolDetected);
        let Some(name) = ToolName::from_wire(&call.name) else {
            // The model asked for a tool outside the closed set.
            let error = ToolError::NotFound(format!("unknown tool '{}'", call.name));
            warn!(tool = %call.name, "Model requested an unregistered tool");
            let _ = tx.send(Ok(StreamEvent::content(error.to_string()))).await;
            enter(TurnState::Done);
            return;
        };

        let arguments = match serde_json::from_str(&call.arguments) {
            Ok(arguments) => arguments,
            Err(e) => {
                let result = ToolInvocationResult::err(
                    name,
                    ToolError::InvalidArguments(e.to_string()).to_string(),
                );
                if self.emit_tool_result(result, tx).await.is_ok() {
                    enter(TurnState::Done);
                }
                return;
            }
        };

        let marker = format!("Now querying {}…", name.label());
        if tx.send(Ok(StreamEvent::content(marker))).await.is_err() {
            return;
        }

        if self.run_tool(name, arguments, tx).await.is_ok() {
            enter(TurnState::Done);
        }
    }

    /// Stream one model request and forward decoded events. `Err(())`
    /// means the turn already failed or the consumer went away.
    async fn stream_turn(
        &self,
        messages: Vec<Message>,
        tools: Vec<flowchat_core::message::ToolDefinition>,
        tx: &EventSender,
    ) -> Result<(), ()> {
        let request = self.request(messages).with_tools(tools);
        let mut fragments = match self.client.stream(request).await {
            Ok(rx) => rx,
            Err(e) => {
                self.fail(e, tx).await;
                return Err(());
            }
        };

        enter(TurnState::Streaming);
        while let Some(item) = fragments.recv().await {
            match item {
                Ok(fragment) => {
                    if self.forward(&fragment, tx).await.is_err() {
                        return Err(());
                    }
                }
                Err(e) => {
                    self.fail(e, tx).await;
                    return Err(());
                }
            }
        }
        Ok(())
    }

    async fn forward(&self, fragment: &Fragment, tx: &EventSender) -> Result<(), ()> {
        for event in decode_fragment(fragment) {
            if matches!(event, StreamEvent::Thinking { .. }) && !self.ctx.show_thinking {
                continue;
            }
            if tx.send(Ok(event)).await.is_err() {
                return Err(()); // consumer dropped the turn
            }
        }
        Ok(())
    }

    /// Execute a tool, fold the outcome into a `ToolInvocationResult`,
    /// and emit `ToolCall` followed by exactly one `Content`.
    async fn run_tool(
        &self,
        name: ToolName,
        arguments: serde_json::Value,
        tx: &EventSender,
    ) -> Result<(), ()> {
        enter(TurnState::ToolExecuting);
        info!(tool = %name, "Executing tool");

        let result = match self.tools.execute(name, arguments).await {
            Ok(payload) => ToolInvocationResult::ok(name, payload),
            Err(e) => {
                warn!(tool = %name, error = %e, "Tool execution failed");
                ToolInvocationResult::err(name, e.to_string())
            }
        };

        self.emit_tool_result(result, tx).await
    }

    async fn emit_tool_result(
        &self,
        result: ToolInvocationResult,
        tx: &EventSender,
    ) -> Result<(), ()> {
        enter(TurnState::ToolFormatted);
        let rendered = render::tool_result(&result);

        if tx.send(Ok(StreamEvent::ToolCall { result })).await.is_err() {
            return Err(());
        }
        if tx.send(Ok(StreamEvent::content(rendered))).await.is_err() {
            return Err(());
        }
        Ok(())
    }

    fn request(&self, messages: Vec<Message>) -> ChatRequest {
        ChatRequest::new(&self.ctx.model, messages)
            .with_temperature(self.ctx.temperature)
            .with_max_tokens(self.ctx.max_tokens)
    }

    async fn fail(&self, error: ClientError, tx: &EventSender) {
        enter(TurnState::Failed);
        warn!(error = %error, "Turn failed");
        let _ = tx.send(Err(Error::Client(error))).await;
    }
}
