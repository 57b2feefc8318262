//! Turn lifecycle: the state machine and the pull-based stream handle.

use flowchat_core::error::Error;
use flowchat_core::event::{StreamEvent, ToolInvocationResult};
use tokio::sync::mpsc;
use tracing::debug;

/// The phases a turn moves through. Traced, never exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TurnState {
    Dispatching,
    Streaming,
    ToolDetected,
    ToolExecuting,
    ToolFormatted,
    Done,
    Failed,
}

impl TurnState {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Dispatching => "dispatching",
            Self::Streaming => "streaming",
            Self::ToolDetected => "tool_detected",
            Self::ToolExecuting => "tool_executing",
            Self::ToolFormatted => "tool_formatted",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// Log a state transition and return the new state.
pub(crate) fn enter(state: TurnState) -> TurnState {
    debug!(state = state.name(), "Turn state");
    state
}

/// A pull-based handle over one running turn.
///
/// The orchestrator spawns a driver task that feeds events into a channel;
/// the consumer pulls them with [`next`](TurnStream::next). `Ok(None)`
/// means the turn completed. Dropping the handle abandons the turn:
/// the driver's next send fails and it stops.
pub struct TurnStream {
    rx: mpsc::Receiver<Result<StreamEvent, Error>>,
    summary: Option<ToolInvocationResult>,
}

impl TurnStream {
    pub(crate) fn new(rx: mpsc::Receiver<Result<StreamEvent, Error>>) -> Self {
        Self { rx, summary: None }
    }

    /// Pull the next event. `Ok(None)` signals completion; `Err` is a
    /// transport failure and terminates the turn.
    pub async fn next(&mut self) -> Result<Option<StreamEvent>, Error> {
        match self.rx.recv().await {
            Some(Ok(event)) => {
                if let StreamEvent::ToolCall { result } = &event {
                    self.summary = Some(result.clone());
                }
                Ok(Some(event))
            }
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    /// The turn's tool invocation result, if a tool ran. Populated once
    /// the `ToolCall` event has been pulled.
    pub fn summary(&self) -> Option<&ToolInvocationResult> {
        self.summary.as_ref()
    }

    /// Drain the remaining events into a vector. Test convenience.
    pub async fn collect(&mut self) -> Result<Vec<StreamEvent>, Error> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await? {
            events.push(event);
        }
        Ok(events)
    }
}
