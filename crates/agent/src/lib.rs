//! Turn orchestration — the heart of FlowChat.
//!
//! A turn is one user message in, one ordered event stream out:
//!
//! 1. **Dispatch** — pick a path: plain generation, classifier-first
//!    routing, or model-bound tool calling
//! 2. **Stream** — decode raw fragments into `Thinking`/`Content` events
//! 3. **Tool** — when a tool is selected, execute it and emit
//!    `ToolCall` followed by exactly one rendered `Content`
//!
//! The consumer pulls events from a [`TurnStream`]; the channel closing
//! is the completion signal. Tool failures render as visible content,
//! transport failures end the turn.

pub mod decoder;
pub mod orchestrator;
pub mod router;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;

pub use decoder::decode_fragment;
pub use orchestrator::Orchestrator;
pub use router::IntentRouter;
pub use turn::TurnStream;
