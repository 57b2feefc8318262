//! Chat backend client implementations for FlowChat.
//!
//! All clients implement the `flowchat_core::ChatClient` trait. The
//! orchestrator is handed an `Arc<dyn ChatClient>` and never knows which
//! backend it is talking to.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;
