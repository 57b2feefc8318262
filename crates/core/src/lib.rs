//! # FlowChat Core
//!
//! Domain types, traits, and error definitions for the FlowChat streaming
//! orchestration layer. This crate has **zero framework dependencies** — it
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping the chat backend via configuration
//! - Easy testing with scripted mock clients
//! - Clean dependency graph (all crates depend inward on core)

pub mod client;
pub mod error;
pub mod event;
pub mod json_span;
pub mod message;
pub mod record;
pub mod route;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use client::{ChatClient, ChatRequest, ChatResponse, ContentPart, Fragment, FragmentContent};
pub use error::{ClientError, Error, Result, ToolError};
pub use event::{StreamEvent, ToolInvocationResult, ToolName, ToolPayload};
pub use message::{Message, MessageToolCall, Role, ToolDefinition};
pub use record::{Address, CurrentConditions, ExtractedUser, LocationIdentity, WeatherRecord};
pub use route::RoutingDecision;
pub use tool::{Tool, ToolRegistry};
