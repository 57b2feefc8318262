//! Error types for the FlowChat domain.
//!
//! Uses `thiserror` for ergonomic error definitions. The taxonomy follows
//! the turn's failure policy: tool-local failures (`ToolError`) are caught
//! and rendered as visible content, while transport failures (`ClientError`)
//! are fatal to the turn.

use thiserror::Error;

/// The top-level error type for all FlowChat operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Chat transport errors (fatal to the turn) ---
    #[error("Client error: {0}")]
    Client(#[from] ClientError),

    // --- Tool errors (rendered as content, never fatal) ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the underlying chat transport.
///
/// Any of these aborts the turn: the orchestrator never converts a
/// transport failure into visible content.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("API request failed: {message} (status: {status_code})")]
    Api { status_code: u16, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Client not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures local to a tool invocation.
///
/// These are captured into `ToolInvocationResult::error` and rendered as
/// user-visible text; the turn still completes normally. No variant is
/// retried — a failed tool call is reported once.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The lookup target does not exist (e.g. an unresolvable location),
    /// or the model requested a tool that is not registered.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A network, status, or parse failure inside a tool. Partial success
    /// (first phase ok, second phase failed) still collapses to this.
    #[error("Tool request failed: {0}")]
    Transient(String),

    /// Model-emitted structure failed strict validation. No partial object
    /// is ever surfaced.
    #[error("extraction failed: {0}")]
    SchemaInvalid(String),

    /// The model supplied arguments the tool cannot use.
    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_displays_correctly() {
        let err = Error::Client(ClientError::Api {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn tool_error_displays_correctly() {
        let err = Error::Tool(ToolError::NotFound("no city matched '阿特兰蒂斯'".into()));
        assert!(err.to_string().contains("阿特兰蒂斯"));
    }

    #[test]
    fn schema_invalid_carries_fixed_prefix() {
        let err = ToolError::SchemaInvalid("age was not a number".into());
        assert!(err.to_string().starts_with("extraction failed"));
    }
}
