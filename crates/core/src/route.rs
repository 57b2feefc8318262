//! Routing decision — which capability handles this turn.
//!
//! Derived exactly once per turn, before any generation, and never
//! reconsidered mid-turn.

/// The outcome of intent classification for one user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Route to the weather tool with an extracted location string.
    Weather { location: String },

    /// Route to the extraction tool with the user's text verbatim.
    ExtractUser { content: String },

    /// No tool applies; fall through to plain generation.
    None,
}

impl RoutingDecision {
    /// Short name for tracing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Weather { .. } => "weather",
            Self::ExtractUser { .. } => "extract",
            Self::None => "none",
        }
    }
}
