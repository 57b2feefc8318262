//! Chunk decoder — raw stream fragments to typed events.
//!
//! Some backends deliver thinking and content as a separate `reasoning`
//! field on the delta; others (local `/v1` gateways in particular) wrap
//! both inside a JSON envelope `{"message":{"thinking":..,"content":..}}`
//! carried as the content string itself. The decoder probes for the
//! envelope and falls back to treating the payload as plain content, so
//! any text the probe cannot classify still reaches the user verbatim.

use flowchat_core::client::Fragment;
use flowchat_core::event::StreamEvent;
use serde::Deserialize;

/// The nested envelope some backends use for a single delta.
#[derive(Debug, Deserialize)]
struct Envelope {
    message: EnvelopeMessage,
}

#[derive(Debug, Deserialize)]
struct EnvelopeMessage {
    #[serde(default)]
    thinking: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Decode one fragment into zero or more events.
///
/// Pure and total: never errors, never drops text it cannot classify.
/// Within one fragment, reasoning always precedes content.
pub fn decode_fragment(fragment: &Fragment) -> Vec<StreamEvent> {
    let mut events = Vec::new();

    if let Some(reasoning) = &fragment.reasoning
        && !reasoning.is_empty()
    {
        events.push(StreamEvent::thinking(reasoning));
    }

    let payload = fragment.content.flatten();
    if payload.is_empty() {
        return events;
    }

    match serde_json::from_str::<Envelope>(&payload) {
        Ok(envelope) => {
            if let Some(thinking) = envelope.message.thinking
                && !thinking.is_empty()
            {
                events.push(StreamEvent::thinking(thinking));
            }
            if let Some(content) = envelope.message.content
                && !content.is_empty()
            {
                events.push(StreamEvent::content(content));
            }
        }
        Err(_) => events.push(StreamEvent::content(payload)),
    }

    events
}
