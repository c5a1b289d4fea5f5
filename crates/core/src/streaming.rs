//! Stream Events
//!
//! What a provider stream is reduced to before the application sees it.
//! Providers translate their wire lines with a `StreamAdapter`; the AI
//! service only matches on `UnifiedStreamEvent`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One step of a streamed model reply
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UnifiedStreamEvent {
    /// Answer text
    TextDelta { content: String },

    /// Reasoning text the model exposes as "thought" parts
    ThinkingDelta { content: String },

    Usage {
        input_tokens: u32,
        output_tokens: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        thinking_tokens: Option<u32>,
    },

    /// The provider reported a failure inside the stream
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    Complete {
        #[serde(skip_serializing_if = "Option::is_none")]
        stop_reason: Option<String>,
    },
}

impl UnifiedStreamEvent {
    /// Answer text carried by the event; thoughts are excluded
    pub fn text(&self) -> Option<&str> {
        match self {
            UnifiedStreamEvent::TextDelta { content } => Some(content),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UnifiedStreamEvent::Complete { .. } | UnifiedStreamEvent::Error { .. }
        )
    }
}

/// A stream line the adapter could not translate
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum AdapterError {
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Translates one provider's stream lines into `UnifiedStreamEvent`s
pub trait StreamAdapter: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// A line may yield no events (keep-alives, blank lines) or several
    /// (thought and answer parts in one chunk).
    fn adapt(&mut self, input: &str) -> Result<Vec<UnifiedStreamEvent>, AdapterError>;

    /// Forget per-stream state before reuse
    fn reset(&mut self) {}
}
