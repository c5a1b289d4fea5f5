//! Token estimation and text statistics

use serde::{Deserialize, Serialize};

/// Average characters per token used by the estimate
const CHARS_PER_TOKEN: usize = 4;

/// Estimate the token count of `text` from its character length.
///
/// This is a heuristic (~4 characters per token), not a tokenizer.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Character and token counts shown for the open prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStats {
    pub char_count: usize,
    pub token_count: usize,
}

impl TextStats {
    pub fn of(text: &str) -> Self {
        Self {
            char_count: text.chars().count(),
            token_count: estimate_tokens(text),
        }
    }
}
