//! Prompt Models
//!
//! A prompt is a named, timestamped, ordered list of blocks. Prompts built
//! with the JSON builder carry a raw payload in `content` instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::block::{Block, BlockType};
use crate::utils::id::new_id;
use crate::utils::tokens::TextStats;

/// Name used when a prompt is created or renamed with a blank name
pub const DEFAULT_PROMPT_NAME: &str = "Untitled Prompt";

/// Separator between rendered blocks in the assembled text
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Normalize a user-supplied prompt name
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_PROMPT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Document kind of a prompt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptFormat {
    #[default]
    Blocks,
    Json,
}

/// A named, timestamped document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PromptFormat>,
    /// Raw payload of a `json` prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Prompt {
    /// New empty block prompt; blank names fall back to the default
    pub fn new(name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: normalize_name(name),
            created_at: now,
            updated_at: now,
            blocks: Vec::new(),
            format: None,
            content: None,
        }
    }

    /// New `json` prompt holding `content` as its payload
    pub fn new_json(name: &str, content: impl Into<String>) -> Self {
        Self {
            format: Some(PromptFormat::Json),
            content: Some(content.into()),
            ..Self::new(name)
        }
    }

    /// New prompt with the given `(type, content)` blocks
    pub fn with_blocks<I, S>(name: &str, blocks: I) -> Self
    where
        I: IntoIterator<Item = (BlockType, S)>,
        S: Into<String>,
    {
        let mut prompt = Self::new(name);
        prompt.blocks = blocks
            .into_iter()
            .map(|(block_type, content)| Block::with_content(block_type, content))
            .collect();
        prompt
    }

    pub fn format(&self) -> PromptFormat {
        self.format.unwrap_or_default()
    }

    pub fn is_json(&self) -> bool {
        self.format() == PromptFormat::Json
    }

    /// Bump `updated_at`, never below `created_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now().max(self.created_at);
    }

    pub fn block_index(&self, block_id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block_id)
    }

    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }

    /// The assembled plain-text prompt.
    ///
    /// Each block renders as `// TYPE\ncontent`, blocks joined by a blank
    /// line. A `json` prompt returns its payload unchanged.
    pub fn assemble(&self) -> String {
        if self.is_json() {
            return self.content.clone().unwrap_or_default();
        }
        self.blocks
            .iter()
            .map(Block::render)
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }

    /// Character and token counts over the block contents
    pub fn stats(&self) -> TextStats {
        if self.is_json() {
            return TextStats::of(self.content.as_deref().unwrap_or_default());
        }
        let text = self
            .blocks
            .iter()
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR);
        TextStats::of(&text)
    }

    /// Whether two blocks share an id
    pub fn has_duplicate_block_ids(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.blocks.iter().any(|b| !seen.insert(b.id.as_str()))
    }

    /// Copy of this prompt with fresh prompt and block ids and timestamps
    pub fn fresh_copy(&self) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            created_at: now,
            updated_at: now,
            blocks: self.blocks.iter().map(Block::duplicate).collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  My Prompt  "), "My Prompt");
        assert_eq!(normalize_name("   "), DEFAULT_PROMPT_NAME);
        assert_eq!(normalize_name(""), DEFAULT_PROMPT_NAME);
    }

    #[test]
    fn test_new_prompt_is_empty() {
        let prompt = Prompt::new("Demo");
        assert_eq!(prompt.name, "Demo");
        assert!(prompt.blocks.is_empty());
        assert_eq!(prompt.created_at, prompt.updated_at);
        assert_eq!(prompt.format(), PromptFormat::Blocks);
    }

    #[test]
    fn test_assemble_joins_blocks() {
        let prompt = Prompt::with_blocks(
            "Demo",
            [
                (BlockType::Role, "You are a poet."),
                (BlockType::Instruction, "Write a haiku."),
            ],
        );
        assert_eq!(
            prompt.assemble(),
            "// ROLE\nYou are a poet.\n\n// INSTRUCTION\nWrite a haiku."
        );
    }

    #[test]
    fn test_assemble_empty_prompt() {
        assert_eq!(Prompt::new("Empty").assemble(), "");
    }

    #[test]
    fn test_assemble_json_prompt_returns_payload() {
        let prompt = Prompt::new_json("Scene", "{\"scene\": \"beach\"}");
        assert!(prompt.is_json());
        assert_eq!(prompt.assemble(), "{\"scene\": \"beach\"}");
    }

    #[test]
    fn test_touch_never_goes_below_created() {
        let mut prompt = Prompt::new("Future");
        prompt.created_at = Utc::now() + chrono::Duration::days(1);
        prompt.touch();
        assert!(prompt.updated_at >= prompt.created_at);
    }

    #[test]
    fn test_stats() {
        let prompt = Prompt::with_blocks("Demo", [(BlockType::Instruction, "Say hi")]);
        let stats = prompt.stats();
        assert_eq!(stats.char_count, 6);
        assert_eq!(stats.token_count, 2);
    }

    #[test]
    fn test_wire_format_omits_absent_format() {
        let prompt = Prompt::new("Demo");
        let json = serde_json::to_value(&prompt).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("format").is_none());
        assert!(json.get("content").is_none());

        let json_prompt = serde_json::to_value(Prompt::new_json("J", "{}")).unwrap();
        assert_eq!(json_prompt["format"], "json");
    }

    #[test]
    fn test_fresh_copy() {
        let prompt = Prompt::with_blocks("Demo", [(BlockType::Role, "r"), (BlockType::Context, "c")]);
        let copy = prompt.fresh_copy();
        assert_ne!(copy.id, prompt.id);
        assert_eq!(copy.name, prompt.name);
        assert_eq!(copy.blocks.len(), 2);
        for (a, b) in copy.blocks.iter().zip(prompt.blocks.iter()) {
            assert_ne!(a.id, b.id);
            assert_eq!(a.content, b.content);
        }
    }
}
