//! Block Models
//!
//! A block is one typed fragment of a prompt. The block type decides the
//! header line it gets in the assembled text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::utils::id::new_id;

/// The closed set of block categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    Role,
    Instruction,
    Context,
    Constraint,
    Variable,
    Example,
}

impl BlockType {
    /// All block types, in library order
    pub const ALL: [BlockType; 6] = [
        BlockType::Role,
        BlockType::Instruction,
        BlockType::Context,
        BlockType::Constraint,
        BlockType::Variable,
        BlockType::Example,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BlockType::Role => "Role",
            BlockType::Instruction => "Instruction",
            BlockType::Context => "Context",
            BlockType::Constraint => "Constraint",
            BlockType::Variable => "Variable",
            BlockType::Example => "Example",
        }
    }

    /// Header line used in the assembled prompt, e.g. `// INSTRUCTION`
    pub fn header(&self) -> String {
        format!("// {}", self.label().to_uppercase())
    }

    /// Short description shown in the block library
    pub fn description(&self) -> &'static str {
        match self {
            BlockType::Role => "Define the persona or expertise the AI should adopt.",
            BlockType::Instruction => "State the task the AI should perform.",
            BlockType::Context => "Provide background information the AI needs.",
            BlockType::Constraint => "Set rules, limits and requirements for the output.",
            BlockType::Variable => "Declare placeholders to fill in before use.",
            BlockType::Example => "Show sample inputs and expected outputs.",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when a label is not a known block type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBlockType(pub String);

impl fmt::Display for UnknownBlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown block type: {}", self.0)
    }
}

impl std::error::Error for UnknownBlockType {}

impl FromStr for BlockType {
    type Err = UnknownBlockType;

    /// Case-insensitive match on the block label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        BlockType::ALL
            .iter()
            .find(|t| t.label().eq_ignore_ascii_case(needle))
            .copied()
            .ok_or_else(|| UnknownBlockType(s.to_string()))
    }
}

/// A typed unit of prompt text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: BlockType,
    #[serde(default)]
    pub content: String,
    /// Display-only flag; not part of the prompt text
    #[serde(default)]
    pub is_collapsed: bool,
}

impl Block {
    /// New empty, expanded block with a fresh id
    pub fn new(block_type: BlockType) -> Self {
        Self::with_content(block_type, String::new())
    }

    pub fn with_content(block_type: BlockType, content: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            block_type,
            content: content.into(),
            is_collapsed: false,
        }
    }

    /// Copy of this block under a fresh id
    pub fn duplicate(&self) -> Self {
        Self {
            id: new_id(),
            ..self.clone()
        }
    }

    /// Rendered segment: header line followed by the content
    pub fn render(&self) -> String {
        format!("{}\n{}", self.block_type.header(), self.content)
    }
}
