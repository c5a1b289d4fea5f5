//! AI Generation Session
//!
//! Transient state of a streamed prompt generation. It is shown while the
//! stream runs and only reaches the store when the user confirms it.

use serde::{Deserialize, Serialize};

use crate::models::block::Block;
use crate::models::prompt::Prompt;
use crate::services::block_stream::Section;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiGenerationState {
    pub requirements: String,
    pub is_generating: bool,
    pub is_finished: bool,
    pub generated_name: String,
    pub generated_blocks: Vec<Block>,
    /// Section still being written, for live preview
    pub pending: Option<Section>,
    pub raw_content: String,
    pub thoughts: String,
    pub error: Option<String>,
}

impl AiGenerationState {
    /// Fresh state for a generation that is starting
    pub fn start(requirements: &str) -> Self {
        Self {
            requirements: requirements.to_string(),
            is_generating: true,
            ..Default::default()
        }
    }

    pub fn apply_sections(&mut self, sections: Vec<Section>) {
        for section in sections {
            match section {
                Section::Name { name } => self.generated_name = name,
                block @ Section::Block { .. } => self.generated_blocks.extend(block.into_block()),
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.is_generating && !self.is_finished && self.generated_blocks.is_empty()
    }

    /// The generated prompt, once the stream has finished with blocks
    pub fn to_prompt(&self) -> Option<Prompt> {
        if !self.is_finished || self.generated_blocks.is_empty() {
            return None;
        }
        let mut prompt = Prompt::new(&self.generated_name);
        prompt.blocks = self.generated_blocks.clone();
        Some(prompt)
    }
}
