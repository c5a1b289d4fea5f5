//! Instruction Builders
//!
//! Natural-language instructions sent to the model for each AI feature,
//! plus the option enums those features take.

use serde::{Deserialize, Serialize};

use crate::models::block::BlockType;
use crate::services::block_stream::{MARKER_CLOSE, MARKER_OPEN, NAME_LABEL};

/// Separator the model writes between paraphrase variations
pub const VARIATION_SEPARATOR: &str = "---VARIATION_SEPARATOR---";

pub const MIN_VARIATIONS: u32 = 1;
pub const MAX_VARIATIONS: u32 = 10;
pub const DEFAULT_VARIATIONS: u32 = 3;

/// Rewrite one block's text as a sharper prompt block
pub fn improve_prompt(text: &str) -> String {
    format!(
        "You are an expert prompt engineer. Your task is to refine and improve the following text \
         to make it a more effective and clear prompt block. Focus on clarity, specificity, and \
         structure. Do not add any preamble, explanation, or markdown formatting. Only provide the \
         improved text.\n\nHere is the text to improve:\n---\n{}\n---\n",
        text
    )
}

fn block_type_list() -> String {
    BlockType::ALL
        .iter()
        .map(|t| format!("\"{}\"", t.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One-shot generation answered as a JSON object
pub fn generation_prompt(requirements: &str) -> String {
    format!(
        "You are an expert prompt engineer. Build a structured prompt that satisfies the user's \
         requirements below. Split it into blocks; each block has a \"type\" (one of {types}) and \
         a \"content\" string. Order the blocks the way they should be read.\n\n\
         Respond with a single JSON object and nothing else, in this exact shape:\n\
         {{\"name\": \"short descriptive prompt name\", \"blocks\": [{{\"type\": \"Role\", \"content\": \"...\"}}]}}\n\n\
         User requirements:\n---\n{requirements}\n---\n",
        types = block_type_list(),
        requirements = requirements
    )
}

fn marker(label: &str) -> String {
    format!("{}{}{}", MARKER_OPEN, label, MARKER_CLOSE)
}

/// Streamed generation answered in the section-delimiter convention
pub fn creation_stream_prompt(requirements: &str) -> String {
    format!(
        "You are an expert prompt engineer. Build a structured prompt that satisfies the user's \
         requirements below.\n\n\
         Write your answer as sections. Each section starts with a marker on its own line and \
         runs until the next marker. Start with {name} followed by a short descriptive prompt \
         name. Then write one section per block, using the block type as the marker label, for \
         example {role}. Allowed block types: {types}. Do not use markdown code fences and do not \
         write anything outside the sections.\n\n\
         User requirements:\n---\n{requirements}\n---\n",
        name = marker(NAME_LABEL),
        role = marker(BlockType::Role.label()),
        types = block_type_list(),
        requirements = requirements
    )
}

/// Paraphrase tone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParaphraseMode {
    #[default]
    Funny,
    Formal,
    Casual,
    Professional,
    Creative,
    Concise,
    Simplify,
    Expand,
    Custom,
}

impl ParaphraseMode {
    pub const ALL: [ParaphraseMode; 9] = [
        ParaphraseMode::Funny,
        ParaphraseMode::Formal,
        ParaphraseMode::Casual,
        ParaphraseMode::Professional,
        ParaphraseMode::Creative,
        ParaphraseMode::Concise,
        ParaphraseMode::Simplify,
        ParaphraseMode::Expand,
        ParaphraseMode::Custom,
    ];

    /// Tone instruction; `Custom` takes the user's own instruction instead
    pub fn instruction(&self) -> &'static str {
        match self {
            ParaphraseMode::Funny => "Make it humorous and witty while keeping the meaning.",
            ParaphraseMode::Formal => "Use a formal, polished register.",
            ParaphraseMode::Casual => "Use a relaxed, conversational tone.",
            ParaphraseMode::Professional => "Make it clear, confident and business-appropriate.",
            ParaphraseMode::Creative => "Use vivid, original wording and imagery.",
            ParaphraseMode::Concise => "Make it as short as possible without losing meaning.",
            ParaphraseMode::Simplify => "Use plain words and short sentences anyone can follow.",
            ParaphraseMode::Expand => "Elaborate with more detail and explanation.",
            ParaphraseMode::Custom => "",
        }
    }
}

/// Paraphrase `text` into `variations` versions separated by the variation separator
pub fn paraphrase_prompt(mode: ParaphraseMode, custom_instruction: &str, text: &str, variations: u32) -> String {
    let instruction = match mode {
        ParaphraseMode::Custom => custom_instruction.trim(),
        other => other.instruction(),
    };
    format!(
        "You are an expert writer. Paraphrase the text below. {instruction}\n\n\
         Write exactly {variations} distinct variation(s). Separate consecutive variations with a \
         line containing only {separator}. Output only the variations, with no numbering, \
         preamble or commentary.\n\n\
         Text:\n---\n{text}\n---\n",
        instruction = instruction,
        variations = variations,
        separator = VARIATION_SEPARATOR,
        text = text
    )
}

/// Target of the JSON prompt builder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JsonBuilderKind {
    #[default]
    Video,
    Image,
    #[serde(rename = "UI")]
    Ui,
    Custom,
}

impl JsonBuilderKind {
    fn guidance(&self) -> &'static str {
        match self {
            JsonBuilderKind::Video => {
                "a structured prompt for a text-to-video model: scene, subjects, actions, camera \
                 movement, shot type, lighting, style, mood, duration and audio"
            }
            JsonBuilderKind::Image => {
                "a structured prompt for a text-to-image model: subject, composition, style, \
                 color palette, lighting, medium, aspect ratio and negative prompt"
            }
            JsonBuilderKind::Ui => {
                "a UI specification: screen, layout, components with their properties and states, \
                 interactions and styling"
            }
            JsonBuilderKind::Custom => {
                "a well-structured JSON document that models the description with clear, \
                 descriptive keys"
            }
        }
    }
}

pub fn json_builder_prompt(kind: JsonBuilderKind, description: &str) -> String {
    format!(
        "You are an expert at writing structured JSON prompts. Turn the description below into \
         {guidance}. Respond with valid JSON only, with no markdown fences or commentary.\n\n\
         Description:\n---\n{description}\n---\n",
        guidance = kind.guidance(),
        description = description
    )
}

/// Kind of configuration extracted from source code
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonConfigKind {
    #[default]
    Design,
    Architecture,
}

impl JsonConfigKind {
    fn guidance(&self) -> &'static str {
        match self {
            JsonConfigKind::Design => {
                "a design schema: color tokens, typography, spacing, radii, shadows, breakpoints \
                 and the reusable components with their variants"
            }
            JsonConfigKind::Architecture => {
                "an architecture description: modules, their responsibilities, dependencies \
                 between them, data flow, external services and entry points"
            }
        }
    }
}

pub fn json_config_prompt(kind: JsonConfigKind, source: &str) -> String {
    format!(
        "You are a senior software architect. Analyze the source code below and extract \
         {guidance}. Respond with valid JSON only, with no markdown fences or commentary.\n\n\
         Source code:\n---\n{source}\n---\n",
        guidance = kind.guidance(),
        source = source
    )
}

/// Variations for live display while the stream is running
pub fn split_variations(raw: &str) -> Vec<String> {
    raw.split(VARIATION_SEPARATOR)
        .map(|v| v.trim_start().to_string())
        .collect()
}

/// Final variations: trimmed, empty ones dropped
pub fn final_variations(raw: &str) -> Vec<String> {
    raw.split(VARIATION_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improve_prompt_wraps_text() {
        let prompt = improve_prompt("be nice");
        assert!(prompt.starts_with("You are an expert prompt engineer."));
        assert!(prompt.ends_with("---\nbe nice\n---\n"));
    }

    #[test]
    fn test_creation_prompt_names_markers() {
        let prompt = creation_stream_prompt("a haiku bot");
        assert!(prompt.contains("<<<NAME>>>"));
        assert!(prompt.contains("<<<Role>>>"));
        assert!(prompt.contains("\"Example\""));
    }

    #[test]
    fn test_paraphrase_prompt_custom_instruction() {
        let prompt = paraphrase_prompt(ParaphraseMode::Custom, "  like a pirate ", "hello", 2);
        assert!(prompt.contains("like a pirate"));
        assert!(prompt.contains("exactly 2"));
        assert!(prompt.contains(VARIATION_SEPARATOR));
    }

    #[test]
    fn test_variation_splitting() {
        let raw = "One\n---VARIATION_SEPARATOR---\n  Two\n---VARIATION_SEPARATOR---\n";
        assert_eq!(split_variations(raw), vec!["One\n", "Two\n", ""]);
        assert_eq!(final_variations(raw), vec!["One", "Two"]);
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(serde_json::to_value(JsonBuilderKind::Ui).unwrap(), "UI");
        assert_eq!(serde_json::to_value(JsonConfigKind::Architecture).unwrap(), "architecture");
        assert_eq!(ParaphraseMode::default(), ParaphraseMode::Funny);
    }
}
