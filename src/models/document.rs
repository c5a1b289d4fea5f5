//! Document Models
//!
//! The persisted prompt collection and the UI selection around it.

use serde::{Deserialize, Serialize};

use super::prompt::Prompt;

/// Enumerated UI mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    #[default]
    Editor,
    Templates,
    Settings,
    Gallery,
    AiCreation,
    Paraphrase,
    JsonBuilder,
    JsonConfig,
}

/// The document stored under the prompt-state key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDocument {
    #[serde(default)]
    pub current_view: View,
    #[serde(default)]
    pub prompts: Vec<Prompt>,
    #[serde(default)]
    pub current_prompt_id: Option<String>,
}

impl PromptDocument {
    pub fn find(&self, prompt_id: &str) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == prompt_id)
    }

    pub fn contains(&self, prompt_id: &str) -> bool {
        self.find(prompt_id).is_some()
    }

    /// Drop duplicate prompt ids (first wins) and point a dangling
    /// `current_prompt_id` at the first prompt, or clear it.
    ///
    /// Returns true if anything changed.
    pub fn repair(&mut self) -> bool {
        let before = self.prompts.len();
        let mut seen = std::collections::HashSet::new();
        self.prompts.retain(|p| seen.insert(p.id.clone()));
        let mut changed = self.prompts.len() != before;

        let dangling = self
            .current_prompt_id
            .as_deref()
            .is_some_and(|id| !self.contains(id));
        if dangling {
            self.current_prompt_id = self.prompts.first().map(|p| p.id.clone());
            changed = true;
        }
        changed
    }
}
