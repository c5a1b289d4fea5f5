//! Prompt Commands
//!
//! Command handlers for the prompt collection, the current selection and
//! the gallery.

use crate::models::document::{PromptDocument, View};
use crate::models::prompt::{Prompt, DEFAULT_PROMPT_NAME};
use crate::models::response::CommandResponse;
use crate::services::gallery;
use crate::state::AppState;
use crate::utils::tokens::TextStats;

/// Full document: view, prompts and current selection
pub async fn get_state(state: &AppState) -> CommandResponse<PromptDocument> {
    CommandResponse::ok(state.read_store(|s| s.document().clone()).await)
}

pub async fn set_view(view: View, state: &AppState) -> CommandResponse<View> {
    state.mutate_store(|s| s.set_view(view)).await;
    CommandResponse::ok(view)
}

/// Create an empty prompt and make it current
pub async fn create_prompt(name: Option<String>, state: &AppState) -> CommandResponse<Prompt> {
    let name = name.unwrap_or_else(|| DEFAULT_PROMPT_NAME.to_string());
    CommandResponse::ok(state.mutate_store(|s| s.create_prompt(&name)).await)
}

/// Make a prompt current; false when the id is unknown
pub async fn load_prompt(prompt_id: String, state: &AppState) -> CommandResponse<bool> {
    CommandResponse::ok(state.mutate_store(|s| s.load_prompt(&prompt_id)).await)
}

pub async fn delete_prompt(prompt_id: String, state: &AppState) -> CommandResponse<bool> {
    let removed = state.mutate_store(|s| s.delete_prompt(&prompt_id)).await;
    CommandResponse::ok(removed.is_some())
}

/// Rename the current prompt; returns the stored name
pub async fn rename_prompt(name: String, state: &AppState) -> CommandResponse<Option<String>> {
    CommandResponse::ok(state.mutate_store(|s| s.rename_prompt(&name)).await)
}

/// Prompts, most recently updated first
pub async fn list_prompts(state: &AppState) -> CommandResponse<Vec<Prompt>> {
    let prompts = state
        .read_store(|s| s.prompts_by_recency().into_iter().cloned().collect())
        .await;
    CommandResponse::ok(prompts)
}

pub async fn get_assembled_prompt(state: &AppState) -> CommandResponse<Option<String>> {
    CommandResponse::ok(state.read_store(|s| s.assembled_prompt()).await)
}

pub async fn get_prompt_stats(state: &AppState) -> CommandResponse<Option<TextStats>> {
    CommandResponse::ok(state.read_store(|s| s.current_stats()).await)
}

/// Store JSON builder output as a `json` prompt
pub async fn save_json_prompt(name: String, content: String, state: &AppState) -> CommandResponse<Prompt> {
    if content.trim().is_empty() {
        return CommandResponse::err("There is no JSON to save.");
    }
    CommandResponse::ok(state.mutate_store(|s| s.save_json_prompt(&name, &content)).await)
}

pub async fn get_gallery() -> CommandResponse<Vec<Prompt>> {
    CommandResponse::ok(gallery::gallery_prompts())
}

/// Copy a gallery example into the collection
pub async fn use_gallery_prompt(gallery_id: String, state: &AppState) -> CommandResponse<Prompt> {
    let Some(example) = gallery::gallery_prompt(&gallery_id) else {
        return CommandResponse::err(format!("Gallery prompt not found: {}", gallery_id));
    };
    CommandResponse::ok(state.mutate_store(|s| s.use_gallery_prompt(&example)).await)
}
