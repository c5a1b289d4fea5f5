//! Import / Export Commands

use std::path::PathBuf;

use chrono::Utc;

use crate::models::response::CommandResponse;
use crate::services::import_export::{self, ExportedFile, ImportReport};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

/// Import prompts from the text of a JSON file
pub async fn import_prompts(text: String, state: &AppState) -> CommandResponse<ImportReport> {
    state
        .mutate_store(|s| import_export::import_text(s, &text))
        .await
        .into()
}

fn target_dir(dir: Option<String>, state: &AppState) -> PathBuf {
    dir.map(PathBuf::from)
        .unwrap_or_else(|| state.export_dir().to_path_buf())
}

/// Export one prompt, the current one unless an id is given
pub async fn export_prompt(prompt_id: Option<String>, dir: Option<String>, state: &AppState) -> CommandResponse<ExportedFile> {
    let prompt = state
        .read_store(|s| match prompt_id.as_deref() {
            Some(id) => s.get(id).cloned(),
            None => s.current_prompt().cloned(),
        })
        .await;

    let result: AppResult<ExportedFile> = match prompt {
        Some(prompt) => import_export::export_prompt(&prompt, &target_dir(dir, state)),
        None => Err(AppError::not_found("There is no prompt to export.")),
    };
    result.into()
}

/// Export the whole collection into one file
pub async fn export_all_prompts(dir: Option<String>, state: &AppState) -> CommandResponse<ExportedFile> {
    let prompts = state.read_store(|s| s.prompts().to_vec()).await;
    import_export::export_collection(&prompts, &target_dir(dir, state), Utc::now()).into()
}
