//! Settings Commands
//!
//! Commands for reading and updating the AI and appearance settings, the
//! model catalogue, and the destructive "clear" actions.

use crate::models::response::CommandResponse;
use crate::models::settings::{available_models, ModelInfo, SamplingProfile, Settings, SettingsUpdate, Theme};
use crate::state::AppState;
use crate::storage::persistence::StorageStats;

/// Get current settings
pub async fn get_settings(state: &AppState) -> CommandResponse<Settings> {
    CommandResponse::ok(state.settings().await)
}

/// Update settings with a partial update
pub async fn update_settings(update: SettingsUpdate, state: &AppState) -> CommandResponse<Settings> {
    state.update_settings(&update).await.into()
}

pub async fn toggle_theme(state: &AppState) -> CommandResponse<Theme> {
    state.toggle_theme().await.into()
}

/// Behaviour scores for a temperature / top-p pair; the stored values fill
/// in whatever is not given
pub async fn get_sampling_profile(temperature: Option<f32>, top_p: Option<f32>, state: &AppState) -> CommandResponse<SamplingProfile> {
    let ai = state.settings().await.ai;
    CommandResponse::ok(SamplingProfile::from_params(
        temperature.unwrap_or(ai.temperature),
        top_p.unwrap_or(ai.top_p),
    ))
}

/// Models offered by the provider, or the built-in catalogue when no API
/// key is set or the provider cannot list them
pub async fn list_models(state: &AppState) -> CommandResponse<Vec<ModelInfo>> {
    let catalogue = available_models();
    let Ok(ai) = state.ai_service().await else {
        return CommandResponse::ok(catalogue);
    };

    match ai.list_models().await {
        Ok(ids) => {
            let models = ids
                .into_iter()
                .map(|id| {
                    catalogue
                        .iter()
                        .find(|m| m.id == id)
                        .cloned()
                        .unwrap_or_else(|| ModelInfo {
                            name: id.clone(),
                            id,
                            description: String::new(),
                        })
                })
                .collect();
            CommandResponse::ok(models)
        }
        Err(e) => {
            tracing::warn!("[AI] listing models failed, using catalogue: {}", e);
            CommandResponse::ok(catalogue)
        }
    }
}

/// Delete every prompt; returns how many were removed
pub async fn clear_prompts(state: &AppState) -> CommandResponse<usize> {
    state.clear_prompts().await.into()
}

/// Reset both settings partitions
pub async fn clear_settings(state: &AppState) -> CommandResponse<Settings> {
    state.clear_settings().await.into()
}

pub async fn get_storage_stats(state: &AppState) -> CommandResponse<StorageStats> {
    state.storage_stats().await.into()
}
