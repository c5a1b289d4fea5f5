//! Document Persistence
//!
//! Reads and writes the prompt document and the two settings partitions
//! through a `KeyValueStore`. Each partition lives under its own key so the
//! prompts and the settings can be cleared independently.
//!
//! Loading never fails on bad data: an absent or corrupt document yields the
//! empty default, individual prompts that do not decode are dropped, and the
//! legacy single-prompt shape is upgraded and written back on first load.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::kv::KeyValueStore;
use crate::models::document::{PromptDocument, View};
use crate::models::prompt::Prompt;
use crate::models::settings::{AiSettings, AppearanceSettings, Settings, Theme};
use crate::utils::error::AppResult;
use crate::utils::id::new_id;

/// Key of the prompt document
pub const STATE_KEY: &str = "promptBuilderState";
/// Key of the AI provider settings
pub const SETTINGS_KEY: &str = "promptBuilderSettings";
/// Key of the appearance settings
pub const UI_STATE_KEY: &str = "promptBuilderUIState";

/// Load the prompt document, migrating and repairing as needed
pub fn load_document(kv: &dyn KeyValueStore) -> AppResult<PromptDocument> {
    let Some(raw) = kv.get(STATE_KEY)? else {
        tracing::debug!("[Persistence] no stored document, starting empty");
        return Ok(PromptDocument::default());
    };

    let value: Value = match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("[Persistence] stored document is not valid JSON, starting empty: {}", e);
            return Ok(PromptDocument::default());
        }
    };

    let Value::Object(mut object) = value else {
        tracing::warn!("[Persistence] stored document is not an object, starting empty");
        return Ok(PromptDocument::default());
    };

    if is_legacy_shape(&object) {
        let legacy_theme = object.get("theme").cloned();
        let mut doc = migrate_legacy(&mut object);
        doc.repair();
        save_document(kv, &doc)?;
        carry_legacy_theme(kv, legacy_theme)?;
        tracing::info!(
            "[Persistence] migrated single-prompt document ({} prompt)",
            doc.prompts.len()
        );
        return Ok(doc);
    }

    let mut doc = decode_document(object);
    if doc.repair() {
        tracing::info!("[Persistence] repaired stored document");
    }
    Ok(doc)
}

/// Serialize and store the prompt document
pub fn save_document(kv: &dyn KeyValueStore, doc: &PromptDocument) -> AppResult<()> {
    let raw = serde_json::to_string(doc)?;
    kv.set(STATE_KEY, &raw)?;
    tracing::debug!(
        "[Persistence] saved {} prompts ({} bytes)",
        doc.prompts.len(),
        raw.len()
    );
    Ok(())
}

/// The older shape: a single `currentPrompt` and no `prompts` list
fn is_legacy_shape(object: &Map<String, Value>) -> bool {
    object.get("currentPrompt").is_some_and(Value::is_object) && !object.contains_key("prompts")
}

fn migrate_legacy(object: &mut Map<String, Value>) -> PromptDocument {
    let Some(Value::Object(mut legacy)) = object.remove("currentPrompt") else {
        return PromptDocument::default();
    };

    if !legacy.get("id").is_some_and(Value::is_string) {
        legacy.insert("id".to_string(), json!(new_id()));
    }
    if !legacy.get("createdAt").is_some_and(Value::is_string) {
        legacy.insert("createdAt".to_string(), json!(Utc::now()));
    }
    if let Some(created_at) = legacy.get("createdAt").cloned() {
        legacy.insert("updatedAt".to_string(), created_at);
    }

    match serde_json::from_value::<Prompt>(Value::Object(legacy)) {
        Ok(prompt) => PromptDocument {
            current_view: View::Editor,
            current_prompt_id: Some(prompt.id.clone()),
            prompts: vec![prompt],
        },
        Err(e) => {
            tracing::warn!("[Persistence] legacy prompt could not be decoded: {}", e);
            PromptDocument::default()
        }
    }
}

fn carry_legacy_theme(kv: &dyn KeyValueStore, theme: Option<Value>) -> AppResult<()> {
    let Some(theme) = theme.and_then(|t| serde_json::from_value::<Theme>(t).ok()) else {
        return Ok(());
    };
    let mut appearance = load_appearance(kv)?;
    appearance.theme = theme;
    save_appearance(kv, &appearance)
}

/// Field-by-field decode so one bad prompt does not lose the rest
fn decode_document(mut object: Map<String, Value>) -> PromptDocument {
    let current_view = object
        .remove("currentView")
        .and_then(|v| serde_json::from_value::<View>(v).ok())
        .unwrap_or_default();

    let current_prompt_id = object
        .remove("currentPromptId")
        .and_then(|v| v.as_str().map(str::to_string));

    let prompts = match object.remove("prompts") {
        Some(Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value::<Prompt>(item) {
                Ok(prompt) => Some(prompt),
                Err(e) => {
                    tracing::warn!("[Persistence] dropping stored prompt #{}: {}", index, e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };

    PromptDocument {
        current_view,
        prompts,
        current_prompt_id,
    }
}

fn load_partition<T: DeserializeOwned + Default>(kv: &dyn KeyValueStore, key: &str) -> AppResult<T> {
    let Some(raw) = kv.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!("[Persistence] {} is corrupt, using defaults: {}", key, e);
            Ok(T::default())
        }
    }
}

fn save_partition<T: Serialize>(kv: &dyn KeyValueStore, key: &str, value: &T) -> AppResult<()> {
    kv.set(key, &serde_json::to_string(value)?)
}

pub fn load_ai_settings(kv: &dyn KeyValueStore) -> AppResult<AiSettings> {
    load_partition(kv, SETTINGS_KEY)
}

pub fn save_ai_settings(kv: &dyn KeyValueStore, settings: &AiSettings) -> AppResult<()> {
    save_partition(kv, SETTINGS_KEY, settings)
}

pub fn load_appearance(kv: &dyn KeyValueStore) -> AppResult<AppearanceSettings> {
    load_partition(kv, UI_STATE_KEY)
}

pub fn save_appearance(kv: &dyn KeyValueStore, appearance: &AppearanceSettings) -> AppResult<()> {
    save_partition(kv, UI_STATE_KEY, appearance)
}

/// Both settings partitions
pub fn load_settings(kv: &dyn KeyValueStore) -> AppResult<Settings> {
    Ok(Settings {
        ai: load_ai_settings(kv)?,
        appearance: load_appearance(kv)?,
    })
}

/// Remove the stored prompt document
pub fn clear_prompts(kv: &dyn KeyValueStore) -> AppResult<()> {
    kv.remove(STATE_KEY)?;
    tracing::info!("[Persistence] cleared stored prompts");
    Ok(())
}

/// Remove both settings partitions
pub fn clear_settings(kv: &dyn KeyValueStore) -> AppResult<()> {
    kv.remove(SETTINGS_KEY)?;
    kv.remove(UI_STATE_KEY)?;
    tracing::info!("[Persistence] cleared stored settings");
    Ok(())
}

/// Prompt count and stored size shown on the settings page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub prompt_count: usize,
    pub storage_bytes: usize,
    pub storage_display: String,
}

/// Bytes of the stored document
pub fn storage_size(kv: &dyn KeyValueStore) -> AppResult<usize> {
    Ok(kv.get(STATE_KEY)?.map(|raw| raw.len()).unwrap_or(0))
}

pub fn storage_stats(kv: &dyn KeyValueStore, prompt_count: usize) -> AppResult<StorageStats> {
    let storage_bytes = storage_size(kv)?;
    Ok(StorageStats {
        prompt_count,
        storage_bytes,
        storage_display: format_bytes(storage_bytes),
    })
}

/// Human-readable byte size (`0 Bytes`, `1.5 KB`, `2 MB`)
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}
