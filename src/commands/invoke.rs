//! Invoke Dispatcher
//!
//! Routes a command name plus its JSON arguments to the handler and returns
//! the serialized `CommandResponse`. Arguments are an object keyed by the
//! handler's parameter names in camelCase (`{"blockId": "..."}`); a missing
//! or `null` argument object counts as `{}`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{ai, blocks, import_export, prompts, settings};
use crate::models::block::BlockType;
use crate::models::document::View;
use crate::models::response::CommandResponse;
use crate::models::settings::SettingsUpdate;
use crate::services::ai::{JsonBuilderKind, JsonConfigKind, ParaphraseRequest};
use crate::state::AppState;

/// Every command `dispatch` understands
pub const COMMANDS: &[&str] = &[
    "get_state",
    "set_view",
    "create_prompt",
    "load_prompt",
    "delete_prompt",
    "rename_prompt",
    "list_prompts",
    "get_assembled_prompt",
    "get_prompt_stats",
    "add_block",
    "delete_block",
    "duplicate_block",
    "update_block_content",
    "reorder_blocks",
    "toggle_block_collapse",
    "import_prompts",
    "export_prompt",
    "export_all_prompts",
    "get_gallery",
    "use_gallery_prompt",
    "get_settings",
    "update_settings",
    "toggle_theme",
    "get_sampling_profile",
    "list_models",
    "clear_prompts",
    "clear_settings",
    "get_storage_stats",
    "improve_block",
    "generate_prompt",
    "start_ai_generation",
    "get_ai_generation",
    "confirm_ai_generation",
    "reset_ai_generation",
    "cancel_ai_generation",
    "paraphrase",
    "build_json",
    "save_json_prompt",
    "generate_json_config",
    "flush",
];

/// Commands that wait on the network; hosts should not block other
/// requests behind them
pub fn is_long_running(command: &str) -> bool {
    matches!(
        command,
        "improve_block"
            | "generate_prompt"
            | "paraphrase"
            | "build_json"
            | "generate_json_config"
            | "list_models"
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViewArgs {
    view: View,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NameArgs {
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameArgs {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptIdArgs {
    prompt_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddBlockArgs {
    block_type: BlockType,
    index: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockIdArgs {
    block_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockContentArgs {
    block_id: String,
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderArgs {
    dragged_id: String,
    target_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextArgs {
    text: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportArgs {
    prompt_id: Option<String>,
    dir: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportAllArgs {
    dir: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GalleryArgs {
    gallery_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSettingsArgs {
    update: SettingsUpdate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SamplingArgs {
    temperature: Option<f32>,
    top_p: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequirementsArgs {
    requirements: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ParaphraseArgs {
    request: ParaphraseRequest,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildJsonArgs {
    #[serde(default)]
    kind: JsonBuilderKind,
    description: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaveJsonArgs {
    name: String,
    content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonConfigArgs {
    #[serde(default)]
    kind: JsonConfigKind,
    source: String,
}

fn respond<T: Serialize>(response: CommandResponse<T>) -> Value {
    serde_json::to_value(&response).unwrap_or_else(|e| {
        tracing::error!("[Invoke] failed to serialize response: {}", e);
        error_value(format!("Failed to serialize response: {}", e))
    })
}

fn error_value(message: String) -> Value {
    json!({ "success": false, "data": null, "error": message })
}

fn parse_args<T: DeserializeOwned>(command: &str, args: Value) -> Result<T, Value> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|e| {
        tracing::warn!("[Invoke] bad arguments for {}: {}", command, e);
        error_value(format!("Invalid arguments for {}: {}", command, e))
    })
}

macro_rules! with_args {
    ($command:expr, $args:expr, $ty:ty, |$a:ident| $body:expr) => {
        match parse_args::<$ty>($command, $args) {
            Ok($a) => respond($body),
            Err(response) => response,
        }
    };
}

/// Run `command` with `args` and return its serialized response
pub async fn dispatch(state: &AppState, command: &str, args: Value) -> Value {
    tracing::debug!("[Invoke] {}", command);
    match command {
        // Prompts
        "get_state" => respond(prompts::get_state(state).await),
        "set_view" => with_args!(command, args, ViewArgs, |a| prompts::set_view(a.view, state).await),
        "create_prompt" => with_args!(command, args, NameArgs, |a| {
            prompts::create_prompt(a.name, state).await
        }),
        "load_prompt" => with_args!(command, args, PromptIdArgs, |a| {
            prompts::load_prompt(a.prompt_id, state).await
        }),
        "delete_prompt" => with_args!(command, args, PromptIdArgs, |a| {
            prompts::delete_prompt(a.prompt_id, state).await
        }),
        "rename_prompt" => with_args!(command, args, RenameArgs, |a| {
            prompts::rename_prompt(a.name, state).await
        }),
        "list_prompts" => respond(prompts::list_prompts(state).await),
        "get_assembled_prompt" => respond(prompts::get_assembled_prompt(state).await),
        "get_prompt_stats" => respond(prompts::get_prompt_stats(state).await),
        "save_json_prompt" => with_args!(command, args, SaveJsonArgs, |a| {
            prompts::save_json_prompt(a.name, a.content, state).await
        }),

        // Blocks
        "add_block" => with_args!(command, args, AddBlockArgs, |a| {
            blocks::add_block(a.block_type, a.index, state).await
        }),
        "delete_block" => with_args!(command, args, BlockIdArgs, |a| {
            blocks::delete_block(a.block_id, state).await
        }),
        "duplicate_block" => with_args!(command, args, BlockIdArgs, |a| {
            blocks::duplicate_block(a.block_id, state).await
        }),
        "update_block_content" => with_args!(command, args, BlockContentArgs, |a| {
            blocks::update_block_content(a.block_id, a.content, state).await
        }),
        "reorder_blocks" => with_args!(command, args, ReorderArgs, |a| {
            blocks::reorder_blocks(a.dragged_id, a.target_id, state).await
        }),
        "toggle_block_collapse" => with_args!(command, args, BlockIdArgs, |a| {
            blocks::toggle_block_collapse(a.block_id, state).await
        }),

        // Import / export
        "import_prompts" => with_args!(command, args, TextArgs, |a| {
            import_export::import_prompts(a.text, state).await
        }),
        "export_prompt" => with_args!(command, args, ExportArgs, |a| {
            import_export::export_prompt(a.prompt_id, a.dir, state).await
        }),
        "export_all_prompts" => with_args!(command, args, ExportAllArgs, |a| {
            import_export::export_all_prompts(a.dir, state).await
        }),

        // Gallery
        "get_gallery" => respond(prompts::get_gallery().await),
        "use_gallery_prompt" => with_args!(command, args, GalleryArgs, |a| {
            prompts::use_gallery_prompt(a.gallery_id, state).await
        }),

        // Settings
        "get_settings" => respond(settings::get_settings(state).await),
        "update_settings" => with_args!(command, args, UpdateSettingsArgs, |a| {
            settings::update_settings(a.update, state).await
        }),
        "toggle_theme" => respond(settings::toggle_theme(state).await),
        "get_sampling_profile" => with_args!(command, args, SamplingArgs, |a| {
            settings::get_sampling_profile(a.temperature, a.top_p, state).await
        }),
        "list_models" => respond(settings::list_models(state).await),
        "clear_prompts" => respond(settings::clear_prompts(state).await),
        "clear_settings" => respond(settings::clear_settings(state).await),
        "get_storage_stats" => respond(settings::get_storage_stats(state).await),

        // AI
        "improve_block" => with_args!(command, args, BlockIdArgs, |a| {
            ai::improve_block(a.block_id, state).await
        }),
        "generate_prompt" => with_args!(command, args, RequirementsArgs, |a| {
            ai::generate_prompt(a.requirements, state).await
        }),
        "start_ai_generation" => with_args!(command, args, RequirementsArgs, |a| {
            ai::start_ai_generation(a.requirements, state).await
        }),
        "get_ai_generation" => respond(ai::get_ai_generation(state).await),
        "confirm_ai_generation" => respond(ai::confirm_ai_generation(state).await),
        "reset_ai_generation" => respond(ai::reset_ai_generation(state).await),
        "cancel_ai_generation" => respond(ai::cancel_ai_generation(state).await),
        "paraphrase" => with_args!(command, args, ParaphraseArgs, |a| {
            ai::paraphrase(a.request, state).await
        }),
        "build_json" => with_args!(command, args, BuildJsonArgs, |a| {
            ai::build_json(a.kind, a.description, state).await
        }),
        "generate_json_config" => with_args!(command, args, JsonConfigArgs, |a| {
            ai::generate_json_config(a.kind, a.source, state).await
        }),

        "flush" => {
            state.flush().await;
            respond(CommandResponse::ok(()))
        }
        unknown => {
            tracing::warn!("[Invoke] unknown command {}", unknown);
            error_value(format!("Unknown command: {}", unknown))
        }
    }
}
