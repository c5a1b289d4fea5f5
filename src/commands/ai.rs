//! AI Commands
//!
//! Command handlers for the AI features. Input is validated before the API
//! key is checked, and both before any request is made.
//!
//! `start_ai_generation` returns at once and streams on a background task;
//! progress is published as `ai-generation` events and can be polled with
//! `get_ai_generation`. Paraphrase and JSON building run inline and publish
//! their partial output as `paraphrase` / `json-builder` events. Only one
//! stream runs at a time: starting one cancels the other.

use serde::{Deserialize, Serialize};

use crate::models::prompt::Prompt;
use crate::models::response::CommandResponse;
use crate::services::ai::{
    validate_requirements, AiGenerationState, JsonBuildOutput, JsonBuilderKind, JsonConfigKind,
    ParaphraseRequest, EMPTY_IMPROVE_MESSAGE, EMPTY_JSON_DESCRIPTION_MESSAGE, EMPTY_SOURCE_MESSAGE,
};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};

pub const AI_GENERATION_EVENT: &str = "ai-generation";
pub const PARAPHRASE_EVENT: &str = "paraphrase";
pub const JSON_BUILDER_EVENT: &str = "json-builder";

/// Incremental JSON builder output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonChunk {
    pub chunk: String,
}

/// Rewrite a block of the current prompt with the AI and store the result
pub async fn improve_block(block_id: String, state: &AppState) -> CommandResponse<String> {
    improve(&block_id, state).await.into()
}

async fn improve(block_id: &str, state: &AppState) -> AppResult<String> {
    let text = state
        .read_store(|s| {
            s.current_prompt()
                .and_then(|p| p.block(block_id))
                .map(|b| b.content.clone())
        })
        .await
        .ok_or_else(|| AppError::not_found(format!("Block not found: {}", block_id)))?;
    if text.trim().is_empty() {
        return Err(AppError::validation(EMPTY_IMPROVE_MESSAGE));
    }

    let ai = state.ai_service().await?;
    let improved = ai.improve_block_text(&text).await?;
    // the block may have been deleted while the request ran
    state
        .mutate_store(|s| s.update_block_content(block_id, &improved))
        .await;
    Ok(improved)
}

/// One-shot generation; the new prompt is added and made current
pub async fn generate_prompt(requirements: String, state: &AppState) -> CommandResponse<Prompt> {
    generate(&requirements, state).await.into()
}

async fn generate(requirements: &str, state: &AppState) -> AppResult<Prompt> {
    validate_requirements(requirements)?;
    let ai = state.ai_service().await?;
    let prompt = ai.generate_prompt(requirements).await?;
    let stored = state
        .mutate_store(|s| {
            let id = s.load_generated_prompt(prompt);
            s.get(&id).cloned()
        })
        .await;
    stored.ok_or_else(|| AppError::internal("generated prompt was not stored"))
}

/// Start a streamed generation in the background
pub async fn start_ai_generation(requirements: String, state: &AppState) -> CommandResponse<AiGenerationState> {
    start_generation(requirements, state).await.into()
}

async fn start_generation(requirements: String, state: &AppState) -> AppResult<AiGenerationState> {
    validate_requirements(&requirements)?;
    let ai = state.ai_service().await?;

    let (stream_id, cancel) = state.begin_stream().await;
    let session = state.ai_session();
    let started = AiGenerationState::start(&requirements);
    *session.write().await = started.clone();

    let task_state = state.clone();
    tokio::spawn(async move {
        let result = ai
            .stream_prompt_creation(&requirements, &session, &cancel, |snapshot| {
                task_state.emit(AI_GENERATION_EVENT, snapshot)
            })
            .await;
        match result {
            Ok(()) => {}
            Err(AppError::Cancelled) => {
                task_state.end_stream(stream_id).await;
                return;
            }
            Err(e) => tracing::warn!("[AI] generation failed: {}", e),
        }
        let last = session.read().await.clone();
        task_state.emit(AI_GENERATION_EVENT, &last);
        task_state.end_stream(stream_id).await;
    });

    Ok(started)
}

pub async fn get_ai_generation(state: &AppState) -> CommandResponse<AiGenerationState> {
    CommandResponse::ok(state.ai_session().read().await.clone())
}

/// Commit a finished generation to the store and clear the session
pub async fn confirm_ai_generation(state: &AppState) -> CommandResponse<Prompt> {
    confirm(state).await.into()
}

async fn confirm(state: &AppState) -> AppResult<Prompt> {
    let session = state.ai_session();
    let mut generation = session.write().await;
    let prompt = generation
        .to_prompt()
        .ok_or_else(|| AppError::validation("There is no finished generation to confirm."))?;

    let stored = state
        .mutate_store(|s| {
            let id = s.load_generated_prompt(prompt);
            s.get(&id).cloned()
        })
        .await
        .ok_or_else(|| AppError::internal("generated prompt was not stored"))?;
    *generation = AiGenerationState::default();
    tracing::info!("[AI] confirmed generated prompt {}", stored.id);
    Ok(stored)
}

/// Cancel any running generation and discard the session
pub async fn reset_ai_generation(state: &AppState) -> CommandResponse<AiGenerationState> {
    state.cancel_stream().await;
    let session = state.ai_session();
    *session.write().await = AiGenerationState::default();
    CommandResponse::ok(AiGenerationState::default())
}

/// Cancel the running stream; false when nothing was running
pub async fn cancel_ai_generation(state: &AppState) -> CommandResponse<bool> {
    let cancelled = state.cancel_stream().await;
    if cancelled {
        let session = state.ai_session();
        let mut generation = session.write().await;
        if generation.is_generating {
            *generation = AiGenerationState::default();
        }
    }
    CommandResponse::ok(cancelled)
}

/// Streamed paraphrase; returns the final variations
pub async fn paraphrase(request: ParaphraseRequest, state: &AppState) -> CommandResponse<Vec<String>> {
    run_paraphrase(&request, state).await.into()
}

async fn run_paraphrase(request: &ParaphraseRequest, state: &AppState) -> AppResult<Vec<String>> {
    request.validate()?;
    let ai = state.ai_service().await?;
    let (stream_id, cancel) = state.begin_stream().await;
    let result = ai
        .stream_paraphrase(request, &cancel, |variations| {
            state.emit(PARAPHRASE_EVENT, &variations)
        })
        .await;
    state.end_stream(stream_id).await;
    result
}

/// Streamed JSON builder; invalid JSON is reported in the output, not as an error
pub async fn build_json(kind: JsonBuilderKind, description: String, state: &AppState) -> CommandResponse<JsonBuildOutput> {
    run_json_builder(kind, &description, state).await.into()
}

async fn run_json_builder(kind: JsonBuilderKind, description: &str, state: &AppState) -> AppResult<JsonBuildOutput> {
    if description.trim().is_empty() {
        return Err(AppError::validation(EMPTY_JSON_DESCRIPTION_MESSAGE));
    }
    let ai = state.ai_service().await?;
    let (stream_id, cancel) = state.begin_stream().await;
    let result = ai
        .stream_json_builder(kind, description, &cancel, |chunk| {
            state.emit(
                JSON_BUILDER_EVENT,
                &JsonChunk {
                    chunk: chunk.to_string(),
                },
            )
        })
        .await;
    state.end_stream(stream_id).await;
    result
}

/// Extract a design or architecture config from pasted source code
pub async fn generate_json_config(kind: JsonConfigKind, source: String, state: &AppState) -> CommandResponse<String> {
    json_config(kind, &source, state).await.into()
}

async fn json_config(kind: JsonConfigKind, source: &str, state: &AppState) -> AppResult<String> {
    if source.trim().is_empty() {
        return Err(AppError::validation(EMPTY_SOURCE_MESSAGE));
    }
    let ai = state.ai_service().await?;
    ai.generate_json_config(kind, source).await
}
