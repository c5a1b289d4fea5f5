//! Invoke Dispatcher Integration Tests
//!
//! Drives the backend the way the host does: command names with JSON
//! arguments against an in-memory database, with a scripted provider in
//! place of Gemini.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::mpsc;

use prompt_studio::models::settings::AiSettings;
use prompt_studio::services::ai::{ProviderFactory, MISSING_API_KEY_MESSAGE};
use prompt_studio::state::AppEvent;
use prompt_studio::storage::load_document;
use prompt_studio::{dispatch, AppResult, AppState};
use prompt_studio_core::streaming::UnifiedStreamEvent;
use prompt_studio_llm::{
    LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message, ProviderConfig, StopReason,
    UsageStats,
};

// ============================================================================
// Scripted provider
// ============================================================================

struct ScriptedProvider {
    config: ProviderConfig,
    chunks: Vec<String>,
    delay: Duration,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn send_message(
        &self,
        _messages: Vec<Message>,
        _system: Option<String>,
        _request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        Ok(LlmResponse {
            content: Some(self.chunks.concat()),
            thinking: None,
            stop_reason: StopReason::EndTurn,
            usage: UsageStats::default(),
            model: self.config.model.clone(),
        })
    }

    async fn stream_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        tx: mpsc::Sender<UnifiedStreamEvent>,
        request_options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        for chunk in &self.chunks {
            tokio::time::sleep(self.delay).await;
            let _ = tx
                .send(UnifiedStreamEvent::TextDelta {
                    content: chunk.clone(),
                })
                .await;
        }
        self.send_message(messages, system, request_options).await
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }

    fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

struct ScriptedFactory {
    chunks: Vec<String>,
    delay: Duration,
}

impl ScriptedFactory {
    fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            delay: Duration::from_millis(1),
        }
    }
}

impl ProviderFactory for ScriptedFactory {
    fn create(&self, settings: &AiSettings) -> AppResult<Arc<dyn LlmProvider>> {
        Ok(Arc::new(ScriptedProvider {
            config: ProviderConfig {
                api_key: Some(settings.api_key.clone()),
                model: settings.model.clone(),
                ..Default::default()
            },
            chunks: self.chunks.clone(),
            delay: self.delay,
        }))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn app(dir: &TempDir) -> AppState {
    AppState::in_memory(dir.path().to_path_buf()).unwrap()
}

async fn call(state: &AppState, command: &str, args: Value) -> Value {
    let response = dispatch(state, command, args).await;
    assert_eq!(response["success"], json!(true), "{}: {}", command, response);
    response["data"].clone()
}

async fn call_err(state: &AppState, command: &str, args: Value) -> String {
    let response = dispatch(state, command, args).await;
    assert_eq!(response["success"], json!(false), "{}: {}", command, response);
    response["error"].as_str().unwrap().to_string()
}

async fn set_api_key(state: &AppState) {
    call(state, "update_settings", json!({"update": {"apiKey": "test-key"}})).await;
}

// ============================================================================
// Editor commands
// ============================================================================

#[tokio::test]
async fn test_editing_flow() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir);

    let prompt = call(&state, "create_prompt", json!({"name": "Support Bot"})).await;
    assert_eq!(prompt["name"], json!("Support Bot"));

    let role = call(&state, "add_block", json!({"blockType": "Role"})).await;
    let instruction = call(&state, "add_block", json!({"blockType": "Instruction"})).await;
    let role_id = role["id"].as_str().unwrap();
    let instruction_id = instruction["id"].as_str().unwrap();

    call(&state, "update_block_content", json!({"blockId": role_id, "content": "You help customers."})).await;
    call(&state, "update_block_content", json!({"blockId": instruction_id, "content": "Answer briefly."})).await;
    let moved = call(&state, "reorder_blocks", json!({"draggedId": instruction_id, "targetId": role_id})).await;
    assert_eq!(moved, json!(true));

    let assembled = call(&state, "get_assembled_prompt", Value::Null).await;
    assert_eq!(
        assembled,
        json!("// INSTRUCTION\nAnswer briefly.\n\n// ROLE\nYou help customers.")
    );

    let stats = call(&state, "get_prompt_stats", Value::Null).await;
    assert_eq!(stats["charCount"], json!(36));
    assert_eq!(stats["tokenCount"], json!(9));

    // unknown targets are reported as no-ops, not errors
    assert_eq!(call(&state, "delete_block", json!({"blockId": "nope"})).await, Value::Null);
    assert_eq!(call(&state, "load_prompt", json!({"promptId": "nope"})).await, json!(false));
}

#[tokio::test]
async fn test_flush_persists_document() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir);
    call(&state, "create_prompt", json!({"name": "Saved"})).await;
    call(&state, "flush", Value::Null).await;

    let stats = call(&state, "get_storage_stats", Value::Null).await;
    assert_eq!(stats["promptCount"], json!(1));
    assert!(stats["storageBytes"].as_u64().unwrap() > 0);

    assert_eq!(call(&state, "clear_prompts", Value::Null).await, json!(1));
    let stats = call(&state, "get_storage_stats", Value::Null).await;
    assert_eq!(stats["storageBytes"], json!(0));
}

#[tokio::test]
async fn test_export_then_import_via_commands() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir);
    call(&state, "use_gallery_prompt", json!({"galleryId": "gallery_id_2"})).await;
    call(&state, "create_prompt", json!({"name": "Second"})).await;

    let file = call(&state, "export_all_prompts", Value::Null).await;
    let path = file["path"].as_str().unwrap();
    let text = std::fs::read_to_string(path).unwrap();

    let other_dir = TempDir::new().unwrap();
    let other = app(&other_dir);
    let report = call(&other, "import_prompts", json!({"text": text})).await;
    assert_eq!(report["added"], json!(2));
    assert_eq!(report["skippedDuplicates"], json!(0));

    let error = call_err(&other, "import_prompts", json!({"text": "not json"})).await;
    assert_eq!(error, "Import failed. The file is not valid JSON.");
}

#[tokio::test]
async fn test_settings_commands() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir);

    let theme = call(&state, "toggle_theme", Value::Null).await;
    assert_eq!(theme, json!("dark"));

    let error = call_err(&state, "update_settings", json!({"update": {"fontSize": 40}})).await;
    assert!(error.contains("font size"));

    let settings = call(&state, "update_settings", json!({"update": {"temperature": 0.2, "topP": 0.5}})).await;
    assert!((settings["ai"]["temperature"].as_f64().unwrap() - 0.2).abs() < 1e-6);

    let profile = call(&state, "get_sampling_profile", Value::Null).await;
    assert!(profile["consistency"].as_f64().unwrap() > 7.9);

    let models = call(&state, "list_models", Value::Null).await;
    assert!(models.as_array().unwrap().len() >= 6);

    let settings = call(&state, "clear_settings", Value::Null).await;
    assert_eq!(settings["appearance"]["theme"], json!("light"));
}

// ============================================================================
// AI commands
// ============================================================================

#[tokio::test]
async fn test_ai_requires_api_key_after_input_validation() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir);

    let error = call_err(&state, "start_ai_generation", json!({"requirements": "  "})).await;
    assert_eq!(error, "Please describe the prompt you want to create.");

    let error = call_err(&state, "start_ai_generation", json!({"requirements": "a bot"})).await;
    assert_eq!(error, MISSING_API_KEY_MESSAGE);
}

#[tokio::test]
async fn test_streamed_generation_then_confirm() {
    let dir = TempDir::new().unwrap();
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<AppEvent>();
    let state = app(&dir)
        .with_provider_factory(Arc::new(ScriptedFactory::new(&[
            "<<<NAME>>>\nRecipe Helper\n",
            "<<<Role>>>\nYou are a chef.\n",
            "<<<Instruction>>>\nSuggest a dinner.",
        ])))
        .with_events(events_tx);
    set_api_key(&state).await;

    let started = call(&state, "start_ai_generation", json!({"requirements": "cooking help"})).await;
    assert_eq!(started["isGenerating"], json!(true));

    // the last event carries the finished session
    let finished = loop {
        let event = tokio::time::timeout(Duration::from_secs(5), events_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.event, "ai-generation");
        if event.payload["isFinished"] == json!(true) {
            break event.payload;
        }
    };
    assert_eq!(finished["generatedName"], json!("Recipe Helper"));
    assert_eq!(finished["generatedBlocks"].as_array().unwrap().len(), 2);

    let prompt = call(&state, "confirm_ai_generation", Value::Null).await;
    assert_eq!(prompt["name"], json!("Recipe Helper"));

    let doc = call(&state, "get_state", Value::Null).await;
    assert_eq!(doc["currentPromptId"], prompt["id"]);
    assert_eq!(doc["currentView"], json!("editor"));

    let session = call(&state, "get_ai_generation", Value::Null).await;
    assert_eq!(session["isFinished"], json!(false));
    let error = call_err(&state, "confirm_ai_generation", Value::Null).await;
    assert_eq!(error, "There is no finished generation to confirm.");
}

#[tokio::test]
async fn test_cancel_generation_discards_session() {
    let dir = TempDir::new().unwrap();
    let mut factory = ScriptedFactory::new(&["<<<Role>>>\nSlow", " output", " that", " never", " ends"]);
    factory.delay = Duration::from_millis(200);
    let state = app(&dir).with_provider_factory(Arc::new(factory));
    set_api_key(&state).await;

    call(&state, "start_ai_generation", json!({"requirements": "anything"})).await;
    assert_eq!(call(&state, "cancel_ai_generation", Value::Null).await, json!(true));

    let session = call(&state, "get_ai_generation", Value::Null).await;
    assert_eq!(session["isGenerating"], json!(false));
    assert_eq!(session["generatedBlocks"], json!([]));
    assert_eq!(call(&state, "cancel_ai_generation", Value::Null).await, json!(false));

    tokio::time::sleep(Duration::from_millis(300)).await;
    let session = call(&state, "get_ai_generation", Value::Null).await;
    assert_eq!(session["rawContent"], json!(""));
}

#[tokio::test]
async fn test_improve_block_updates_content() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir).with_provider_factory(Arc::new(ScriptedFactory::new(&[
        "You are a meticulous editor.",
    ])));
    set_api_key(&state).await;

    call(&state, "create_prompt", Value::Null).await;
    let block = call(&state, "add_block", json!({"blockType": "Role"})).await;
    let block_id = block["id"].as_str().unwrap();

    let error = call_err(&state, "improve_block", json!({"blockId": block_id})).await;
    assert_eq!(error, "There is no text to improve.");

    call(&state, "update_block_content", json!({"blockId": block_id, "content": "edit stuff"})).await;
    let improved = call(&state, "improve_block", json!({"blockId": block_id})).await;
    assert_eq!(improved, json!("You are a meticulous editor."));

    let assembled = call(&state, "get_assembled_prompt", Value::Null).await;
    assert_eq!(assembled, json!("// ROLE\nYou are a meticulous editor."));
}

#[tokio::test]
async fn test_shutdown_keeps_result_of_running_command() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir).with_provider_factory(Arc::new(ScriptedFactory::new(&[
        "You are a ",
        "careful reviewer.",
    ])));
    set_api_key(&state).await;

    call(&state, "create_prompt", Value::Null).await;
    let block = call(&state, "add_block", json!({"blockType": "Role"})).await;
    let block_id = block["id"].as_str().unwrap().to_string();
    call(&state, "update_block_content", json!({"blockId": block_id, "content": "review"})).await;
    call(&state, "flush", Value::Null).await;

    // stdin closes while the improvement is still streaming
    let task_state = state.clone();
    state.spawn(async move {
        let response = dispatch(&task_state, "improve_block", json!({"blockId": block_id})).await;
        assert_eq!(response["success"], json!(true), "{}", response);
    });
    state.shutdown(Duration::from_secs(5)).await;

    let doc = load_document(state.kv()).unwrap();
    let blocks = &doc.prompts[0].blocks;
    assert_eq!(blocks[0].content, "You are a careful reviewer.");
}

#[tokio::test]
async fn test_paraphrase_and_json_builder() {
    let dir = TempDir::new().unwrap();
    let state = app(&dir).with_provider_factory(Arc::new(ScriptedFactory::new(&[
        "First take\n---VARIATION_SEPARATOR---\n",
        "Second take",
    ])));
    set_api_key(&state).await;

    let variations = call(
        &state,
        "paraphrase",
        json!({"request": {"mode": "Formal", "text": "hey", "variations": 2}}),
    )
    .await;
    assert_eq!(variations, json!(["First take", "Second take"]));

    let error = call_err(&state, "paraphrase", json!({"request": {"mode": "Custom", "text": "hey"}})).await;
    assert_eq!(error, "Please provide a custom instruction.");

    let output = call(&state, "build_json", json!({"kind": "UI", "description": "a login form"})).await;
    assert_eq!(output["valid"], json!(false));
    assert!(output["error"].as_str().unwrap().contains("invalid JSON"));

    let saved = call(&state, "save_json_prompt", json!({"name": "Login", "content": "{\"screen\": \"login\"}"})).await;
    assert_eq!(saved["format"], json!("json"));
    let assembled = call(&state, "get_assembled_prompt", Value::Null).await;
    assert_eq!(assembled, json!("{\"screen\": \"login\"}"));
}
