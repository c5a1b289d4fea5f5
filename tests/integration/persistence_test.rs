//! Persistence Integration Tests
//!
//! Documents and settings written through the SQLite database survive a
//! reopen; legacy documents are migrated on first load.

use prompt_studio::models::block::BlockType;
use prompt_studio::models::document::View;
use prompt_studio::models::settings::{AiSettings, Theme};
use prompt_studio::services::store::PromptStore;
use prompt_studio::storage::persistence::{
    clear_prompts, load_ai_settings, load_appearance, load_document, save_ai_settings,
    save_document, STATE_KEY,
};
use prompt_studio::storage::{Database, KeyValueStore};
use tempfile::TempDir;

fn open(dir: &TempDir) -> Database {
    Database::open(&dir.path().join("data.db")).unwrap()
}

#[test]
fn test_document_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let current_id = {
        let db = open(&dir);
        let mut store = PromptStore::new();
        store.create_prompt("Kept");
        let block = store.add_block(BlockType::Variable, None).unwrap();
        store.update_block_content(&block.id, "{{topic}}");
        store.set_view(View::Paraphrase);
        save_document(&db, store.document()).unwrap();
        store.current_prompt_id().unwrap().to_string()
    };

    let db = open(&dir);
    let store = PromptStore::from_document(load_document(&db).unwrap());
    assert_eq!(store.current_prompt_id(), Some(current_id.as_str()));
    assert_eq!(store.current_view(), View::Paraphrase);
    assert_eq!(store.current_prompt().unwrap().blocks[0].content, "{{topic}}");
}

#[test]
fn test_legacy_document_migrates_once() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    db.set(
        STATE_KEY,
        r#"{
            "theme": "dark",
            "currentPrompt": {
                "id": "legacy-1",
                "name": "Old Prompt",
                "createdAt": "2024-01-01T00:00:00Z",
                "blocks": [{"id": "b1", "type": "Role", "content": "You are old.", "isCollapsed": false}]
            }
        }"#,
    )
    .unwrap();

    let doc = load_document(&db).unwrap();
    assert_eq!(doc.current_prompt_id.as_deref(), Some("legacy-1"));
    assert_eq!(doc.prompts[0].updated_at, doc.prompts[0].created_at);
    assert_eq!(load_appearance(&db).unwrap().theme, Theme::Dark);

    // written back in the current shape
    let raw = db.get(STATE_KEY).unwrap().unwrap();
    assert!(raw.contains("\"prompts\""));
    assert!(!raw.contains("currentPrompt\""));
    assert_eq!(load_document(&db).unwrap(), doc);
}

#[test]
fn test_dangling_current_id_repaired() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    db.set(
        STATE_KEY,
        r#"{
            "currentView": "editor",
            "currentPromptId": "gone",
            "prompts": [
                {"id": "a", "name": "A", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z", "blocks": []},
                {"id": "a", "name": "A again", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z", "blocks": []}
            ]
        }"#,
    )
    .unwrap();

    let doc = load_document(&db).unwrap();
    assert_eq!(doc.prompts.len(), 1);
    assert_eq!(doc.prompts[0].name, "A");
    assert_eq!(doc.current_prompt_id.as_deref(), Some("a"));
}

#[test]
fn test_clearing_prompts_keeps_settings() {
    let dir = TempDir::new().unwrap();
    let db = open(&dir);
    let mut store = PromptStore::new();
    store.create_prompt("Gone soon");
    save_document(&db, store.document()).unwrap();

    let settings = AiSettings {
        api_key: "secret".to_string(),
        ..Default::default()
    };
    save_ai_settings(&db, &settings).unwrap();

    clear_prompts(&db).unwrap();
    assert!(load_document(&db).unwrap().prompts.is_empty());
    assert_eq!(load_ai_settings(&db).unwrap(), settings);
}
