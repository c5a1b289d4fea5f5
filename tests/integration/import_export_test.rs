//! Import / Export Integration Tests
//!
//! Files written by export are read back by import.

use chrono::{TimeZone, Utc};
use prompt_studio::models::block::BlockType;
use prompt_studio::models::response::user_message;
use prompt_studio::models::prompt::Prompt;
use prompt_studio::services::import_export::{
    export_collection, export_prompt, import_text, NOTHING_TO_EXPORT_MESSAGE,
};
use prompt_studio::services::store::PromptStore;
use tempfile::TempDir;

fn sample_store() -> PromptStore {
    let mut store = PromptStore::new();
    store.import_prompts(vec![
        Prompt::with_blocks("Code Review!", [(BlockType::Role, "You review Rust code.")]),
        Prompt::with_blocks(
            "Summarizer",
            [
                (BlockType::Instruction, "Summarize the text."),
                (BlockType::Constraint, "At most three sentences."),
            ],
        ),
    ]);
    store
}

#[test]
fn test_collection_round_trip_through_file() {
    let dir = TempDir::new().unwrap();
    let store = sample_store();
    let at = Utc.with_ymd_and_hms(2025, 3, 9, 12, 0, 0).unwrap();

    let file = export_collection(store.prompts(), dir.path(), at).unwrap();
    assert_eq!(file.file_name, "prompt-builder-export-2025-03-09.json");
    let text = std::fs::read_to_string(&file.path).unwrap();
    assert!(text.starts_with("[\n  {"));

    let mut fresh = PromptStore::new();
    let report = import_text(&mut fresh, &text).unwrap();
    assert_eq!(report.added, 2);
    assert!(report.rejected.is_empty());
    assert_eq!(fresh.prompts(), store.prompts());

    // importing the same file again adds nothing
    let report = import_text(&mut fresh, &text).unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped_duplicates, 2);
    assert_eq!(fresh.len(), 2);
}

#[test]
fn test_single_prompt_export_imports_as_object() {
    let dir = TempDir::new().unwrap();
    let store = sample_store();
    let prompt = &store.prompts()[0];

    let file = export_prompt(prompt, dir.path()).unwrap();
    assert_eq!(file.file_name, "code_review_.json");

    let text = std::fs::read_to_string(&file.path).unwrap();
    let mut fresh = PromptStore::new();
    let report = import_text(&mut fresh, &text).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(fresh.current_prompt_id(), Some(prompt.id.as_str()));
}

#[test]
fn test_partial_import_reports_rejects() {
    let mut store = PromptStore::new();
    let text = r#"[
        {"id": "ok", "name": "Fine", "blocks": [{"id": "b", "type": "Role", "content": "x"}]},
        {"id": "bad", "blocks": [{"type": "Persona"}]},
        42
    ]"#;
    let report = import_text(&mut store, text).unwrap();
    assert_eq!(report.added, 1);
    assert_eq!(report.rejected.len(), 2);
    assert_eq!(report.rejected[0].index, 1);
    assert!(report.summary().contains("Rejected 2 invalid prompt(s)."));
}

#[test]
fn test_invalid_file_leaves_store_untouched() {
    let mut store = sample_store();
    let before = store.clone();
    assert!(import_text(&mut store, "{ not json").is_err());
    assert!(import_text(&mut store, "\"just a string\"").is_err());
    assert_eq!(store, before);
}

#[test]
fn test_empty_collection_not_exported() {
    let dir = TempDir::new().unwrap();
    let err = export_collection(&[], dir.path(), Utc::now()).unwrap_err();
    assert_eq!(user_message(&err), NOTHING_TO_EXPORT_MESSAGE);
}
