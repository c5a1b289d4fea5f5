//! Prompt Store Integration Tests
//!
//! Multi-step editing sessions against the public store API.

use prompt_studio::models::block::BlockType;
use prompt_studio::models::document::View;
use prompt_studio::services::gallery::gallery_prompts;
use prompt_studio::services::store::PromptStore;

fn ids(store: &PromptStore) -> Vec<String> {
    store
        .current_prompt()
        .unwrap()
        .blocks
        .iter()
        .map(|b| b.id.clone())
        .collect()
}

// ============================================================================
// Editing Session
// ============================================================================

#[test]
fn test_build_prompt_from_scratch() {
    let mut store = PromptStore::new();
    store.set_view(View::Templates);
    let prompt = store.create_prompt("Email Writer");
    assert_eq!(store.current_view(), View::Editor);
    assert_eq!(store.current_prompt_id(), Some(prompt.id.as_str()));

    let role = store.add_block(BlockType::Role, None).unwrap();
    let instruction = store.add_block(BlockType::Instruction, None).unwrap();
    let context = store.add_block(BlockType::Context, Some(1)).unwrap();
    assert_eq!(ids(&store), vec![role.id.clone(), context.id.clone(), instruction.id.clone()]);

    assert!(store.update_block_content(&role.id, "You are a helpful assistant."));
    assert!(store.update_block_content(&instruction.id, "Write a polite email."));
    assert!(store.update_block_content(&context.id, "The reader is a customer."));

    // move the instruction in front of the context
    assert!(store.reorder_blocks(&instruction.id, Some(&context.id)));
    assert_eq!(ids(&store), vec![role.id.clone(), instruction.id.clone(), context.id.clone()]);

    assert_eq!(
        store.assembled_prompt().unwrap(),
        "// ROLE\nYou are a helpful assistant.\n\n// INSTRUCTION\nWrite a polite email.\n\n// CONTEXT\nThe reader is a customer."
    );

    let stats = store.current_stats().unwrap();
    let joined = "You are a helpful assistant.\n\nWrite a polite email.\n\nThe reader is a customer.";
    assert_eq!(stats.char_count, joined.chars().count());
    assert_eq!(stats.token_count, joined.chars().count().div_ceil(4));
}

#[test]
fn test_duplicate_delete_and_collapse() {
    let mut store = PromptStore::new();
    store.create_prompt("P");
    let block = store.add_block(BlockType::Example, None).unwrap();
    store.update_block_content(&block.id, "In: 2+2\nOut: 4");

    let copy = store.duplicate_block(&block.id).unwrap();
    assert_ne!(copy.id, block.id);
    assert_eq!(copy.content, "In: 2+2\nOut: 4");
    assert_eq!(ids(&store), vec![block.id.clone(), copy.id.clone()]);

    let before = store.current_prompt().unwrap().updated_at;
    assert_eq!(store.toggle_block_collapse(&copy.id), Some(true));
    assert_eq!(store.current_prompt().unwrap().updated_at, before);

    assert!(store.delete_block(&block.id).is_some());
    assert_eq!(ids(&store), vec![copy.id.clone()]);
    assert!(store.delete_block(&block.id).is_none());
}

#[test]
fn test_switching_and_deleting_prompts() {
    let mut store = PromptStore::new();
    let first = store.create_prompt("First");
    let second = store.create_prompt("Second");
    assert_eq!(store.prompts()[0].id, second.id);

    assert!(store.load_prompt(&first.id));
    store.add_block(BlockType::Constraint, None);
    assert_eq!(store.get(&first.id).unwrap().blocks.len(), 1);
    assert!(store.get(&second.id).unwrap().blocks.is_empty());

    // the most recently edited prompt leads the template list
    assert_eq!(store.prompts_by_recency()[0].id, first.id);

    store.delete_prompt(&first.id);
    assert_eq!(store.current_prompt_id(), Some(second.id.as_str()));
    store.delete_prompt(&second.id);
    assert!(store.current_prompt().is_none());
    assert!(store.add_block(BlockType::Role, None).is_none());
}

#[test]
fn test_gallery_copy_is_independent() {
    let mut store = PromptStore::new();
    let example = gallery_prompts().remove(0);
    let copy = store.use_gallery_prompt(&example);
    assert_ne!(copy.id, example.id);
    assert_eq!(copy.blocks.len(), example.blocks.len());

    let block_id = copy.blocks[0].id.clone();
    store.update_block_content(&block_id, "changed");
    assert_ne!(gallery_prompts()[0].blocks[0].content, "changed");
}

#[test]
fn test_json_prompt_ignores_block_edits() {
    let mut store = PromptStore::new();
    let prompt = store.save_json_prompt("Scene", "{\"scene\": \"beach\"}");
    assert!(prompt.is_json());
    assert!(store.add_block(BlockType::Role, None).is_none());
    assert_eq!(store.assembled_prompt().unwrap(), "{\"scene\": \"beach\"}");
}
