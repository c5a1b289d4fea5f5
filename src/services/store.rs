//! Prompt Store
//!
//! The single source of truth for the prompt collection and the UI
//! selection around it. Every mutation either applies fully or is a no-op
//! when its target does not exist; the return value says which, and no
//! mutation ever errors.
//!
//! Block operations act on the current prompt. A `json` prompt has no
//! blocks, so block operations on it are no-ops.

use std::collections::HashSet;

use crate::models::block::{Block, BlockType};
use crate::models::document::{PromptDocument, View};
use crate::models::prompt::{normalize_name, Prompt};
use crate::utils::tokens::TextStats;

/// In-memory prompt collection with its mutation API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptStore {
    doc: PromptDocument,
}

impl PromptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a loaded document, repairing dangling references
    pub fn from_document(mut doc: PromptDocument) -> Self {
        doc.repair();
        Self { doc }
    }

    pub fn document(&self) -> &PromptDocument {
        &self.doc
    }

    pub fn into_document(self) -> PromptDocument {
        self.doc
    }

    // ========================================================================
    // Selection
    // ========================================================================

    pub fn current_view(&self) -> View {
        self.doc.current_view
    }

    pub fn set_view(&mut self, view: View) {
        self.doc.current_view = view;
    }

    pub fn current_prompt_id(&self) -> Option<&str> {
        self.doc.current_prompt_id.as_deref()
    }

    pub fn current_prompt(&self) -> Option<&Prompt> {
        let id = self.doc.current_prompt_id.as_deref()?;
        self.doc.prompts.iter().find(|p| p.id == id)
    }

    pub fn current_prompt_mut(&mut self) -> Option<&mut Prompt> {
        let id = self.doc.current_prompt_id.clone()?;
        self.doc.prompts.iter_mut().find(|p| p.id == id)
    }

    /// Current prompt if it is a block prompt
    fn block_prompt_mut(&mut self) -> Option<&mut Prompt> {
        self.current_prompt_mut().filter(|p| !p.is_json())
    }

    /// Make `prompt_id` current; false if no such prompt
    pub fn load_prompt(&mut self, prompt_id: &str) -> bool {
        if !self.doc.contains(prompt_id) {
            tracing::debug!("[Store] load_prompt: unknown id {}", prompt_id);
            return false;
        }
        self.doc.current_prompt_id = Some(prompt_id.to_string());
        true
    }

    // ========================================================================
    // Prompts
    // ========================================================================

    pub fn prompts(&self) -> &[Prompt] {
        &self.doc.prompts
    }

    pub fn get(&self, prompt_id: &str) -> Option<&Prompt> {
        self.doc.find(prompt_id)
    }

    pub fn len(&self) -> usize {
        self.doc.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.prompts.is_empty()
    }

    /// Prompts ordered for the template list: most recently updated first
    pub fn prompts_by_recency(&self) -> Vec<&Prompt> {
        let mut prompts: Vec<&Prompt> = self.doc.prompts.iter().collect();
        prompts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        prompts
    }

    /// Insert at the head of the collection and make current
    fn insert_current(&mut self, prompt: Prompt) -> &Prompt {
        self.doc.current_prompt_id = Some(prompt.id.clone());
        self.doc.prompts.insert(0, prompt);
        &self.doc.prompts[0]
    }

    /// Create an empty prompt, make it current and open the editor
    pub fn create_prompt(&mut self, name: &str) -> Prompt {
        let prompt = Prompt::new(name);
        tracing::info!("[Store] created prompt {} ({})", prompt.id, prompt.name);
        self.doc.current_view = View::Editor;
        self.insert_current(prompt).clone()
    }

    /// Remove a prompt. Deleting the current prompt moves the selection to
    /// the first remaining prompt, or clears it.
    pub fn delete_prompt(&mut self, prompt_id: &str) -> Option<Prompt> {
        let index = self.doc.prompts.iter().position(|p| p.id == prompt_id)?;
        let removed = self.doc.prompts.remove(index);

        if self.doc.current_prompt_id.as_deref() == Some(prompt_id) {
            self.doc.current_prompt_id = self.doc.prompts.first().map(|p| p.id.clone());
        }
        tracing::info!("[Store] deleted prompt {}", prompt_id);
        Some(removed)
    }

    /// Rename the current prompt; returns the stored name
    pub fn rename_prompt(&mut self, name: &str) -> Option<String> {
        let prompt = self.current_prompt_mut()?;
        prompt.name = normalize_name(name);
        prompt.touch();
        Some(prompt.name.clone())
    }

    /// Append validated prompts whose id is not yet taken; returns the
    /// number added. A repeated id later in the same batch is also skipped.
    pub fn import_prompts(&mut self, prompts: Vec<Prompt>) -> usize {
        let mut taken: HashSet<String> = self.doc.prompts.iter().map(|p| p.id.clone()).collect();
        let mut added = 0;
        for prompt in prompts {
            if taken.insert(prompt.id.clone()) {
                self.doc.prompts.push(prompt);
                added += 1;
            }
        }
        if added > 0 {
            if self.doc.current_prompt_id.is_none() {
                self.doc.current_prompt_id = self.doc.prompts.first().map(|p| p.id.clone());
            }
            tracing::info!("[Store] imported {} prompts", added);
        }
        added
    }

    /// Commit an accepted AI generation: insert at head, make current, open
    /// the editor. Returns the prompt id.
    pub fn load_generated_prompt(&mut self, prompt: Prompt) -> String {
        let prompt = if self.doc.contains(&prompt.id) {
            prompt.fresh_copy()
        } else {
            prompt
        };
        self.doc.current_view = View::Editor;
        self.insert_current(prompt).id.clone()
    }

    /// Create a `json` prompt holding `content`, made current
    pub fn save_json_prompt(&mut self, name: &str, content: &str) -> Prompt {
        let prompt = Prompt::new_json(name, content);
        tracing::info!("[Store] saved JSON prompt {} ({})", prompt.id, prompt.name);
        self.insert_current(prompt).clone()
    }

    /// Copy a gallery example into the collection under fresh ids
    pub fn use_gallery_prompt(&mut self, example: &Prompt) -> Prompt {
        let prompt = example.fresh_copy();
        self.doc.current_view = View::Editor;
        self.insert_current(prompt).clone()
    }

    /// Remove every prompt; returns how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.doc.prompts.len();
        self.doc.prompts.clear();
        self.doc.current_prompt_id = None;
        removed
    }

    // ========================================================================
    // Blocks (current prompt)
    // ========================================================================

    /// Add an empty block at `index` (clamped to the list length) or at the end
    pub fn add_block(&mut self, block_type: BlockType, index: Option<usize>) -> Option<Block> {
        let prompt = self.block_prompt_mut()?;
        let block = Block::new(block_type);
        let at = index.unwrap_or(prompt.blocks.len()).min(prompt.blocks.len());
        prompt.blocks.insert(at, block.clone());
        prompt.touch();
        Some(block)
    }

    pub fn delete_block(&mut self, block_id: &str) -> Option<Block> {
        let prompt = self.block_prompt_mut()?;
        let index = prompt.block_index(block_id)?;
        let removed = prompt.blocks.remove(index);
        prompt.touch();
        Some(removed)
    }

    /// Copy a block under a fresh id, directly after the original
    pub fn duplicate_block(&mut self, block_id: &str) -> Option<Block> {
        let prompt = self.block_prompt_mut()?;
        let index = prompt.block_index(block_id)?;
        let copy = prompt.blocks[index].duplicate();
        prompt.blocks.insert(index + 1, copy.clone());
        prompt.touch();
        Some(copy)
    }

    pub fn update_block_content(&mut self, block_id: &str, content: &str) -> bool {
        let Some(prompt) = self.block_prompt_mut() else {
            return false;
        };
        let Some(block) = prompt.blocks.iter_mut().find(|b| b.id == block_id) else {
            return false;
        };
        block.content = content.to_string();
        prompt.touch();
        true
    }

    /// Move `dragged_id` to just before `target_id`, or to the end when the
    /// target is absent or unknown.
    pub fn reorder_blocks(&mut self, dragged_id: &str, target_id: Option<&str>) -> bool {
        let Some(prompt) = self.block_prompt_mut() else {
            return false;
        };
        if !move_block(&mut prompt.blocks, dragged_id, target_id) {
            return false;
        }
        prompt.touch();
        true
    }

    /// Flip the collapsed flag; returns the new value. Display-only, so
    /// `updated_at` is left alone.
    pub fn toggle_block_collapse(&mut self, block_id: &str) -> Option<bool> {
        let prompt = self.block_prompt_mut()?;
        let block = prompt.blocks.iter_mut().find(|b| b.id == block_id)?;
        block.is_collapsed = !block.is_collapsed;
        Some(block.is_collapsed)
    }

    // ========================================================================
    // Derived
    // ========================================================================

    pub fn assembled_prompt(&self) -> Option<String> {
        self.current_prompt().map(Prompt::assemble)
    }

    pub fn current_stats(&self) -> Option<TextStats> {
        self.current_prompt().map(Prompt::stats)
    }
}

/// Splice `dragged_id` out of `blocks` and back in before `target_id`.
///
/// Returns false if `dragged_id` is not in the list. A target equal to the
/// dragged block, or missing, appends at the end.
pub fn move_block(blocks: &mut Vec<Block>, dragged_id: &str, target_id: Option<&str>) -> bool {
    let Some(from) = blocks.iter().position(|b| b.id == dragged_id) else {
        return false;
    };
    let dragged = blocks.remove(from);
    let to = target_id
        .and_then(|target| blocks.iter().position(|b| b.id == target))
        .unwrap_or(blocks.len());
    blocks.insert(to, dragged);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn store_with_prompt() -> PromptStore {
        let mut store = PromptStore::new();
        store.create_prompt("Demo");
        store
    }

    fn block_ids(store: &PromptStore) -> Vec<String> {
        store
            .current_prompt()
            .map(|p| p.blocks.iter().map(|b| b.id.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_create_prompt_inserts_at_head() {
        let mut store = PromptStore::new();
        store.set_view(View::Templates);
        let first = store.create_prompt("First");
        let second = store.create_prompt("  Second  ");

        assert_eq!(store.prompts()[0].id, second.id);
        assert_eq!(store.prompts()[1].id, first.id);
        assert_eq!(store.current_prompt_id(), Some(second.id.as_str()));
        assert_eq!(second.name, "Second");
        assert_eq!(store.current_view(), View::Editor);
    }

    #[test]
    fn test_load_prompt_unknown_is_noop() {
        let mut store = store_with_prompt();
        let current = store.current_prompt_id().map(str::to_string);
        assert!(!store.load_prompt("nope"));
        assert_eq!(store.current_prompt_id().map(str::to_string), current);
    }

    #[test]
    fn test_delete_current_falls_back_to_first() {
        let mut store = PromptStore::new();
        let a = store.create_prompt("A");
        let b = store.create_prompt("B");
        let c = store.create_prompt("C");
        // order: C, B, A; current C
        assert!(store.delete_prompt(&c.id).is_some());
        assert_eq!(store.current_prompt_id(), Some(b.id.as_str()));

        // deleting a non-current prompt keeps the selection
        store.delete_prompt(&a.id);
        assert_eq!(store.current_prompt_id(), Some(b.id.as_str()));

        store.delete_prompt(&b.id);
        assert!(store.current_prompt_id().is_none());
        assert!(store.delete_prompt(&b.id).is_none());
    }

    #[test]
    fn test_rename_trims_and_falls_back() {
        let mut store = store_with_prompt();
        assert_eq!(store.rename_prompt("  My Prompt  ").as_deref(), Some("My Prompt"));
        assert_eq!(store.rename_prompt("   ").as_deref(), Some("Untitled Prompt"));

        let mut empty = PromptStore::new();
        assert!(empty.rename_prompt("x").is_none());
    }

    #[test]
    fn test_add_block_positions() {
        let mut store = store_with_prompt();
        let a = store.add_block(BlockType::Role, None).unwrap();
        let b = store.add_block(BlockType::Instruction, None).unwrap();
        let c = store.add_block(BlockType::Context, Some(1)).unwrap();
        let d = store.add_block(BlockType::Example, Some(99)).unwrap();
        assert_eq!(block_ids(&store), vec![a.id, c.id, b.id, d.id]);
        assert!(c.content.is_empty());
        assert!(!c.is_collapsed);
    }

    #[test]
    fn test_block_ops_without_current_prompt_are_noops() {
        let mut store = PromptStore::new();
        assert!(store.add_block(BlockType::Role, None).is_none());
        assert!(store.delete_block("x").is_none());
        assert!(store.duplicate_block("x").is_none());
        assert!(!store.update_block_content("x", "y"));
        assert!(!store.reorder_blocks("x", None));
        assert!(store.toggle_block_collapse("x").is_none());
    }

    #[test]
    fn test_delete_unknown_block_does_not_touch() {
        let mut store = store_with_prompt();
        store.add_block(BlockType::Role, None);
        let before = store.current_prompt().unwrap().clone();
        assert!(store.delete_block("missing").is_none());
        assert_eq!(store.current_prompt().unwrap(), &before);
    }

    #[test]
    fn test_duplicate_block_inserted_after_original() {
        let mut store = store_with_prompt();
        let a = store.add_block(BlockType::Role, None).unwrap();
        let b = store.add_block(BlockType::Instruction, None).unwrap();
        store.update_block_content(&a.id, "You are terse.");

        let copy = store.duplicate_block(&a.id).unwrap();
        assert_ne!(copy.id, a.id);
        assert_eq!(copy.block_type, BlockType::Role);
        assert_eq!(copy.content, "You are terse.");
        assert_eq!(block_ids(&store), vec![a.id, copy.id, b.id]);
    }

    #[test]
    fn test_update_block_content_bumps_updated_at() {
        let mut store = store_with_prompt();
        let block = store.add_block(BlockType::Instruction, None).unwrap();
        let past = Utc::now() - Duration::hours(1);
        {
            let prompt = store.current_prompt_mut().unwrap();
            prompt.created_at = past;
            prompt.updated_at = past;
        }
        assert!(store.update_block_content(&block.id, "Say hi"));
        let prompt = store.current_prompt().unwrap();
        assert!(prompt.updated_at > past);
        assert_eq!(prompt.blocks[0].content, "Say hi");
        assert!(!store.update_block_content("missing", "x"));
    }

    #[test]
    fn test_reorder_before_target_and_to_end() {
        let mut store = store_with_prompt();
        let a = store.add_block(BlockType::Role, None).unwrap().id;
        let b = store.add_block(BlockType::Instruction, None).unwrap().id;
        let c = store.add_block(BlockType::Context, None).unwrap().id;

        assert!(store.reorder_blocks(&c, Some(&a)));
        assert_eq!(block_ids(&store), vec![c.clone(), a.clone(), b.clone()]);

        assert!(store.reorder_blocks(&c, None));
        assert_eq!(block_ids(&store), vec![a.clone(), b.clone(), c.clone()]);

        assert!(store.reorder_blocks(&a, Some("unknown")));
        assert_eq!(block_ids(&store), vec![b.clone(), c.clone(), a.clone()]);

        assert!(!store.reorder_blocks("unknown", Some(&a)));
        assert_eq!(block_ids(&store), vec![b, c, a]);
    }

    #[test]
    fn test_toggle_collapse_leaves_updated_at() {
        let mut store = store_with_prompt();
        let block = store.add_block(BlockType::Role, None).unwrap();
        let before = store.current_prompt().unwrap().updated_at;
        assert_eq!(store.toggle_block_collapse(&block.id), Some(true));
        assert_eq!(store.toggle_block_collapse(&block.id), Some(false));
        assert_eq!(store.current_prompt().unwrap().updated_at, before);
    }

    #[test]
    fn test_block_sequence_keeps_ids_unique() {
        let mut store = store_with_prompt();
        let mut expected: Vec<String> = Vec::new();
        for i in 0..20 {
            let block_type = BlockType::ALL[i % BlockType::ALL.len()];
            let block = store.add_block(block_type, Some(i / 2)).unwrap();
            expected.insert((i / 2).min(expected.len()), block.id);
            if i % 3 == 0 {
                let victim = expected.remove(0);
                store.delete_block(&victim);
            }
            if i % 4 == 0 && expected.len() > 1 {
                let dragged = expected.remove(expected.len() - 1);
                let target = expected[0].clone();
                store.reorder_blocks(&dragged, Some(&target));
                expected.insert(0, dragged);
            }
        }
        let ids = block_ids(&store);
        assert_eq!(ids, expected);
        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_import_skips_existing_and_batch_duplicates() {
        let mut store = store_with_prompt();
        let existing = store.current_prompt().unwrap().clone();
        let fresh = Prompt::new("Fresh");
        let batch = vec![existing, fresh.clone(), fresh.clone()];

        assert_eq!(store.import_prompts(batch.clone()), 1);
        assert_eq!(store.len(), 2);
        // idempotent by id
        assert_eq!(store.import_prompts(batch), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_import_into_empty_selects_first() {
        let mut store = PromptStore::new();
        let prompt = Prompt::new("Imported");
        store.import_prompts(vec![prompt.clone()]);
        assert_eq!(store.current_prompt_id(), Some(prompt.id.as_str()));
    }

    #[test]
    fn test_prompts_by_recency() {
        let mut store = PromptStore::new();
        let a = store.create_prompt("A");
        let b = store.create_prompt("B");
        store.load_prompt(&a.id);
        {
            let prompt = store.current_prompt_mut().unwrap();
            prompt.updated_at = Utc::now() + Duration::seconds(5);
        }
        let order: Vec<&str> = store.prompts_by_recency().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec![a.id.as_str(), b.id.as_str()]);
    }

    #[test]
    fn test_assembled_scenario() {
        let mut store = PromptStore::new();
        store.create_prompt("Demo");
        let block = store.add_block(BlockType::Instruction, None).unwrap();
        store.update_block_content(&block.id, "Say hi");
        assert_eq!(store.assembled_prompt().as_deref(), Some("// INSTRUCTION\nSay hi"));
    }

    #[test]
    fn test_json_prompt_rejects_block_ops() {
        let mut store = PromptStore::new();
        let prompt = store.save_json_prompt("Scene", "{\"a\": 1}");
        assert_eq!(store.current_prompt_id(), Some(prompt.id.as_str()));
        assert!(store.add_block(BlockType::Role, None).is_none());
        assert_eq!(store.assembled_prompt().as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_load_generated_prompt() {
        let mut store = store_with_prompt();
        store.set_view(View::AiCreation);
        let generated = Prompt::with_blocks("Gen", [(BlockType::Role, "r")]);
        let id = store.load_generated_prompt(generated.clone());
        assert_eq!(id, generated.id);
        assert_eq!(store.prompts()[0].id, id);
        assert_eq!(store.current_view(), View::Editor);

        // committing the same generation twice does not collide
        let second = store.load_generated_prompt(generated);
        assert_ne!(second, id);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_use_gallery_prompt_copies() {
        let mut store = PromptStore::new();
        let example = Prompt::with_blocks("Example", [(BlockType::Role, "r")]);
        let copy = store.use_gallery_prompt(&example);
        assert_ne!(copy.id, example.id);
        assert_ne!(copy.blocks[0].id, example.blocks[0].id);
        assert_eq!(store.current_prompt_id(), Some(copy.id.as_str()));
    }

    #[test]
    fn test_clear() {
        let mut store = store_with_prompt();
        store.create_prompt("Other");
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert!(store.current_prompt_id().is_none());
    }

    #[test]
    fn test_move_block_onto_itself_appends() {
        let mut blocks = vec![
            Block::new(BlockType::Role),
            Block::new(BlockType::Context),
        ];
        let first = blocks[0].id.clone();
        assert!(move_block(&mut blocks, &first, Some(&first)));
        assert_eq!(blocks[1].id, first);
    }
}
