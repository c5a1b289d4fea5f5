//! Block Commands
//!
//! Block edits on the current prompt. Each returns what it changed, or
//! `None`/`false` when the target does not exist.

use crate::models::block::{Block, BlockType};
use crate::models::response::CommandResponse;
use crate::state::AppState;

pub async fn add_block(block_type: BlockType, index: Option<usize>, state: &AppState) -> CommandResponse<Option<Block>> {
    CommandResponse::ok(state.mutate_store(|s| s.add_block(block_type, index)).await)
}

pub async fn delete_block(block_id: String, state: &AppState) -> CommandResponse<Option<Block>> {
    CommandResponse::ok(state.mutate_store(|s| s.delete_block(&block_id)).await)
}

pub async fn duplicate_block(block_id: String, state: &AppState) -> CommandResponse<Option<Block>> {
    CommandResponse::ok(state.mutate_store(|s| s.duplicate_block(&block_id)).await)
}

pub async fn update_block_content(block_id: String, content: String, state: &AppState) -> CommandResponse<bool> {
    CommandResponse::ok(
        state
            .mutate_store(|s| s.update_block_content(&block_id, &content))
            .await,
    )
}

/// Drop `dragged_id` before `target_id`, or at the end without a target
pub async fn reorder_blocks(dragged_id: String, target_id: Option<String>, state: &AppState) -> CommandResponse<bool> {
    CommandResponse::ok(
        state
            .mutate_store(|s| s.reorder_blocks(&dragged_id, target_id.as_deref()))
            .await,
    )
}

/// Returns the new collapsed flag
pub async fn toggle_block_collapse(block_id: String, state: &AppState) -> CommandResponse<Option<bool>> {
    CommandResponse::ok(state.mutate_store(|s| s.toggle_block_collapse(&block_id)).await)
}
