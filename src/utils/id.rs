//! Identifier generation

use uuid::Uuid;

/// Generate a new unique id for prompts and blocks
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
