//! Prompt Gallery
//!
//! Built-in example prompts. They are read-only and never persisted; a user
//! takes one into the collection with `PromptStore::use_gallery_prompt`.

use chrono::{DateTime, Utc};

use crate::models::block::{Block, BlockType};
use crate::models::prompt::Prompt;

struct GalleryEntry {
    id: &'static str,
    name: &'static str,
    created_at: &'static str,
    updated_at: &'static str,
    blocks: &'static [(&'static str, BlockType, &'static str)],
}

const ENTRIES: &[GalleryEntry] = &[
    GalleryEntry {
        id: "gallery_id_1",
        name: "Full-Stack App Scaffolder",
        created_at: "2025-07-03T20:57:27.680Z",
        updated_at: "2025-07-03T20:59:29.525Z",
        blocks: &[
            (
                "gallery_1_role",
                BlockType::Role,
                "You are a seasoned full-stack developer and UX designer. Your task is to architect and scaffold a single-page Prompt Builder web application that runs entirely in the browser, storing all data in local storage or IndexedDB. The app should follow modern best practices for component-based design, responsive layouts, and an intuitive user experience. Generate all necessary files and code snippets (HTML, CSS/Tailwind, JavaScript/React or vanilla JS, plus build tooling configuration) to realize the following detailed feature set and flow:",
            ),
            (
                "gallery_1_instruction",
                BlockType::Instruction,
                "I want to add a new page in my application (gallery page) /gallery.html. This will have a prompt gallery. A collection of prompts. Whenever I click on a gallery card, I should be able to see the preview of the prompt in the right hand sidebar.",
            ),
            (
                "gallery_1_constraint",
                BlockType::Constraint,
                "For code files which needs changes, give me code for the entire file and do not write comments. Follow the same coding style that I have written.",
            ),
        ],
    },
    GalleryEntry {
        id: "gallery_id_2",
        name: "Creative Story Writer",
        created_at: "2025-07-02T18:30:00.123Z",
        updated_at: "2025-07-02T19:00:00.456Z",
        blocks: &[
            (
                "block_role_story",
                BlockType::Role,
                "You are a master storyteller, capable of weaving intricate plots and developing compelling characters. Your style is reminiscent of classic fantasy authors, but with a modern, fast-paced narrative.",
            ),
            (
                "block_instr_story",
                BlockType::Instruction,
                "Write a short story (around 500 words) about a young cartographer who discovers a map that leads to a city that moves. The story should start with the discovery of the map and end as they take their first step on the journey.",
            ),
            (
                "block_context_story",
                BlockType::Context,
                "The world is a vast, unexplored continent where magic is rare and often misunderstood. The main character, Elara, lives in a remote port town and has always dreamed of adventure beyond the horizon.",
            ),
        ],
    },
    GalleryEntry {
        id: "gallery_id_3",
        name: "Technical Documentation Assistant",
        created_at: "2025-07-01T11:00:00.000Z",
        updated_at: "2025-07-01T11:25:10.987Z",
        blocks: &[
            (
                "block_role_tech",
                BlockType::Role,
                "You are a technical writer specializing in creating clear, concise, and user-friendly documentation for software APIs.",
            ),
            (
                "block_instr_tech",
                BlockType::Instruction,
                "Generate API documentation for the following JavaScript function. Include a brief description, parameter details (name, type, description), and a return value description. Provide a clear code example.",
            ),
            (
                "block_variable_tech",
                BlockType::Variable,
                "Function to document:\n```javascript\nfunction calculateDiscount(price, percentage) {\n  if (percentage < 0 || percentage > 100) {\n    throw new Error('Percentage must be between 0 and 100.');\n  }\n  return price - (price * (percentage / 100));\n}\n```",
            ),
        ],
    },
];

fn timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// The gallery prompts, in display order
pub fn gallery_prompts() -> Vec<Prompt> {
    ENTRIES
        .iter()
        .map(|entry| Prompt {
            id: entry.id.to_string(),
            name: entry.name.to_string(),
            created_at: timestamp(entry.created_at),
            updated_at: timestamp(entry.updated_at),
            blocks: entry
                .blocks
                .iter()
                .map(|(id, block_type, content)| Block {
                    id: id.to_string(),
                    block_type: *block_type,
                    content: content.to_string(),
                    is_collapsed: false,
                })
                .collect(),
            format: None,
            content: None,
        })
        .collect()
}

pub fn gallery_prompt(id: &str) -> Option<Prompt> {
    gallery_prompts().into_iter().find(|p| p.id == id)
}
