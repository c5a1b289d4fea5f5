//! Streamed Section Parsing Integration Tests
//!
//! Realistic model output, split at awkward points, parsed into a
//! generation session and committed to the store.

use prompt_studio::models::block::BlockType;
use prompt_studio::services::ai::AiGenerationState;
use prompt_studio::services::block_stream::{parse_sections, BlockStream, Section, SectionParser};
use prompt_studio::services::store::PromptStore;

const RESPONSE: &str = "Here is your prompt:\n\
<<<NAME>>>\n\
Travel Planner\n\
<<<Role>>>\n\
You are an experienced travel agent.\n\
<<<Context>>>\n\
The traveller has a budget of $2000.\n\
\n\
They prefer trains over planes.\n\
<<<Tone>>>\n\
Cheerful.\n\
<<<Instruction>>>\n\
Plan a one-week trip to Italy.\n";

fn chunks(text: &str, size: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

#[test]
fn test_every_chunking_gives_the_same_sections() {
    let expected = parse_sections(RESPONSE);
    assert_eq!(expected.len(), 4);
    for size in [1, 2, 3, 5, 8, 13, 64] {
        let streamed: Vec<Section> = BlockStream::new(chunks(RESPONSE, size).into_iter()).collect();
        assert_eq!(streamed, expected, "chunk size {}", size);
    }
}

#[test]
fn test_session_from_stream_commits_to_store() {
    let mut parser = SectionParser::new();
    let mut session = AiGenerationState::start("a travel planner");
    for chunk in chunks(RESPONSE, 7) {
        let completed = parser.feed(&chunk);
        session.apply_sections(completed);
        session.pending = parser.pending();
        session.raw_content.push_str(&chunk);
    }
    session.apply_sections(parser.finish());
    session.pending = None;
    session.is_generating = false;
    session.is_finished = true;

    assert_eq!(session.generated_name, "Travel Planner");
    let types: Vec<BlockType> = session.generated_blocks.iter().map(|b| b.block_type).collect();
    assert_eq!(types, vec![BlockType::Role, BlockType::Context, BlockType::Instruction]);
    assert_eq!(
        session.generated_blocks[1].content,
        "The traveller has a budget of $2000.\n\nThey prefer trains over planes."
    );
    assert_eq!(session.raw_content, RESPONSE);

    let mut store = PromptStore::new();
    let prompt = session.to_prompt().unwrap();
    let id = store.load_generated_prompt(prompt);
    let stored = store.get(&id).unwrap();
    assert_eq!(stored.name, "Travel Planner");
    assert_eq!(stored.blocks.len(), 3);
    assert_eq!(store.current_prompt_id(), Some(id.as_str()));
}

#[test]
fn test_pending_preview_tracks_open_section() {
    let mut parser = SectionParser::new();
    parser.feed("<<<NAME>>>\nDemo\n<<<Constraint>>>\nNo more than");
    assert_eq!(
        parser.pending(),
        Some(Section::Block {
            block_type: BlockType::Constraint,
            content: "No more than".to_string(),
        })
    );
    parser.feed(" 100 words.");
    let done = parser.finish();
    assert_eq!(
        done,
        vec![Section::Block {
            block_type: BlockType::Constraint,
            content: "No more than 100 words.".to_string(),
        }]
    );
}
