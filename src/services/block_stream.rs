//! Streamed Block Parser
//!
//! Incremental parser for AI output written in the section-delimiter
//! convention: a line `<<<LABEL>>>` opens a section that runs until the
//! next marker line. `NAME` labels the prompt name, any other label must be
//! a block type (matched case-insensitively). Sections with unknown labels,
//! text before the first marker, and empty sections are dropped.
//!
//! `SectionParser` is push-based (`feed` chunks as they arrive);
//! `BlockStream` wraps it as a pull-based iterator over any chunk iterator.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::models::block::{Block, BlockType};

pub const MARKER_OPEN: &str = "<<<";
pub const MARKER_CLOSE: &str = ">>>";
pub const NAME_LABEL: &str = "NAME";

/// A completed section of streamed output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Section {
    Name { name: String },
    Block { block_type: BlockType, content: String },
}

impl Section {
    pub fn into_block(self) -> Option<Block> {
        match self {
            Section::Block {
                block_type,
                content,
            } => Some(Block::with_content(block_type, content)),
            Section::Name { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Label {
    Name,
    Block(BlockType),
    Unknown(String),
}

/// Marker line label, if `line` is a marker
fn parse_marker(line: &str) -> Option<Label> {
    let label = line
        .trim()
        .strip_prefix(MARKER_OPEN)?
        .strip_suffix(MARKER_CLOSE)?
        .trim();
    if label.is_empty() {
        return None;
    }
    if label.eq_ignore_ascii_case(NAME_LABEL) {
        return Some(Label::Name);
    }
    Some(match label.parse::<BlockType>() {
        Ok(block_type) => Label::Block(block_type),
        Err(_) => Label::Unknown(label.to_string()),
    })
}

fn close_section(label: Label, content: &str) -> Option<Section> {
    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    match label {
        Label::Name => Some(Section::Name {
            name: content.to_string(),
        }),
        Label::Block(block_type) => Some(Section::Block {
            block_type,
            content: content.to_string(),
        }),
        Label::Unknown(label) => {
            tracing::debug!("[BlockStream] dropping section with unknown label {}", label);
            None
        }
    }
}

#[derive(Debug)]
struct OpenSection {
    label: Label,
    content: String,
}

/// Push-based incremental section parser
#[derive(Debug, Default)]
pub struct SectionParser {
    /// Trailing text with no newline yet
    partial: String,
    open: Option<OpenSection>,
}

impl SectionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the next chunk; returns the sections it completed
    pub fn feed(&mut self, chunk: &str) -> Vec<Section> {
        self.partial.push_str(chunk);
        let mut completed = Vec::new();
        while let Some(newline) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=newline).collect();
            self.consume_line(line.trim_end_matches(['\n', '\r']), &mut completed);
        }
        completed
    }

    fn consume_line(&mut self, line: &str, completed: &mut Vec<Section>) {
        if let Some(label) = parse_marker(line) {
            if let Some(open) = self.open.take() {
                completed.extend(close_section(open.label, &open.content));
            }
            self.open = Some(OpenSection {
                label,
                content: String::new(),
            });
        } else if let Some(open) = self.open.as_mut() {
            open.content.push_str(line);
            open.content.push('\n');
        }
    }

    /// The section still being written, for live preview.
    ///
    /// Includes the unterminated last line unless it could be the start of
    /// a marker.
    pub fn pending(&self) -> Option<Section> {
        let open = self.open.as_ref()?;
        let mut content = open.content.clone();
        if !self.partial.trim_start().starts_with('<') {
            content.push_str(&self.partial);
        }
        let content = content.trim().to_string();
        match &open.label {
            Label::Name => Some(Section::Name { name: content }),
            Label::Block(block_type) => Some(Section::Block {
                block_type: *block_type,
                content,
            }),
            Label::Unknown(_) => None,
        }
    }

    /// End of input: flush the last line and the open section
    pub fn finish(&mut self) -> Vec<Section> {
        let mut completed = Vec::new();
        let last = std::mem::take(&mut self.partial);
        if !last.is_empty() {
            self.consume_line(last.trim_end_matches('\r'), &mut completed);
        }
        if let Some(open) = self.open.take() {
            completed.extend(close_section(open.label, &open.content));
        }
        completed
    }
}

/// Parse a complete response in one go
pub fn parse_sections(text: &str) -> Vec<Section> {
    let mut parser = SectionParser::new();
    let mut sections = parser.feed(text);
    sections.extend(parser.finish());
    sections
}

/// Pull-based section iterator over a stream of text chunks
pub struct BlockStream<I> {
    chunks: I,
    parser: Option<SectionParser>,
    ready: VecDeque<Section>,
}

impl<I> BlockStream<I> {
    pub fn new(chunks: I) -> Self {
        Self {
            chunks,
            parser: Some(SectionParser::new()),
            ready: VecDeque::new(),
        }
    }
}

impl<I, S> Iterator for BlockStream<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Section;

    fn next(&mut self) -> Option<Section> {
        loop {
            if let Some(section) = self.ready.pop_front() {
                return Some(section);
            }
            let parser = self.parser.as_mut()?;
            match self.chunks.next() {
                Some(chunk) => self.ready.extend(parser.feed(chunk.as_ref())),
                None => {
                    self.ready.extend(parser.finish());
                    self.parser = None;
                }
            }
        }
    }
}
