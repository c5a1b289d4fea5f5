//! Import / Export
//!
//! Export writes one prompt or the whole collection as pretty JSON. Import
//! accepts the same file shapes (one prompt object or an array of them),
//! checks every candidate against the prompt schema, and hands the valid
//! ones to the store, which skips ids it already holds.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::store::PromptStore;
use crate::models::block::{Block, BlockType};
use crate::models::prompt::{Prompt, PromptFormat};
use crate::utils::error::{AppError, AppResult};
use crate::utils::json::{collection_export_file_name, export_file_name, to_pretty_json};
use crate::utils::paths::ensure_dir;

pub const INVALID_JSON_MESSAGE: &str = "Import failed. The file is not valid JSON.";
pub const INVALID_SHAPE_MESSAGE: &str =
    "Import failed. The file must contain a prompt object or an array of prompts.";
pub const NOTHING_TO_EXPORT_MESSAGE: &str = "There are no prompts to export.";

/// What is wrong with one field of a candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldIssue {
    Missing,
    WrongType { expected: String },
    Invalid { message: String },
}

/// A field path (`blocks[2].type`) with its issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProblem {
    pub field: String,
    #[serde(flatten)]
    pub issue: FieldIssue,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.issue {
            FieldIssue::Missing => write!(f, "{} is missing", self.field),
            FieldIssue::WrongType { expected } => {
                write!(f, "{} should be {}", self.field, expected)
            }
            FieldIssue::Invalid { message } => write!(f, "{} {}", self.field, message),
        }
    }
}

/// A rejected import candidate and every problem found in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateError {
    /// Position of the candidate in the imported list
    pub index: usize,
    /// The candidate's id, when it had a usable one
    pub id: Option<String>,
    pub problems: Vec<FieldProblem>,
}

impl fmt::Display for CandidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let problems: Vec<String> = self.problems.iter().map(ToString::to_string).collect();
        write!(f, "prompt #{}: {}", self.index, problems.join("; "))
    }
}

impl std::error::Error for CandidateError {}

/// Outcome of an import, as shown to the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub added: usize,
    pub skipped_duplicates: usize,
    pub rejected: Vec<CandidateError>,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Imported {} new prompt(s). Skipped {} duplicate(s).",
            self.added, self.skipped_duplicates
        );
        if !self.rejected.is_empty() {
            summary.push_str(&format!(" Rejected {} invalid prompt(s).", self.rejected.len()));
        }
        summary
    }
}

/// Parse an import file into its candidate values.
///
/// An object becomes a one-element list; anything other than an object or
/// an array is rejected as a whole.
pub fn parse_import(text: &str) -> AppResult<Vec<Value>> {
    let value: Value =
        serde_json::from_str(text).map_err(|_| AppError::validation(INVALID_JSON_MESSAGE))?;
    match value {
        Value::Array(items) => Ok(items),
        object @ Value::Object(_) => Ok(vec![object]),
        _ => Err(AppError::validation(INVALID_SHAPE_MESSAGE)),
    }
}

/// Field-level checker that collects problems instead of stopping at the first
struct Checker {
    problems: Vec<FieldProblem>,
}

impl Checker {
    fn push(&mut self, field: impl Into<String>, issue: FieldIssue) {
        self.problems.push(FieldProblem {
            field: field.into(),
            issue,
        });
    }

    fn wrong_type(&mut self, field: impl Into<String>, expected: &str) {
        self.push(
            field,
            FieldIssue::WrongType {
                expected: expected.to_string(),
            },
        );
    }

    fn invalid(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.push(
            field,
            FieldIssue::Invalid {
                message: message.into(),
            },
        );
    }

    /// Required non-empty string
    fn required_str(&mut self, object: &Map<String, Value>, key: &str, field: &str) -> Option<String> {
        match object.get(key) {
            None | Some(Value::Null) => {
                self.push(field, FieldIssue::Missing);
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.invalid(field, "must not be empty");
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.wrong_type(field, "a string");
                None
            }
        }
    }

    /// Optional string; absent or null is `Some(None)`, a wrong type is `None`
    fn optional_str(&mut self, object: &Map<String, Value>, key: &str, field: &str) -> Option<Option<String>> {
        match object.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => {
                self.wrong_type(field, "a string");
                None
            }
        }
    }

    fn timestamp(&mut self, object: &Map<String, Value>, key: &str) -> Option<Option<DateTime<Utc>>> {
        let raw = self.optional_str(object, key, key)?;
        match raw {
            None => Some(None),
            Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(at) => Some(Some(at.with_timezone(&Utc))),
                Err(_) => {
                    self.invalid(key, "is not an ISO-8601 timestamp");
                    None
                }
            },
        }
    }

    fn block(&mut self, value: &Value, index: usize) -> Option<Block> {
        let prefix = format!("blocks[{}]", index);
        let Value::Object(object) = value else {
            self.wrong_type(prefix, "an object");
            return None;
        };

        let id = self.required_str(object, "id", &format!("{}.id", prefix));
        let block_type = match object.get("type") {
            None | Some(Value::Null) => {
                self.push(format!("{}.type", prefix), FieldIssue::Missing);
                None
            }
            Some(Value::String(label)) => match label.parse::<BlockType>() {
                Ok(block_type) => Some(block_type),
                Err(e) => {
                    self.invalid(format!("{}.type", prefix), e.to_string());
                    None
                }
            },
            Some(_) => {
                self.wrong_type(format!("{}.type", prefix), "a string");
                None
            }
        };
        let content = self.optional_str(object, "content", &format!("{}.content", prefix));
        let is_collapsed = match object.get("isCollapsed") {
            None | Some(Value::Null) => Some(false),
            Some(Value::Bool(flag)) => Some(*flag),
            Some(_) => {
                self.wrong_type(format!("{}.isCollapsed", prefix), "a boolean");
                None
            }
        };

        Some(Block {
            id: id?,
            block_type: block_type?,
            content: content?.unwrap_or_default(),
            is_collapsed: is_collapsed?,
        })
    }
}

/// Check one candidate against the prompt schema.
///
/// Missing timestamps default to now and an `updatedAt` earlier than
/// `createdAt` is raised to it. Duplicate block ids reject the candidate.
pub fn validate_candidate(value: &Value, index: usize) -> Result<Prompt, CandidateError> {
    let mut checker = Checker {
        problems: Vec::new(),
    };

    let Value::Object(object) = value else {
        checker.wrong_type("prompt", "an object");
        return Err(CandidateError {
            index,
            id: None,
            problems: checker.problems,
        });
    };

    let id = checker.required_str(object, "id", "id");
    let name = checker.required_str(object, "name", "name");
    let created_at = checker.timestamp(object, "createdAt");
    let updated_at = checker.timestamp(object, "updatedAt");

    let format = match object.get("format") {
        None | Some(Value::Null) => Some(None),
        Some(raw) => match serde_json::from_value::<PromptFormat>(raw.clone()) {
            Ok(format) => Some(Some(format)),
            Err(_) => {
                checker.invalid("format", "must be \"blocks\" or \"json\"");
                None
            }
        },
    };
    let content = checker.optional_str(object, "content", "content");

    let blocks = match object.get("blocks") {
        None | Some(Value::Null) => {
            checker.push("blocks", FieldIssue::Missing);
            None
        }
        Some(Value::Array(items)) => {
            let parsed: Vec<Option<Block>> = items
                .iter()
                .enumerate()
                .map(|(i, item)| checker.block(item, i))
                .collect();
            parsed.into_iter().collect::<Option<Vec<Block>>>()
        }
        Some(_) => {
            checker.wrong_type("blocks", "an array");
            None
        }
    };

    if let Some(blocks) = &blocks {
        let mut seen = std::collections::HashSet::new();
        for (i, block) in blocks.iter().enumerate() {
            if !seen.insert(block.id.as_str()) {
                checker.invalid(format!("blocks[{}].id", i), "duplicates an earlier block id");
            }
        }
    }

    if let (Some(Some(PromptFormat::Json)), Some(None)) = (&format, &content) {
        checker.push("content", FieldIssue::Missing);
    }

    if !checker.problems.is_empty() {
        return Err(CandidateError {
            index,
            id,
            problems: checker.problems,
        });
    }

    // every field checked above without a problem
    let (Some(id), Some(name), Some(created_at), Some(updated_at), Some(format), Some(content), Some(blocks)) =
        (id, name, created_at, updated_at, format, content, blocks)
    else {
        return Err(CandidateError {
            index,
            id: None,
            problems: Vec::new(),
        });
    };

    let now = Utc::now();
    let created_at = created_at.unwrap_or(now);
    let updated_at = updated_at.unwrap_or(created_at).max(created_at);

    Ok(Prompt {
        id,
        name: name.trim().to_string(),
        created_at,
        updated_at,
        blocks,
        format,
        content,
    })
}

/// Split candidates into valid prompts and rejections
pub fn validate_candidates(values: &[Value]) -> (Vec<Prompt>, Vec<CandidateError>) {
    let mut valid = Vec::new();
    let mut rejected = Vec::new();
    for (index, value) in values.iter().enumerate() {
        match validate_candidate(value, index) {
            Ok(prompt) => valid.push(prompt),
            Err(e) => {
                tracing::warn!("[Import] rejected {}", e);
                rejected.push(e);
            }
        }
    }
    (valid, rejected)
}

/// Import a file's text into the store.
///
/// Invalid JSON or a wrong top-level shape is an error and leaves the store
/// untouched.
pub fn import_text(store: &mut PromptStore, text: &str) -> AppResult<ImportReport> {
    let candidates = parse_import(text)?;
    let (valid, rejected) = validate_candidates(&candidates);
    let offered = valid.len();
    let added = store.import_prompts(valid);

    let report = ImportReport {
        added,
        skipped_duplicates: offered - added,
        rejected,
    };
    tracing::info!("[Import] {}", report.summary());
    Ok(report)
}

/// A written export file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    pub path: PathBuf,
    pub file_name: String,
    pub bytes: usize,
}

fn write_export(dir: &Path, file_name: String, body: String) -> AppResult<ExportedFile> {
    ensure_dir(dir)?;
    let path = dir.join(&file_name);
    std::fs::write(&path, &body)?;
    tracing::info!("[Export] wrote {} ({} bytes)", path.display(), body.len());
    Ok(ExportedFile {
        path,
        file_name,
        bytes: body.len(),
    })
}

/// Write one prompt as `<sanitized name>.json` in `dir`
pub fn export_prompt(prompt: &Prompt, dir: &Path) -> AppResult<ExportedFile> {
    write_export(dir, export_file_name(&prompt.name), to_pretty_json(prompt)?)
}

/// Write the whole collection as `prompt-builder-export-YYYY-MM-DD.json`
pub fn export_collection(prompts: &[Prompt], dir: &Path, at: DateTime<Utc>) -> AppResult<ExportedFile> {
    if prompts.is_empty() {
        return Err(AppError::validation(NOTHING_TO_EXPORT_MESSAGE));
    }
    write_export(dir, collection_export_file_name(at), to_pretty_json(prompts)?)
}
