//! Prompt loading from newline-delimited JSON record files.
//!
//! Each line is one record with a `messages` array of conversational turns.
//! Only the first two turns are retained — the fixed context-plus-instruction
//! prefix this harness evaluates against. Any further turns in the source
//! record are ignored.
//!
//! Loading is fail-closed: the first malformed line fails the whole load.
//! Silently skipping a line would desynchronize result indices from the
//! source records.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Conversational turns retained per record.
pub const RETAINED_TURNS: usize = 2;

/// Errors raised while loading the prompt file.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("failed to read input file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

/// Typed chat roles. An unknown role string is a malformed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    /// Wire name of the role, as it appears in record files and templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// One unit of work: the retained prefix of a source record's conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub messages: Vec<ChatMessage>,
}

/// Shape of one input line. Extra fields in source records are ignored.
#[derive(Deserialize)]
struct RawRecord {
    messages: Vec<ChatMessage>,
}

/// Load all prompt records from a newline-delimited JSON file.
///
/// Preserves input order; the returned position of each record defines its
/// `prompt_index` for all downstream results. Whitespace-only lines are
/// skipped — they carry no record.
pub fn load_prompts(path: &Path) -> Result<Vec<PromptRecord>, PromptError> {
    let raw = fs::read_to_string(path).map_err(|source| PromptError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: RawRecord =
            serde_json::from_str(line).map_err(|e| PromptError::MalformedRecord {
                line: idx + 1,
                reason: e.to_string(),
            })?;
        if record.messages.is_empty() {
            return Err(PromptError::MalformedRecord {
                line: idx + 1,
                reason: "messages array is empty".into(),
            });
        }
        let mut messages = record.messages;
        messages.truncate(RETAINED_TURNS);
        records.push(PromptRecord { messages });
    }

    debug!(count = records.len(), path = %path.display(), "loaded prompt records");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_lines(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn keeps_first_two_turns_only() {
        let file = write_lines(&[concat!(
            r#"{"messages": [{"role": "system", "content": "a"}, "#,
            r#"{"role": "user", "content": "b"}, "#,
            r#"{"role": "assistant", "content": "c"}]}"#
        )]);
        let records = load_prompts(file.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].messages.len(), 2);
        assert_eq!(records[0].messages[1].content, "b");
    }

    #[test]
    fn single_turn_record_is_kept() {
        let file = write_lines(&[r#"{"messages": [{"role": "user", "content": "hi"}]}"#]);
        let records = load_prompts(file.path()).unwrap();
        assert_eq!(records[0].messages.len(), 1);
    }

    #[test]
    fn empty_messages_is_malformed() {
        let file = write_lines(&[r#"{"messages": []}"#]);
        assert!(matches!(
            load_prompts(file.path()),
            Err(PromptError::MalformedRecord { line: 1, .. })
        ));
    }

    #[test]
    fn unknown_role_is_malformed() {
        let file = write_lines(&[r#"{"messages": [{"role": "tool", "content": "x"}]}"#]);
        assert!(load_prompts(file.path()).is_err());
    }

    #[test]
    fn reports_line_number_of_first_bad_record() {
        let file = write_lines(&[
            r#"{"messages": [{"role": "user", "content": "ok"}]}"#,
            "not json",
        ]);
        match load_prompts(file.path()) {
            Err(PromptError::MalformedRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected malformed record, got {other:?}"),
        }
    }
}
