// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Scripted editor sessions.
//!
//! A script is a JSON-lines file where each line is one host event:
//!
//! ```text
//! {"type":"open","document":1,"path":"/a.ts","grammar":"TypeScript","text":"let a;"}
//! {"type":"edit","document":1,"edits":[{"start":[0,0],"end":[0,0],"text":"x"}]}
//! {"type":"save","document":1}
//! {"type":"close","document":1}
//! ```
//!
//! Edits within one `edit` line form a single coalesced batch and are
//! applied in order.

use anyhow::{Context, Result, anyhow, bail};
use ropey::{Rope, RopeSlice};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use crate::host::{
    ChangeBatch, DocumentEvent, DocumentId, HostDocument, HostEdit, HostEvent, TextPoint,
    TextRange,
};
use crate::sync::SyncCoordinator;

/// One line of a replay script.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// The editor opened a document.
    Open {
        /// Document key.
        document: u64,
        /// Path on disk; omitted for a new, unsaved buffer.
        #[serde(default)]
        path: Option<PathBuf>,
        /// Grammar label.
        #[serde(default)]
        grammar: String,
        /// Initial contents.
        #[serde(default)]
        text: String,
    },
    /// The user edited a document.
    Edit {
        /// Document key.
        document: u64,
        /// Edits of one coalesced batch.
        #[serde(default)]
        edits: Vec<ScriptEdit>,
    },
    /// The document was saved, optionally to a new path.
    Save {
        /// Document key.
        document: u64,
        /// New path ("save as" or first save).
        #[serde(default)]
        path: Option<PathBuf>,
    },
    /// The tab was closed.
    Close {
        /// Document key.
        document: u64,
    },
}

/// A single replacement, positions as `[row, column]` in characters.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScriptEdit {
    /// Start of the replaced region.
    pub start: [u32; 2],
    /// End of the replaced region.
    pub end: [u32; 2],
    /// Replacement text.
    #[serde(default)]
    pub text: String,
}

/// Parses a JSON-lines script. Blank lines are skipped.
///
/// # Errors
///
/// Returns an error naming the first line that does not parse.
pub fn parse_script(input: &str) -> Result<Vec<ScriptStep>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid script step on line {}", index + 1))
        })
        .collect()
}

/// An in-memory document whose text lives in a rope.
pub struct ScriptedDocument {
    id: DocumentId,
    grammar: String,
    text: Mutex<Rope>,
    path: Mutex<Option<PathBuf>>,
}

impl ScriptedDocument {
    /// Creates a document with initial contents.
    #[must_use]
    pub fn new(id: DocumentId, path: Option<PathBuf>, grammar: &str, text: &str) -> Self {
        Self {
            id,
            grammar: grammar.to_string(),
            text: Mutex::new(Rope::from_str(text)),
            path: Mutex::new(path),
        }
    }

    /// Records that the document now lives at `path`.
    pub fn set_path(&self, path: PathBuf) {
        *self.path.lock().unwrap_or_else(PoisonError::into_inner) = Some(path);
    }

    /// Applies `edits` in order and returns the batch the host would report.
    ///
    /// Each edit's range and removed text refer to the document as it is
    /// when that edit is applied. The document is left untouched if any edit
    /// is out of bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a position lies outside the document or a range
    /// ends before it starts.
    pub fn apply(&self, edits: &[ScriptEdit]) -> Result<ChangeBatch> {
        let mut rope = self.text.lock().unwrap_or_else(PoisonError::into_inner);
        let mut scratch = rope.clone();
        let mut batch = Vec::with_capacity(edits.len());

        for edit in edits {
            let start = char_index(&scratch, edit.start)?;
            let end = char_index(&scratch, edit.end)?;
            if end < start {
                bail!("Edit ends before it starts: {:?}", edit);
            }

            let old_text = scratch.slice(start..end).to_string();
            scratch.remove(start..end);
            scratch.insert(start, &edit.text);

            batch.push(HostEdit {
                old_range: TextRange::new(
                    TextPoint::new(edit.start[0], edit.start[1]),
                    TextPoint::new(edit.end[0], edit.end[1]),
                ),
                old_text,
                new_text: edit.text.clone(),
            });
        }

        *rope = scratch;
        Ok(batch)
    }
}

impl HostDocument for ScriptedDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_string()
    }

    fn path(&self) -> Option<PathBuf> {
        self.path
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn grammar(&self) -> String {
        self.grammar.clone()
    }
}

/// Converts a `[row, column]` pair into a char index, checking bounds.
fn char_index(rope: &Rope, [row, column]: [u32; 2]) -> Result<usize> {
    let row = row as usize;
    let column = column as usize;

    if row >= rope.len_lines() {
        bail!("Row {} is past the end of the document", row);
    }
    let content_len = line_content_len(rope.line(row));
    if column > content_len {
        bail!("Column {} is past the end of row {}", column, row);
    }

    Ok(rope.line_to_char(row) + column)
}

/// Length of a line in chars, excluding its `\n` or `\r\n` terminator.
fn line_content_len(line: RopeSlice<'_>) -> usize {
    let mut len = line.len_chars();
    if len > 0 && line.char(len - 1) == '\n' {
        len -= 1;
    }
    if len > 0 && line.char(len - 1) == '\r' {
        len -= 1;
    }
    len
}

/// Drives a coordinator with script steps.
pub struct Replay {
    coordinator: SyncCoordinator,
    documents: HashMap<DocumentId, Arc<ScriptedDocument>>,
}

impl Replay {
    /// Wraps a coordinator.
    #[must_use]
    pub fn new(coordinator: SyncCoordinator) -> Self {
        Self {
            coordinator,
            documents: HashMap::new(),
        }
    }

    /// The coordinator being driven.
    #[must_use]
    pub const fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    /// Runs every step in order.
    ///
    /// # Errors
    ///
    /// Returns the first step error.
    pub fn run(&mut self, steps: Vec<ScriptStep>) -> Result<()> {
        for (index, step) in steps.into_iter().enumerate() {
            self.step(step)
                .with_context(|| format!("Replay failed at step {}", index + 1))?;
        }
        Ok(())
    }

    /// Applies one step to its document and forwards the host event.
    ///
    /// A document the coordinator refuses to observe is reported and
    /// skipped; it does not stop the replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the step opens a document that is already open,
    /// targets an unknown document, or contains an invalid edit.
    pub fn step(&mut self, step: ScriptStep) -> Result<()> {
        match step {
            ScriptStep::Open {
                document,
                path,
                grammar,
                text,
            } => {
                let id = DocumentId(document);
                if self.documents.contains_key(&id) {
                    bail!("Document {} is already open", id);
                }
                let doc = Arc::new(ScriptedDocument::new(id, path, &grammar, &text));
                self.documents.insert(id, doc.clone());
                if let Err(e) = self.coordinator.handle(HostEvent::Opened(doc)) {
                    warn!("Not syncing document {}: {}", id, e);
                }
            }
            ScriptStep::Edit { document, edits } => {
                let id = DocumentId(document);
                let batch = self.document(id)?.apply(&edits)?;
                debug!("Document {} edited ({} edits)", id, batch.len());
                self.dispatch(id, DocumentEvent::Changed(batch))?;
            }
            ScriptStep::Save { document, path } => {
                let id = DocumentId(document);
                if let Some(path) = path {
                    self.document(id)?.set_path(path);
                }
                self.dispatch(id, DocumentEvent::Saved)?;
            }
            ScriptStep::Close { document } => {
                let id = DocumentId(document);
                self.document(id)?;
                self.dispatch(id, DocumentEvent::Destroyed)?;
                self.documents.remove(&id);
            }
        }
        Ok(())
    }

    fn document(&self, id: DocumentId) -> Result<&Arc<ScriptedDocument>> {
        self.documents
            .get(&id)
            .ok_or_else(|| anyhow!("Document {} is not open", id))
    }

    fn dispatch(&mut self, id: DocumentId, event: DocumentEvent) -> Result<()> {
        self.coordinator
            .handle(HostEvent::Document { id, event })
            .map_err(Into::into)
    }
}
