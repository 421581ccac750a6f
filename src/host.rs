// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Interfaces the editor host provides to the synchronization core.
//!
//! The host owns its documents. The core only sees them through
//! [`HostDocument`] and reacts to the events it is handed.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Opaque key for one document's editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A zero-based row/column position in the host's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct TextPoint {
    /// Zero-based line.
    pub row: u32,
    /// Zero-based column within the line.
    pub column: u32,
}

impl TextPoint {
    /// Creates a point.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

/// A half-open region between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextRange {
    /// First point covered by the range.
    pub start: TextPoint,
    /// Point just past the range.
    pub end: TextPoint,
}

impl TextRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(start: TextPoint, end: TextPoint) -> Self {
        Self { start, end }
    }

    /// An empty range at `point`, as produced by a pure insertion.
    #[must_use]
    pub const fn point(point: TextPoint) -> Self {
        Self {
            start: point,
            end: point,
        }
    }
}

/// One discrete edit, expressed against the text before the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEdit {
    /// Region replaced, in the old document's coordinates.
    pub old_range: TextRange,
    /// Text that was removed.
    pub old_text: String,
    /// Text that was inserted.
    pub new_text: String,
}

/// All edits the host coalesced into a single change notification.
pub type ChangeBatch = Vec<HostEdit>;

/// A document as exposed by the editor host.
pub trait HostDocument: Send + Sync {
    /// Key of this document's editing session.
    fn id(&self) -> DocumentId;

    /// Full current text.
    fn text(&self) -> String;

    /// Where the document is persisted, or `None` if it has never been saved.
    fn path(&self) -> Option<PathBuf>;

    /// Content-type or grammar label (e.g. `"TypeScript"`).
    fn grammar(&self) -> String;
}

/// Events the host delivers for a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    /// The buffer changed; carries every edit of one coalesced notification.
    Changed(ChangeBatch),
    /// The buffer was written to disk.
    Saved,
    /// The document was closed by the user.
    Destroyed,
}

impl DocumentEvent {
    /// Kind of event, used to check subscriptions.
    #[must_use]
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::Changed(_) => EventKind::Change,
            Self::Saved => EventKind::Save,
            Self::Destroyed => EventKind::Destroy,
        }
    }
}

/// Discriminant of [`DocumentEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// [`DocumentEvent::Changed`].
    Change,
    /// [`DocumentEvent::Saved`].
    Save,
    /// [`DocumentEvent::Destroyed`].
    Destroy,
}

/// Everything the host environment can report to a coordinator.
#[derive(Clone)]
pub enum HostEvent {
    /// A document was opened for editing.
    Opened(Arc<dyn HostDocument>),
    /// Something happened to an already opened document.
    Document {
        /// Which document.
        id: DocumentId,
        /// What happened.
        event: DocumentEvent,
    },
}

impl fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Opened(doc) => f.debug_tuple("Opened").field(&doc.id()).finish(),
            Self::Document { id, event } => f
                .debug_struct("Document")
                .field("id", id)
                .field("event", event)
                .finish(),
        }
    }
}
