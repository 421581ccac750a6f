// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Reading the server's text document sync capability.

use lsp_types::{
    ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncSaveOptions,
};

/// How a session reports edits to the server.
///
/// Picked once from the server's capability and fixed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Every change resends the whole document.
    Full,
    /// Every change sends only the edited regions.
    Incremental,
}

impl SyncStrategy {
    /// Maps a declared sync kind to a strategy.
    ///
    /// `NONE` and unrecognized values have no strategy.
    #[must_use]
    pub fn from_kind(kind: TextDocumentSyncKind) -> Option<Self> {
        if kind == TextDocumentSyncKind::FULL {
            Some(Self::Full)
        } else if kind == TextDocumentSyncKind::INCREMENTAL {
            Some(Self::Incremental)
        } else {
            None
        }
    }

    /// The sync kind that selects this strategy.
    #[must_use]
    pub const fn kind(self) -> TextDocumentSyncKind {
        match self {
            Self::Full => TextDocumentSyncKind::FULL,
            Self::Incremental => TextDocumentSyncKind::INCREMENTAL,
        }
    }
}

/// Extracts the change sync kind a server advertised.
///
/// A missing capability, or options without a `change` field, mean `NONE`.
#[must_use]
pub fn sync_kind(capabilities: &ServerCapabilities) -> TextDocumentSyncKind {
    match &capabilities.text_document_sync {
        Some(TextDocumentSyncCapability::Kind(kind)) => *kind,
        Some(TextDocumentSyncCapability::Options(options)) => {
            options.change.unwrap_or(TextDocumentSyncKind::NONE)
        }
        None => TextDocumentSyncKind::NONE,
    }
}

/// Whether the server asked for the document text in `didSave`.
#[must_use]
pub fn save_include_text(capabilities: &ServerCapabilities) -> bool {
    let Some(TextDocumentSyncCapability::Options(options)) = &capabilities.text_document_sync
    else {
        return false;
    };

    matches!(
        &options.save,
        Some(TextDocumentSyncSaveOptions::SaveOptions(save)) if save.include_text == Some(true)
    )
}
