// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Error types for the synchronization core.

use lsp_types::TextDocumentSyncKind;
use std::path::PathBuf;

/// Failures surfaced by the synchronization core.
///
/// Expected transient states (a document without a path, a repeated
/// dispose) are not errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The server does not accept document sync through this engine.
    #[error("server text document sync kind {0:?} cannot be adapted")]
    Unsupported(TextDocumentSyncKind),

    /// A document path could not be turned into a `file://` URI.
    #[error("path cannot be expressed as a URI: {}", path.display())]
    InvalidPath {
        /// The offending path.
        path: PathBuf,
    },

    /// The URI produced for a path was rejected by the URI parser.
    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri {
        /// The rejected URI text.
        uri: String,
        /// Parser message.
        reason: String,
    },
}

/// Convenience alias used across the sync modules.
pub type Result<T> = std::result::Result<T, SyncError>;
