// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! docsync keeps editor documents in sync with a language server.
//!
//! It turns host open/edit/save/close events into versioned
//! `textDocument/*` notifications, using full or incremental sync depending
//! on what the server declared.

/// Terminal output helpers for the CLI.
pub mod cli;
/// Configuration loading.
pub mod config;
/// Error types.
pub mod error;
/// Host editor interfaces consumed by the sync core.
pub mod host;
/// Language identifier derivation.
pub mod language;
/// Notification framing and the outgoing transport.
pub mod lsp;
/// Scripted editor sessions for replaying through a coordinator.
pub mod replay;
/// The synchronization engine.
pub mod sync;
/// Path to URI conversion.
pub mod uri;

pub use error::SyncError;
pub use host::{DocumentEvent, DocumentId, HostDocument, HostEdit, HostEvent};
pub use sync::{DocumentSession, SessionOptions, SyncCoordinator, SyncStrategy};
