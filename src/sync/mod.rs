// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// Server sync capability inspection and strategy selection.
pub mod capability;
/// Host edit to `didChange` content change conversion.
pub mod changes;
/// Session registry and host event routing.
pub mod coordinator;
/// Per-document version tracking and notification emission.
pub mod session;

pub use capability::{SyncStrategy, save_include_text, sync_kind};
pub use coordinator::{DocumentFilter, SyncCoordinator};
pub use session::{DocumentSession, SessionOptions, SessionState};
