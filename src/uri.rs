// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Conversion from persisted document paths to LSP URIs.

use lsp_types::Uri;
use std::path::Path;
use std::sync::Arc;

use crate::error::{Result, SyncError};

/// Injected path → URI conversion.
///
/// Only ever invoked for documents that have a path.
pub type IdentityFn = Arc<dyn Fn(&Path) -> Result<Uri> + Send + Sync>;

/// Converts an absolute path into a percent-encoded `file://` URI.
///
/// # Errors
///
/// Returns [`SyncError::InvalidPath`] for relative paths and
/// [`SyncError::InvalidUri`] if the result does not parse as a URI.
pub fn path_to_uri(path: &Path) -> Result<Uri> {
    let url = url::Url::from_file_path(path).map_err(|()| SyncError::InvalidPath {
        path: path.to_path_buf(),
    })?;

    url.as_str().parse().map_err(|e| SyncError::InvalidUri {
        uri: url.to_string(),
        reason: format!("{e:?}"),
    })
}

/// The default [`IdentityFn`], backed by [`path_to_uri`].
#[must_use]
pub fn file_identity() -> IdentityFn {
    Arc::new(path_to_uri)
}
