// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Language identifiers sent in `textDocument/didOpen`.

use std::collections::HashMap;
use std::path::Path;

/// Derives the LSP language identifier for a document.
///
/// The grammar label is lower-cased and looked up in `overrides`. Documents
/// without a grammar label fall back to detection by file extension.
#[must_use]
pub fn language_id(
    grammar: &str,
    path: Option<&Path>,
    overrides: &HashMap<String, String>,
) -> String {
    let label = grammar.trim().to_lowercase();

    if let Some(mapped) = overrides.get(&label) {
        return mapped.clone();
    }

    if label.is_empty() {
        return path.map_or("plaintext", detect_language_id).to_string();
    }

    label
}

/// Maps a file extension to its conventional language identifier.
#[must_use]
pub fn detect_language_id(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("rs") => "rust",
        Some("go") => "go",
        Some("py") => "python",
        Some("js") => "javascript",
        Some("ts") => "typescript",
        Some("tsx") => "typescriptreact",
        Some("jsx") => "javascriptreact",
        Some("c") => "c",
        Some("cpp" | "cc" | "cxx" | "h" | "hpp") => "cpp",
        Some("java") => "java",
        Some("rb") => "ruby",
        Some("sh" | "bash" | "zsh") => "shellscript",
        Some("json") => "json",
        Some("yaml" | "yml") => "yaml",
        Some("toml") => "toml",
        Some("md") => "markdown",
        Some("html") => "html",
        Some("css") => "css",
        Some("lua") => "lua",
        Some("sql") => "sql",
        _ => "plaintext",
    }
}
