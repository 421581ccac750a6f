/*
 * Copyright (C) 2026 Mark Wells Dev
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! CLI utilities for terminal output formatting and colors.

use crossterm::tty::IsTty;
use lsp_types::{
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, FileChangeType,
    TextDocumentContentChangeEvent,
};
use std::io::stdout;

use crate::lsp::NotificationMessage;

/// Configuration for color output
#[derive(Debug, Clone)]
pub struct ColorConfig {
    /// Whether ANSI escapes are emitted.
    pub enabled: bool,
}

impl ColorConfig {
    /// Create a new `ColorConfig`, auto-detecting TTY unless nocolor is true
    #[must_use]
    pub fn new(nocolor: bool) -> Self {
        Self {
            enabled: !nocolor && stdout().is_tty(),
        }
    }

    fn paint(&self, code: &str, s: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    /// ANSI escape code for green (versions)
    #[must_use]
    pub fn green(&self, s: &str) -> String {
        self.paint("32", s)
    }

    /// ANSI escape code for blue (method names)
    #[must_use]
    pub fn blue(&self, s: &str) -> String {
        self.paint("34", s)
    }

    /// ANSI escape code for cyan (language names)
    #[must_use]
    pub fn cyan(&self, s: &str) -> String {
        self.paint("36", s)
    }

    /// ANSI escape code for dim text
    #[must_use]
    pub fn dim(&self, s: &str) -> String {
        self.paint("2", s)
    }
}

/// Get the terminal width, defaulting to 80 if unable to detect
#[must_use]
pub fn terminal_width() -> usize {
    crossterm::terminal::size().map_or(80, |(w, _)| usize::from(w))
}

/// Truncate a string to `max_len` characters, adding "..." if truncated
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }
    let kept: String = s.chars().take(max_len - 3).collect();
    format!("{kept}...")
}

/// Renders a notification as one human-readable line.
///
/// Text payloads are shown escaped and cut to `width` characters.
#[must_use]
pub fn summarize(message: &NotificationMessage, colors: &ColorConfig, width: usize) -> String {
    let method = message
        .method
        .rsplit_once('/')
        .map_or(message.method.as_str(), |(_, name)| name);
    let head = colors.blue(&format!("{method:<22}"));

    let body = match message.method.as_str() {
        "textDocument/didOpen" => message
            .params::<DidOpenTextDocumentParams>()
            .ok()
            .map(|p| {
                format!(
                    "{} {} {} {}",
                    p.text_document.uri.as_str(),
                    colors.green(&format!("v{}", p.text_document.version)),
                    colors.cyan(&p.text_document.language_id),
                    colors.dim(&preview(&p.text_document.text, width)),
                )
            }),
        "textDocument/didChange" => message
            .params::<DidChangeTextDocumentParams>()
            .ok()
            .map(|p| {
                let changes: Vec<String> = p
                    .content_changes
                    .iter()
                    .map(|c| describe_change(c, width))
                    .collect();
                format!(
                    "{} {} {}",
                    p.text_document.uri.as_str(),
                    colors.green(&format!("v{}", p.text_document.version)),
                    colors.dim(&changes.join(" ")),
                )
            }),
        "textDocument/didSave" => message
            .params::<DidSaveTextDocumentParams>()
            .ok()
            .map(|p| p.text_document.uri.as_str().to_string()),
        "workspace/didChangeWatchedFiles" => message
            .params::<DidChangeWatchedFilesParams>()
            .ok()
            .map(|p| {
                p.changes
                    .iter()
                    .map(|e| format!("{} {}", e.uri.as_str(), change_type(e.typ)))
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
        "textDocument/didClose" => message
            .params::<DidCloseTextDocumentParams>()
            .ok()
            .map(|p| p.text_document.uri.as_str().to_string()),
        _ => None,
    };

    format!(
        "{head} {}",
        body.unwrap_or_else(|| truncate(&message.params.to_string(), width))
    )
}

fn describe_change(change: &TextDocumentContentChangeEvent, width: usize) -> String {
    match change.range {
        Some(range) => format!(
            "[{}:{}-{}:{} -{}] {}",
            range.start.line,
            range.start.character,
            range.end.line,
            range.end.character,
            change.range_length.unwrap_or_default(),
            preview(&change.text, width),
        ),
        None => format!("[full] {}", preview(&change.text, width)),
    }
}

fn preview(text: &str, width: usize) -> String {
    truncate(&format!("{text:?}"), width)
}

fn change_type(typ: FileChangeType) -> &'static str {
    if typ == FileChangeType::CREATED {
        "created"
    } else if typ == FileChangeType::DELETED {
        "deleted"
    } else {
        "changed"
    }
}
