// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Conversion of host edit batches into `didChange` content changes.

use lsp_types::{Position, Range, TextDocumentContentChangeEvent};

use super::capability::SyncStrategy;
use crate::host::{HostEdit, TextPoint, TextRange};

/// Builds the content changes for one coalesced batch.
///
/// Returns `None` for an empty batch, which must not produce a notification.
/// `text` is only called for [`SyncStrategy::Full`].
pub fn content_changes<F>(
    strategy: SyncStrategy,
    batch: &[HostEdit],
    text: F,
) -> Option<Vec<TextDocumentContentChangeEvent>>
where
    F: FnOnce() -> String,
{
    if batch.is_empty() {
        return None;
    }

    let changes = match strategy {
        SyncStrategy::Full => vec![full_change(text())],
        SyncStrategy::Incremental => batch.iter().map(incremental_change).collect(),
    };
    Some(changes)
}

/// A change that replaces the whole document.
#[must_use]
pub const fn full_change(text: String) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: None,
        range_length: None,
        text,
    }
}

/// A change covering one host edit, in the pre-edit coordinate space.
#[must_use]
pub fn incremental_change(edit: &HostEdit) -> TextDocumentContentChangeEvent {
    TextDocumentContentChangeEvent {
        range: Some(to_lsp_range(edit.old_range)),
        range_length: Some(utf16_len(&edit.old_text)),
        text: edit.new_text.clone(),
    }
}

/// Converts a host range into an LSP range.
#[must_use]
pub const fn to_lsp_range(range: TextRange) -> Range {
    Range {
        start: to_lsp_position(range.start),
        end: to_lsp_position(range.end),
    }
}

const fn to_lsp_position(point: TextPoint) -> Position {
    Position {
        line: point.row,
        character: point.column,
    }
}

/// Length of `text` in UTF-16 code units, the unit of `rangeLength`.
fn utf16_len(text: &str) -> u32 {
    u32::try_from(text.encode_utf16().count()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(start: (u32, u32), end: (u32, u32), old: &str, new: &str) -> HostEdit {
        HostEdit {
            old_range: TextRange::new(
                TextPoint::new(start.0, start.1),
                TextPoint::new(end.0, end.1),
            ),
            old_text: old.to_string(),
            new_text: new.to_string(),
        }
    }

    #[test]
    fn test_empty_batch_yields_nothing() {
        assert!(content_changes(SyncStrategy::Incremental, &[], String::new).is_none());
        assert!(content_changes(SyncStrategy::Full, &[], || "abc".to_string()).is_none());
    }

    #[test]
    fn test_insert_at_origin() {
        let batch = vec![edit((0, 0), (0, 0), "", "x")];
        let changes =
            content_changes(SyncStrategy::Incremental, &batch, || unreachable!()).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].range,
            Some(Range::new(Position::new(0, 0), Position::new(0, 0)))
        );
        assert_eq!(changes[0].range_length, Some(0));
        assert_eq!(changes[0].text, "x");
    }

    #[test]
    fn test_one_change_per_edit_in_order() {
        let batch = vec![
            edit((0, 0), (0, 3), "foo", "bar"),
            edit((2, 1), (3, 0), "ine\n", ""),
            edit((5, 4), (5, 4), "", "baz"),
        ];
        let changes =
            content_changes(SyncStrategy::Incremental, &batch, || unreachable!()).unwrap();

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].range_length, Some(3));
        assert_eq!(changes[0].text, "bar");
        assert_eq!(
            changes[1].range,
            Some(Range::new(Position::new(2, 1), Position::new(3, 0)))
        );
        assert_eq!(changes[1].range_length, Some(4));
        assert_eq!(changes[1].text, "");
        assert_eq!(changes[2].text, "baz");
    }

    #[test]
    fn test_range_length_is_utf16() {
        // U+1F600 is two UTF-16 units, 'é' is one.
        let batch = vec![edit((0, 0), (0, 3), "é😀", "")];
        let changes =
            content_changes(SyncStrategy::Incremental, &batch, || unreachable!()).unwrap();
        assert_eq!(changes[0].range_length, Some(3));
    }

    #[test]
    fn test_full_sends_single_whole_text_change() {
        let batch = vec![edit((0, 0), (0, 0), "", "a"), edit((1, 0), (1, 0), "", "b")];
        let changes =
            content_changes(SyncStrategy::Full, &batch, || "a\nb\n".to_string()).unwrap();

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].range, None);
        assert_eq!(changes[0].range_length, None);
        assert_eq!(changes[0].text, "a\nb\n");
    }
}
