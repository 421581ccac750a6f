// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Per-document synchronization session.

use lsp_types::{
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams, FileChangeType, FileEvent,
    TextDocumentIdentifier, TextDocumentItem, Uri, VersionedTextDocumentIdentifier,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

use super::capability::SyncStrategy;
use super::changes;
use crate::error::Result;
use crate::host::{DocumentEvent, DocumentId, EventKind, HostDocument, HostEdit};
use crate::language;
use crate::lsp::NotificationSink;
use crate::uri::IdentityFn;

/// Behaviour switches shared by every session of a coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionOptions {
    /// Send `didClose` when a session is disposed without its document
    /// having been destroyed.
    pub close_on_dispose: bool,
    /// Include the full text in `didSave`.
    pub save_include_text: bool,
    /// Grammar label (lower-cased) to language identifier overrides.
    pub language_overrides: HashMap<String, String>,
}

/// Lifecycle of a session as seen by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The document has no path yet; the server does not know about it.
    Unopened,
    /// `didOpen` was sent.
    Open,
    /// Terminal. No further notifications.
    Closed,
}

/// Keeps one open document in sync with the server.
pub struct DocumentSession {
    id: DocumentId,
    document: Weak<dyn HostDocument>,
    sink: Arc<dyn NotificationSink>,
    identity: IdentityFn,
    strategy: SyncStrategy,
    options: Arc<SessionOptions>,
    version: i32,
    state: SessionState,
    /// Identity the server currently has open.
    uri: Option<Uri>,
    subscriptions: HashSet<EventKind>,
}

impl DocumentSession {
    /// Creates the session and sends `didOpen` if the document has a path.
    ///
    /// # Errors
    ///
    /// Returns an error if the document's path cannot be converted to a URI.
    pub fn new(
        document: &Arc<dyn HostDocument>,
        strategy: SyncStrategy,
        sink: Arc<dyn NotificationSink>,
        identity: IdentityFn,
        options: Arc<SessionOptions>,
    ) -> Result<Self> {
        let mut session = Self {
            id: document.id(),
            document: Arc::downgrade(document),
            sink,
            identity,
            strategy,
            options,
            version: 1,
            state: SessionState::Unopened,
            uri: None,
            subscriptions: [EventKind::Change, EventKind::Save, EventKind::Destroy]
                .into_iter()
                .collect(),
        };
        session.open()?;
        Ok(session)
    }

    /// Document this session tracks.
    #[must_use]
    pub const fn id(&self) -> DocumentId {
        self.id
    }

    /// Version of the last notification sent (1 right after open).
    #[must_use]
    pub const fn version(&self) -> i32 {
        self.version
    }

    /// Lifecycle state as the server sees it.
    ///
    /// Disposing without `close_on_dispose` leaves this at `Open`: the server
    /// still holds the document even though the session no longer listens.
    /// Use [`Self::is_disposed`] to check for that.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The change strategy fixed at construction.
    #[must_use]
    pub const fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    /// True once all event subscriptions are gone, whether through close or
    /// dispose.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Reacts to a host event for this document.
    ///
    /// Events without a live subscription are ignored.
    pub fn handle(&mut self, event: &DocumentEvent) {
        if !self.subscriptions.contains(&event.kind()) {
            trace!("Session {} ignoring {:?}: not subscribed", self.id, event.kind());
            return;
        }

        match event {
            DocumentEvent::Changed(batch) => self.did_change(batch),
            DocumentEvent::Saved => self.did_save(),
            DocumentEvent::Destroyed => self.close(),
        }
    }

    /// Sends `didOpen` with version 1 if the document is addressable.
    fn open(&mut self) -> Result<()> {
        let Some(document) = self.document.upgrade() else {
            return Ok(());
        };
        let Some(path) = document.path() else {
            trace!("Document {} has no path yet, deferring didOpen", self.id);
            return Ok(());
        };

        let uri = (self.identity)(&path)?;
        self.version = 1;
        self.state = SessionState::Open;
        self.announce(document.as_ref(), &path, uri);
        Ok(())
    }

    /// Sends `didOpen` for `uri` at the current version.
    fn announce(&mut self, document: &dyn HostDocument, path: &Path, uri: Uri) {
        let language_id = language::language_id(
            &document.grammar(),
            Some(path),
            &self.options.language_overrides,
        );
        debug!("Opening document: {} ({})", uri.as_str(), language_id);

        self.uri = Some(uri.clone());
        self.sink.did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri,
                language_id,
                version: self.version,
                text: document.text(),
            },
        });
    }

    fn did_change(&mut self, batch: &[HostEdit]) {
        if self.state != SessionState::Open {
            trace!("Dropping change for {}: {:?}", self.id, self.state);
            return;
        }
        let Some(document) = self.document.upgrade() else {
            return;
        };
        let uri = match self.current_identity(document.as_ref()) {
            Some(Identity::Known(uri)) => uri,
            // The reopen already carried the edited text.
            Some(Identity::Moved(_)) | None => return,
        };
        let Some(content_changes) =
            changes::content_changes(self.strategy, batch, || document.text())
        else {
            trace!("Dropping empty change batch for {}", uri.as_str());
            return;
        };

        self.version += 1;
        trace!(
            "didChange {} v{} ({} changes)",
            uri.as_str(),
            self.version,
            content_changes.len()
        );

        self.sink.did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier {
                uri,
                version: self.version,
            },
            content_changes,
        });
    }

    fn did_save(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let Some(document) = self.document.upgrade() else {
            return;
        };

        // First save of a new document makes it addressable.
        if self.state == SessionState::Unopened {
            if let Err(e) = self.open() {
                warn!("Cannot open {} after save: {}", self.id, e);
                return;
            }
            if self.state != SessionState::Open {
                return;
            }
        }

        let Some(uri) = self.current_identity(document.as_ref()).map(Identity::into_uri) else {
            return;
        };
        let text = self.options.save_include_text.then(|| document.text());

        debug!("Document saved: {}", uri.as_str());
        self.sink.did_save(DidSaveTextDocumentParams {
            text_document: TextDocumentIdentifier { uri: uri.clone() },
            text,
        });
        self.sink.did_change_watched_files(DidChangeWatchedFilesParams {
            changes: vec![FileEvent::new(uri, FileChangeType::CHANGED)],
        });
    }

    /// Unsubscribes and sends `didClose` if the server knows the document.
    ///
    /// Runs at most once; later calls are no-ops.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        let was_open = self.state == SessionState::Open;
        self.subscriptions.clear();
        self.state = SessionState::Closed;

        if !was_open {
            return;
        }

        let Some(uri) = self.uri.clone() else {
            return;
        };

        debug!("Closing document: {}", uri.as_str());
        self.sink.did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier { uri },
        });
    }

    /// Drops every event subscription.
    ///
    /// Sends no `didClose` unless the options ask for it. Idempotent.
    pub fn dispose(&mut self) {
        if self.options.close_on_dispose {
            self.close();
            return;
        }
        if !self.subscriptions.is_empty() {
            trace!("Disposing session for {}", self.id);
            self.subscriptions.clear();
        }
    }

    /// Identity of the document right now, if it has a path.
    ///
    /// An open document whose path changed (e.g. "save as") is closed under
    /// its old identity and reopened under the new one first.
    fn current_identity(&mut self, document: &dyn HostDocument) -> Option<Identity> {
        let Some(path) = document.path() else {
            trace!("Document {} has no path", self.id);
            return None;
        };

        let uri = match (self.identity)(&path) {
            Ok(uri) => uri,
            Err(e) => {
                warn!("Skipping notification for {}: {}", self.id, e);
                return None;
            }
        };

        match self.uri.take() {
            Some(old) if old != uri => {
                debug!("Document moved: {} -> {}", old.as_str(), uri.as_str());
                self.sink.did_close(DidCloseTextDocumentParams {
                    text_document: TextDocumentIdentifier { uri: old },
                });
                self.announce(document, &path, uri.clone());
                Some(Identity::Moved(uri))
            }
            _ => {
                self.uri = Some(uri.clone());
                Some(Identity::Known(uri))
            }
        }
    }
}

/// Result of resolving a document's identity before a notification.
enum Identity {
    /// The server already has the document open under this URI.
    Known(Uri),
    /// The document was just reopened under this URI.
    Moved(Uri),
}

impl Identity {
    fn into_uri(self) -> Uri {
        match self {
            Self::Known(uri) | Self::Moved(uri) => uri,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{TextPoint, TextRange};
    use crate::lsp::{ChannelSink, NotificationMessage};
    use crate::uri;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct TestDocument {
        text: Mutex<String>,
        path: Mutex<Option<PathBuf>>,
    }

    impl TestDocument {
        fn new(path: Option<&str>, text: &str) -> Arc<Self> {
            Arc::new(Self {
                text: Mutex::new(text.to_string()),
                path: Mutex::new(path.map(PathBuf::from)),
            })
        }

        fn set_text(&self, text: &str) {
            *self.text.lock().unwrap() = text.to_string();
        }

        fn set_path(&self, path: &str) {
            *self.path.lock().unwrap() = Some(PathBuf::from(path));
        }
    }

    impl HostDocument for TestDocument {
        fn id(&self) -> DocumentId {
            DocumentId(1)
        }

        fn text(&self) -> String {
            self.text.lock().unwrap().clone()
        }

        fn path(&self) -> Option<PathBuf> {
            self.path.lock().unwrap().clone()
        }

        fn grammar(&self) -> String {
            "TypeScript".to_string()
        }
    }

    fn session(
        doc: &Arc<TestDocument>,
        strategy: SyncStrategy,
        options: SessionOptions,
    ) -> (DocumentSession, UnboundedReceiver<NotificationMessage>) {
        let (sink, rx) = ChannelSink::new();
        let doc: Arc<dyn HostDocument> = doc.clone();
        let session = DocumentSession::new(
            &doc,
            strategy,
            Arc::new(sink),
            uri::file_identity(),
            Arc::new(options),
        )
        .unwrap();
        (session, rx)
    }

    fn methods(rx: &mut UnboundedReceiver<NotificationMessage>) -> Vec<String> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|m| m.method)
            .collect()
    }

    fn insert(text: &str) -> DocumentEvent {
        DocumentEvent::Changed(vec![HostEdit {
            old_range: TextRange::point(TextPoint::new(0, 0)),
            old_text: String::new(),
            new_text: text.to_string(),
        }])
    }

    #[test]
    fn test_open_sends_version_one_and_lowercased_language() {
        let doc = TestDocument::new(Some("/a.ts"), "let a;");
        let (session, mut rx) = session(&doc, SyncStrategy::Incremental, SessionOptions::default());

        assert_eq!(session.state(), SessionState::Open);
        let open: DidOpenTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(open.text_document.uri.as_str(), "file:///a.ts");
        assert_eq!(open.text_document.language_id, "typescript");
        assert_eq!(open.text_document.version, 1);
        assert_eq!(open.text_document.text, "let a;");
    }

    #[test]
    fn test_version_increments_once_per_batch() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) =
            session(&doc, SyncStrategy::Incremental, SessionOptions::default());
        rx.try_recv().unwrap();

        let batch = DocumentEvent::Changed(vec![
            HostEdit {
                old_range: TextRange::point(TextPoint::new(0, 0)),
                old_text: String::new(),
                new_text: "a".to_string(),
            },
            HostEdit {
                old_range: TextRange::point(TextPoint::new(0, 1)),
                old_text: String::new(),
                new_text: "b".to_string(),
            },
        ]);
        session.handle(&batch);

        let change: DidChangeTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(change.text_document.version, 2);
        assert_eq!(change.content_changes.len(), 2);
        assert_eq!(session.version(), 2);
    }

    #[test]
    fn test_empty_batch_is_dropped() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) = session(&doc, SyncStrategy::Full, SessionOptions::default());
        rx.try_recv().unwrap();

        session.handle(&DocumentEvent::Changed(Vec::new()));
        assert!(rx.try_recv().is_err());
        assert_eq!(session.version(), 1);
    }

    #[test]
    fn test_full_sends_text_at_emission() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) = session(&doc, SyncStrategy::Full, SessionOptions::default());
        rx.try_recv().unwrap();

        doc.set_text("x");
        session.handle(&insert("x"));

        let change: DidChangeTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(change.text_document.version, 2);
        assert_eq!(change.content_changes.len(), 1);
        assert_eq!(change.content_changes[0].range, None);
        assert_eq!(change.content_changes[0].text, "x");
    }

    #[test]
    fn test_save_precedes_watched_file_event() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) =
            session(&doc, SyncStrategy::Incremental, SessionOptions::default());

        session.handle(&DocumentEvent::Saved);
        assert_eq!(
            methods(&mut rx),
            [
                "textDocument/didOpen",
                "textDocument/didSave",
                "workspace/didChangeWatchedFiles"
            ]
        );
        assert_eq!(session.version(), 1);
    }

    #[test]
    fn test_save_include_text() {
        let doc = TestDocument::new(Some("/a.ts"), "body");
        let options = SessionOptions {
            save_include_text: true,
            ..Default::default()
        };
        let (mut session, mut rx) = session(&doc, SyncStrategy::Incremental, options);
        rx.try_recv().unwrap();

        session.handle(&DocumentEvent::Saved);
        let save: DidSaveTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(save.text.as_deref(), Some("body"));

        let watched: DidChangeWatchedFilesParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(watched.changes[0].typ, FileChangeType::CHANGED);
    }

    #[test]
    fn test_unsaved_document_is_silent_until_first_save() {
        let doc = TestDocument::new(None, "");
        let (mut session, mut rx) =
            session(&doc, SyncStrategy::Incremental, SessionOptions::default());
        assert_eq!(session.state(), SessionState::Unopened);

        doc.set_text("x");
        session.handle(&insert("x"));
        assert!(rx.try_recv().is_err());
        assert_eq!(session.version(), 1);

        doc.set_path("/new.ts");
        session.handle(&DocumentEvent::Saved);

        let open: DidOpenTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(open.text_document.version, 1);
        assert_eq!(open.text_document.text, "x");
        assert_eq!(
            methods(&mut rx),
            ["textDocument/didSave", "workspace/didChangeWatchedFiles"]
        );
    }

    #[test]
    fn test_unsaved_document_close_is_silent() {
        let doc = TestDocument::new(None, "");
        let (mut session, mut rx) = session(&doc, SyncStrategy::Full, SessionOptions::default());

        session.handle(&DocumentEvent::Destroyed);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_destroy_closes_once_and_unsubscribes() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) =
            session(&doc, SyncStrategy::Incremental, SessionOptions::default());
        rx.try_recv().unwrap();

        session.handle(&DocumentEvent::Destroyed);
        session.handle(&DocumentEvent::Destroyed);
        session.handle(&insert("late"));
        session.dispose();
        session.dispose();

        assert_eq!(methods(&mut rx), ["textDocument/didClose"]);
        assert!(session.is_disposed());
    }

    #[test]
    fn test_dispose_without_close() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) =
            session(&doc, SyncStrategy::Incremental, SessionOptions::default());
        rx.try_recv().unwrap();

        session.dispose();
        session.dispose();
        session.handle(&insert("x"));
        session.handle(&DocumentEvent::Destroyed);

        assert!(rx.try_recv().is_err());
        // The server still holds the document; only the listeners are gone.
        assert_eq!(session.state(), SessionState::Open);
        assert!(session.is_disposed());
    }

    #[test]
    fn test_close_on_dispose() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let options = SessionOptions {
            close_on_dispose: true,
            ..Default::default()
        };
        let (mut session, mut rx) = session(&doc, SyncStrategy::Incremental, options);
        rx.try_recv().unwrap();

        session.dispose();
        session.dispose();
        assert_eq!(methods(&mut rx), ["textDocument/didClose"]);
    }

    #[test]
    fn test_close_uses_last_uri_when_document_dropped() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) =
            session(&doc, SyncStrategy::Incremental, SessionOptions::default());
        rx.try_recv().unwrap();

        drop(doc);
        session.handle(&DocumentEvent::Destroyed);

        let close: DidCloseTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(close.text_document.uri.as_str(), "file:///a.ts");
    }

    #[test]
    fn test_save_as_reopens_under_new_identity() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) =
            session(&doc, SyncStrategy::Incremental, SessionOptions::default());
        rx.try_recv().unwrap();
        doc.set_text("x");
        session.handle(&insert("x"));
        rx.try_recv().unwrap();

        doc.set_path("/b.ts");
        session.handle(&DocumentEvent::Saved);

        let close: DidCloseTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(close.text_document.uri.as_str(), "file:///a.ts");
        let open: DidOpenTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(open.text_document.uri.as_str(), "file:///b.ts");
        assert_eq!(open.text_document.version, 2);
        assert_eq!(open.text_document.text, "x");
        let save: DidSaveTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(save.text_document.uri.as_str(), "file:///b.ts");
        assert_eq!(methods(&mut rx), ["workspace/didChangeWatchedFiles"]);

        session.handle(&DocumentEvent::Destroyed);
        let close: DidCloseTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(close.text_document.uri.as_str(), "file:///b.ts");
    }

    #[test]
    fn test_moved_document_reopens_instead_of_changing() {
        let doc = TestDocument::new(Some("/a.ts"), "");
        let (mut session, mut rx) = session(&doc, SyncStrategy::Full, SessionOptions::default());
        rx.try_recv().unwrap();

        doc.set_path("/b.ts");
        doc.set_text("x");
        session.handle(&insert("x"));

        assert_eq!(
            methods(&mut rx),
            ["textDocument/didClose", "textDocument/didOpen"]
        );
        assert_eq!(session.version(), 1);

        doc.set_text("xy");
        session.handle(&insert("y"));
        let change: DidChangeTextDocumentParams = rx.try_recv().unwrap().params().unwrap();
        assert_eq!(change.text_document.uri.as_str(), "file:///b.ts");
        assert_eq!(change.text_document.version, 2);
    }
}
