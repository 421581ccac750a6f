// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Registry of document sessions for one server connection.

use lsp_types::TextDocumentSyncKind;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::capability::SyncStrategy;
use super::session::{DocumentSession, SessionOptions};
use crate::error::{Result, SyncError};
use crate::host::{DocumentEvent, DocumentId, HostDocument, HostEvent};
use crate::lsp::NotificationSink;
use crate::uri::{self, IdentityFn};

/// Decides whether a server cares about a document (e.g. by file type).
pub type DocumentFilter = Box<dyn Fn(&dyn HostDocument) -> bool + Send + Sync>;

/// Creates, routes events to, and tears down document sessions.
///
/// Holds at most one session per document. Sessions are removed as soon as
/// their document is destroyed.
pub struct SyncCoordinator {
    strategy: SyncStrategy,
    sink: Arc<dyn NotificationSink>,
    filter: DocumentFilter,
    identity: IdentityFn,
    options: Arc<SessionOptions>,
    sessions: HashMap<DocumentId, DocumentSession>,
    disposed: bool,
}

impl SyncCoordinator {
    /// Whether a server with this sync kind can be served by a coordinator.
    #[must_use]
    pub fn can_adapt(kind: TextDocumentSyncKind) -> bool {
        SyncStrategy::from_kind(kind).is_some()
    }

    /// Creates a coordinator for a server that declared `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Unsupported`] if `kind` is neither `FULL` nor
    /// `INCREMENTAL`.
    pub fn new<F>(
        kind: TextDocumentSyncKind,
        sink: Arc<dyn NotificationSink>,
        filter: F,
    ) -> Result<Self>
    where
        F: Fn(&dyn HostDocument) -> bool + Send + Sync + 'static,
    {
        let strategy = SyncStrategy::from_kind(kind).ok_or(SyncError::Unsupported(kind))?;
        debug!("Document sync strategy: {:?}", strategy);

        Ok(Self {
            strategy,
            sink,
            filter: Box::new(filter),
            identity: uri::file_identity(),
            options: Arc::new(SessionOptions::default()),
            sessions: HashMap::new(),
            disposed: false,
        })
    }

    /// Replaces the session options used for documents observed from now on.
    #[must_use]
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    /// Replaces the path to URI conversion.
    #[must_use]
    pub fn with_identity(mut self, identity: IdentityFn) -> Self {
        self.identity = identity;
        self
    }

    /// Strategy every session of this coordinator uses.
    #[must_use]
    pub const fn strategy(&self) -> SyncStrategy {
        self.strategy
    }

    /// Starts syncing a newly opened document.
    ///
    /// Returns `Ok(false)` without doing anything if the document already has
    /// a session, the filter rejects it, or the coordinator was disposed.
    ///
    /// # Errors
    ///
    /// Returns the session's construction error. The registry is left as it
    /// was.
    pub fn observe(&mut self, document: &Arc<dyn HostDocument>) -> Result<bool> {
        let id = document.id();

        if self.disposed {
            trace!("Coordinator disposed, ignoring document {}", id);
            return Ok(false);
        }
        if self.sessions.contains_key(&id) {
            trace!("Document {} already has a session", id);
            return Ok(false);
        }
        if !(self.filter)(document.as_ref()) {
            trace!("Document {} rejected by filter", id);
            return Ok(false);
        }

        let session = DocumentSession::new(
            document,
            self.strategy,
            self.sink.clone(),
            self.identity.clone(),
            self.options.clone(),
        )?;
        self.sessions.insert(id, session);
        debug!("Observing document {} ({} live)", id, self.sessions.len());
        Ok(true)
    }

    /// Routes a document event to its session.
    ///
    /// Events for documents without a session are ignored. A destroy event
    /// closes the session and drops it from the registry.
    pub fn dispatch(&mut self, id: DocumentId, event: &DocumentEvent) {
        let Some(session) = self.sessions.get_mut(&id) else {
            trace!("No session for document {}, ignoring {:?}", id, event.kind());
            return;
        };

        session.handle(event);

        if matches!(event, DocumentEvent::Destroyed)
            && let Some(mut session) = self.sessions.remove(&id)
        {
            session.dispose();
            debug!("Document {} destroyed ({} live)", id, self.sessions.len());
        }
    }

    /// Single entry point for host events.
    ///
    /// # Errors
    ///
    /// Returns the error of [`Self::observe`] for `Opened` events.
    pub fn handle(&mut self, event: HostEvent) -> Result<()> {
        match event {
            HostEvent::Opened(document) => self.observe(&document).map(|_| ()),
            HostEvent::Document { id, event } => {
                self.dispatch(id, &event);
                Ok(())
            }
        }
    }

    /// Processes host events until the stream ends, then disposes.
    ///
    /// A document whose session cannot be created is skipped; the error is
    /// logged and the loop continues with the next event.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<HostEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle(event) {
                warn!("Failed to observe document: {}", e);
            }
        }
        self.dispose();
    }

    /// Disposes every live session and stops observing new documents.
    ///
    /// Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let count = self.sessions.len();
        for (_, mut session) in self.sessions.drain() {
            session.dispose();
        }
        info!("Document sync disposed ({} sessions)", count);
    }

    /// Number of live sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Whether `id` has a live session.
    #[must_use]
    pub fn contains(&self, id: DocumentId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Current version of the session for `id`.
    #[must_use]
    pub fn version(&self, id: DocumentId) -> Option<i32> {
        self.sessions.get(&id).map(DocumentSession::version)
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        self.dispose();
    }
}
