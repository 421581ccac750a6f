// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! Outgoing side of the server connection.

use anyhow::Result;
use lsp_types::notification::{
    DidChangeTextDocument, DidChangeWatchedFiles, DidCloseTextDocument, DidOpenTextDocument,
    DidSaveTextDocument, Notification,
};
use lsp_types::{
    DidChangeTextDocumentParams, DidChangeWatchedFilesParams, DidCloseTextDocumentParams,
    DidOpenTextDocumentParams, DidSaveTextDocumentParams,
};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use super::protocol::{self, NotificationMessage};

/// Receives the document lifecycle notifications produced by sync sessions.
///
/// Delivery is fire-and-forget: implementations must not block and have no
/// way to report failure back to the session.
pub trait NotificationSink: Send + Sync {
    /// `textDocument/didOpen`
    fn did_open(&self, params: DidOpenTextDocumentParams);
    /// `textDocument/didChange`
    fn did_change(&self, params: DidChangeTextDocumentParams);
    /// `textDocument/didSave`
    fn did_save(&self, params: DidSaveTextDocumentParams);
    /// `workspace/didChangeWatchedFiles`
    fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams);
    /// `textDocument/didClose`
    fn did_close(&self, params: DidCloseTextDocumentParams);
}

/// A [`NotificationSink`] that queues JSON-RPC messages on an unbounded channel.
///
/// Pair it with [`write_messages`] to put the queue on the wire.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<NotificationMessage>,
}

impl ChannelSink {
    /// Creates a sink and the receiving end of its queue.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<NotificationMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Wraps an existing sender.
    #[must_use]
    pub const fn from_sender(tx: mpsc::UnboundedSender<NotificationMessage>) -> Self {
        Self { tx }
    }

    fn send<N: Notification>(&self, params: N::Params) {
        let message = match NotificationMessage::new(N::METHOD, params) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping {}: {:#}", N::METHOD, e);
                return;
            }
        };

        trace!("Queueing {}", N::METHOD);
        if self.tx.send(message).is_err() {
            warn!("Dropping {}: connection closed", N::METHOD);
        }
    }
}

impl NotificationSink for ChannelSink {
    fn did_open(&self, params: DidOpenTextDocumentParams) {
        self.send::<DidOpenTextDocument>(params);
    }

    fn did_change(&self, params: DidChangeTextDocumentParams) {
        self.send::<DidChangeTextDocument>(params);
    }

    fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.send::<DidSaveTextDocument>(params);
    }

    fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        self.send::<DidChangeWatchedFiles>(params);
    }

    fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.send::<DidCloseTextDocument>(params);
    }
}

/// Writes queued notifications to `writer` with LSP framing until every
/// sender has been dropped.
///
/// Returns the number of messages written.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub async fn write_messages<W>(
    mut rx: mpsc::UnboundedReceiver<NotificationMessage>,
    mut writer: W,
) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let mut written = 0;
    while let Some(message) = rx.recv().await {
        let frame = protocol::encode_message(&message)?;
        trace!("Sending LSP message: {}", message.method);
        writer.write_all(&frame).await?;
        writer.flush().await?;
        written += 1;
    }
    Ok(written)
}
