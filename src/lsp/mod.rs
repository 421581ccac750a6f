// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

/// LSP message protocol definitions.
pub mod protocol;
/// Notification sink abstraction and the channel-backed implementation.
pub mod transport;

pub use protocol::NotificationMessage;
pub use transport::{ChannelSink, NotificationSink, write_messages};
