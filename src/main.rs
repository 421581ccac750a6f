// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Mark Wells <contact@markwells.dev>

//! docsync CLI.
//!
//! Replays recorded editor sessions through the synchronization engine and
//! prints the notifications a language server would receive.

#![allow(clippy::print_stdout, reason = "CLI tool needs to output to stdout")]

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use lsp_types::{
    SaveOptions, ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions, TextDocumentSyncSaveOptions,
};
use regex::Regex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use docsync::cli::{self, ColorConfig};
use docsync::config::Config;
use docsync::host::HostDocument;
use docsync::lsp::{self, ChannelSink, NotificationMessage};
use docsync::replay::{self, Replay};
use docsync::sync::{self, SyncCoordinator};

/// Command-line arguments for docsync.
#[derive(Parser, Debug)]
#[command(name = "docsync")]
#[command(about = "Document synchronization engine for LSP clients")]
#[command(version = env!("DOCSYNC_VERSION"))]
struct Args {
    /// The subcommand to run.
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

/// Subcommands supported by docsync.
#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines editor session and print the resulting notifications.
    Replay {
        /// Script to replay.
        script: PathBuf,

        /// Text document sync kind the simulated server declares.
        #[arg(long, value_enum, default_value = "incremental")]
        sync: SyncArg,

        /// Simulate a server that wants the text in didSave.
        #[arg(long)]
        save_include_text: bool,

        /// Only sync documents with these grammar labels (case-insensitive).
        /// Can be specified multiple times.
        #[arg(long = "only")]
        only: Vec<String>,

        /// Output format.
        #[arg(long, value_enum, default_value = "lsp")]
        format: OutputFormat,

        /// Only print notifications whose method matches this regex.
        #[arg(long, short)]
        filter: Option<String>,

        /// Disable colored output.
        #[arg(long)]
        nocolor: bool,
    },
}

/// Server sync kinds selectable from the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum SyncArg {
    /// The server accepts no document sync.
    None,
    /// Whole document on every change.
    Full,
    /// Edited ranges only.
    Incremental,
}

impl From<SyncArg> for TextDocumentSyncKind {
    fn from(arg: SyncArg) -> Self {
        match arg {
            SyncArg::None => Self::NONE,
            SyncArg::Full => Self::FULL,
            SyncArg::Incremental => Self::INCREMENTAL,
        }
    }
}

/// How replayed notifications are printed.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// `Content-Length` framed JSON-RPC, as sent to a server.
    Lsp,
    /// One JSON message per line.
    Json,
    /// Human-readable summary.
    Pretty,
}

/// Entry point for the docsync binary.
///
/// # Errors
///
/// Returns an error if the subcommand fails.
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("docsync=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Replay {
            script,
            sync,
            save_include_text,
            only,
            format,
            filter,
            nocolor,
        } => {
            let filter = filter
                .map(|f| Regex::new(&f))
                .transpose()
                .context("Invalid --filter regex")?;
            let capabilities = server_capabilities(sync.into(), save_include_text);
            let config = Config::load(args.config)?;

            run_replay(ReplayArgs {
                script,
                capabilities,
                config,
                only,
                format,
                filter,
                colors: ColorConfig::new(nocolor),
            })
            .await
        }
    }
}

struct ReplayArgs {
    script: PathBuf,
    capabilities: ServerCapabilities,
    config: Config,
    only: Vec<String>,
    format: OutputFormat,
    filter: Option<Regex>,
    colors: ColorConfig,
}

/// Capabilities of the simulated server.
fn server_capabilities(kind: TextDocumentSyncKind, include_text: bool) -> ServerCapabilities {
    ServerCapabilities {
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(kind),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(include_text),
                })),
                ..Default::default()
            },
        )),
        ..Default::default()
    }
}

async fn run_replay(args: ReplayArgs) -> Result<()> {
    let kind = sync::sync_kind(&args.capabilities);
    if !SyncCoordinator::can_adapt(kind) {
        bail!("Server declares sync kind {kind:?}; nothing to replay");
    }

    let source = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script {}", args.script.display()))?;
    let steps = replay::parse_script(&source)?;
    info!("Replaying {} steps from {}", steps.len(), args.script.display());

    let (sink, rx) = ChannelSink::new();
    let output = tokio::spawn(print_messages(
        filter_messages(rx, args.filter),
        args.format,
        args.colors,
    ));

    let only: Vec<String> = args.only.iter().map(|g| g.to_lowercase()).collect();
    let coordinator = SyncCoordinator::new(kind, Arc::new(sink), move |doc: &dyn HostDocument| {
        only.is_empty() || only.contains(&doc.grammar().to_lowercase())
    })?
    .with_options(args.config.session_options(&args.capabilities));

    let mut replay = Replay::new(coordinator);
    let result = replay.run(steps);
    // Dropping the coordinator closes the channel so the printer can finish.
    drop(replay);

    let printed = output.await.context("Output task panicked")??;
    debug!("Printed {} notifications", printed);
    result
}

/// Forwards only messages whose method matches `filter`.
fn filter_messages(
    mut rx: mpsc::UnboundedReceiver<NotificationMessage>,
    filter: Option<Regex>,
) -> mpsc::UnboundedReceiver<NotificationMessage> {
    let Some(filter) = filter else {
        return rx;
    };

    let (tx, filtered) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            if filter.is_match(&message.method) && tx.send(message).is_err() {
                break;
            }
        }
    });
    filtered
}

async fn print_messages(
    mut rx: mpsc::UnboundedReceiver<NotificationMessage>,
    format: OutputFormat,
    colors: ColorConfig,
) -> Result<usize> {
    match format {
        OutputFormat::Lsp => lsp::write_messages(rx, tokio::io::stdout()).await,
        OutputFormat::Json => {
            let mut printed = 0;
            while let Some(message) = rx.recv().await {
                println!("{}", serde_json::to_string(&message)?);
                printed += 1;
            }
            Ok(printed)
        }
        OutputFormat::Pretty => {
            let width = cli::terminal_width().saturating_sub(40).max(20);
            let mut printed = 0;
            while let Some(message) = rx.recv().await {
                println!("{}", cli::summarize(&message, &colors, width));
                printed += 1;
            }
            Ok(printed)
        }
    }
}
