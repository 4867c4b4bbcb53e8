//! Treegate
//!
//! Command-line front end for the sandboxed filesystem gateway.

use std::path::PathBuf;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Args, Parser, Subcommand};
use gateway::config::Config;
use gateway::files::SearchQuery;
use gateway::{FileGateway, GatewayRouter};
use protocol::messages::{ChangeEvent, Message};
use protocol::Envelope;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Treegate - sandboxed access to one directory tree.
#[derive(Parser, Debug)]
#[command(name = "treegate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Sandbox root (overrides the configuration)
    #[arg(short, long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to daily files in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the recursive index of the tree
    Tree {
        /// Include hidden entries
        #[arg(long)]
        hidden: bool,

        /// Ignore the cache and rescan
        #[arg(long)]
        refresh: bool,
    },

    /// List one directory level
    Ls {
        /// Directory relative to the root (default: the root)
        #[arg(default_value = "")]
        path: String,

        /// Include hidden entries
        #[arg(long)]
        hidden: bool,
    },

    /// Print a file's content
    Cat {
        /// File relative to the root
        path: String,

        /// Write the raw bytes instead of a JSON document
        #[arg(long)]
        raw: bool,
    },

    /// Search file contents
    Search {
        /// Text or pattern to look for
        query: String,

        #[command(flatten)]
        options: QueryOptions,
    },

    /// Replace text across the tree
    Replace {
        /// Text or pattern to look for
        query: String,

        /// Replacement text
        replacement: String,

        #[command(flatten)]
        options: QueryOptions,
    },

    /// Write a zip archive of one folder or several paths
    Archive {
        /// Paths relative to the root
        #[arg(required = true)]
        paths: Vec<String>,

        /// Output file (defaults to the archive's suggested name)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Serve JSON envelopes on stdin/stdout
    Serve,
}

/// Matching options shared by search and replace.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryOptions {
    /// Match case exactly
    #[arg(long)]
    pub case_sensitive: bool,

    /// Treat the query as a regular expression
    #[arg(long)]
    pub regex: bool,

    /// Match whole words only
    #[arg(long)]
    pub word: bool,

    /// Only files matching these globs
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<String>,

    /// Skip files matching these globs
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,
}

impl QueryOptions {
    fn into_query(self, query: String) -> SearchQuery {
        SearchQuery {
            query,
            case_sensitive: self.case_sensitive,
            use_regex: self.regex,
            whole_word: self.word,
            include: self.include,
            exclude: self.exclude,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default()?
    };

    // Apply environment variable overrides, then the command line
    config.apply_env_overrides();
    if let Some(root) = &cli.root {
        config.gateway.root = root.clone();
    }

    config.validate()?;

    let level = if cli.verbose {
        "debug"
    } else {
        config.gateway.log_level.as_str()
    };
    let _guard = init_tracing(level, cli.log_dir.as_deref())?;

    if let Some(config_path) = &cli.config {
        tracing::info!("Using config file: {:?}", config_path);
    }

    let gateway = FileGateway::new(&config)
        .with_context(|| format!("Cannot open sandbox root {}", config.gateway.root.display()))?;

    match cli.command {
        Commands::Tree { hidden, refresh } => {
            let entries = gateway.list_all(hidden, refresh).await?;
            print_json(entries.as_slice())?;
        }
        Commands::Ls { path, hidden } => {
            let listing = gateway.list_directory(&path, hidden).await?;
            print_json(&listing)?;
        }
        Commands::Cat { path, raw: true } => {
            let (bytes, mime_type) = gateway.serve_file(&path).await?;
            tracing::debug!(path = %path, mime_type, bytes = bytes.len(), "Serving raw file");
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&bytes).await?;
            stdout.flush().await?;
        }
        Commands::Cat { path, raw: false } => {
            let content = gateway.read_file(&path).await?;
            print_json(&content)?;
        }
        Commands::Search { query, options } => {
            let matches = gateway.search(&options.into_query(query)).await;
            print_json(&matches)?;
        }
        Commands::Replace {
            query,
            replacement,
            options,
        } => {
            let summary = gateway
                .replace(&options.into_query(query), &replacement)
                .await?;
            print_json(&summary)?;
        }
        Commands::Archive { paths, output } => {
            write_archive(&gateway, paths, output).await?;
        }
        Commands::Serve => {
            serve(gateway).await?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber.
///
/// Console output goes to stderr so stdout stays reserved for JSON. With a
/// log directory, a daily-rolling file layer is added; the returned guard
/// must live until exit so buffered lines are flushed.
fn init_tracing(
    level: &str,
    log_dir: Option<&std::path::Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let console = fmt::layer().with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = RollingFileAppender::new(Rotation::DAILY, dir, "treegate.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console)
                .init();
            Ok(None)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn write_archive(
    gateway: &FileGateway,
    paths: Vec<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let single_folder = match paths.as_slice() {
        [only] => gateway.list_directory(only, false).await?.error.is_none(),
        _ => false,
    };

    let archive = if single_folder {
        gateway.archive_folder(&paths[0]).await?
    } else {
        gateway.archive_many(paths).await?
    };

    let bytes = BASE64
        .decode(&archive.data)
        .context("Archive payload is not valid base64")?;
    let target = output.unwrap_or_else(|| PathBuf::from(&archive.filename));
    std::fs::write(&target, &bytes)
        .with_context(|| format!("Failed to write archive: {}", target.display()))?;

    tracing::info!(path = %target.display(), bytes = bytes.len(), "Archive written");
    print_json(&serde_json::json!({
        "filename": archive.filename,
        "path": target,
        "bytes": bytes.len(),
    }))
}

/// Answer request envelopes read line by line from stdin.
///
/// Requests run concurrently; each response carries the sequence number of
/// its request. Change notifications are interleaved with sequence 0.
async fn serve(gateway: FileGateway) -> anyhow::Result<()> {
    let router = GatewayRouter::new(gateway);
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Envelope>();

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(envelope) = out_rx.recv().await {
            let line = match envelope.to_json() {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode response");
                    continue;
                }
            };
            if stdout.write_all(format!("{}\n", line).as_bytes()).await.is_err()
                || stdout.flush().await.is_err()
            {
                break;
            }
        }
    });

    let mut changes = router.gateway().subscribe();
    let change_tx = out_tx.clone();
    let notifier = tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(event) => {
                    let _ = change_tx.send(change_envelope(event));
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Change notifications dropped");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tracing::info!(root = %router.gateway().root().display(), "Serving requests on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let envelope = match Envelope::from_json(&line) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding malformed request");
                continue;
            }
        };
        if let Err(e) = envelope.check_version() {
            tracing::warn!(error = %e, "Discarding request");
            continue;
        }

        let router = router.clone();
        let out_tx = out_tx.clone();
        tokio::spawn(async move {
            let sequence = envelope.sequence;
            if let Some(response) = router.route_or_error(envelope.payload).await {
                let _ = out_tx.send(Envelope::new(sequence, response));
            }
        });
    }

    tracing::info!("Input closed, shutting down");
    notifier.abort();
    drop(out_tx);
    drop(router);
    let _ = writer.await;
    Ok(())
}

fn change_envelope(event: ChangeEvent) -> Envelope {
    Envelope::new(0, Message::Changed(event))
}
