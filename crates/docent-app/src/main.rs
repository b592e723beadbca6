//! Docent terminal front end - composition root.
//!
//! 1. Parse flags and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the HTTP backend and the mode controller
//! 4. Run the prompt loop, printing streamed answers as they grow

mod cli;
mod repl;

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use docent_chat::{fingerprint_file, ExchangeOutcome, HttpBackend, ModeController};
use docent_core::config::DocentConfig;
use docent_core::events::LogUpdate;
use docent_core::types::{ChatMode, Fingerprint};

use cli::CliArgs;
use repl::{split_paragraphs, Command, Transcript, HELP};

/// The document currently installed as the chunk set.
struct LoadedDocument {
    path: PathBuf,
    fingerprint: Fingerprint,
}

struct App {
    controller: ModeController<HttpBackend>,
    updates: broadcast::Receiver<LogUpdate>,
    transcript: Transcript,
    document: Option<LoadedDocument>,
}

impl App {
    fn new(controller: ModeController<HttpBackend>) -> Self {
        let updates = controller.subscribe();
        Self {
            controller,
            updates,
            transcript: Transcript::new(),
            document: None,
        }
    }

    fn backend(&self) -> &Arc<HttpBackend> {
        self.controller.backend()
    }

    fn print_pending_updates(&mut self) {
        loop {
            match self.updates.try_recv() {
                Ok(update) => self.print_update(&update),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Transcript fell behind");
                }
                Err(_) => break,
            }
        }
    }

    fn print_update(&mut self, update: &LogUpdate) {
        if update.mode != self.controller.mode() {
            return;
        }
        if let Some(text) = self.transcript.render(update) {
            print!("{text}");
            let _ = std::io::stdout().flush();
        }
    }

    async fn load(&mut self, path: &Path) {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read document");
                println!("Could not read {}: {e}", path.display());
                return;
            }
        };
        let chunks = split_paragraphs(&text);
        let fingerprint = fingerprint_file(path).await;
        println!(
            "Loaded {} ({} chunks, fingerprint {fingerprint})",
            path.display(),
            chunks.len()
        );
        self.controller.set_chunks(chunks);
        self.document = Some(LoadedDocument {
            path: path.to_path_buf(),
            fingerprint,
        });
    }

    async fn summary(&self) {
        let Some(doc) = &self.document else {
            println!("No document loaded.");
            return;
        };
        let status = self
            .backend()
            .summary_status(std::slice::from_ref(&doc.fingerprint))
            .await;
        if !status.get(doc.fingerprint.as_str()).copied().unwrap_or(false) {
            println!("No summary yet for {}.", doc.path.display());
            return;
        }
        match self.backend().summary(&doc.fingerprint).await {
            Some(summary) => println!("{summary}"),
            None => println!("Summary unavailable."),
        }
    }

    async fn export(&self) {
        let Some(doc) = &self.document else {
            println!("No document loaded.");
            return;
        };
        match self.backend().export(&doc.fingerprint).await {
            Ok(Some(url)) => println!("Published: {url}"),
            Ok(None) => println!("Export returned no link."),
            Err(e) => {
                tracing::warn!(error = %e, "Export failed");
                println!("Export failed: {e}");
            }
        }
    }

    fn history(&self) {
        for entry in self.controller.snapshot() {
            println!("{entry}");
        }
    }

    /// Submit the line and print the answer as it streams in.
    async fn ask(&mut self, text: String) {
        self.controller.set_input(text);
        let Some(pending) = self.controller.submit() else {
            if self.controller.mode() == ChatMode::Document && self.controller.chunks().is_empty() {
                println!("Load a document first (/load <path>), or switch to /chat.");
            }
            self.controller.set_input(String::new());
            return;
        };

        let mut task = tokio::spawn(pending.run());
        let outcome = loop {
            tokio::select! {
                finished = &mut task => break finished,
                received = self.updates.recv() => match received {
                    Ok(update) => self.print_update(&update),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Transcript fell behind");
                    }
                    Err(broadcast::error::RecvError::Closed) => {}
                },
            }
        };
        self.print_pending_updates();
        println!();

        match outcome {
            Ok(ExchangeOutcome::Failed { reason }) => tracing::debug!(%reason, "Exchange failed"),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "Exchange task panicked"),
        }
    }

    fn switch(&mut self, mode: ChatMode) {
        self.controller.set_mode(mode);
        self.print_pending_updates();
        println!("[{mode} mode]");
    }

    async fn run(&mut self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("{}> ", self.controller.mode());
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match Command::parse(&line) {
                Command::Document => self.switch(ChatMode::Document),
                Command::Conversation => self.switch(ChatMode::Conversation),
                Command::NewChat => {
                    self.controller.new_chat();
                    self.print_pending_updates();
                    println!("[new chat]");
                }
                Command::Reset => {
                    self.controller.reset();
                    self.print_pending_updates();
                }
                Command::Load(path) => self.load(&path).await,
                Command::Summary => self.summary().await,
                Command::Export => self.export().await,
                Command::History => self.history(),
                Command::Help => println!("{HELP}"),
                Command::Quit => break,
                Command::Unknown(cmd) => println!("Unknown command {cmd}. Try /help."),
                Command::Ask(text) => self.ask(text).await,
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = DocentConfig::load_or_default(&config_file);
    config.backend.base_url = args.resolve_backend_url(&config.backend.base_url);

    // Tracing goes to stderr so the transcript stays readable.
    let directive = args.resolve_filter_directive(&config.general.log_level);
    let filter = tracing_subscriber::EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting Docent v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    let backend = HttpBackend::new(&config.backend)?;
    tracing::info!(url = %backend.base_url(), "Backend configured");

    let controller = ModeController::new(backend, &config.chat);
    let mut app = App::new(controller);

    if let Some(path) = &args.document {
        app.load(path).await;
    }
    println!("{HELP}");

    app.run().await?;
    Ok(())
}
