//! # tubelink
//!
//! Terminal front end for the account-linking flow: store the dashboard
//! credential, link YouTube channels through a browser popup, and show what
//! the backend has linked.

#![deny(unsafe_code)]

mod console;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tubelink_api::{ApiClient, BackendApi, ConnectionStatusSnapshot};
use tubelink_auth::{Credential, FileTokenStore, TokenStore, credentials_file_path};
use tubelink_connect::{BrowserPopupProvider, ConnectionEvent, ConnectionFlow, FlowConfig};
use tubelink_core::Notifier;
use tubelink_settings::TubelinkSettings;

use crate::console::ConsoleNotifier;

/// Extra time allowed past the refresh delay for the accounts-changed event.
const REFRESH_GRACE: Duration = Duration::from_millis(500);

/// Link YouTube channels to your dashboard account.
#[derive(Parser, Debug)]
#[command(name = "tubelink", version, about = "Link YouTube channels to your dashboard account")]
struct Cli {
    /// Settings file (defaults to ~/.tubelink/settings.json).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Backend base URL (overrides settings).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log filter, e.g. `debug` or `tubelink_connect=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Store the dashboard bearer token.
    Login {
        /// Token issued by the dashboard.
        #[arg(long)]
        token: String,
    },
    /// Forget the stored token.
    Logout,
    /// Show which channels the backend has linked.
    Status {
        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Open the YouTube sign-in popup and wait for it to finish.
    Connect,
}

/// Shared wiring for every subcommand.
struct App {
    settings: TubelinkSettings,
    tokens: Arc<dyn TokenStore>,
    notifier: Arc<dyn Notifier>,
}

impl App {
    fn new(settings: TubelinkSettings) -> Self {
        let store = FileTokenStore::new(token_store_path(&settings));
        tracing::debug!(path = %store.path().display(), "using credential store");
        Self {
            settings,
            tokens: Arc::new(store),
            notifier: Arc::new(ConsoleNotifier::default()),
        }
    }

    fn token_key(&self) -> &str {
        &self.settings.auth.token_key
    }

    fn api_client(&self) -> Result<ApiClient> {
        ApiClient::new(
            self.settings.api.clone(),
            Arc::clone(&self.tokens),
            self.token_key(),
            Arc::clone(&self.notifier),
        )
        .context("Failed to build HTTP client")
    }

    fn login(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            bail!("token must not be empty");
        }
        self.tokens
            .write(self.token_key(), token)
            .context("Failed to store credential")?;
        println!("Signed in.");
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        self.tokens
            .remove(self.token_key())
            .context("Failed to remove credential")?;
        println!("Signed out.");
        Ok(())
    }

    async fn status(&self, json: bool) -> Result<()> {
        let Some(credential) = Credential::load(self.tokens.as_ref(), self.token_key()) else {
            bail!("not signed in; run `tubelink login --token <TOKEN>` first");
        };
        let snapshot = self
            .api_client()?
            .connection_status(&credential)
            .await
            .context("Failed to fetch connection status")?;
        if json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            println!("{}", describe(snapshot));
        }
        Ok(())
    }

    async fn connect(&self) -> Result<ExitCode> {
        let popups = BrowserPopupProvider::from_settings(
            &self.settings.popup,
            tubelink_settings::tubelink_dir().join("popups"),
        );
        match popups.browser() {
            Some(path) => tracing::debug!(browser = %path.display(), "popup browser"),
            None => tracing::warn!("no supported browser found; set popup.browserPath"),
        }

        let flow = ConnectionFlow::new(
            FlowConfig::from_settings(&self.settings),
            Arc::new(self.api_client()?),
            Arc::clone(&self.tokens),
            Arc::new(popups),
            Arc::clone(&self.notifier),
        );
        let mut events = flow.subscribe();

        if let Err(e) = flow.initiate_connection().await {
            // the notifier already printed what the user needs
            tracing::debug!(error = %e, "connection not started");
            return Ok(ExitCode::FAILURE);
        }
        println!("Finish signing in in the popup window, then close it. Press Ctrl-C to cancel.");

        tokio::select! {
            () = flow.wait_idle() => {}
            res = tokio::signal::ctrl_c() => {
                res.context("Failed to listen for ctrl-c")?;
                if flow.abort() {
                    println!("Cancelled.");
                    return Ok(ExitCode::FAILURE);
                }
                flow.wait_idle().await;
            }
        }

        let wait = self.settings.connect.refresh_delay() + REFRESH_GRACE;
        if let Ok(Ok(ConnectionEvent::AccountsChanged { .. })) =
            tokio::time::timeout(wait, events.recv()).await
        {
            self.status(false).await?;
        }
        Ok(ExitCode::SUCCESS)
    }
}

/// Credential file location: the configured path or `~/.tubelink/credentials.json`.
fn token_store_path(settings: &TubelinkSettings) -> PathBuf {
    settings.auth.store_path.as_ref().map_or_else(
        || credentials_file_path(&tubelink_settings::tubelink_dir()),
        PathBuf::from,
    )
}

fn describe(snapshot: ConnectionStatusSnapshot) -> String {
    match (snapshot.connected, snapshot.account_count) {
        (false, _) => "No YouTube channels connected.".to_string(),
        (true, 1) => "Connected: 1 YouTube channel.".to_string(),
        (true, n) => format!("Connected: {n} YouTube channels."),
    }
}

fn load_settings(cli: &Cli) -> Result<TubelinkSettings> {
    let path = cli
        .settings
        .clone()
        .unwrap_or_else(tubelink_settings::settings_path);
    let mut settings = load_settings_at(&path)?;
    if let Some(url) = &cli.api_url {
        settings.api.base_url.clone_from(url);
    }
    Ok(settings)
}

fn load_settings_at(path: &Path) -> Result<TubelinkSettings> {
    tubelink_settings::load_settings_from_path(path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| settings.logging.level.clone());
    tubelink_core::init_subscriber(&level);

    let app = App::new(settings);
    match cli.command {
        Command::Login { token } => app.login(&token)?,
        Command::Logout => app.logout()?,
        Command::Status { json } => app.status(json).await?,
        Command::Connect => return app.connect().await,
    }
    Ok(ExitCode::SUCCESS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
