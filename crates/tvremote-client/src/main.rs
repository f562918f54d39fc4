//! tvremote: command-line front-end for the remote-control client.
//!
//! # Usage
//!
//! ```text
//! tvremote [OPTIONS] <ADDRESS> <COMMAND>
//!
//! Commands:
//!   connect              Open the channel and print the pairing token, if any
//!   key <KEY>...         Press one or more keys, e.g. KEY_VOLUP KEY_VOLUP
//!   text <TEXT>          Type text into the focused field
//!   apps                 List installed applications (id<TAB>name)
//!   launch --id <ID>     Launch by application id
//!   launch --name <NAME> Launch by name ("netflix", "YouTube", ...)
//!   token get|set|clear  Inspect or edit the stored pairing token
//!
//! Options:
//!   --secure             Use the TLS channel and pairing tokens
//!   --name <NAME>        Name shown on the receiver's pairing prompt
//!   --config <PATH>      Config file [default: platform config dir]
//!   --token-file <PATH>  Token store [default: platform config dir]
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable              | Flag           |
//! |-----------------------|----------------|
//! | `TVREMOTE_SECURE`     | `--secure`     |
//! | `TVREMOTE_NAME`       | `--name`       |
//! | `TVREMOTE_CONFIG`     | `--config`     |
//! | `TVREMOTE_TOKEN_FILE` | `--token-file` |
//!
//! Flags win over the config file, which wins over built-in defaults.
//! `RUST_LOG` wins over the file's `log_level`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tvremote_client::application::{CommandChannel, LaunchOrchestrator};
use tvremote_client::domain::RemoteConfig;
use tvremote_client::infrastructure::storage::{AppConfigFile, FileTokenStore, TokenStore};
use tvremote_client::infrastructure::{Connection, ConnectionRegistry, HttpRestLauncher};
use tvremote_core::{AttemptResult, LaunchReport, SecurityMode};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Remote control for networked TV receivers.
#[derive(Debug, Parser)]
#[command(name = "tvremote", about = "Remote control for networked TV receivers", version)]
struct Cli {
    /// Receiver host name or IP address.
    address: String,

    /// Use the TLS channel (port 8002 by default) and pairing tokens.
    #[arg(long, env = "TVREMOTE_SECURE")]
    secure: bool,

    /// Name shown on the receiver's pairing prompt.
    #[arg(long, env = "TVREMOTE_NAME")]
    name: Option<String>,

    /// Path of the TOML config file.
    #[arg(long, env = "TVREMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Path of the TOML token store.
    #[arg(long, env = "TVREMOTE_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open the channel and print the pairing token, if one was issued.
    Connect,
    /// Press keys in order.
    Key {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Type text into the focused field.
    Text { text: String },
    /// List installed applications.
    Apps,
    /// Launch an application.
    #[command(group(ArgGroup::new("target").required(true).args(["id", "name"])))]
    Launch {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// Inspect or edit the stored pairing token for ADDRESS.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[derive(Debug, Subcommand)]
enum TokenAction {
    Get,
    Set { token: String },
    Clear,
}

impl Cli {
    fn security_mode(&self, file: &AppConfigFile) -> SecurityMode {
        if self.secure || file.remote.secure {
            SecurityMode::Secure
        } else {
            SecurityMode::Plain
        }
    }

    /// The file's configuration with command-line overrides applied.
    fn remote_config(&self, file: &AppConfigFile) -> RemoteConfig {
        let mut config = file.to_remote_config();
        if let Some(name) = &self.name {
            config.display_name = name.clone();
        }
        config
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => AppConfigFile::default_path().context("locating config file"),
        }
    }

    fn token_path(&self) -> anyhow::Result<PathBuf> {
        match &self.token_file {
            Some(path) => Ok(path.clone()),
            None => FileTokenStore::default_path().context("locating token store"),
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The config file is read before logging starts because it carries the
    // fallback log level.
    let config_path = cli.config_path()?;
    let file = AppConfigFile::load(&config_path)
        .with_context(|| format!("reading config file {}", config_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&file.remote.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    debug!(path = %config_path.display(), "configuration loaded");

    let mode = cli.security_mode(&file);
    let config = Arc::new(cli.remote_config(&file));
    let token_path = cli.token_path()?;
    let token_store: Arc<dyn TokenStore> = Arc::new(
        FileTokenStore::open(&token_path)
            .with_context(|| format!("opening token store {}", token_path.display()))?,
    );

    let registry = ConnectionRegistry::new(Arc::clone(&config), Arc::clone(&token_store));
    let result = run(&cli, mode, &registry).await;
    registry.close_all().await;
    result
}

async fn run(cli: &Cli, mode: SecurityMode, registry: &ConnectionRegistry) -> anyhow::Result<()> {
    let address = cli.address.as_str();

    if let Command::Token { action } = &cli.command {
        let store = registry.token_store();
        match action {
            TokenAction::Get => match store.load(address) {
                Some(token) => println!("{token}"),
                None => println!("(none)"),
            },
            TokenAction::Set { token } => store.store(address, token),
            TokenAction::Clear => store.clear(address),
        }
        return Ok(());
    }

    let connection = registry.get_or_create(address, mode);
    info!(address, %mode, "connecting");

    match &cli.command {
        Command::Connect => {
            let token = connection
                .ensure_open()
                .await
                .with_context(|| format!("connecting to {address}"))?;
            match token {
                Some(token) => println!("connected; token {token}"),
                None => println!("connected"),
            }
        }
        Command::Key { keys } => {
            open(&connection, address).await?;
            let channel = CommandChannel::new(connection);
            for key in keys {
                channel
                    .send_key(key)
                    .await
                    .with_context(|| format!("sending {key}"))?;
            }
        }
        Command::Text { text } => {
            open(&connection, address).await?;
            CommandChannel::new(connection)
                .send_text(text)
                .await
                .context("sending text")?;
        }
        Command::Apps => {
            open(&connection, address).await?;
            let apps = CommandChannel::new(connection)
                .list_apps()
                .await
                .context("listing installed apps")?;
            for app in apps {
                println!("{}\t{}", app.id, app.name);
            }
        }
        Command::Launch { id, name } => {
            // A dead channel is not fatal: the REST fallback may still work.
            if let Err(e) = connection.ensure_open().await {
                warn!(address, "channel unavailable, launching over REST only: {e}");
            }
            let rest = HttpRestLauncher::new(registry.config().rest_timeout)
                .context("building HTTP client")?;
            let launcher = LaunchOrchestrator::new(connection, Arc::new(rest));
            let report = match (id, name) {
                (Some(id), _) => launcher
                    .launch_by_id(id)
                    .await
                    .with_context(|| format!("launching {id}"))?,
                (None, Some(name)) => launcher
                    .launch_by_name(name)
                    .await
                    .with_context(|| format!("launching {name}"))?,
                (None, None) => anyhow::bail!("launch needs --id or --name"),
            };
            print_report(&report);
        }
        Command::Token { .. } => {}
    }
    Ok(())
}

async fn open(connection: &Connection, address: &str) -> anyhow::Result<()> {
    connection
        .ensure_open()
        .await
        .map(|_| ())
        .with_context(|| format!("connecting to {address}"))
}

fn print_report(report: &LaunchReport) {
    for attempt in &report.attempts {
        let outcome = match &attempt.result {
            AttemptResult::Acknowledged => "acknowledged".to_string(),
            AttemptResult::Sent => "sent".to_string(),
            AttemptResult::Failed(reason) => format!("failed: {reason}"),
        };
        println!("{}\t{}\t{}", attempt.app_id, attempt.method, outcome);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
