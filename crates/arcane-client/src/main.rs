use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

mod capabilities;

use arcane_core::Defaults;
use arcane_session::{negotiate, NegotiationPreferences};
use arcane_supervisor::{Supervisor, SupervisorCapabilities};

/// Headless reference client for the Arcane remote-desktop protocol.
///
/// Drives negotiation, worker attach and the supervisor end-to-end
/// without a windowing toolkit attached — useful for scripted sessions
/// and as a template for a real viewer's capability wiring.
#[derive(Parser, Debug)]
#[command(name = "arcane-client", version, about)]
struct Cli {
    /// Server host name or address
    host: String,

    /// Server port
    #[arg(long, default_value_t = 5900)]
    port: u16,

    /// Session password
    #[arg(long, env = "ARCANE_PASSWORD")]
    password: String,

    /// JSON file with client-side defaults (clipboard mode, image
    /// quality, packet/block size); falls back to built-in defaults
    /// when absent.
    #[arg(long)]
    defaults: Option<PathBuf>,

    /// JSON file tracking trusted server fingerprints
    #[arg(long, default_value = "trusted-fingerprints.json")]
    trust_store: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let defaults = match &cli.defaults {
        Some(path) => {
            let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            Defaults::from_json(&json).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Defaults::default(),
    };

    let trust_store = capabilities::JsonTrustStore::open(cli.trust_store.clone());

    let preferences = NegotiationPreferences {
        clipboard_mode: defaults.clipboard_mode,
        image_quality: defaults.image_quality,
        packet_size: defaults.packet_size,
        block_size: defaults.block_size,
    };

    info!(host = %cli.host, port = cli.port, "negotiating session");
    let session = match negotiate(&cli.host, cli.port, &cli.password, &preferences) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "negotiation failed");
            anyhow::bail!("{}", e.user_message());
        }
    };

    if !trust_store.contains(&session.server_fingerprint) {
        warn!(fingerprint = %session.server_fingerprint, "server fingerprint not previously trusted; trusting on first use");
        trust_store.add(&session.server_fingerprint, &format!("{}:{}", cli.host, cli.port));
    }

    info!(
        session_id = %session.session_id,
        view_only = session.view_only,
        clipboard = ?session.effective_clipboard_mode,
        "session negotiated"
    );

    let supervisor = Supervisor::new(
        cli.host.clone(),
        cli.port,
        cli.password.clone(),
        session,
        SupervisorCapabilities {
            screen_selector: Arc::new(capabilities::AutoSelectFirstScreen),
            renderer: Arc::new(capabilities::LoggingRenderer),
            clipboard: Arc::new(capabilities::LoggingClipboardBridge),
            input: Arc::new(capabilities::NoInputSource),
        },
    );

    match supervisor.run() {
        Ok(false) => {
            info!("session ended cleanly");
            Ok(())
        }
        Ok(true) => {
            error!("session ended with an error");
            anyhow::bail!("session ended with an error");
        }
        Err(e) => {
            error!(error = %e, "supervisor failed to start");
            anyhow::bail!("{}", e.user_message());
        }
    }
}
