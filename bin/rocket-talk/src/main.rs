//! # RocketTalk Binary
//!
//! The entry point that assembles the application based on compile-time features.

use anyhow::{anyhow, Context};
use clap::Parser;
use rt_api::{router, AppState, FlashKey};
use rt_auth_file::FileCredentialStore;
use rt_config::{LogFormat, LogSettings, Settings, DEFAULT_SESSION_SECRET};
use rt_core::traits::MessageStore;
use secrecy::ExposeSecret;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[cfg(feature = "store-fs")]
use rt_store_fs::FsMessageStore;

#[cfg(all(feature = "store-memory", not(feature = "store-fs")))]
use rt_store_memory::MemoryMessageStore;

#[cfg(not(any(feature = "store-fs", feature = "store-memory")))]
compile_error!("enable one of the `store-fs` or `store-memory` features");

/// Private messaging between a fixed set of users.
#[derive(Parser, Debug)]
#[command(name = "rocket-talk", version, about)]
struct Cli {
    /// Settings file (defaults to `rocket-talk.toml` when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind, overriding `server.host`
    #[arg(long)]
    host: Option<String>,

    /// Port to bind, overriding `server.port`
    #[arg(short, long)]
    port: Option<u16>,
}

fn init_tracing(log: &LogSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&log.filter))
        .context("invalid log filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init()?,
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
    }
    Ok(())
}

#[cfg(feature = "store-fs")]
async fn message_store(settings: &Settings) -> anyhow::Result<Arc<dyn MessageStore>> {
    let store = FsMessageStore::open(&settings.storage.messages_dir)
        .await
        .with_context(|| {
            format!(
                "cannot open message directory {}",
                settings.storage.messages_dir.display()
            )
        })?;
    Ok(Arc::new(store))
}

#[cfg(all(feature = "store-memory", not(feature = "store-fs")))]
async fn message_store(_settings: &Settings) -> anyhow::Result<Arc<dyn MessageStore>> {
    tracing::warn!("using the in-memory message store; messages are lost on exit");
    Ok(Arc::new(MemoryMessageStore::new()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }

    init_tracing(&settings.log)?;
    tracing::debug!(?settings, "configuration loaded");

    let secret = settings.session.secret.expose_secret();
    if secret == DEFAULT_SESSION_SECRET {
        tracing::warn!("session.secret is the built-in default; set ROCKET_TALK__SESSION__SECRET");
    }

    let state = AppState {
        store: message_store(&settings).await?,
        credentials: Arc::new(FileCredentialStore::new(&settings.storage.passwords_file)),
        flash_key: FlashKey::new(secret.as_bytes())
            .map_err(|e| anyhow!("invalid session secret: {e}"))?,
    };

    let app = router(state, &settings.server.assets_dir);
    let address = settings.server.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("cannot bind {address}"))?;

    tracing::info!(
        %address,
        passwords = %settings.storage.passwords_file.display(),
        "RocketTalk listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
