//! # rt-config
//!
//! Layered settings for RocketTalk: built-in defaults, then an optional
//! config file, then `ROCKET_TALK__SECTION__KEY` environment variables
//! (a `.env` file is honoured). CLI flags are applied by the binary.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Secret shipped as the default so a fresh checkout starts; never use it in production.
pub const DEFAULT_SESSION_SECRET: &str = "change-me";

const DEFAULT_CONFIG_FILE: &str = "rocket-talk";
const ENV_PREFIX: &str = "ROCKET_TALK";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub session: SessionSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served under `/assets/`
    pub assets_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// One `<id>.json` file per message lives here
    pub messages_dir: PathBuf,
    /// JSON object of lowercase username -> password
    pub passwords_file: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SessionSettings {
    /// Key used to sign the flash-alert cookie
    #[serde(deserialize_with = "secret_string")]
    pub secret: SecretString,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

fn secret_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Settings {
    /// Loads `.env`, then builds settings from defaults, `rocket-talk.*`
    /// (or `file` when given) and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::build(file)
    }

    fn build(file: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.assets_dir", "assets")?
            .set_default("storage.messages_dir", "messages")?
            .set_default("storage.passwords_file", "passwords.json")?
            .set_default("session.secret", DEFAULT_SESSION_SECRET)?
            .set_default("log.filter", "info")?
            .set_default("log.format", "pretty")?;

        let builder = match file {
            Some(path) => builder.add_source(config::File::from(path)),
            None => {
                builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
            }
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }
}
