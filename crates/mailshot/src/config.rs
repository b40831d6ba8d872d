//! Configuration file and the settings resolved from it.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use mailshot_oauth::TokenCommand;
use mailshot_smtp::AuthMechanism;
use mailshot_smtp::connection::{DEFAULT_EHLO_NAME, DEFAULT_HOST, DEFAULT_PORT};

use crate::cli::Cli;
use crate::exit::Failure;

/// Contents of `config.json`. Every field is optional; secrets never live
/// here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// SMTP server.
    pub host: Option<String>,
    /// SMTP server port.
    pub port: Option<u16>,
    /// Sender address and AUTH username.
    pub username: Option<String>,
    /// Preferred AUTH mechanism.
    pub auth_method: Option<String>,
    /// Name announced in `EHLO`.
    pub ehlo_name: Option<String>,
    /// XOAUTH2 token helper.
    pub token_command: Option<TokenCommand>,
}

/// Default location: `<config dir>/mailshot/config.json`.
#[must_use]
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailshot")
        .join("config.json")
}

/// Loads the configuration file.
///
/// A missing file at the default location means "no configuration"; a
/// missing file that was asked for explicitly is an error.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn load(explicit: Option<&Path>) -> anyhow::Result<FileConfig> {
    let path = explicit.map_or_else(default_path, Path::to_path_buf);

    if explicit.is_none() && !path.exists() {
        debug!("No configuration file at {}", path.display());
        return Ok(FileConfig::default());
    }

    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("cannot read {}", path.display()))?;

    let config = serde_json::from_str(&contents)
        .with_context(|| format!("cannot parse {}", path.display()))?;
    debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Effective settings: command line over file over built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// SMTP server.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// Name announced in `EHLO`.
    pub ehlo_name: String,
    /// Sender address, if known before prompting.
    pub username: Option<String>,
    /// Preferred AUTH mechanism.
    pub auth_method: Option<AuthMechanism>,
    /// XOAUTH2 token helper.
    pub token_command: TokenCommand,
}

impl Settings {
    /// Merges the command line with the file configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::InvalidOption`] for an unknown AUTH mechanism.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, Failure> {
        let auth_method = cli
            .auth
            .clone()
            .or(file.auth_method)
            .map(|name| {
                name.parse::<AuthMechanism>()
                    .map_err(Failure::InvalidOption)
            })
            .transpose()?;

        Ok(Self {
            host: cli
                .host
                .clone()
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            ehlo_name: cli
                .ehlo_name
                .clone()
                .or(file.ehlo_name)
                .unwrap_or_else(|| DEFAULT_EHLO_NAME.to_string()),
            username: cli.from.clone().or(file.username),
            auth_method,
            token_command: file.token_command.unwrap_or_default(),
        })
    }
}
