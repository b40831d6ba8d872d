//! Connection establishment and session ownership.

mod session;
mod stream;

pub use session::{Session, SessionState};
pub use stream::{
    SmtpStream, connect, display_ip, display_socket_addr, resolve, shorten_ipv6,
};

use crate::error::Result;

/// Default submission host.
pub const DEFAULT_HOST: &str = "smtp.gmail.com";

/// Default implicit-TLS submission port.
pub const DEFAULT_PORT: u16 = 465;

/// Default name announced in `EHLO`.
pub const DEFAULT_EHLO_NAME: &str = "localhost";

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Server hostname.
    pub host: String,
    /// Server port (implicit TLS).
    pub port: u16,
    /// Name announced in `EHLO`.
    pub ehlo_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ehlo_name: DEFAULT_EHLO_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration for the given host with default port and
    /// `EHLO` name.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> SessionConfigBuilder {
        SessionConfigBuilder::new(host)
    }

    /// Opens a secured transport to the configured server and wraps it in a
    /// fresh session.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution or every connection attempt fails.
    pub async fn open(&self) -> Result<Session> {
        let stream = connect(&self.host, self.port).await?;
        Ok(Session::new(stream))
    }
}

/// Builder for [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: SessionConfig::new(host),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the name announced in `EHLO`.
    #[must_use]
    pub fn ehlo_name(mut self, name: impl Into<String>) -> Self {
        self.config.ehlo_name = name.into();
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> SessionConfig {
        self.config
    }
}
