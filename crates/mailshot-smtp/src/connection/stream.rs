//! Secured transport establishment.

use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use tokio::net::{TcpStream, lookup_host};
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// TLS-secured SMTP transport (implicit TLS).
pub type SmtpStream = tokio_rustls::client::TlsStream<TcpStream>;

/// Connects to an SMTP server over implicit TLS.
///
/// The hostname is resolved with the system resolver and each address is
/// tried once, in resolver order. The first handshake that succeeds wins.
///
/// # Errors
///
/// Returns [`Error::HostResolution`] if the name yields no address and
/// [`Error::Connection`] if every address fails.
pub async fn connect(hostname: &str, port: u16) -> Result<SmtpStream> {
    let server_name =
        ServerName::try_from(hostname.to_string()).map_err(|_| Error::HostResolution {
            host: hostname.to_string(),
            reason: "not a valid DNS name or IP address".into(),
        })?;

    let addresses = resolve(hostname, port).await?;
    let connector = create_tls_connector();

    for addr in addresses {
        let shown = display_socket_addr(&addr);
        debug!("Connecting to {shown}");

        match connect_addr(&connector, server_name.clone(), addr).await {
            Ok(stream) => {
                info!("Connected to {shown}");
                return Ok(stream);
            }
            Err(e) => warn!("Connection to {shown} failed: {e}"),
        }
    }

    Err(Error::Connection {
        host: hostname.to_string(),
        port,
    })
}

/// Resolves a hostname to its socket addresses, in resolver order.
///
/// # Errors
///
/// Returns [`Error::HostResolution`] if the lookup fails or is empty.
pub async fn resolve(hostname: &str, port: u16) -> Result<Vec<SocketAddr>> {
    debug!("Resolving hostname {hostname}");

    let addresses: Vec<SocketAddr> = lookup_host((hostname, port))
        .await
        .map_err(|e| Error::HostResolution {
            host: hostname.to_string(),
            reason: e.to_string(),
        })?
        .collect();

    if addresses.is_empty() {
        return Err(Error::HostResolution {
            host: hostname.to_string(),
            reason: "no addresses returned".into(),
        });
    }

    for addr in &addresses {
        debug!("Resolved {}", display_ip(addr.ip()));
    }

    Ok(addresses)
}

async fn connect_addr(
    connector: &TlsConnector,
    server_name: ServerName<'static>,
    addr: SocketAddr,
) -> std::io::Result<SmtpStream> {
    let tcp_stream = TcpStream::connect(addr).await?;
    connector.connect(server_name, tcp_stream).await
}

/// Creates a TLS connector with the bundled web PKI roots.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Formats an IP address for diagnostics: IPv4 dotted, IPv6 bracketed and
/// shortened.
#[must_use]
pub fn display_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => format!("[{}]", shorten_ipv6(&v6)),
    }
}

/// Formats a socket address as `ip:port` using [`display_ip`].
#[must_use]
pub fn display_socket_addr(addr: &SocketAddr) -> String {
    format!("{}:{}", display_ip(addr.ip()), addr.port())
}

/// Renders an IPv6 address with the longest run of zero groups replaced by
/// `::`.
///
/// Only runs of two or more groups are collapsed; on a tie the first run
/// wins. Groups are lowercase hex without leading zeros.
#[must_use]
pub fn shorten_ipv6(addr: &Ipv6Addr) -> String {
    let groups = addr.segments();

    let mut best: Option<(usize, usize)> = None;
    let mut run_start = None;
    for (i, group) in groups.iter().enumerate() {
        if *group == 0 {
            let start = *run_start.get_or_insert(i);
            let len = i + 1 - start;
            if len >= 2 && best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((start, len));
            }
        } else {
            run_start = None;
        }
    }

    let hex = |slice: &[u16]| {
        slice
            .iter()
            .map(|g| format!("{g:x}"))
            .collect::<Vec<_>>()
            .join(":")
    };

    match best {
        Some((start, len)) => format!(
            "{}::{}",
            hex(&groups[..start]),
            hex(&groups[start + len..])
        ),
        None => hex(&groups),
    }
}
