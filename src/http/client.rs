use native_tls::{TlsConnector, TlsStream};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::proxy::ProxyConfig;
use super::request::build_connect_request;
use super::response::read_connect_reply;
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// A byte stream an HTTP exchange can run over: plain TCP or TLS.
pub trait Stream: Read + Write {}

impl<T: Read + Write> Stream for T {}

/// Set up TCP stream with appropriate timeouts.
///
/// Every resolved address is tried in turn; the last failure is reported.
pub fn setup_tcp_stream(host: &str, port: u16) -> Result<TcpStream> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|source| Error::Resolve {
            host: host.to_string(),
            port,
            source,
        })?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
            Ok(stream) => {
                stream.set_read_timeout(Some(READ_TIMEOUT))?;
                stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
                return Ok(stream);
            }
            Err(err) => last_error = Some(err),
        }
    }

    let source = last_error.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "No DNS records found")
    });
    Err(Error::Connect {
        host: host.to_string(),
        port,
        source,
    })
}

/// Build the TLS connector used for HTTPS targets.
///
/// Certificates and hostnames are verified; TLS 1.2 is the floor.
pub fn tls_connector() -> Result<TlsConnector> {
    TlsConnector::builder()
        .danger_accept_invalid_certs(false)
        .danger_accept_invalid_hostnames(false)
        .min_protocol_version(Some(native_tls::Protocol::Tlsv12))
        .build()
        .map_err(|err| Error::Tls(err.to_string()))
}

/// Run the TLS handshake for `host` over an established stream.
pub fn start_tls(
    connector: &TlsConnector,
    host: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>> {
    connector
        .connect(host, stream)
        .map_err(|err| Error::Tls(format!("TLS handshake error: {}", err)))
}

/// Ask the proxy to open a tunnel to `host:port` over `stream`.
///
/// Only a 200 reply opens the tunnel; anything else fails with the proxy's
/// raw reply and nothing further is written.
pub fn open_tunnel<S: Read + Write>(
    stream: &mut S,
    proxy: &ProxyConfig,
    host: &str,
    port: u16,
) -> Result<()> {
    let authorization = proxy.authorization();
    stream.write_all(&build_connect_request(host, port, authorization.as_deref()))?;
    stream.flush()?;

    let reply = read_connect_reply(stream)?;
    let status = reply.split_whitespace().nth(1).unwrap_or("").to_string();
    if status != "200" {
        return Err(Error::ProxyRefused {
            status,
            response: reply,
        });
    }

    Ok(())
}

/// Connect to the proxy and open a tunnel to `host:port` through it.
pub fn connect_via_proxy(proxy: &ProxyConfig, host: &str, port: u16) -> Result<TcpStream> {
    let mut stream = setup_tcp_stream(&proxy.host, proxy.port)?;
    open_tunnel(&mut stream, proxy, host, port)?;
    Ok(stream)
}
