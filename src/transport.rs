//! Connection strategy for RPC calls.
//!
//! The RPC library hands over an encoded call; this module decides how the
//! bytes reach the endpoint:
//!
//! * no proxy: straight to the target, TLS when the URL is `https`;
//! * proxy, `http` target: to the proxy, with an absolute request URI and
//!   `Proxy-Authorization` on every request;
//! * proxy, `https` target: `CONNECT` through the proxy, then TLS inside the
//!   tunnel and ordinary origin-form requests.
//!
//! One connection is kept for the life of the transport and reused while the
//! server allows it.

use native_tls::TlsConnector;
use std::io::{BufReader, Cursor, Write};

use crate::error::{Error, Result};
use crate::http::client::{connect_via_proxy, setup_tcp_stream, start_tls, tls_connector, Stream};
use crate::http::{build_rpc_request, read_response, ProxyConfig, RequestTarget, TargetUrl};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    Direct,
    Forward(ProxyConfig),
    Tunnel(ProxyConfig),
}

/// Carries RPC requests to one endpoint, optionally through a proxy.
pub struct ProxyTransport {
    url: TargetUrl,
    route: Route,
    tls: Option<TlsConnector>,
    connection: Option<BufReader<Box<dyn Stream>>>,
    last_error: Option<Error>,
}

impl ProxyTransport {
    /// Prepare a transport for `url`.
    ///
    /// Nothing is connected yet, but the TLS connector for an `https` target
    /// is built here so a missing TLS backend fails before any work is done.
    pub fn new(url: TargetUrl, proxy: Option<ProxyConfig>) -> Result<Self> {
        let route = match proxy {
            None => Route::Direct,
            Some(proxy) if url.https => Route::Tunnel(proxy),
            Some(proxy) => Route::Forward(proxy),
        };
        let tls = if url.https {
            Some(tls_connector()?)
        } else {
            None
        };

        Ok(ProxyTransport {
            url,
            route,
            tls,
            connection: None,
            last_error: None,
        })
    }

    /// The proxy in use, if any.
    pub fn proxy(&self) -> Option<&ProxyConfig> {
        match &self.route {
            Route::Direct => None,
            Route::Forward(proxy) | Route::Tunnel(proxy) => Some(proxy),
        }
    }

    /// Whether a connection is currently held open for reuse.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The failure that aborted the most recent exchange, if any.
    pub fn take_error(&mut self) -> Option<Error> {
        self.last_error.take()
    }

    /// POST one encoded RPC call and return the response body.
    ///
    /// # Arguments
    ///
    /// * `body` - The encoded call.
    ///
    /// # Returns
    ///
    /// * `Result<Vec<u8>>` - The body of a 200 response; any other status, a
    ///   refused tunnel, or a connection failure is an error.
    pub fn exchange(&mut self, body: &[u8]) -> Result<Vec<u8>> {
        let mut connection = match self.connection.take() {
            Some(connection) => connection,
            None => BufReader::new(self.connect()?),
        };

        let (target, authorization) = match &self.route {
            Route::Forward(proxy) => (RequestTarget::Absolute, proxy.authorization()),
            Route::Direct | Route::Tunnel(_) => (RequestTarget::Origin, None),
        };
        let request = build_rpc_request(&self.url, target, authorization.as_deref(), body);

        let stream = connection.get_mut();
        stream.write_all(&request)?;
        stream.flush()?;

        let response = read_response(&mut connection)?;
        if response.keep_alive {
            self.connection = Some(connection);
        }

        if response.status != 200 {
            return Err(Error::Http {
                status: response.status,
                reason: response.reason,
            });
        }

        Ok(response.body)
    }

    fn connect(&self) -> Result<Box<dyn Stream>> {
        let url = &self.url;
        let stream = match &self.route {
            Route::Forward(proxy) => setup_tcp_stream(&proxy.host, proxy.port)?,
            Route::Tunnel(proxy) => connect_via_proxy(proxy, &url.host, url.port)?,
            Route::Direct => setup_tcp_stream(&url.host, url.port)?,
        };

        match (&self.tls, &self.route) {
            (Some(connector), Route::Direct | Route::Tunnel(_)) => {
                Ok(Box::new(start_tls(connector, &url.host, stream)?))
            }
            _ => Ok(Box::new(stream)),
        }
    }
}

impl xmlrpc::Transport for &mut ProxyTransport {
    type Stream = Cursor<Vec<u8>>;

    fn transmit(
        self,
        request: &xmlrpc::Request<'_>,
    ) -> std::result::Result<Self::Stream, Box<dyn std::error::Error + Send + Sync>> {
        let mut body = Vec::new();
        request.write_as_xml(&mut body)?;

        match self.exchange(&body) {
            Ok(reply) => {
                self.last_error = None;
                Ok(Cursor::new(reply))
            }
            Err(err) => {
                let message = err.to_string();
                self.last_error = Some(err);
                Err(message.into())
            }
        }
    }
}
