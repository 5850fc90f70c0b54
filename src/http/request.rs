use super::url::TargetUrl;

/// `User-Agent` sent on RPC requests and CONNECT handshakes.
pub const USER_AGENT: &str = concat!("mtpost/", env!("CARGO_PKG_VERSION"));

/// How the request target appears in the request line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTarget {
    /// `POST /path`, for direct connections and CONNECT tunnels.
    Origin,
    /// `POST http://host/path`, for a plain forward proxy.
    Absolute,
}

/// Build an RPC POST request.
///
/// # Arguments
///
/// * `url` - The RPC endpoint.
/// * `target` - Whether the request line carries the path or the absolute URI.
/// * `proxy_authorization` - Value for `Proxy-Authorization`, if any.
/// * `body` - The encoded RPC call.
///
/// # Returns
///
/// * `Vec<u8>` - The request head followed by the body.
pub fn build_rpc_request(
    url: &TargetUrl,
    target: RequestTarget,
    proxy_authorization: Option<&str>,
    body: &[u8],
) -> Vec<u8> {
    let request_target = match target {
        RequestTarget::Origin => url.path.clone(),
        RequestTarget::Absolute => url.absolute(),
    };

    let mut request = format!(
        "POST {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: {}\r\n",
        request_target,
        url.authority(),
        USER_AGENT
    );

    if let Some(auth) = proxy_authorization {
        request.push_str(&format!("Proxy-Authorization: {}\r\n", auth));
    }

    request.push_str("Content-Type: text/xml\r\n");
    request.push_str(&format!("Content-Length: {}\r\n", body.len()));
    request.push_str("Connection: keep-alive\r\n");
    request.push_str("\r\n");

    let mut request_bytes = request.into_bytes();
    request_bytes.extend_from_slice(body);
    request_bytes
}

/// Build the CONNECT handshake that opens a tunnel to `host:port`.
pub fn build_connect_request(host: &str, port: u16, proxy_authorization: Option<&str>) -> Vec<u8> {
    let mut request = format!(
        "CONNECT {}:{} HTTP/1.0\r\nUser-Agent: {}\r\n",
        host, port, USER_AGENT
    );

    if let Some(auth) = proxy_authorization {
        request.push_str(&format!("Proxy-Authorization: {}\r\n", auth));
    }

    request.push_str("\r\n");
    request.into_bytes()
}
