use crate::error::{Error, Result};

/// The RPC endpoint, split into the pieces the transport needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetUrl {
    pub https: bool,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl TargetUrl {
    /// Parse a URL into its components.
    ///
    /// # Arguments
    ///
    /// * `url` - An `http://` or `https://` URL; the port defaults to 80/443
    ///   and the path to `/`.
    ///
    /// # Returns
    ///
    /// * `Result<TargetUrl>` - The parsed endpoint, or a configuration error.
    pub fn parse(url: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::Config(format!("Invalid URL \"{}\": {}", url, reason));

        let (https, rest) = if let Some(rest) = url.strip_prefix("https://") {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix("http://") {
            (false, rest)
        } else {
            return Err(invalid("URL must start with http:// or https://"));
        };

        let (authority, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => (rest, "/"),
        };
        let (host, port) = match authority.split_once(':') {
            Some((host, port)) => (host, port.parse().map_err(|_| invalid("Invalid port"))?),
            None => (authority, if https { 443 } else { 80 }),
        };

        if host.is_empty() {
            return Err(invalid("Invalid host"));
        }

        Ok(TargetUrl {
            https,
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    fn default_port(&self) -> u16 {
        if self.https {
            443
        } else {
            80
        }
    }

    /// `host` or `host:port` when the port is not the scheme default.
    pub fn authority(&self) -> String {
        if self.port == self.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// The absolute form used in a request line sent to a forward proxy.
    pub fn absolute(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!("{}://{}{}", scheme, self.authority(), self.path)
    }
}
