use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{Error, Result};

/// Port assumed when the proxy specification names none.
pub const DEFAULT_PROXY_PORT: u16 = 3128;

/// Where the forward proxy lives and how to authenticate with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Parse a proxy specification of the form
    /// `[scheme://][user[:pass]@]host[:port]`, as found in `HTTP_PROXY`.
    ///
    /// Percent-escapes in the credentials are decoded. Anything after the
    /// authority (a trailing `/`) is ignored.
    ///
    /// # Arguments
    ///
    /// * `spec` - The raw specification string.
    ///
    /// # Returns
    ///
    /// * `Result<ProxyConfig>` - The parsed proxy, or a proxy error for a
    ///   missing host or a non-numeric port.
    pub fn parse(spec: &str) -> Result<Self> {
        let invalid = || Error::ProxySpec(spec.to_string());

        let rest = spec.trim();
        let rest = match rest.find("://") {
            Some(idx) => &rest[idx + 3..],
            None => rest,
        };

        let (userinfo, hostport) = match rest.rsplit_once('@') {
            Some((userinfo, hostport)) => (Some(userinfo), hostport),
            None => (None, rest),
        };
        let hostport = match hostport.find('/') {
            Some(idx) => &hostport[..idx],
            None => hostport,
        };

        let (host, port) = match hostport.split_once(':') {
            Some((host, port)) => (host, port.parse::<u16>().map_err(|_| invalid())?),
            None => (hostport, DEFAULT_PROXY_PORT),
        };
        if host.is_empty() || port == 0 {
            return Err(invalid());
        }

        let (username, password) = match userinfo {
            Some(userinfo) => {
                let (user, pass) = match userinfo.split_once(':') {
                    Some((user, pass)) => (user, Some(pass)),
                    None => (userinfo, None),
                };
                (
                    Some(percent_decode(user)).filter(|u| !u.is_empty()),
                    pass.map(percent_decode).filter(|p| !p.is_empty()),
                )
            }
            None => (None, None),
        };

        Ok(ProxyConfig {
            host: host.to_string(),
            port,
            username,
            password,
        })
    }

    /// The `Proxy-Authorization` value, when both credentials are set.
    pub fn authorization(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!(
                "Basic {}",
                STANDARD.encode(format!("{}:{}", user, pass))
            )),
            _ => None,
        }
    }
}

fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|pair| u8::from_str_radix(pair, 16).ok());
            if let Some(byte) = hex {
                decoded.push(byte);
                i += 3;
                continue;
            }
        }
        decoded.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&decoded).into_owned()
}
