use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure, for callers that need to branch on
/// what went wrong rather than print it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed post document or wire date.
    Format,
    /// Connection establishment, TLS, or HTTP exchange with the endpoint.
    Transport,
    /// The proxy refused the tunnel, or its specification is malformed.
    Proxy,
    /// The RPC layer reported a fault or returned something unusable.
    Rpc,
    /// Configuration file or setting problems.
    Config,
    /// The request itself is inconsistent (e.g. mismatching post ids).
    Usage,
}

/// Error type for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Format(String),

    #[error("DNS resolution error for {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Connection error: {source} ({host}:{port})")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid HTTP response: {0}")]
    InvalidResponse(String),

    #[error("HTTP error: {status} {reason}")]
    Http { status: u16, reason: String },

    #[error("Invalid proxy specification \"{0}\"")]
    ProxySpec(String),

    #[error("Invalid CONNECT response \"{status}\"")]
    ProxyRefused { status: String, response: String },

    #[error("{0}")]
    Rpc(String),

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Format(_) => ErrorKind::Format,
            Error::Resolve { .. }
            | Error::Connect { .. }
            | Error::Tls(_)
            | Error::Io(_)
            | Error::InvalidResponse(_)
            | Error::Http { .. } => ErrorKind::Transport,
            Error::ProxySpec(_) | Error::ProxyRefused { .. } => ErrorKind::Proxy,
            Error::Rpc(_) => ErrorKind::Rpc,
            Error::Config(_) => ErrorKind::Config,
            Error::Usage(_) => ErrorKind::Usage,
        }
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub(crate) fn rpc(message: impl Into<String>) -> Self {
        Error::Rpc(message.into())
    }
}
