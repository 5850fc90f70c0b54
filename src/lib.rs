pub mod args;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod post;
pub mod rpc;
pub mod table;
pub mod transport;


// Re-export main types for easy access
pub use args::{Cli, Command};
pub use commands::Session;
pub use config::{Config, Profile};
pub use error::{Error, ErrorKind, Result};
pub use post::{PostDocument, PostRecord};
pub use rpc::BlogClient;
pub use transport::ProxyTransport;
