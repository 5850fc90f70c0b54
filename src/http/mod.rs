//! Minimal HTTP/1.1 plumbing for carrying RPC calls, directly or through a
//! forward proxy.

pub mod client;
pub mod proxy;
pub mod request;
pub mod response;
pub mod url;

pub use proxy::ProxyConfig;
pub use request::{build_rpc_request, RequestTarget, USER_AGENT};
pub use response::{read_response, HttpResponse};
pub use url::TargetUrl;
