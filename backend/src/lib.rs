//! User-management RPC router.
//!
//! The [`domain`] module holds the router, authorization gate, and endpoint
//! handlers; [`outbound`] provides the in-memory user directory and HMAC
//! token adapters; [`inbound`] exposes the router over HTTP.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use config::ServerSettings;
pub use middleware::Trace;
