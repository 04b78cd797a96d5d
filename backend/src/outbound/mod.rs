//! Outbound adapters implementing domain ports.
//!
//! - **directory**: user storage behind [`UserDirectory`](crate::domain::ports::UserDirectory)
//! - **auth**: HMAC bearer tokens behind the identity ports
//!
//! Adapters translate between domain types and their backing mechanism and
//! hold no routing or authorization logic.

pub mod auth;
pub mod directory;

pub use auth::{HmacTokenAuthority, TokenIdentityResolver};
pub use directory::InMemoryUserDirectory;
