//! Token-based caller authentication adapters.

mod hmac_token;

pub use hmac_token::{EPHEMERAL_SECRET_LEN, HmacTokenAuthority, TokenIdentityResolver};
