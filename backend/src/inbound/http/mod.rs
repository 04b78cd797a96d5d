//! HTTP inbound adapter exposing the RPC endpoint and health probes.

pub mod health;
pub mod rpc;
pub mod state;
