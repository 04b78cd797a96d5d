//! Inbound adapters translating transport requests into router calls while
//! keeping framework details at the edge.

pub mod http;
