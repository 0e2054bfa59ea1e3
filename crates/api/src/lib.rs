//! HTTP API: server, routing, and request/response mapping for the
//! permission core.

pub mod app;
pub mod context;
pub mod identity;
pub mod middleware;
