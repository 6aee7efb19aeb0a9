//! Security report ingestion relay.
//!
//! Accepts browser security reports (CSP, HPKP, Expect-CT, Expect-Staple),
//! normalizes them into events and forwards them as envelopes.

pub mod config;
pub mod envelope;
pub mod event;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod origin;
pub mod project;
pub mod report;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
