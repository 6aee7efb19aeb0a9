//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown_signal() resolves
//!
//! Shutdown (shutdown.rs):
//!     trigger() → server stops accepting → in-flight requests finish
//!               → forwarder drains the envelope queue → exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;
