//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → RelayState snapshot shared via ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the RelayState snapshot
//!     → in-flight requests finish on the old snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - CORS and listener settings are read once at startup; projects reload live

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CorsConfig, IngestConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProjectConfig, RelayConfig, TimeoutConfig, UpstreamConfig,
};
pub use validation::ValidationError;
