//! permstore-server: Configuration and operations tooling
//!
//! This crate wires the permission core into an executable:
//! - Configuration loading (defaults, YAML file, environment)
//! - Logging bootstrap
//! - The operations behind the `permstore` binary
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              permstore-server               │
//! ├─────────────────────────────────────────────┤
//! │  config.rs   - Configuration management     │
//! │  logging.rs  - Subscriber setup             │
//! │  commands.rs - consistency, merged,         │
//! │                who-can, types               │
//! └─────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod config;
pub mod logging;

// Re-exports for convenience
pub use config::{ConfigLoadError, PermstoreConfig};
pub use logging::{init_logging, LoggingConfig};
