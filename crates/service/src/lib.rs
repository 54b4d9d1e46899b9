//! Upload receiver for picdrop.
//!
//! This crate provides everything behind the gateway binary:
//! - Configuration (listen address, upload limits, relay settings)
//! - State management (ServiceState holding the relay client)
//! - HTTP handlers (index page, image upload, health checks)
//! - Process lifecycle (tracing setup, graceful shutdown)

pub mod config;
pub mod http;
pub mod process;
pub mod state;

// Re-export key types for convenience
pub use config::{Config, UploadLimits};
pub use process::{spawn_service, ServiceError};
pub use state::{State as ServiceState, StateSetupError};
