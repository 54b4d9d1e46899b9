use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use common::prelude::RelayConfig;

/// Largest single file accepted (100 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;
/// Bytes of a part held in memory before it spills to a temp file (32 MiB)
pub const DEFAULT_MEMORY_BUFFER_BYTES: usize = 32 * 1024 * 1024;
/// Whole-request body ceiling (1 GiB)
pub const DEFAULT_MAX_REQUEST_BYTES: usize = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadLimits {
    pub max_file_bytes: u64,
    pub memory_buffer_bytes: usize,
    pub max_request_bytes: usize,
}

impl UploadLimits {
    /// The file ceiling in whole megabytes, for error messages
    pub fn max_file_megabytes(&self) -> u64 {
        self.max_file_bytes / (1024 * 1024)
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            memory_buffer_bytes: DEFAULT_MEMORY_BUFFER_BYTES,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// address for the HTTP server to listen on
    pub listen_addr: SocketAddr,
    /// limits applied to every upload request
    pub limits: UploadLimits,

    // relay configuration
    /// remote endpoints, credentials and storage/share settings
    pub relay: RelayConfig,

    // misc
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(relay: RelayConfig) -> Self {
        Self {
            listen_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8080),
            limits: UploadLimits::default(),
            relay,
            log_level: tracing::Level::INFO,
        }
    }
}
