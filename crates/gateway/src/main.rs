//! picdrop - image upload gateway
//!
//! Accepts JPEG and PNG uploads over HTTP, checks them and relays each one
//! to Dropbox, answering with a share link per file.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use url::Url;

use common::prelude::{AccessToken, RelayConfig, StorageConfig};
use common::relay::{DEFAULT_REMOTE_PATH, DEFAULT_SHARE_LINK_URL, DEFAULT_UPLOAD_URL};
use service::config::{DEFAULT_MAX_FILE_BYTES, DEFAULT_MEMORY_BUFFER_BYTES};
use service::{Config, UploadLimits};

/// picdrop - relay image uploads to Dropbox
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on for HTTP requests
    #[arg(short, long, env = "PICDROP_PORT", default_value_t = 8080)]
    port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "PICDROP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Dropbox OAuth access token
    #[arg(long, env = "DROPBOX_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,

    /// Dropbox folder that uploads are stored under
    #[arg(long, env = "DROPBOX_DEFAULT_PATH", default_value = DEFAULT_REMOTE_PATH)]
    remote_path: String,

    /// Upload endpoint
    #[arg(long, env = "DROPBOX_UPLOAD_URL", default_value = DEFAULT_UPLOAD_URL)]
    upload_url: Url,

    /// Share link endpoint
    #[arg(long, env = "DROPBOX_SHARE_LINK_URL", default_value = DEFAULT_SHARE_LINK_URL)]
    share_link_url: Url,

    /// Seconds allowed for each remote call
    #[arg(long, env = "PICDROP_REMOTE_TIMEOUT", default_value_t = 60)]
    remote_timeout: u64,

    /// Largest accepted file in bytes
    #[arg(long, env = "PICDROP_MAX_UPLOAD_SIZE", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    max_upload_size: u64,

    /// Bytes of a file kept in memory before spilling to disk
    #[arg(long, env = "PICDROP_MEMORY_BUFFER_SIZE", default_value_t = DEFAULT_MEMORY_BUFFER_BYTES)]
    memory_buffer_size: usize,
}

impl Args {
    fn into_config(self) -> Result<Config> {
        let access_token = AccessToken::new(self.access_token);
        if access_token.is_empty() {
            bail!("DROPBOX_ACCESS_TOKEN must not be empty");
        }
        if self.remote_timeout == 0 {
            bail!("--remote-timeout must be at least one second");
        }

        let mut relay = RelayConfig::new(access_token);
        relay.upload_url = self.upload_url;
        relay.share_link_url = self.share_link_url;
        relay.timeout = Duration::from_secs(self.remote_timeout);
        relay.storage = StorageConfig {
            path_prefix: self.remote_path,
            ..StorageConfig::default()
        };

        let mut config = Config::new(relay);
        config.listen_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.port);
        config.limits = UploadLimits {
            max_file_bytes: self.max_upload_size,
            memory_buffer_bytes: self.memory_buffer_size,
            ..UploadLimits::default()
        };
        config.log_level = self.log_level.parse().unwrap_or(tracing::Level::INFO);

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config()?;
    service::spawn_service(&config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["picdrop"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse(&["--access-token", "secret"]).into_config().unwrap();
        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.limits.max_file_bytes, DEFAULT_MAX_FILE_BYTES);
        assert_eq!(config.relay.storage.path_prefix, "/file-upload");
        assert_eq!(config.relay.timeout, Duration::from_secs(60));
        assert_eq!(config.relay.upload_url.as_str(), DEFAULT_UPLOAD_URL);
        assert_eq!(config.log_level, tracing::Level::INFO);
    }

    #[test]
    fn test_overrides() {
        let config = parse(&[
            "--access-token",
            "secret",
            "--port",
            "9000",
            "--remote-path",
            "/photos",
            "--remote-timeout",
            "5",
            "--log-level",
            "debug",
        ])
        .into_config()
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.relay.storage.remote_path("a.png"), "/photos/a.png");
        assert_eq!(config.relay.timeout, Duration::from_secs(5));
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_blank_token_is_rejected() {
        assert!(parse(&["--access-token", "  "]).into_config().is_err());
    }
}
