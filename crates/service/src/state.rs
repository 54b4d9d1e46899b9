use tokio::sync::watch;

use common::prelude::{RelayClient, RelayError};

use super::config::{Config, UploadLimits};

/// Main service state, shared read-only by every request
#[derive(Clone)]
pub struct State {
    relay: RelayClient,
    limits: UploadLimits,
    shutdown_rx: watch::Receiver<()>,
}

impl State {
    pub fn from_config(
        config: &Config,
        shutdown_rx: watch::Receiver<()>,
    ) -> Result<Self, StateSetupError> {
        let relay = RelayClient::new(config.relay.clone())?;
        tracing::info!(
            upload_url = %config.relay.upload_url,
            share_link_url = %config.relay.share_link_url,
            path_prefix = %config.relay.storage.path_prefix,
            "relay configured"
        );

        Ok(Self {
            relay,
            limits: config.limits,
            shutdown_rx,
        })
    }

    pub fn relay(&self) -> &RelayClient {
        &self.relay
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// True once the shutdown signal has fired (or its sender is gone)
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_rx.has_changed().unwrap_or(true)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("failed to set up storage relay: {0}")]
    Relay(#[from] RelayError),
}
