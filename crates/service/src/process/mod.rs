mod utils;

use std::time::Duration;

use tokio::time::timeout;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http::{self, HttpServerError};
use crate::{Config, ServiceState, StateSetupError};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Set up logging, build the service state and serve HTTP until
///  SIGINT/SIGTERM. Returns once the server has drained.
pub async fn spawn_service(config: &Config) -> Result<(), ServiceError> {
    let (non_blocking_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(non_blocking_writer)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stdout_layer).init();

    utils::register_panic_logger();
    utils::report_build_info();

    let (graceful_waiter, _shutdown_tx, shutdown_rx) =
        utils::graceful_shutdown_blocker().map_err(ServiceError::Signals)?;

    let state = match ServiceState::from_config(config, shutdown_rx.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("error creating server state: {}", e);
            return Err(e.into());
        }
    };

    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let http_rx = shutdown_rx.clone();
    let mut http_handle = tokio::spawn(async move {
        tracing::info!("Starting HTTP server on {}", listen_addr);
        http::run(listen_addr, log_level, state, http_rx).await
    });

    tokio::select! {
        // the server only stops on its own when it failed
        result = &mut http_handle => {
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => {
                    tracing::error!("HTTP server error: {}", e);
                    Err(e.into())
                }
                Err(e) => Err(ServiceError::Task(e)),
            };
        }
        _ = graceful_waiter => {
            tracing::info!("shutdown signal received, draining requests");
        }
    }

    match timeout(FINAL_SHUTDOWN_TIMEOUT, http_handle).await {
        Ok(Ok(Ok(()))) => {
            tracing::info!("shutdown complete");
            Ok(())
        }
        Ok(Ok(Err(e))) => Err(e.into()),
        Ok(Err(e)) => Err(ServiceError::Task(e)),
        Err(_) => {
            tracing::error!(
                "Failed to shut down within {} seconds",
                FINAL_SHUTDOWN_TIMEOUT.as_secs()
            );
            Err(ServiceError::ShutdownTimeout)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
    #[error(transparent)]
    State(#[from] StateSetupError),
    #[error(transparent)]
    Http(#[from] HttpServerError),
    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("service did not shut down in time")]
    ShutdownTimeout,
}
