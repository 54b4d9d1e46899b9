mod api_arg;
mod body;
mod client;
mod config;
mod error;
mod progress;

pub use api_arg::header_safe_json;
pub use body::UploadBody;
pub use client::RelayClient;
pub use config::{
    AccessToken, LinkAccess, LinkAudience, RelayConfig, RequestedVisibility, ShareSettings,
    StorageConfig, WriteMode, DEFAULT_REMOTE_PATH, DEFAULT_SHARE_LINK_URL, DEFAULT_TIMEOUT,
    DEFAULT_UPLOAD_URL,
};
pub use error::RelayError;
pub use progress::Progress;
