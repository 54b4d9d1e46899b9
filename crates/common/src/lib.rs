/**
 * Storage relay.
 *  A thin client over the Dropbox HTTP API that
 *  uploads a byte stream to a configured path and
 *  asks for a public share link to it.
 */
pub mod relay;
/**
 * Helper for reporting build version information
 *  at startup and over the status endpoints.
 */
pub mod version;

pub mod prelude {
    pub use crate::relay::{
        AccessToken, RelayClient, RelayConfig, RelayError, ShareSettings, StorageConfig,
        UploadBody, WriteMode,
    };
    pub use crate::version::build_info;
}
