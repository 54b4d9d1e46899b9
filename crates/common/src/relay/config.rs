use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Dropbox endpoint that accepts a raw file body
pub const DEFAULT_UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";
/// Dropbox endpoint that creates a public link for an uploaded file
pub const DEFAULT_SHARE_LINK_URL: &str =
    "https://api.dropboxapi.com/2/sharing/create_shared_link_with_settings";
/// Folder inside the app's Dropbox space that uploads land in
pub const DEFAULT_REMOTE_PATH: &str = "/file-upload";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Bearer token for the storage provider.
///  Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// How the remote resolves a write to a path that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    Add,
    Overwrite,
}

/// Upload-side settings sent with every file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// folder that uploaded files are placed under
    pub path_prefix: String,
    pub mode: WriteMode,
    pub autorename: bool,
    pub mute: bool,
    pub strict_conflict: bool,
}

impl StorageConfig {
    /// Destination path for `filename` under the configured prefix
    pub fn remote_path(&self, filename: &str) -> String {
        let prefix = self.path_prefix.trim_end_matches('/');
        format!("{}/{}", prefix, filename)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path_prefix: DEFAULT_REMOTE_PATH.to_string(),
            mode: WriteMode::Add,
            autorename: false,
            mute: false,
            strict_conflict: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAccess {
    Viewer,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkAudience {
    Public,
    Team,
    NoOne,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedVisibility {
    Public,
    TeamOnly,
}

/// Settings requested for every share link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSettings {
    pub access: LinkAccess,
    pub allow_download: bool,
    pub audience: LinkAudience,
    pub requested_visibility: RequestedVisibility,
}

impl Default for ShareSettings {
    fn default() -> Self {
        Self {
            access: LinkAccess::Viewer,
            allow_download: true,
            audience: LinkAudience::Public,
            requested_visibility: RequestedVisibility::Public,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub upload_url: Url,
    pub share_link_url: Url,
    pub access_token: AccessToken,
    /// applies to each outbound request, including the body transfer
    pub timeout: Duration,
    pub storage: StorageConfig,
    pub share: ShareSettings,
}

impl RelayConfig {
    /// Dropbox endpoints and default settings for the given token
    pub fn new(access_token: AccessToken) -> Self {
        Self {
            upload_url: Url::parse(DEFAULT_UPLOAD_URL).expect("valid default upload url"),
            share_link_url: Url::parse(DEFAULT_SHARE_LINK_URL)
                .expect("valid default share link url"),
            access_token,
            timeout: DEFAULT_TIMEOUT,
            storage: StorageConfig::default(),
            share: ShareSettings::default(),
        }
    }

    /// Point both endpoints at `base`, keeping the Dropbox API paths.
    ///  Used to aim the relay at a mock server.
    pub fn with_base_url(mut self, base: &Url) -> Result<Self, url::ParseError> {
        self.upload_url = base.join("/2/files/upload")?;
        self.share_link_url = base.join("/2/sharing/create_shared_link_with_settings")?;
        Ok(self)
    }
}
