use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, Response, StatusCode};
use url::Url;

use super::api_arg::{header_safe_json, CommitInfo, SharePayload};
use super::body::UploadBody;
use super::config::RelayConfig;
use super::error::RelayError;

const DROPBOX_API_ARG: &str = "Dropbox-API-Arg";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the storage provider's upload and sharing endpoints.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct RelayClient {
    config: Arc<RelayConfig>,
    client: Client,
}

impl RelayClient {
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        if config.access_token.is_empty() {
            return Err(RelayError::MissingAccessToken);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(config.timeout))
            .build()?;

        Ok(Self {
            config: Arc::new(config),
            client,
        })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Path the remote will store `filename` at
    pub fn remote_path(&self, filename: &str) -> String {
        self.config.storage.remote_path(filename)
    }

    /// Stream `body` to the upload endpoint as `filename`
    #[tracing::instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn upload(&self, filename: &str, body: UploadBody) -> Result<(), RelayError> {
        let path = self.remote_path(filename);
        let arg = header_safe_json(&CommitInfo::new(&self.config.storage, &path))
            .map_err(RelayError::Encode)?;
        let len = body.len();

        let response = self
            .client
            .post(self.config.upload_url.clone())
            .bearer_auth(self.config.access_token.expose())
            .header(DROPBOX_API_ARG, arg)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, len)
            .body(body.into_reqwest(filename))
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        let response = ensure_success(response).await?;
        tracing::info!(path = %path, bytes = len, status = %response.status(), "uploaded file");
        Ok(())
    }

    /// Create (or recover) a public link to a previously uploaded `filename`
    #[tracing::instrument(skip(self))]
    pub async fn share_link(&self, filename: &str) -> Result<Url, RelayError> {
        let path = self.remote_path(filename);
        let payload = SharePayload {
            path: &path,
            settings: &self.config.share,
        };

        let response = self
            .client
            .post(self.config.share_link_url.clone())
            .bearer_auth(self.config.access_token.expose())
            .json(&payload)
            .send()
            .await
            .map_err(RelayError::from_transport)?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(RelayError::from_transport)?;

        if status.is_success() {
            let url = parse_share_link(&body)?;
            tracing::info!(path = %path, url = %url, "created share link");
            return Ok(url);
        }

        // the remote refuses to create a second link for the same path,
        //  but tells us the one it already has
        if status == StatusCode::CONFLICT {
            if let Some(url) = existing_share_link(&body) {
                let url = Url::parse(&url)?;
                tracing::info!(path = %path, url = %url, "reusing existing share link");
                return Ok(url);
            }
        }

        Err(RelayError::HttpStatus(
            status,
            String::from_utf8_lossy(&body).into_owned(),
        ))
    }
}

async fn ensure_success(response: Response) -> Result<Response, RelayError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(RelayError::from_transport)?;
    Err(RelayError::HttpStatus(status, text))
}

fn parse_share_link(body: &[u8]) -> Result<Url, RelayError> {
    let value: serde_json::Value = serde_json::from_slice(body).map_err(RelayError::InvalidJson)?;
    let url = value
        .get("url")
        .and_then(|u| u.as_str())
        .ok_or(RelayError::MissingUrl)?;
    Ok(Url::parse(url)?)
}

fn existing_share_link(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;
    if error.get(".tag")?.as_str()? != "shared_link_already_exists" {
        return None;
    }
    error
        .pointer("/shared_link_already_exists/metadata/url")?
        .as_str()
        .map(str::to_string)
}
