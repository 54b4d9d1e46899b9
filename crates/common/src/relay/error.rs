use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("access token is empty")]
    MissingAccessToken,
    #[error("HTTP request failed: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("request to storage provider timed out")]
    Timeout,
    #[error("HTTP status {0}: {1}")]
    HttpStatus(StatusCode, String),
    #[error("could not encode request argument: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid JSON in response: {0}")]
    InvalidJson(#[source] serde_json::Error),
    #[error("response did not contain a share link url")]
    MissingUrl,
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl RelayError {
    /// Sort transport errors into timeouts and everything else
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Timeout
        } else {
            RelayError::Reqwest(err)
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RelayError::Timeout)
    }
}
