use reqwest::{Method, StatusCode};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("{method} {url} ended with status {status}:\n{body}")]
    Status {
        method: Method,
        url: Url,
        status: StatusCode,
        body: String,
    },

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {url}: {source}")]
    Decode {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry url `{0}` cannot be used as a base url")]
    InvalidUrl(Url),

    #[error("token contains characters that are not allowed in an HTTP header")]
    InvalidToken,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl RegistryError {
    /// Status code of the failed response, if the registry answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            RegistryError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            RegistryError::Status { url, .. }
            | RegistryError::Transport { url, .. }
            | RegistryError::Decode { url, .. }
            | RegistryError::InvalidUrl(url) => Some(url),
            RegistryError::InvalidToken | RegistryError::Client(_) => None,
        }
    }
}
