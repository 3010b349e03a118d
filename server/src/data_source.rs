use std::io::ErrorKind;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("Unknown schema version: {0}")]
    SchemaVersion(String),
    #[error("Malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Player not found")]
    Empty,
    #[error("Invalid URL: {0}")]
    Url(String),
}

/// Base location of the generated JSON files.
#[derive(Debug, Clone)]
pub enum DataSource {
    Http(reqwest::Url),
    Dir(PathBuf),
}

impl DataSource {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let with_slash = if raw.ends_with('/') {
                raw.to_owned()
            } else {
                format!("{raw}/")
            };
            match reqwest::Url::parse(&with_slash) {
                Ok(url) => return Self::Http(url),
                Err(e) => {
                    warn!(error = %e, base = raw, "invalid data base URL, treating it as a directory");
                }
            }
        }
        Self::Dir(PathBuf::from(raw))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Http(url) => url.to_string(),
            Self::Dir(path) => path.display().to_string(),
        }
    }

    /// Read `path` relative to the base. A missing file reads as `HTTP 404`.
    pub async fn fetch(&self, client: &reqwest::Client, path: &str) -> Result<Vec<u8>, FetchError> {
        match self {
            Self::Http(base) => {
                let url = base
                    .join(path)
                    .map_err(|e| FetchError::Url(e.to_string()))?;
                fetch_url(client, url).await
            }
            Self::Dir(root) => match tokio::fs::read(root.join(path)).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => Err(FetchError::Status(404)),
                Err(e) => Err(e.into()),
            },
        }
    }
}

/// Single GET; any non-2xx status is an error.
pub async fn fetch_url(client: &reqwest::Client, url: reqwest::Url) -> Result<Vec<u8>, FetchError> {
    let resp = client.get(url).send().await?;
    if !resp.status().is_success() {
        return Err(FetchError::Status(resp.status().as_u16()));
    }
    Ok(resp.bytes().await?.to_vec())
}
