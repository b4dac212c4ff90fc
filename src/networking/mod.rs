use std::path::PathBuf;

use log::{debug, warn};
use reqwest::Client;

use crate::error::FetchError;
use crate::manifest::Manifest;

const USER_AGENT: &str = concat!("flowtics-release/", env!("CARGO_PKG_VERSION"));

/// Loads the release manifest for the download page. A single request per
/// load; no retries and no timeout beyond the transport's own.
#[derive(Clone)]
pub struct ManifestClient {
    client: Client,
}

impl ManifestClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|err| {
                warn!("network client: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self { client }
    }

    #[cfg(test)]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch and parse the manifest. `source` is an `http(s)://` URL or a
    /// local path, which lets a release be previewed before it is uploaded.
    ///
    /// # Errors
    /// Returns [`FetchError`] for transport failures, non-2xx responses,
    /// unreadable files, and bodies that are not a manifest.
    pub async fn fetch(&self, source: &str) -> Result<Manifest, FetchError> {
        let body = if is_remote(source) {
            self.fetch_remote(source).await?
        } else {
            read_local(source).await?
        };
        Ok(Manifest::from_json(body.trim_start_matches('\u{feff}'))?)
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, FetchError> {
        debug!("network client: GET {url}");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("network client: {url} answered {status}");
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

impl Default for ManifestClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn read_local(source: &str) -> Result<String, FetchError> {
    let path = PathBuf::from(source.strip_prefix("file://").unwrap_or(source));
    debug!("network client: reading {}", path.display());
    match tokio::fs::read_to_string(&path).await {
        Ok(body) => Ok(body),
        Err(source) => Err(FetchError::Io { path, source }),
    }
}

fn is_remote(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
