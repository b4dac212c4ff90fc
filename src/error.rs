use std::path::PathBuf;

use thiserror::Error;

/// Fatal problems reading a manifest from disk. These stop validation before
/// any field is checked.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON format in {}: {message}", .path.display())]
    MalformedDocument { path: PathBuf, message: String },
}

/// Failures of the network collaborator. The page only ever shows the
/// `Display` text of these.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unable to fetch release information: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("Invalid release manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("No downloads are currently available for this release.")]
    NoDownloadsAvailable,
}

/// Raised when a download item is activated without a usable link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClickError {
    #[error("The {platform_key} download is not available yet. Please check back later.")]
    UnavailableUrl { platform_key: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_read_like_the_download_page() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP error! status: 404");
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = ManifestError::FileNotFound {
            path: PathBuf::from("releases/latest.json"),
        };
        assert_eq!(err.to_string(), "File not found: releases/latest.json");
    }
}
