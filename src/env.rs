use std::env;
use std::path::PathBuf;

/// Conventional location of the manifest, relative to the site root.
pub const DEFAULT_MANIFEST_PATH: &str = "releases/latest.json";

pub const MANIFEST_PATH_VAR: &str = "FLOWTICS_MANIFEST_PATH";
pub const RELEASES_URL_VAR: &str = "FLOWTICS_RELEASES_URL";
pub const HIGHLIGHT_RECOMMENDED_VAR: &str = "FLOWTICS_HIGHLIGHT_RECOMMENDED";

/// Settings shared by the validator and the page preview. Command-line flags
/// override these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// File checked by the validator when no path is given.
    pub manifest_path: PathBuf,
    /// Where the page loads the manifest from: an `http(s)://` URL or a path.
    pub releases_url: String,
    /// Mark the section matching the visitor's OS. Off unless asked for.
    pub highlight_recommended: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            releases_url: DEFAULT_MANIFEST_PATH.to_owned(),
            highlight_recommended: false,
        }
    }
}

impl ReleaseConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            manifest_path: non_empty(MANIFEST_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.manifest_path),
            releases_url: non_empty(RELEASES_URL_VAR).unwrap_or(defaults.releases_url),
            highlight_recommended: non_empty(HIGHLIGHT_RECOMMENDED_VAR)
                .map(|value| parse_flag(&value))
                .unwrap_or(defaults.highlight_recommended),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
