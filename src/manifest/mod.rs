use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod platform;

pub use platform::{DISPLAY_FAMILIES, Family, classify};

/// Suffixes accepted for installer download links.
pub const INSTALLER_EXTENSIONS: [&str; 7] =
    [".exe", ".dmg", ".AppImage", ".deb", ".rpm", ".zip", ".tar.gz"];

/// Advisory set of platform keys the download page expects. Other keys are
/// accepted; they only earn a validator warning.
pub const CANONICAL_PLATFORM_KEYS: [&str; 7] = [
    "win-x64",
    "win-ia32",
    "win-arm64",
    "mac-x64",
    "mac-arm64",
    "linux-x64",
    "linux-arm64",
];

/// Checksum value left behind by the release template.
pub const PLACEHOLDER_CHECKSUM: &str = "sha256_checksum_here";

/// Link used by hand-edited manifests for "not published yet".
pub const PLACEHOLDER_URL: &str = "#";

pub const RELEASE_NOTES_FALLBACK: &str = "No release notes available";

/// Keys beginning with `_` inside `platforms` are author comments.
pub fn is_comment_key(key: &str) -> bool {
    key.starts_with('_')
}

/// `true` for a link that cannot be followed: blank after trimming or `#`.
pub fn is_placeholder_url(url: &str) -> bool {
    let trimmed = url.trim();
    trimmed.is_empty() || trimmed == PLACEHOLDER_URL
}

/// Release manifest as served next to the download page (`releases/latest.json`).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub release_date: String,
    #[serde(default)]
    pub release_notes: Option<String>,
    /// Kept as raw JSON so comment keys with arbitrary values survive and the
    /// document order is preserved.
    pub platforms: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub available: Option<bool>,
}

impl Manifest {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Platform entries in document order, comment keys skipped. Values that
    /// are not JSON objects are dropped with a warning.
    pub fn entries(&self) -> Vec<(&str, PlatformEntry)> {
        self.platforms
            .iter()
            .filter(|(key, _)| !is_comment_key(key))
            .filter_map(|(key, value)| match PlatformEntry::from_value(value) {
                Some(entry) => Some((key.as_str(), entry)),
                None => {
                    warn!("manifest: ignoring platform entry {key}: expected an object");
                    None
                }
            })
            .collect()
    }

    pub fn release_notes_or_default(&self) -> &str {
        self.release_notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .unwrap_or(RELEASE_NOTES_FALLBACK)
    }
}

impl PlatformEntry {
    /// Read an entry leniently: fields of the wrong type count as absent, the
    /// same way the validator reports them as warnings rather than dropping
    /// the whole entry.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |field: &str| object.get(field).and_then(Value::as_str).map(str::to_owned);
        Some(Self {
            url: text("url"),
            label: text("label"),
            size: object.get("size").and_then(Value::as_u64),
            checksum: text("checksum"),
            available: object.get("available").and_then(Value::as_bool),
        })
    }

    /// The download link, if it is one a visitor can actually follow.
    pub fn resolved_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .filter(|url| !is_placeholder_url(url))
            .map(str::trim)
    }

    /// An explicit `available: false` hides the entry whatever its link says.
    pub fn is_available(&self) -> bool {
        self.available != Some(false) && self.resolved_url().is_some()
    }

    pub fn title<'a>(&'a self, key: &'a str) -> &'a str {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn manifest(platforms: Value) -> Manifest {
        serde_json::from_value(json!({
            "version": "1.2.0",
            "releaseDate": "2024-01-15",
            "platforms": platforms,
        }))
        .expect("fixture manifest")
    }

    #[test]
    fn keeps_document_order_and_skips_comments() {
        let manifest = manifest(json!({
            "_comment": "Set url to # until the build is uploaded",
            "linux-x64": { "url": "a.AppImage" },
            "win-x64": { "url": "a.exe" },
            "mac-arm64": { "url": "a.dmg" },
        }));

        let keys: Vec<&str> = manifest.entries().into_iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["linux-x64", "win-x64", "mac-arm64"]);
    }

    #[test]
    fn drops_non_object_entries_only() {
        let manifest = manifest(json!({
            "win-x64": "a.exe",
            "mac-x64": { "url": "a.dmg", "size": "big", "available": "no" },
            "linux-x64": { "url": "a.deb" },
        }));

        let entries = manifest.entries();
        let keys: Vec<&str> = entries.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, ["mac-x64", "linux-x64"]);
        assert_eq!(entries[0].1.size, None);
        assert_eq!(entries[0].1.available, None);
        assert_eq!(entries[0].1.resolved_url(), Some("a.dmg"));
    }

    #[test]
    fn placeholder_and_blank_links_are_not_resolved() {
        for url in ["", "   ", "#", " # "] {
            let entry = PlatformEntry {
                url: Some(url.into()),
                ..Default::default()
            };
            assert_eq!(entry.resolved_url(), None, "url {url:?}");
            assert!(!entry.is_available());
        }
        assert!(!PlatformEntry::default().is_available());
    }

    #[test]
    fn explicit_unavailable_wins_over_a_real_link() {
        let entry = PlatformEntry {
            url: Some("a.AppImage".into()),
            available: Some(false),
            ..Default::default()
        };
        assert_eq!(entry.resolved_url(), Some("a.AppImage"));
        assert!(!entry.is_available());
    }

    #[test]
    fn title_falls_back_to_key() {
        let mut entry = PlatformEntry::default();
        assert_eq!(entry.title("win-x64"), "win-x64");
        entry.label = Some(" ".into());
        assert_eq!(entry.title("win-x64"), "win-x64");
        entry.label = Some("Windows (64-bit)".into());
        assert_eq!(entry.title("win-x64"), "Windows (64-bit)");
    }

    #[test]
    fn release_notes_fall_back_to_placeholder() {
        let mut manifest = manifest(json!({}));
        assert_eq!(manifest.release_notes_or_default(), RELEASE_NOTES_FALLBACK);
        manifest.release_notes = Some("Bug fixes".into());
        assert_eq!(manifest.release_notes_or_default(), "Bug fixes");
    }
}
