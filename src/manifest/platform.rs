use std::fmt;

use serde::Serialize;

/// Operating-system family used to group download sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Family {
    Windows,
    MacOs,
    Linux,
    Unknown,
}

/// Families that own a section on the download page, in display order.
pub const DISPLAY_FAMILIES: [Family; 3] = [Family::Windows, Family::MacOs, Family::Linux];

// Key prefix -> family. A key matches when it equals the prefix or continues
// with a `-` (so `win` and `win-x64` match, `windows-x64` does not).
const FAMILY_PREFIXES: [(&str, Family); 3] = [
    ("win", Family::Windows),
    ("mac", Family::MacOs),
    ("linux", Family::Linux),
];

impl Family {
    pub const fn label(self) -> &'static str {
        match self {
            Family::Windows => "Windows",
            Family::MacOs => "macOS",
            Family::Linux => "Linux",
            Family::Unknown => "Unknown",
        }
    }

    /// Family of the machine this binary runs on.
    pub fn host() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    fn from_os(os: &str) -> Self {
        match os {
            "windows" => Family::Windows,
            "macos" => Family::MacOs,
            "linux" => Family::Linux,
            _ => Family::Unknown,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a platform key into its OS family by prefix.
#[must_use]
pub fn classify(key: &str) -> Family {
    FAMILY_PREFIXES
        .iter()
        .find_map(|(prefix, family)| {
            key.strip_prefix(prefix)
                .filter(|rest| rest.is_empty() || rest.starts_with('-'))
                .map(|_| *family)
        })
        .unwrap_or(Family::Unknown)
}
