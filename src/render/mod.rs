//! Turns a release manifest into the immutable model the download page shows.

use log::{debug, info};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::env::ReleaseConfig;
use crate::error::{ClickError, RenderError};
use crate::manifest::{DISPLAY_FAMILIES, Family, Manifest, classify, is_placeholder_url};
use crate::util::{format_bytes, format_release_date};

const SIZE_UNKNOWN_TEXT: &str = "Download";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Family to mark as recommended. `None` keeps highlighting off.
    pub recommended: Option<Family>,
}

impl RenderOptions {
    pub fn from_config(config: &ReleaseConfig) -> Self {
        Self {
            recommended: config.highlight_recommended.then(Family::host),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayItem {
    pub platform_key: String,
    pub title: String,
    pub size_text: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilySection {
    pub family: Family,
    pub items: Vec<DisplayItem>,
    pub recommended: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayModel {
    pub version: String,
    pub version_label: String,
    pub release_date: String,
    pub release_notes: String,
    /// Only families with at least one download, in Windows, macOS, Linux order.
    pub sections: Vec<FamilySection>,
}

impl DisplayModel {
    #[cfg(test)]
    pub fn section(&self, family: Family) -> Option<&FamilySection> {
        self.sections.iter().find(|section| section.family == family)
    }

    pub fn find_item(&self, platform_key: &str) -> Option<&DisplayItem> {
        self.sections
            .iter()
            .flat_map(|section| &section.items)
            .find(|item| item.platform_key == platform_key)
    }
}

/// Build the display model for one page load.
///
/// Entries without a followable link or marked `available: false` are left
/// out, as are keys outside the three families. Families with nothing left are
/// omitted entirely.
///
/// # Errors
/// [`RenderError::NoDownloadsAvailable`] when no family has a download.
pub fn render(manifest: &Manifest, options: &RenderOptions) -> Result<DisplayModel, RenderError> {
    let mut buckets: [Vec<DisplayItem>; 3] = Default::default();

    for (key, entry) in manifest.entries() {
        if !entry.is_available() {
            debug!("render: hiding {key} (no link or marked unavailable)");
            continue;
        }
        let Some(slot) = DISPLAY_FAMILIES
            .iter()
            .position(|family| *family == classify(key))
        else {
            debug!("render: {key} matches no platform family");
            continue;
        };
        let Some(url) = entry.resolved_url() else {
            continue;
        };

        buckets[slot].push(DisplayItem {
            platform_key: key.to_owned(),
            title: entry.title(key).to_owned(),
            size_text: entry
                .size
                .filter(|size| *size > 0)
                .map(format_bytes)
                .unwrap_or_else(|| SIZE_UNKNOWN_TEXT.to_owned()),
            url: url.to_owned(),
        });
    }

    let sections: Vec<FamilySection> = DISPLAY_FAMILIES
        .into_iter()
        .zip(buckets)
        .filter(|(_, items)| !items.is_empty())
        .map(|(family, items)| FamilySection {
            family,
            items,
            recommended: options.recommended == Some(family),
        })
        .collect();

    if sections.is_empty() {
        info!("render: manifest {} has no downloadable entries", manifest.version);
        return Err(RenderError::NoDownloadsAvailable);
    }

    Ok(DisplayModel {
        version: manifest.version.clone(),
        version_label: format!("Version {}", manifest.version),
        release_date: format_release_date(&manifest.release_date),
        release_notes: manifest.release_notes_or_default().to_owned(),
        sections,
    })
}

/// Raised when a visitor starts a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadStarted {
    pub platform_key: String,
    pub version: String,
}

/// Receiver of "download started" events. Delivery is fire-and-forget.
pub trait Notifier {
    fn notify(&self, event: DownloadStarted);
}

impl Notifier for mpsc::UnboundedSender<DownloadStarted> {
    fn notify(&self, event: DownloadStarted) {
        // A closed receiver just means nobody is showing toasts any more.
        let _ = self.send(event);
    }
}

/// Click-time handling of a download item. The link is checked again, the
/// notifier is told, and the caller navigates to the returned URL itself.
///
/// # Errors
/// [`ClickError::UnavailableUrl`] when the link is blank or `#`; nothing is
/// notified in that case.
pub fn activate<'a>(
    item: &'a DisplayItem,
    version: &str,
    notifier: &impl Notifier,
) -> Result<&'a str, ClickError> {
    if is_placeholder_url(&item.url) {
        return Err(ClickError::UnavailableUrl {
            platform_key: item.platform_key.clone(),
        });
    }

    info!("Download started: {} - v{version}", item.platform_key);
    notifier.notify(DownloadStarted {
        platform_key: item.platform_key.clone(),
        version: version.to_owned(),
    });
    Ok(item.url.trim())
}
