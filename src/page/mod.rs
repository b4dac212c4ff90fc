use log::{error, info, warn};
use tokio::sync::mpsc;

use crate::error::ClickError;
use crate::networking::ManifestClient;
use crate::page::state::{ClickOutcome, PageState, UserAction};
use crate::render::{self, Notifier, RenderOptions};

pub mod state;

/// Drives one download page: fetch the manifest, render it, and publish each
/// view state to the presentation layer.
pub struct ReleasePage {
    pub state: PageState,
    client: ManifestClient,
    source: String,
    options: RenderOptions,
    attempt: u32,
}

impl ReleasePage {
    pub fn new(client: ManifestClient, source: impl Into<String>, options: RenderOptions) -> Self {
        Self {
            state: PageState::Loading,
            client,
            source: source.into(),
            options,
            attempt: 0,
        }
    }

    /// Run fetch then render from scratch. Whatever the previous attempt
    /// produced is replaced; nothing partial is ever shown.
    pub async fn load(&mut self, updates: &mpsc::UnboundedSender<PageState>) {
        self.attempt += 1;
        self.set_state(PageState::Loading, updates);
        info!("load: attempt {} from {}", self.attempt, self.source);

        let state = match self.client.fetch(&self.source).await {
            Ok(manifest) => match render::render(&manifest, &self.options) {
                Ok(model) => {
                    info!(
                        "load: version {} ready with {} section(s)",
                        model.version,
                        model.sections.len()
                    );
                    PageState::Ready(model)
                }
                Err(err) => {
                    warn!("load: {err}");
                    PageState::Error(err.to_string())
                }
            },
            Err(err) => {
                error!("load: failed to load release info: {err}");
                PageState::Error(err.to_string())
            }
        };
        self.set_state(state, updates);
    }

    pub async fn handle_action(
        &mut self,
        action: UserAction,
        updates: &mpsc::UnboundedSender<PageState>,
        notifier: &impl Notifier,
    ) -> Option<ClickOutcome> {
        match action {
            UserAction::Retry => {
                info!("action: Retry");
                self.load(updates).await;
                None
            }
            UserAction::ClickDownload { platform_key } => {
                info!("action: ClickDownload {platform_key}");
                Some(self.click(&platform_key, notifier))
            }
        }
    }

    /// Click-time handling. Failures stay local to the click and never
    /// change the page state.
    pub fn click(&self, platform_key: &str, notifier: &impl Notifier) -> ClickOutcome {
        let PageState::Ready(model) = &self.state else {
            return unavailable(platform_key);
        };
        let Some(item) = model.find_item(platform_key) else {
            return unavailable(platform_key);
        };

        match render::activate(item, &model.version, notifier) {
            Ok(url) => ClickOutcome::Navigate(url.to_owned()),
            Err(err) => ClickOutcome::Alert(err.to_string()),
        }
    }

    fn set_state(&mut self, state: PageState, updates: &mpsc::UnboundedSender<PageState>) {
        self.state = state.clone();
        let _ = updates.send(state);
    }
}

fn unavailable(platform_key: &str) -> ClickOutcome {
    warn!("click: no download link for {platform_key}");
    ClickOutcome::Alert(
        ClickError::UnavailableUrl {
            platform_key: platform_key.to_owned(),
        }
        .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::DownloadStarted;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn manifest_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    fn page_for(file: &NamedTempFile) -> ReleasePage {
        ReleasePage::new(
            ManifestClient::new(),
            file.path().display().to_string(),
            RenderOptions::default(),
        )
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PageState>) -> Vec<PageState> {
        let mut states = Vec::new();
        while let Ok(state) = rx.try_recv() {
            states.push(state);
        }
        states
    }

    const READY_MANIFEST: &str = r##"{
        "version": "2.0.1",
        "releaseDate": "2024-06-01",
        "platforms": {
            "win-x64": { "url": "https://cdn.example.com/Flowtics.exe", "size": 1048576 },
            "mac-x64": { "url": "#" }
        }
    }"##;

    #[tokio::test]
    async fn load_publishes_loading_then_ready() {
        let file = manifest_file(READY_MANIFEST);
        let mut page = page_for(&file);
        let (tx, mut rx) = mpsc::unbounded_channel();

        page.load(&tx).await;

        let states = drain(&mut rx);
        assert_eq!(states.len(), 2);
        assert_eq!(states[0], PageState::Loading);
        let PageState::Ready(model) = &states[1] else {
            panic!("expected ready state, got {:?}", states[1]);
        };
        assert_eq!(model.version_label, "Version 2.0.1");
        assert_eq!(model.find_item("win-x64").unwrap().size_text, "1 MB");
        assert_eq!(page.state, states[1]);
    }

    #[tokio::test]
    async fn zero_downloads_is_an_error_state() {
        let file = manifest_file(
            r##"{
                "version": "2.0.1",
                "releaseDate": "2024-06-01",
                "platforms": { "win-x64": { "url": "#" }, "linux-x64": { "url": "a.deb", "available": false } }
            }"##,
        );
        let mut page = page_for(&file);
        let (tx, _rx) = mpsc::unbounded_channel();

        page.load(&tx).await;

        assert_eq!(
            page.state,
            PageState::Error("No downloads are currently available for this release.".into())
        );
    }

    #[tokio::test]
    async fn fetch_failures_are_shown_verbatim() {
        let file = manifest_file("not json");
        let mut page = page_for(&file);
        let (tx, _rx) = mpsc::unbounded_channel();

        page.load(&tx).await;

        let PageState::Error(message) = &page.state else {
            panic!("expected error state");
        };
        assert!(message.starts_with("Invalid release manifest:"), "{message}");
    }

    #[tokio::test]
    async fn retry_replaces_the_error_state() {
        let file = manifest_file("{");
        let mut page = page_for(&file);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (notify_tx, _notify_rx) = mpsc::unbounded_channel::<DownloadStarted>();

        page.load(&tx).await;
        assert!(page.state.is_error());

        std::fs::write(file.path(), READY_MANIFEST).unwrap();
        let outcome = page.handle_action(UserAction::Retry, &tx, &notify_tx).await;

        assert_eq!(outcome, None);
        assert!(matches!(page.state, PageState::Ready(_)));
        let states = drain(&mut rx);
        assert_eq!(states.len(), 4);
        assert_eq!(states[2], PageState::Loading);
    }

    #[tokio::test]
    async fn clicks_notify_and_navigate() {
        let file = manifest_file(READY_MANIFEST);
        let mut page = page_for(&file);
        let (tx, _rx) = mpsc::unbounded_channel();
        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<DownloadStarted>();
        page.load(&tx).await;

        let outcome = page
            .handle_action(
                UserAction::ClickDownload {
                    platform_key: "win-x64".into(),
                },
                &tx,
                &notify_tx,
            )
            .await;

        assert_eq!(
            outcome,
            Some(ClickOutcome::Navigate(
                "https://cdn.example.com/Flowtics.exe".into()
            ))
        );
        assert_eq!(
            notify_rx.try_recv().unwrap(),
            DownloadStarted {
                platform_key: "win-x64".into(),
                version: "2.0.1".into(),
            }
        );
    }

    #[tokio::test]
    async fn clicks_on_hidden_entries_alert_without_leaving_the_page() {
        let file = manifest_file(READY_MANIFEST);
        let mut page = page_for(&file);
        let (tx, _rx) = mpsc::unbounded_channel();
        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<DownloadStarted>();
        page.load(&tx).await;
        let before = page.state.clone();

        let outcome = page.click("mac-x64", &notify_tx);

        assert!(matches!(outcome, ClickOutcome::Alert(ref msg) if msg.contains("mac-x64")));
        assert!(notify_rx.try_recv().is_err());
        assert_eq!(page.state, before);
    }
}
