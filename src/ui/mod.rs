//! Terminal presentation of the download page. Holds no logic of its own: it
//! draws whatever [`PageState`] it is handed.

use std::io::{self, BufRead, IsTerminal, Write};

use log::info;

use crate::page::state::PageState;
use crate::render::{DisplayModel, DownloadStarted, Notifier};

const PRODUCT_NAME: &str = "Flowtics";

pub struct TerminalView<W: Write> {
    out: W,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn show(&mut self, state: &PageState) -> io::Result<()> {
        match state {
            PageState::Loading => writeln!(self.out, "Loading release information..."),
            PageState::Error(message) => self.show_error(message),
            PageState::Ready(model) => self.show_ready(model),
        }
    }

    fn show_error(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "❌ Failed to Load Release Information")?;
        writeln!(self.out, "   {message}")?;
        writeln!(self.out, "   [Try Again]")
    }

    fn show_ready(&mut self, model: &DisplayModel) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{PRODUCT_NAME} {}", model.version_label)?;
        writeln!(self.out, "Released {}", model.release_date)?;
        writeln!(self.out)?;
        writeln!(self.out, "{}", model.release_notes)?;

        for section in &model.sections {
            writeln!(self.out)?;
            if section.recommended {
                writeln!(self.out, "{}  (recommended for your system)", section.family)?;
            } else {
                writeln!(self.out, "{}", section.family)?;
            }
            for item in &section.items {
                writeln!(self.out, "  ⬇ {}  [{}]", item.title, item.size_text)?;
                writeln!(self.out, "      {}", item.url)?;
            }
        }
        Ok(())
    }

    /// Inline message for a cancelled click; the rest of the page stays as is.
    pub fn alert(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "⚠️  {message}")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Transient "download started" toast written to stderr.
#[derive(Clone, Copy, Default)]
pub struct ConsoleToast;

impl Notifier for ConsoleToast {
    fn notify(&self, event: DownloadStarted) {
        info!(
            "toast: download started for {} (v{})",
            event.platform_key, event.version
        );
        let [title, body] = toast_lines(&event);
        eprintln!("✔ {title}\n  {body}");
    }
}

fn toast_lines(event: &DownloadStarted) -> [String; 2] {
    [
        "Download Started!".to_owned(),
        format!("Your {} installer is downloading...", event.platform_key),
    ]
}

/// Ask whether to reload after an error. Only interactive sessions are asked;
/// anything else is treated as "no".
pub fn prompt_retry() -> bool {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        return false;
    }
    print!("Try again? [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Family;
    use crate::render::{DisplayItem, FamilySection};

    fn rendered(state: &PageState) -> String {
        let mut view = TerminalView::new(Vec::new());
        view.show(state).unwrap();
        String::from_utf8(view.into_inner()).unwrap()
    }

    fn model(recommended: bool) -> DisplayModel {
        DisplayModel {
            version: "1.2.0".into(),
            version_label: "Version 1.2.0".into(),
            release_date: "January 15, 2024".into(),
            release_notes: "No release notes available".into(),
            sections: vec![FamilySection {
                family: Family::Linux,
                items: vec![DisplayItem {
                    platform_key: "linux-x64".into(),
                    title: "Linux AppImage".into(),
                    size_text: "85 MB".into(),
                    url: "https://cdn.example.com/Flowtics.AppImage".into(),
                }],
                recommended,
            }],
        }
    }

    #[test]
    fn draws_ready_state_sections() {
        let text = rendered(&PageState::Ready(model(false)));
        assert!(text.contains("Flowtics Version 1.2.0\nReleased January 15, 2024\n"));
        assert!(text.contains("\nLinux\n  ⬇ Linux AppImage  [85 MB]\n"));
        assert!(!text.contains("Windows"));
        assert!(!text.contains("recommended"));
    }

    #[test]
    fn marks_recommended_section() {
        let text = rendered(&PageState::Ready(model(true)));
        assert!(text.contains("Linux  (recommended for your system)"));
    }

    #[test]
    fn error_state_shows_message_verbatim_with_retry() {
        let text = rendered(&PageState::Error("HTTP error! status: 503".into()));
        assert!(text.contains("   HTTP error! status: 503\n"));
        assert!(text.contains("[Try Again]"));
    }

    #[test]
    fn toast_names_the_platform() {
        let lines = toast_lines(&DownloadStarted {
            platform_key: "mac-arm64".into(),
            version: "1.2.0".into(),
        });
        assert_eq!(lines[0], "Download Started!");
        assert_eq!(lines[1], "Your mac-arm64 installer is downloading...");
    }

    #[test]
    fn only_yes_answers_retry() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("nope"));
    }
}
