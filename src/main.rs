use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, warn};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;

mod env;
mod error;
mod manifest;
mod networking;
mod page;
mod render;
mod ui;
mod util;
mod validator;

use crate::env::ReleaseConfig;
use crate::networking::ManifestClient;
use crate::page::ReleasePage;
use crate::page::state::{ClickOutcome, UserAction};
use crate::render::RenderOptions;
use crate::ui::{ConsoleToast, TerminalView};

#[derive(Parser, Debug)]
#[command(
    name = "flowtics-release",
    author,
    version,
    about = "Validate the Flowtics release manifest and preview the download page",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Manifest to validate (defaults to releases/latest.json).
    #[arg(value_name = "PATH")]
    manifest: Option<PathBuf>,

    /// Print the tool version and exit.
    #[arg(long)]
    version_only: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a manifest before publishing it.
    Validate {
        #[arg(value_name = "PATH")]
        manifest: Option<PathBuf>,
    },
    /// Load a manifest the way the download page does and print the result.
    Preview {
        /// URL or path of the manifest (defaults to FLOWTICS_RELEASES_URL).
        #[arg(value_name = "SOURCE")]
        source: Option<String>,

        /// Highlight the section matching this machine's OS.
        #[arg(long)]
        recommend: bool,

        /// Start the download for this platform key after loading.
        #[arg(long, value_name = "KEY")]
        download: Option<String>,

        /// Do not launch the browser when starting a download.
        #[arg(long, requires = "download")]
        no_open: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("flowtics-release {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let config = ReleaseConfig::from_env();
    match cli.command {
        Some(Command::Validate { manifest }) => {
            validator::run(&manifest.unwrap_or(config.manifest_path))
        }
        Some(Command::Preview {
            source,
            recommend,
            download,
            no_open,
        }) => {
            let config = ReleaseConfig {
                releases_url: source.unwrap_or(config.releases_url),
                highlight_recommended: recommend || config.highlight_recommended,
                ..config
            };
            preview(&config, download.as_deref(), !no_open)
        }
        None => validator::run(&cli.manifest.unwrap_or(config.manifest_path)),
    }
}

fn build_runtime() -> Option<Runtime> {
    match Builder::new_current_thread().enable_all().build() {
        Ok(rt) => Some(rt),
        Err(err) => {
            error!("preview: failed to create Tokio runtime ({err})");
            None
        }
    }
}

fn preview(config: &ReleaseConfig, download: Option<&str>, open_browser: bool) -> ExitCode {
    let Some(runtime) = build_runtime() else {
        return ExitCode::FAILURE;
    };
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut page = ReleasePage::new(
        ManifestClient::new(),
        config.releases_url.clone(),
        RenderOptions::from_config(config),
    );
    let mut view = TerminalView::new(std::io::stdout());
    let toast = ConsoleToast;

    runtime.block_on(page.load(&tx));
    loop {
        while let Ok(state) = rx.try_recv() {
            if let Err(err) = view.show(&state) {
                error!("preview: unable to draw page: {err}");
                return ExitCode::FAILURE;
            }
        }
        if !page.state.is_error() {
            break;
        }
        if !ui::prompt_retry() {
            return ExitCode::FAILURE;
        }
        runtime.block_on(page.handle_action(UserAction::Retry, &tx, &toast));
    }

    let Some(platform_key) = download else {
        return ExitCode::SUCCESS;
    };
    let click = UserAction::ClickDownload {
        platform_key: platform_key.to_owned(),
    };
    match runtime.block_on(page.handle_action(click, &tx, &toast)) {
        Some(ClickOutcome::Navigate(url)) => {
            if open_browser && let Err(err) = open::that(&url) {
                warn!("preview: could not open {url}: {err}");
                let _ = view.alert(&format!("Open {url} in your browser to download."));
            }
            ExitCode::SUCCESS
        }
        Some(ClickOutcome::Alert(message)) => {
            let _ = view.alert(&message);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_path_runs_the_validator() {
        let cli = Cli::try_parse_from(["flowtics-release", "dist/latest.json"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.manifest, Some(PathBuf::from("dist/latest.json")));

        let cli = Cli::try_parse_from(["flowtics-release"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.manifest.is_none());
    }

    #[test]
    fn parses_preview_options() {
        let cli = Cli::try_parse_from([
            "flowtics-release",
            "preview",
            "https://example.com/releases/latest.json",
            "--recommend",
            "--download",
            "win-x64",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Preview {
                source,
                recommend,
                download,
                no_open,
            }) => {
                assert_eq!(
                    source.as_deref(),
                    Some("https://example.com/releases/latest.json")
                );
                assert!(recommend);
                assert_eq!(download.as_deref(), Some("win-x64"));
                assert!(!no_open);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_more_than_one_manifest_path() {
        assert!(Cli::try_parse_from(["flowtics-release", "a.json", "b.json"]).is_err());
    }
}
