use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use log::{debug, info};
use serde_json::{Map, Value};

use crate::error::ManifestError;
use crate::manifest::{
    CANONICAL_PLATFORM_KEYS, Family, INSTALLER_EXTENSIONS, PLACEHOLDER_CHECKSUM, classify,
    is_comment_key, is_placeholder_url,
};
use crate::util::{format_megabytes, parse_release_date};

const RULE_WIDTH: usize = 50;
const CHECKSUM_PREVIEW_CHARS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Pass,
    Info,
    Warning,
    Error,
}

impl Severity {
    const fn symbol(self) -> &'static str {
        match self {
            Severity::Pass => "✅",
            Severity::Info => "ℹ️ ",
            Severity::Warning => "⚠️ ",
            Severity::Error => "❌",
        }
    }
}

/// Where a finding came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Top-level required fields (`version`, `releaseDate`, `platforms`).
    Field,
    /// A single entry under `platforms`.
    Platform(String),
    /// Checks over all platforms at once.
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub scope: Scope,
    pub message: String,
}

impl Finding {
    fn new(severity: Severity, scope: &Scope, message: impl Into<String>) -> Self {
        Self {
            severity,
            scope: scope.clone(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "{} Warning: {}", self.severity.symbol(), self.message),
            Severity::Info => write!(f, "{} Note: {}", self.severity.symbol(), self.message),
            _ => write!(f, "{} {}", self.severity.symbol(), self.message),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyCounts {
    pub windows: usize,
    pub macos: usize,
    pub linux: usize,
}

impl FamilyCounts {
    fn record(&mut self, family: Family) {
        match family {
            Family::Windows => self.windows += 1,
            Family::MacOs => self.macos += 1,
            Family::Linux => self.linux += 1,
            Family::Unknown => {}
        }
    }

    pub fn total(&self) -> usize {
        self.windows + self.macos + self.linux
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    PassWithWarnings,
    Fail,
}

impl Verdict {
    /// Process exit status: warnings alone never fail a release.
    pub const fn exit_code(self) -> u8 {
        match self {
            Verdict::Pass | Verdict::PassWithWarnings => 0,
            Verdict::Fail => 1,
        }
    }
}

/// Every finding for one manifest, in the order the document was scanned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerdictReport {
    pub findings: Vec<Finding>,
    /// `None` when `platforms` was missing or not an object.
    pub counts: Option<FamilyCounts>,
}

impl VerdictReport {
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.severity == severity)
            .count()
    }

    pub fn verdict(&self) -> Verdict {
        if self.error_count() > 0 {
            Verdict::Fail
        } else if self.warning_count() > 0 {
            Verdict::PassWithWarnings
        } else {
            Verdict::Pass
        }
    }

    fn push(&mut self, severity: Severity, scope: &Scope, message: impl Into<String>) {
        self.findings.push(Finding::new(severity, scope, message));
    }
}

/// Read, parse and check the manifest at `path`.
///
/// # Errors
/// Returns [`ManifestError`] when the file is missing, unreadable or not JSON.
/// Field problems are never errors here; they are findings in the report.
pub fn validate_file(path: &Path) -> Result<VerdictReport, ManifestError> {
    debug!("validator: reading {}", path.display());
    let raw = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ManifestError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ManifestError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let document: Value = serde_json::from_str(raw.trim_start_matches('\u{feff}')).map_err(
        |err| ManifestError::MalformedDocument {
            path: path.to_path_buf(),
            message: err.to_string(),
        },
    )?;

    let report = validate_document(&document);
    info!(
        "validator: {} finished with {} error(s), {} warning(s)",
        path.display(),
        report.error_count(),
        report.warning_count()
    );
    Ok(report)
}

/// Check an already parsed manifest document. The whole document is always
/// scanned so every problem is reported at once.
pub fn validate_document(document: &Value) -> VerdictReport {
    let empty = Map::new();
    let root = document.as_object().unwrap_or(&empty);
    let mut report = VerdictReport::default();

    check_text_field(&mut report, root, "version");
    check_release_date(&mut report, root);

    let Some(platforms) = root.get("platforms").and_then(Value::as_object) else {
        report.push(
            Severity::Error,
            &Scope::Field,
            "Missing or invalid field: platforms (expected an object)",
        );
        return report;
    };
    report.push(
        Severity::Pass,
        &Scope::Field,
        format!("platforms: object with {} entries", platforms.len()),
    );

    let mut counts = FamilyCounts::default();
    for (key, entry) in platforms {
        if is_comment_key(key) {
            continue;
        }
        let family = classify(key);
        counts.record(family);
        check_platform(&mut report, key, family, entry);
    }

    if counts.total() == 0 {
        report.push(Severity::Error, &Scope::Summary, "Error: No valid platforms found!");
    }
    report.counts = Some(counts);
    report
}

fn required_text<'a>(root: &'a Map<String, Value>, field: &str) -> Result<&'a str, String> {
    match root.get(field) {
        None | Some(Value::Null) => Err(format!("Missing required field: {field}")),
        Some(Value::String(text)) if text.trim().is_empty() => {
            Err(format!("Missing required field: {field}"))
        }
        Some(Value::String(text)) => Ok(text),
        Some(_) => Err(format!("Invalid field: {field} must be a string")),
    }
}

fn check_text_field(report: &mut VerdictReport, root: &Map<String, Value>, field: &str) {
    match required_text(root, field) {
        Ok(text) => report.push(Severity::Pass, &Scope::Field, format!("{field}: {text}")),
        Err(message) => report.push(Severity::Error, &Scope::Field, message),
    }
}

fn check_release_date(report: &mut VerdictReport, root: &Map<String, Value>) {
    match required_text(root, "releaseDate") {
        Ok(text) if parse_release_date(text).is_some() => {
            report.push(Severity::Pass, &Scope::Field, format!("releaseDate: {text}"));
        }
        Ok(text) => report.push(
            Severity::Warning,
            &Scope::Field,
            format!("releaseDate \"{text}\" is not an ISO-8601 date (will be shown verbatim)"),
        ),
        Err(message) => report.push(Severity::Error, &Scope::Field, message),
    }
}

fn check_platform(report: &mut VerdictReport, key: &str, family: Family, entry: &Value) {
    let scope = Scope::Platform(key.to_owned());

    if CANONICAL_PLATFORM_KEYS.contains(&key) {
        report.push(Severity::Pass, &scope, format!("Family: {family}"));
    } else if family == Family::Unknown {
        report.push(
            Severity::Warning,
            &scope,
            format!("Unknown platform key \"{key}\" (not shown in any section)"),
        );
    } else {
        report.push(
            Severity::Warning,
            &scope,
            format!("Unknown platform key \"{key}\" (grouped under {family})"),
        );
    }

    let Some(entry) = entry.as_object() else {
        report.push(Severity::Error, &scope, "Entry must be an object with a url field");
        return;
    };

    check_url(report, &scope, entry.get("url"));
    check_label(report, &scope, entry.get("label"));
    check_size(report, &scope, entry.get("size"));
    check_checksum(report, &scope, entry.get("checksum"));

    if entry.get("available") == Some(&Value::Bool(false)) {
        report.push(Severity::Info, &scope, "Marked as unavailable (will be hidden)");
    }
}

fn check_url(report: &mut VerdictReport, scope: &Scope, url: Option<&Value>) {
    match url {
        None | Some(Value::Null) => report.push(Severity::Error, scope, "Missing URL"),
        Some(Value::String(url)) if is_placeholder_url(url) => report.push(
            Severity::Warning,
            scope,
            "Placeholder URL detected, this platform will be hidden on the website",
        ),
        Some(Value::String(url)) if has_installer_extension(url) => {
            report.push(Severity::Pass, scope, format!("URL: {url}"));
        }
        Some(Value::String(_)) => report.push(
            Severity::Error,
            scope,
            format!(
                "Invalid file extension. Must end with: {}",
                INSTALLER_EXTENSIONS.join(", ")
            ),
        ),
        Some(_) => report.push(Severity::Error, scope, "URL must be a string"),
    }
}

/// Extension check on the path part of a link, ignoring `?query` and `#fragment`.
fn has_installer_extension(url: &str) -> bool {
    let url = url.trim();
    let path = url.split(['?', '#']).next().unwrap_or(url);
    INSTALLER_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn check_label(report: &mut VerdictReport, scope: &Scope, label: Option<&Value>) {
    match label {
        Some(Value::String(label)) if !label.trim().is_empty() => {
            report.push(Severity::Pass, scope, format!("Label: {label}"));
        }
        Some(Value::String(_)) | Some(Value::Null) | None => report.push(
            Severity::Warning,
            scope,
            "Missing label (will use platform key as fallback)",
        ),
        Some(_) => report.push(
            Severity::Warning,
            scope,
            "Label must be a string (will use platform key as fallback)",
        ),
    }
}

fn check_size(report: &mut VerdictReport, scope: &Scope, size: Option<&Value>) {
    match size.map(|value| (value, value.as_u64())) {
        None | Some((Value::Null, _)) | Some((_, Some(0))) => {
            report.push(Severity::Warning, scope, "Missing or zero file size");
        }
        Some((_, Some(bytes))) => {
            report.push(Severity::Pass, scope, format!("Size: {} MB", format_megabytes(bytes)));
        }
        Some((_, None)) => report.push(
            Severity::Warning,
            scope,
            "Size must be a whole number of bytes (will show \"Download\")",
        ),
    }
}

fn check_checksum(report: &mut VerdictReport, scope: &Scope, checksum: Option<&Value>) {
    match checksum {
        Some(Value::String(sum)) if sum.trim() == PLACEHOLDER_CHECKSUM => {
            report.push(Severity::Warning, scope, "Placeholder checksum detected");
        }
        Some(Value::String(sum)) if !sum.trim().is_empty() => {
            let preview: String = sum.trim().chars().take(CHECKSUM_PREVIEW_CHARS).collect();
            report.push(Severity::Pass, scope, format!("Checksum: {preview}..."));
        }
        Some(Value::String(_)) | Some(Value::Null) | None => report.push(
            Severity::Warning,
            scope,
            "Missing checksum (recommended for security)",
        ),
        Some(_) => report.push(Severity::Warning, scope, "Checksum must be a string"),
    }
}

fn rule() -> String {
    "═".repeat(RULE_WIDTH)
}

/// Write the human-readable report: required fields, one block per platform,
/// the per-family summary and the verdict. Error lines and the failed verdict
/// go to `err`, everything else to `out`.
pub fn write_report(
    out: &mut impl Write,
    err: &mut impl Write,
    report: &VerdictReport,
) -> io::Result<()> {
    writeln!(out, "📋 Checking required fields...")?;
    let mut current_platform: Option<&str> = None;
    let mut platforms_started = false;

    for finding in &report.findings {
        if let Scope::Platform(key) = &finding.scope {
            if !platforms_started {
                writeln!(out, "\n🔧 Validating platform entries...")?;
                platforms_started = true;
            }
            if current_platform != Some(key.as_str()) {
                writeln!(out, "\nPlatform: {key}")?;
                current_platform = Some(key.as_str());
            }
        }
        let sink: &mut dyn Write = if finding.severity == Severity::Error {
            &mut *err
        } else {
            &mut *out
        };
        match finding.scope {
            Scope::Field => writeln!(sink, "{finding}")?,
            Scope::Platform(_) => writeln!(sink, "  {finding}")?,
            Scope::Summary => {}
        }
    }

    if let Some(counts) = report.counts {
        writeln!(out, "\n📊 Platform Summary:")?;
        writeln!(out, "  Windows: {}", counts.windows)?;
        writeln!(out, "  macOS: {}", counts.macos)?;
        writeln!(out, "  Linux: {}", counts.linux)?;
    }
    for finding in report.findings.iter().filter(|f| f.scope == Scope::Summary) {
        if finding.severity == Severity::Error {
            writeln!(err, "\n{finding}")?;
        } else {
            writeln!(out, "\n{finding}")?;
        }
    }

    writeln!(out, "\n{}", rule())?;
    match report.verdict() {
        Verdict::Fail => writeln!(err, "\n❌ Validation FAILED with errors")?,
        Verdict::PassWithWarnings => {
            writeln!(out, "\n⚠️  Validation PASSED with warnings")?;
            writeln!(
                out,
                "Your release config will work, but consider addressing the warnings above."
            )?;
        }
        Verdict::Pass => {
            writeln!(out, "\n✅ Validation PASSED")?;
            writeln!(out, "Your release configuration looks good!")?;
        }
    }
    Ok(())
}

/// Entry point of the validator command: prints the banner and report and maps
/// the outcome onto the process exit code.
pub fn run(path: &Path) -> ExitCode {
    println!("Flowtics Release Validator\n");
    println!("Validating: {}", path.display());
    println!("{}\n", rule());

    let report = match validate_file(path) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("❌ Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let written = write_report(&mut io::stdout().lock(), &mut io::stderr().lock(), &report);
    if let Err(err) = written {
        eprintln!("❌ Error: unable to write report: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::from(report.verdict().exit_code())
}
