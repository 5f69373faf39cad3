use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::page::{AssetKind, MirrorReport};

/// Output sink for every user-facing line. Built once at program start and
/// handed down the pipeline, so no component writes to the terminal ambiently.
/// Status lines go to stdout and honor `quiet`; errors always go to stderr.
pub struct Console {
    quiet: bool,
}

impl Console {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn line(&self, text: String) {
        if !self.quiet {
            println!("{text}");
        }
    }

    pub fn banner(&self) {
        self.line(format!("[{}] {}", "Console".cyan(), "Page Mirror".cyan()));
    }

    pub fn task_start(&self, url: &str) {
        self.line(format!(
            "[{}] Starting task for {}",
            "Console".cyan(),
            url.cyan()
        ));
    }

    pub fn found(&self, kind: AssetKind, count: usize) {
        self.line(format!(
            "Found {} {} file(s)",
            count.to_string().yellow(),
            kind.label()
        ));
    }

    pub fn downloading(&self, kind: AssetKind, url: &str) {
        self.line(format!("Downloading {} file: {}", kind.label(), url.blue()));
    }

    pub fn cached(&self, kind: AssetKind, path: &Path) {
        self.line(
            format!("{} file already exists: {}", kind.label(), path.display())
                .yellow()
                .to_string(),
        );
    }

    pub fn saved(&self, kind: AssetKind, path: &Path) {
        self.line(
            format!("{} file was saved to {}", kind.label(), path.display())
                .green()
                .to_string(),
        );
    }

    pub fn download_failed(&self, kind: AssetKind, url: &str, reason: &str) {
        eprintln!(
            "{}",
            format!("Error downloading {} file {url}: {reason}", kind.label()).red()
        );
    }

    pub fn resolve_failed(&self, kind: AssetKind, reference: &str, error: &url::ParseError) {
        eprintln!(
            "{}",
            format!(
                "Error resolving {} reference {reference:?}: {error}",
                kind.label()
            )
            .red()
        );
    }

    pub fn completed(&self, index: &Path) {
        self.line(format!("{} {}", "Wrote".green(), index.display()));
    }

    pub fn summary(&self, report: &MirrorReport, elapsed: Duration) {
        if self.quiet {
            return;
        }
        println!();
        println!("{}", "Mirror statistics:".green());
        println!("Total CSS files: {}", report.css.to_string().yellow());
        println!("Total JS files: {}", report.js.to_string().yellow());
        println!("Total images: {}", report.images.to_string().yellow());
        if report.fonts > 0 {
            println!("Total font files: {}", report.fonts.to_string().yellow());
        }
        if report.failed > 0 {
            println!("Failed downloads: {}", report.failed.to_string().red());
        }
        println!("Completed in {elapsed:.2?}");
    }

    pub fn abort(&self, error: &anyhow::Error) {
        eprintln!("{}", format!("{error:#}").red());
    }

    /// Spinner shown while assets are fetched; hidden in quiet mode.
    pub fn spinner(&self) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap(),
        );
        bar
    }
}
