use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, ClientBuilder};
use reqwest::redirect::Policy;
use url::Url;

use crate::console::Console;
use crate::page::AssetKind;

pub const DEFAULT_ASSET_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("page-mirror/", env!("CARGO_PKG_VERSION"));

/// What became of one asset. A `Failed` reference still gets rewritten in the
/// document, so callers use this to count the dangling ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Fetched over the network and written to disk.
    Saved(PathBuf),
    /// Destination file already existed; no network call was made.
    Cached(PathBuf),
    /// Nothing was written; the local reference will dangle.
    Failed(String),
}

impl DownloadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DownloadOutcome::Failed(_))
    }
}

/// Shared client for the page fetch and asset downloads. No global timeout:
/// the top-level fetch is unbounded, assets get a per-request timeout.
pub fn build_client() -> Result<Client> {
    ClientBuilder::new()
        .use_rustls_tls()
        .user_agent(USER_AGENT)
        .timeout(None)
        .build()
        .context("failed to build HTTP client")
}

/// Client for the normalizer's HEAD probes; redirects stay visible so each
/// hop can be inspected and the chain bounded.
pub fn build_head_client() -> Result<Client> {
    ClientBuilder::new()
        .use_rustls_tls()
        .user_agent(USER_AGENT)
        .redirect(Policy::none())
        .build()
        .context("failed to build HEAD client")
}

/// Final path segment of the URL; query and fragment never contribute.
pub fn remote_file_name(url: &Url) -> Option<String> {
    let name = url.path_segments()?.last()?;
    (!name.is_empty()).then(|| name.to_string())
}

pub struct AssetDownloader<'a> {
    client: &'a Client,
    console: &'a Console,
    timeout: Duration,
}

impl<'a> AssetDownloader<'a> {
    pub fn new(client: &'a Client, console: &'a Console, timeout: Duration) -> Self {
        Self {
            client,
            console,
            timeout,
        }
    }

    /// Downloads one asset into `dir`, named after the final path segment of
    /// the query-stripped URL. An existing file short-circuits the network
    /// call entirely (first-write-wins; contents are not verified against this
    /// URL). Never deletes or overwrites; at most one file per call.
    pub fn download(&self, url: &Url, dir: &Path, kind: AssetKind) -> DownloadOutcome {
        let file_name = match remote_file_name(url) {
            Some(name) => name,
            None => {
                let reason = format!("{url} has no file name in its path");
                self.console.download_failed(kind, url.as_str(), &reason);
                return DownloadOutcome::Failed(reason);
            }
        };

        let file_path = dir.join(&file_name);
        if file_path.is_file() {
            self.console.cached(kind, &file_path);
            return DownloadOutcome::Cached(file_path);
        }

        let response = match self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
        {
            Ok(response) => response,
            Err(error) => {
                let reason = format!("request failed: {error}");
                self.console.download_failed(kind, url.as_str(), &reason);
                return DownloadOutcome::Failed(reason);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let reason = format!("server answered {status}");
            self.console.download_failed(kind, url.as_str(), &reason);
            return DownloadOutcome::Failed(reason);
        }

        let body = match response.bytes() {
            Ok(bytes) => bytes,
            Err(error) => {
                let reason = format!("failed to read body: {error}");
                self.console.download_failed(kind, url.as_str(), &reason);
                return DownloadOutcome::Failed(reason);
            }
        };

        if let Err(error) = fs::write(&file_path, &body) {
            let reason = format!("failed to write {}: {error}", file_path.display());
            self.console.download_failed(kind, url.as_str(), &reason);
            return DownloadOutcome::Failed(reason);
        }

        self.console.saved(kind, &file_path);
        DownloadOutcome::Saved(file_path)
    }
}
