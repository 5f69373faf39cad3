use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::console::Console;
use crate::downloader::{build_client, build_head_client, AssetDownloader};
use crate::normalizer;
use crate::page::{local_reference, AssetKind, MirrorReport, PageDocument};
use crate::site::SiteLayout;

/// The whole run, one linear pipeline: normalize the operator URL, fetch and
/// parse the page, provision the output layout, then download and rewrite each
/// asset reference in turn before serializing `index.html`.
pub struct PageMirror<'a> {
    console: &'a Console,
    parent_dir: PathBuf,
    asset_timeout: Duration,
}

impl<'a> PageMirror<'a> {
    pub fn new(console: &'a Console, parent_dir: &Path, asset_timeout: Duration) -> Self {
        Self {
            console,
            parent_dir: parent_dir.to_path_buf(),
            asset_timeout,
        }
    }

    pub fn run(&self, raw_url: &str) -> Result<MirrorReport> {
        let started = Instant::now();

        let client = build_client()?;
        let head_client = build_head_client()?;

        let page_url = normalizer::normalize(&head_client, raw_url)?;
        self.console.task_start(page_url.as_str());

        // Fetch before any directory is created: a non-200 page leaves no
        // partial output behind.
        let mut page = PageDocument::fetch(&client, &page_url)?;

        let host = SiteLayout::dir_name_for(&page_url)
            .with_context(|| format!("page URL {page_url} has no host component"))?;
        let layout = SiteLayout::provision(&self.parent_dir, &host)?;

        let downloader = AssetDownloader::new(&client, self.console, self.asset_timeout);
        let refs = page.asset_refs();

        let mut report = MirrorReport::default();
        for asset in &refs {
            report.record(asset.kind);
        }
        for kind in AssetKind::ALL {
            if kind != AssetKind::Font || report.fonts > 0 {
                self.console.found(kind, report.count_for(kind));
            }
        }

        let spinner = self.console.spinner();
        for asset in &refs {
            let resolved = match page.resolve(&asset.original) {
                Ok(url) => url,
                Err(error) => {
                    self.console.resolve_failed(asset.kind, &asset.original, &error);
                    report.failed += 1;
                    continue;
                }
            };

            spinner.set_message(format!("Downloading {resolved}"));
            self.console.downloading(asset.kind, resolved.as_str());

            let outcome = downloader.download(&resolved, &layout.dir_for(asset.kind), asset.kind);
            if outcome.is_failure() {
                report.failed += 1;
            }

            // Rewritten whether or not the download succeeded; a failed asset
            // leaves a dangling local reference rather than a remote one.
            let local = local_reference(asset.kind, &resolved);
            page.rewrite_attr(asset.kind.attr(), &asset.original, &local);
        }
        spinner.finish_and_clear();

        let index = layout.write_index(page.html())?;
        self.console.completed(&index);
        self.console.summary(&report, started.elapsed());

        Ok(report)
    }
}
