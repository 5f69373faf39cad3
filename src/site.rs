use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::Url;

use crate::page::AssetKind;

/// On-disk layout of a mirrored page: a root directory named after the page's
/// host with one subdirectory per asset kind plus the rewritten `index.html`.
pub struct SiteLayout {
    root: PathBuf,
}

impl SiteLayout {
    /// Creates the output root and its asset subdirectories under `parent`.
    /// Idempotent; pre-existing directories are left alone.
    pub fn provision(parent: &Path, host: &str) -> Result<Self> {
        let root = parent.join(host);
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create output directory {}", root.display()))?;

        for kind in AssetKind::ALL {
            let dir = root.join(kind.subdir());
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create directory {}", dir.display()))?;
        }

        Ok(Self { root })
    }

    /// Directory name for a page URL: the host, with the port kept when one is
    /// present so mirrors of different ports do not collide.
    pub fn dir_name_for(url: &Url) -> Option<String> {
        let host = url.host_str()?;
        Some(match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dir_for(&self, kind: AssetKind) -> PathBuf {
        self.root.join(kind.subdir())
    }

    pub fn write_index(&self, html: &str) -> Result<PathBuf> {
        let path = self.root.join("index.html");
        fs::write(&path, html)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}
