use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dialoguer::Input;

#[derive(Parser, Debug)]
#[command(
    name = "page-mirror",
    about = "Save a single web page as a static offline mirror",
    version,
    long_about = "Downloads one page plus the CSS, JavaScript, font, and image files it references, rewrites the page to use the local copies, and writes everything under a directory named after the page's host. Linked pages are not crawled."
)]
pub struct MirrorCommand {
    /// The URL of the page to mirror; prompted for interactively when omitted
    pub url: Option<String>,

    /// Directory under which the per-host output directory is created
    #[arg(short, long, default_value = ".")]
    pub parent_dir: PathBuf,

    /// Timeout in seconds for each asset download
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// Suppress status output
    #[arg(short, long)]
    pub quiet: bool,
}

impl MirrorCommand {
    /// The URL from the command line, or an interactive prompt when none was
    /// given.
    pub fn target_url(&self) -> Result<String> {
        match &self.url {
            Some(url) => Ok(url.clone()),
            None => {
                let url: String = Input::new().with_prompt("Enter a URL").interact_text()?;
                Ok(url)
            }
        }
    }
}
