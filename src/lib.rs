pub mod cli;
pub mod console;
pub mod downloader;
pub mod mirror;
pub mod normalizer;
pub mod page;
pub mod site;

// Re-export main types for convenience
pub use cli::MirrorCommand;
pub use console::Console;
pub use downloader::{AssetDownloader, DownloadOutcome};
pub use mirror::PageMirror;
pub use normalizer::NormalizeError;
pub use page::{AssetKind, AssetRef, FetchError, MirrorReport, PageDocument};
pub use site::SiteLayout;
