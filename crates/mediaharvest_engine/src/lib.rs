//! Mediaharvest engine: HTTP page fetching, media download, manifest and file
//! persistence, and the per-target harvest loop built on `mediaharvest_core`.
mod decode;
mod download;
mod feed;
mod fetch;
mod filename;
mod harvester;
mod manifest;
mod page;
mod persist;
mod report;
mod types;

pub use decode::{decode_page, DecodedPage};
pub use download::{HttpMediaDownloader, MediaDownloader};
pub use feed::FeedRun;
pub use fetch::{FetchOutput, FetchSettings, HttpClient};
pub use filename::{media_filename, DEFAULT_EXTENSION};
pub use harvester::{HarvestConfig, HarvestError, Harvester, DEFAULT_REQUESTED};
pub use manifest::{read_manifest, ManifestError, ManifestMode, ManifestWriter, MANIFEST_FILENAME};
pub use page::{
    extract_entries, parse_selector, HttpPageFetcher, PageFetcher, PageSettings,
    PageSettingsError,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use report::{LoggingProgressSink, ProgressSink};
pub use types::{FailureKind, FetchError, HarvestEvent, MediaPayload, TargetReport};
