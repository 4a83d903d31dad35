use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use engine_logging::{clear_current_target, engine_debug, engine_error, set_current_target};
use mediaharvest_core::{
    ManifestRecord, Paginator, PaginatorError, ResumeLoadError, ResumeState, Target, TargetError,
    TokenPatterns, DEFAULT_BASE_URL,
};
use thiserror::Error;
use url::Url;

use crate::download::{HttpMediaDownloader, MediaDownloader};
use crate::feed::FeedRun;
use crate::fetch::{FetchSettings, HttpClient};
use crate::filename::media_filename;
use crate::manifest::{read_manifest, ManifestError, ManifestMode, ManifestWriter, MANIFEST_FILENAME};
use crate::page::{HttpPageFetcher, PageFetcher, PageSettings, PageSettingsError};
use crate::persist::{ensure_output_dir, AtomicFileWriter, PersistError};
use crate::report::{LoggingProgressSink, ProgressSink};
use crate::{FetchError, HarvestEvent, TargetReport};

pub const DEFAULT_REQUESTED: usize = 50;

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Each target gets `{output_dir}/{target name}`.
    pub output_dir: PathBuf,
    pub base_url: Url,
    /// New items wanted per target.
    pub requested: usize,
    /// Continue from an existing manifest instead of starting over.
    pub resume: bool,
    /// Stop a target's run after this many page fetches.
    pub max_pages: Option<u32>,
    pub fetch: FetchSettings,
    pub page: PageSettings,
}

impl HarvestConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url parses"),
            requested: DEFAULT_REQUESTED,
            resume: false,
            max_pages: None,
            fetch: FetchSettings::default(),
            page: PageSettings::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("invalid target: {0}")]
    Target(#[from] TargetError),
    #[error(transparent)]
    Paginator(#[from] PaginatorError),
    #[error("cannot resume: {0}")]
    Resume(#[from] ResumeLoadError),
    #[error("manifest: {0}")]
    Manifest(#[from] ManifestError),
    #[error("storage: {0}")]
    Persist(#[from] PersistError),
    #[error("page fetch failed after {saved} saved items: {source}")]
    PageFetch {
        #[source]
        source: FetchError,
        saved: usize,
    },
    #[error("http client: {0}")]
    Client(#[source] FetchError),
    #[error(transparent)]
    PageSettings(#[from] PageSettingsError),
    #[error("{0} is listed more than once")]
    DuplicateTarget(Target),
}

/// Runs targets one after another: resume, paginate, download, record.
pub struct Harvester {
    config: HarvestConfig,
    patterns: &'static TokenPatterns,
    fetcher: Arc<dyn PageFetcher>,
    downloader: Arc<dyn MediaDownloader>,
    sink: Arc<dyn ProgressSink>,
}

impl Harvester {
    pub fn new(
        config: HarvestConfig,
        fetcher: Arc<dyn PageFetcher>,
        downloader: Arc<dyn MediaDownloader>,
        sink: Arc<dyn ProgressSink>,
    ) -> Self {
        Self {
            config,
            patterns: TokenPatterns::shared(),
            fetcher,
            downloader,
            sink,
        }
    }

    /// HTTP fetcher and downloader sharing one client, reporting to the log.
    pub fn with_http(config: HarvestConfig) -> Result<Self, HarvestError> {
        let client = HttpClient::new(config.fetch.clone()).map_err(HarvestError::Client)?;
        let fetcher = HttpPageFetcher::new(client.clone(), &config.page)?;
        let downloader = HttpMediaDownloader::new(client);
        Ok(Self::new(
            config,
            Arc::new(fetcher),
            Arc::new(downloader),
            Arc::new(LoggingProgressSink),
        ))
    }

    /// `{output_dir}/{mode}/{name}`, so a tag and a user sharing a name keep
    /// separate manifests.
    pub fn target_dir(&self, target: &Target) -> PathBuf {
        self.config
            .output_dir
            .join(target.mode.as_str())
            .join(&target.name)
    }

    /// Harvests every target in order. A failing target is logged and the
    /// rest still run. A target listed twice fails the second time without
    /// touching its directory.
    pub async fn harvest_all(
        &self,
        targets: &[Target],
    ) -> Vec<(Target, Result<TargetReport, HarvestError>)> {
        let mut results = Vec::with_capacity(targets.len());
        let mut started = HashSet::new();
        for target in targets {
            let result = if started.insert(target) {
                self.harvest_target(target).await
            } else {
                Err(HarvestError::DuplicateTarget(target.clone()))
            };
            if let Err(err) = &result {
                engine_error!("{} failed: {}", target, err);
            }
            results.push((target.clone(), result));
        }
        results
    }

    /// Runs one target to completion.
    ///
    /// Log lines carry the target label through a thread-local, so the
    /// returned future must be awaited in place (for example under
    /// `block_on`) rather than handed to `tokio::spawn`, where it could
    /// resume on another worker thread.
    pub async fn harvest_target(&self, target: &Target) -> Result<TargetReport, HarvestError> {
        set_current_target(target.label());
        let result = self.run_target(target).await;
        clear_current_target();
        result
    }

    async fn run_target(&self, target: &Target) -> Result<TargetReport, HarvestError> {
        let dir = self.target_dir(target);
        ensure_output_dir(&dir)?;
        let manifest_path = dir.join(MANIFEST_FILENAME);

        let resume = if self.config.resume && manifest_path.exists() {
            let records = read_manifest(&manifest_path)?;
            engine_debug!("{} recorded rows in {}", records.len(), manifest_path.display());
            ResumeState::load(records)?
        } else {
            ResumeState::fresh()
        };
        let mode = if resume.is_fresh() {
            ManifestMode::Truncate
        } else {
            ManifestMode::Append
        };

        let feed_url = target.feed_url(&self.config.base_url)?;
        let paginator = Paginator::new(
            target,
            self.config.requested,
            &resume.seed_seen,
            self.patterns,
        )?
        .with_page_limit(self.config.max_pages);

        self.sink.emit(HarvestEvent::TargetStarted {
            target: target.clone(),
            resumed_from: (!resume.is_fresh()).then_some(resume.next_index),
        });

        let files = AtomicFileWriter::new(dir);
        let mut manifest = ManifestWriter::open(&manifest_path, mode)?;
        let mut run = FeedRun::new(
            target.clone(),
            feed_url,
            paginator,
            self.fetcher.as_ref(),
            self.sink.as_ref(),
        );

        // The index is fixed when an item is yielded, whether or not its
        // download succeeds; only successes get a manifest row.
        let mut next_index = resume.next_index;
        let mut saved = 0;
        let mut failed = 0;
        while let Some(item) = run
            .next_item()
            .await
            .map_err(|source| HarvestError::PageFetch { source, saved })?
        {
            let file_index = next_index;
            next_index += 1;

            let payload = match self.downloader.download(&item.media_url).await {
                Ok(payload) => payload,
                Err(error) => {
                    failed += 1;
                    self.sink.emit(HarvestEvent::DownloadFailed {
                        target: target.clone(),
                        file_index,
                        media_url: item.media_url,
                        error,
                    });
                    continue;
                }
            };

            let filename =
                media_filename(file_index, &item.media_url, payload.content_type.as_deref());
            let path = files.write_bytes(&filename, &payload.bytes)?;
            manifest.append(&ManifestRecord::from_item(file_index, &item))?;
            saved += 1;
            self.sink.emit(HarvestEvent::ItemSaved {
                target: target.clone(),
                file_index,
                media_url: item.media_url,
                path,
            });
        }

        let report = TargetReport {
            target: target.clone(),
            yielded: run.progress().yielded,
            saved,
            failed,
            next_index,
            stop_reason: run.stop_reason(),
        };
        self.sink.emit(HarvestEvent::TargetFinished(report.clone()));
        Ok(report)
    }
}
