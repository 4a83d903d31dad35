use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

use mediaharvest_core::{
    EntryError, PageEntries, PageEntry, ResumeLoadError, StopReason, Target,
};
use mediaharvest_engine::{
    read_manifest, FailureKind, FetchError, HarvestConfig, HarvestError, HarvestEvent, Harvester,
    ManifestError, MediaDownloader, MediaPayload, PageFetcher, ProgressSink, MANIFEST_FILENAME,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use url::Url;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

type PageScript = dyn Fn(&Url, u32) -> Result<PageEntries, FetchError> + Send + Sync;

struct ScriptedFeed {
    script: Box<PageScript>,
    fetched: Mutex<Vec<(String, u32)>>,
}

impl ScriptedFeed {
    fn new(
        script: impl Fn(&Url, u32) -> Result<PageEntries, FetchError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            fetched: Mutex::new(Vec::new()),
        })
    }

    fn depths(&self) -> Vec<u32> {
        self.fetched.lock().unwrap().iter().map(|(_, d)| *d).collect()
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFeed {
    async fn fetch_page(&self, feed_url: &Url, depth: u32) -> Result<PageEntries, FetchError> {
        self.fetched
            .lock()
            .unwrap()
            .push((feed_url.path().to_string(), depth));
        (self.script)(feed_url, depth)
    }
}

#[derive(Default)]
struct FakeDownloader {
    failing: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl FakeDownloader {
    fn failing(urls: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            requested: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl MediaDownloader for FakeDownloader {
    async fn download(&self, media_url: &str) -> Result<MediaPayload, FetchError> {
        self.requested.lock().unwrap().push(media_url.to_string());
        if self.failing.contains(media_url) {
            return Err(FetchError::new(FailureKind::HttpStatus(503), "unavailable"));
        }
        Ok(MediaPayload {
            bytes: media_url.as_bytes().to_vec().into(),
            content_type: Some("image/jpeg".to_string()),
        })
    }
}

#[derive(Default)]
struct CollectingSink {
    events: Mutex<Vec<HarvestEvent>>,
}

impl CollectingSink {
    fn take(&self) -> Vec<HarvestEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ProgressSink for CollectingSink {
    fn emit(&self, event: HarvestEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn config(dir: &Path, requested: usize, resume: bool) -> HarvestConfig {
    let mut config = HarvestConfig::new(dir);
    config.base_url = Url::parse("https://feed.example").unwrap();
    config.requested = requested;
    config.resume = resume;
    config
}

fn cdn(n: usize) -> String {
    format!("https://cdn.example/{n}.jpg")
}

/// Tag feed that reveals three new posts per scroll step and re-shows the
/// first one on every page.
fn endless_tag_page(_: &Url, depth: u32) -> Result<PageEntries, FetchError> {
    let start = depth as usize * 3;
    let mut page = vec![Ok(PageEntry::new(cdn(0), "pinned #top"))];
    page.extend((start..start + 3).map(|n| Ok(PageEntry::new(cdn(n), format!("post {n} #n{n}")))));
    Ok(page)
}

fn manifest_urls(dir: &Path) -> Vec<(u64, String)> {
    read_manifest(&dir.join(MANIFEST_FILENAME))
        .unwrap()
        .into_iter()
        .map(|r| (r.file_index, r.media_url))
        .collect()
}

#[tokio::test]
async fn tag_run_stops_after_first_page_when_satisfied() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(|_, depth| match depth {
        0 => Ok(vec![
            Ok(PageEntry::new("https://cdn.example/u1.jpg", "#a")),
            Ok(PageEntry::new("https://cdn.example/u2.jpg", "#b")),
        ]),
        _ => Ok(vec![
            Ok(PageEntry::new("https://cdn.example/u1.jpg", "#a")),
            Ok(PageEntry::new("https://cdn.example/u3.jpg", "#c")),
        ]),
    });
    let sink = Arc::new(CollectingSink::default());
    let harvester = Harvester::new(
        config(temp.path(), 2, false),
        feed.clone(),
        Arc::new(FakeDownloader::default()),
        sink.clone(),
    );
    let target = Target::tag("sunset").unwrap();

    let report = harvester.harvest_target(&target).await.unwrap();

    assert_eq!(feed.depths(), vec![0]);
    assert_eq!(report.yielded, 2);
    assert_eq!(report.saved, 2);
    assert_eq!(report.next_index, 2);
    assert_eq!(report.stop_reason, Some(StopReason::Satisfied));

    let dir = temp.path().join("tag").join("sunset");
    let rows = read_manifest(&dir.join(MANIFEST_FILENAME)).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].file_index, 0);
    assert_eq!(rows[0].media_url, "https://cdn.example/u1.jpg");
    assert_eq!(rows[0].hashtags, vec!["a"]);
    assert_eq!(rows[1].hashtags, vec!["b"]);
    assert_eq!(fs::read(dir.join("0.jpg")).unwrap(), b"https://cdn.example/u1.jpg");
    assert_eq!(fs::read(dir.join("1.jpg")).unwrap(), b"https://cdn.example/u2.jpg");

    let events = sink.take();
    assert!(matches!(events.first(), Some(HarvestEvent::TargetStarted { resumed_from: None, .. })));
    assert!(matches!(events.last(), Some(HarvestEvent::TargetFinished(_))));
    let saved: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            HarvestEvent::ItemSaved { file_index, .. } => Some(*file_index),
            _ => None,
        })
        .collect();
    assert_eq!(saved, vec![0, 1]);
}

#[tokio::test]
async fn resumed_run_appends_new_items_only() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let target = Target::tag("sea").unwrap();
    let dir = temp.path().join("tag").join("sea");

    let first = Harvester::new(
        config(temp.path(), 4, false),
        ScriptedFeed::new(endless_tag_page),
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );
    first.harvest_target(&target).await.unwrap();
    let before = manifest_urls(&dir);
    assert_eq!(before.len(), 4);

    let sink = Arc::new(CollectingSink::default());
    let second = Harvester::new(
        config(temp.path(), 3, true),
        ScriptedFeed::new(endless_tag_page),
        Arc::new(FakeDownloader::default()),
        sink.clone(),
    );
    let report = second.harvest_target(&target).await.unwrap();
    assert_eq!(report.saved, 3);
    assert_eq!(report.next_index, 7);
    assert!(matches!(
        sink.take().first(),
        Some(HarvestEvent::TargetStarted { resumed_from: Some(4), .. })
    ));

    let after = manifest_urls(&dir);
    assert_eq!(after.len(), 7);
    assert_eq!(&after[..4], &before[..]);
    assert_eq!(
        after.iter().map(|(i, _)| *i).collect::<Vec<_>>(),
        vec![0, 1, 2, 3, 4, 5, 6]
    );
    let distinct: HashSet<_> = after.iter().map(|(_, u)| u.clone()).collect();
    assert_eq!(distinct.len(), after.len());
}

#[tokio::test]
async fn failed_download_keeps_its_index_and_gets_no_row() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let target = Target::tag("gaps").unwrap();
    let dir = temp.path().join("tag").join("gaps");
    let feed_page = |_: &Url, _: u32| -> Result<PageEntries, FetchError> {
        Ok((1..=4)
            .map(|n| Ok(PageEntry::new(cdn(n), "")))
            .collect::<PageEntries>())
    };

    let downloader = FakeDownloader::failing(&[&cdn(2)]);
    let sink = Arc::new(CollectingSink::default());
    let harvester = Harvester::new(
        config(temp.path(), 3, false),
        ScriptedFeed::new(feed_page),
        downloader.clone(),
        sink.clone(),
    );
    let report = harvester.harvest_target(&target).await.unwrap();

    assert_eq!(report.yielded, 3);
    assert_eq!(report.saved, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.next_index, 3);
    assert_eq!(manifest_urls(&dir), vec![(0, cdn(1)), (2, cdn(3))]);
    assert!(dir.join("0.jpg").exists());
    assert!(!dir.join("1.jpg").exists());
    assert_eq!(fs::read(dir.join("2.jpg")).unwrap(), cdn(3).as_bytes());
    assert!(sink.take().iter().any(|e| matches!(
        e,
        HarvestEvent::DownloadFailed { file_index: 1, .. }
    )));

    // The failed url was never recorded, so a resumed run picks it up again
    // after the highest recorded index.
    let retry = Harvester::new(
        config(temp.path(), 1, true),
        ScriptedFeed::new(feed_page),
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );
    retry.harvest_target(&target).await.unwrap();
    assert_eq!(
        manifest_urls(&dir),
        vec![(0, cdn(1)), (2, cdn(3)), (3, cdn(2))]
    );
    assert!(dir.join("3.jpg").exists());
}

#[tokio::test]
async fn fresh_run_overwrites_previous_manifest() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let target = Target::tag("again").unwrap();
    for _ in 0..2 {
        let harvester = Harvester::new(
            config(temp.path(), 2, false),
            ScriptedFeed::new(endless_tag_page),
            Arc::new(FakeDownloader::default()),
            Arc::new(CollectingSink::default()),
        );
        harvester.harvest_target(&target).await.unwrap();
    }
    assert_eq!(
        manifest_urls(&temp.path().join("tag").join("again")),
        vec![(0, cdn(0)), (1, cdn(1))]
    );
}

#[tokio::test]
async fn small_profile_ends_without_reaching_request() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(|_, _| {
        Ok((1..=3).map(|n| Ok(PageEntry::new(cdn(n), "@me"))).collect())
    });
    let harvester = Harvester::new(
        config(temp.path(), 50, false),
        feed.clone(),
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );

    let report = harvester
        .harvest_target(&Target::user("tiny").unwrap())
        .await
        .unwrap();

    assert_eq!(report.saved, 3);
    assert_eq!(report.stop_reason, Some(StopReason::FeedExhausted));
    assert_eq!(feed.depths(), vec![0, 1]);
    let rows = read_manifest(&temp.path().join("user").join("tiny").join(MANIFEST_FILENAME)).unwrap();
    assert_eq!(rows[0].mentions, vec!["me"]);
}

#[tokio::test]
async fn malformed_entries_are_reported_and_skipped() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(|_, _| {
        Ok(vec![
            Err(EntryError::MissingAttribute {
                position: 0,
                attribute: "src",
            }),
            Ok(PageEntry::new(cdn(1), "")),
        ])
    });
    let sink = Arc::new(CollectingSink::default());
    let harvester = Harvester::new(
        config(temp.path(), 1, false),
        feed,
        Arc::new(FakeDownloader::default()),
        sink.clone(),
    );

    let report = harvester
        .harvest_target(&Target::tag("messy").unwrap())
        .await
        .unwrap();

    assert_eq!(report.saved, 1);
    assert!(sink
        .take()
        .iter()
        .any(|e| matches!(e, HarvestEvent::EntrySkipped { .. })));
}

#[tokio::test]
async fn page_limit_ends_an_empty_feed() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(|_, _| Ok(Vec::new()));
    let mut cfg = config(temp.path(), 5, false);
    cfg.max_pages = Some(3);
    let harvester = Harvester::new(
        cfg,
        feed.clone(),
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );

    let report = harvester
        .harvest_target(&Target::tag("empty").unwrap())
        .await
        .unwrap();

    assert_eq!(report.yielded, 0);
    assert_eq!(report.stop_reason, Some(StopReason::PageLimit));
    assert_eq!(feed.depths(), vec![0, 1, 2]);
}

#[tokio::test]
async fn page_fetch_error_fails_only_that_target() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(|url, depth| {
        if url.path().ends_with("/broken") {
            Err(FetchError::new(FailureKind::Timeout, "too slow"))
        } else {
            endless_tag_page(url, depth)
        }
    });
    let harvester = Harvester::new(
        config(temp.path(), 2, false),
        feed,
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );
    let targets = vec![Target::tag("broken").unwrap(), Target::tag("fine").unwrap()];

    let results = harvester.harvest_all(&targets).await;

    assert_eq!(results.len(), 2);
    assert!(matches!(
        &results[0].1,
        Err(HarvestError::PageFetch { saved: 0, source }) if source.kind == FailureKind::Timeout
    ));
    assert_eq!(results[1].1.as_ref().unwrap().saved, 2);
}

#[tokio::test]
async fn corrupt_manifest_blocks_resume() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("tag").join("corrupt");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(MANIFEST_FILENAME), "0,https://a,,,\n1,,,,\n").unwrap();

    let feed = ScriptedFeed::new(endless_tag_page);
    let harvester = Harvester::new(
        config(temp.path(), 2, true),
        feed.clone(),
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );

    let err = harvester
        .harvest_target(&Target::tag("corrupt").unwrap())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Manifest(ManifestError::Resume(ResumeLoadError::MissingUrl { line: 2 }))
    ));
    assert!(feed.depths().is_empty());
    assert_eq!(
        fs::read_to_string(dir.join(MANIFEST_FILENAME)).unwrap(),
        "0,https://a,,,\n1,,,,\n"
    );
}

#[tokio::test]
async fn tag_and_user_with_same_name_keep_separate_storage() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(|url, _| {
        let prefix = if url.path().starts_with("/explore/tags/") {
            "tag"
        } else {
            "user"
        };
        Ok((1..=3)
            .map(|n| Ok(PageEntry::new(format!("https://cdn.example/{prefix}/{n}.jpg"), "")))
            .collect())
    });
    let harvester = Harvester::new(
        config(temp.path(), 3, false),
        feed,
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );
    let targets = vec![Target::tag("cats").unwrap(), Target::user("cats").unwrap()];

    let results = harvester.harvest_all(&targets).await;
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    let tag_dir = temp.path().join("tag").join("cats");
    let user_dir = temp.path().join("user").join("cats");
    assert_eq!(harvester.target_dir(&targets[0]), tag_dir);
    assert_eq!(harvester.target_dir(&targets[1]), user_dir);
    assert_eq!(
        manifest_urls(&tag_dir),
        vec![
            (0, "https://cdn.example/tag/1.jpg".to_string()),
            (1, "https://cdn.example/tag/2.jpg".to_string()),
            (2, "https://cdn.example/tag/3.jpg".to_string()),
        ]
    );
    assert_eq!(
        manifest_urls(&user_dir)[0],
        (0, "https://cdn.example/user/1.jpg".to_string())
    );
    assert_eq!(fs::read(tag_dir.join("0.jpg")).unwrap(), b"https://cdn.example/tag/1.jpg");
    assert_eq!(fs::read(user_dir.join("0.jpg")).unwrap(), b"https://cdn.example/user/1.jpg");
}

#[tokio::test]
async fn repeated_target_runs_once() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let feed = ScriptedFeed::new(endless_tag_page);
    let harvester = Harvester::new(
        config(temp.path(), 2, false),
        feed.clone(),
        Arc::new(FakeDownloader::default()),
        Arc::new(CollectingSink::default()),
    );
    let sea = Target::tag("sea").unwrap();

    let results = harvester.harvest_all(&[sea.clone(), sea.clone()]).await;

    assert_eq!(results[0].1.as_ref().unwrap().saved, 2);
    assert!(matches!(&results[1].1, Err(HarvestError::DuplicateTarget(t)) if *t == sea));
    assert_eq!(feed.depths(), vec![0]);
    assert_eq!(
        manifest_urls(&temp.path().join("tag").join("sea")),
        vec![(0, cdn(0)), (1, cdn(1))]
    );
}
