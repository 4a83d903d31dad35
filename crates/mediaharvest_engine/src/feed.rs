use mediaharvest_core::{FeedItem, Paginator, RunProgress, Step, StopReason, Target};
use url::Url;

use crate::page::PageFetcher;
use crate::report::ProgressSink;
use crate::{FetchError, HarvestEvent};

/// Lazy sequence of new items for one target.
///
/// Each [`FeedRun::next_item`] call advances the paginator only as far as the
/// next item, fetching a page only when the buffered one is used up. Dropping
/// the run early costs nothing beyond the fetch already in flight.
pub struct FeedRun<'a> {
    target: Target,
    feed_url: Url,
    paginator: Paginator<'a>,
    fetcher: &'a dyn PageFetcher,
    sink: &'a dyn ProgressSink,
}

impl<'a> FeedRun<'a> {
    pub fn new(
        target: Target,
        feed_url: Url,
        paginator: Paginator<'a>,
        fetcher: &'a dyn PageFetcher,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            target,
            feed_url,
            paginator,
            fetcher,
            sink,
        }
    }

    /// `Ok(None)` once the run has terminated. A page fetch error is returned
    /// as is; calling again retries the same depth.
    pub async fn next_item(&mut self) -> Result<Option<FeedItem>, FetchError> {
        loop {
            match self.paginator.next_step() {
                Step::Fetch { depth } => {
                    let entries = self.fetcher.fetch_page(&self.feed_url, depth).await?;
                    self.sink.emit(HarvestEvent::PageFetched {
                        target: self.target.clone(),
                        depth,
                        entries: entries.len(),
                    });
                    self.paginator.accept_page(entries);
                }
                Step::Item(item) => return Ok(Some(item)),
                Step::Skipped(error) => {
                    self.sink.emit(HarvestEvent::EntrySkipped {
                        target: self.target.clone(),
                        error,
                    });
                }
                Step::Done => return Ok(None),
            }
        }
    }

    pub fn progress(&self) -> RunProgress {
        self.paginator.progress()
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.paginator.stop_reason()
    }
}
