use std::collections::{HashSet, VecDeque};

use engine_logging::{engine_debug, engine_trace};

use crate::item::{EntryError, FeedItem, PageEntries, PageEntry};
use crate::target::{Target, TerminationPolicy};
use crate::tokens::TokenPatterns;

/// What the driver must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Fetch the page at `depth` and hand it to [`Paginator::accept_page`].
    Fetch { depth: u32 },
    /// A new item; the consumer handles it before asking for the next step.
    Item(FeedItem),
    /// A malformed entry was dropped. Report it and keep stepping.
    Skipped(EntryError),
    /// The run is over.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The requested number of new items was yielded.
    Satisfied,
    /// A bounded feed showed a repeat on a short page.
    FeedExhausted,
    /// The page cap was reached first.
    PageLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunProgress {
    pub requested: usize,
    pub yielded: usize,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginatorError {
    #[error("requested item count must be positive")]
    ZeroRequested,
}

/// Pure pagination/dedup state machine for one target's run.
///
/// The paginator never performs IO. A driver alternates between
/// [`Paginator::next_step`] and, when asked to, fetching a page and passing it
/// to [`Paginator::accept_page`]. Items come out one at a time, so a consumer
/// that stops pulling never causes another fetch.
#[derive(Debug)]
pub struct Paginator<'p> {
    patterns: &'p TokenPatterns,
    policy: TerminationPolicy,
    requested: usize,
    yielded: usize,
    depth: u32,
    max_pages: Option<u32>,
    seen: HashSet<String>,
    page: VecDeque<Result<PageEntry, EntryError>>,
    page_len: usize,
    awaiting_page: bool,
    stop: Option<StopReason>,
}

impl<'p> Paginator<'p> {
    /// The seed is copied; the caller's set is left untouched.
    pub fn new(
        target: &Target,
        requested: usize,
        seed_seen: &HashSet<String>,
        patterns: &'p TokenPatterns,
    ) -> Result<Self, PaginatorError> {
        if requested == 0 {
            return Err(PaginatorError::ZeroRequested);
        }
        Ok(Self {
            patterns,
            policy: target.policy(),
            requested,
            yielded: 0,
            depth: 0,
            max_pages: None,
            seen: seed_seen.clone(),
            page: VecDeque::new(),
            page_len: 0,
            awaiting_page: false,
            stop: None,
        })
    }

    /// Stop with [`StopReason::PageLimit`] once `max_pages` pages were fetched.
    pub fn with_page_limit(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn next_step(&mut self) -> Step {
        if self.stop.is_some() {
            return Step::Done;
        }
        loop {
            if self.yielded >= self.requested {
                self.finish(StopReason::Satisfied);
                return Step::Done;
            }
            match self.page.pop_front() {
                Some(Err(err)) => return Step::Skipped(err),
                Some(Ok(entry)) => {
                    if self.seen.contains(&entry.media_url) {
                        if self.policy == TerminationPolicy::Bounded
                            && self.page_len < self.requested
                        {
                            engine_debug!(
                                "repeat of {} on a page of {} entries; feed exhausted after {} new items",
                                entry.media_url,
                                self.page_len,
                                self.yielded
                            );
                            self.requested = self.yielded;
                            self.finish(StopReason::FeedExhausted);
                            return Step::Done;
                        }
                        engine_trace!("skipping already seen {}", entry.media_url);
                        continue;
                    }
                    self.seen.insert(entry.media_url.clone());
                    let tokens = self.patterns.extract(&entry.caption);
                    self.yielded += 1;
                    return Step::Item(FeedItem::from_entry(entry, tokens));
                }
                None => {
                    if let Some(limit) = self.max_pages {
                        if self.depth >= limit {
                            engine_debug!("page limit {} reached", limit);
                            self.finish(StopReason::PageLimit);
                            return Step::Done;
                        }
                    }
                    self.awaiting_page = true;
                    return Step::Fetch { depth: self.depth };
                }
            }
        }
    }

    /// Hands over the entries fetched for the pending [`Step::Fetch`].
    /// Returns `false` (and changes nothing) when no fetch was pending.
    pub fn accept_page(&mut self, entries: PageEntries) -> bool {
        if !self.awaiting_page || self.stop.is_some() {
            return false;
        }
        self.awaiting_page = false;
        self.depth += 1;
        self.page_len = entries.len();
        self.page = entries.into();
        true
    }

    pub fn progress(&self) -> RunProgress {
        RunProgress {
            requested: self.requested,
            yielded: self.yielded,
            depth: self.depth,
        }
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    pub fn is_done(&self) -> bool {
        self.stop.is_some()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    fn finish(&mut self, reason: StopReason) {
        self.page.clear();
        self.awaiting_page = false;
        self.stop = Some(reason);
    }
}
