use std::collections::BTreeSet;

use crate::tokens::CaptionTokens;

/// One `(media url, caption)` pair visible on a fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub media_url: String,
    pub caption: String,
}

impl PageEntry {
    pub fn new(media_url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            media_url: media_url.into(),
            caption: caption.into(),
        }
    }
}

/// A page element whose attributes could not be read. The entry is skipped;
/// the page and the run continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryError {
    #[error("entry {position} is missing attribute `{attribute}`")]
    MissingAttribute {
        position: usize,
        attribute: &'static str,
    },
    #[error("entry {position} has unusable media url {raw:?}")]
    InvalidUrl { position: usize, raw: String },
}

/// Everything a fetcher saw at one depth, in page order.
pub type PageEntries = Vec<Result<PageEntry, EntryError>>;

/// A newly discovered media item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    pub media_url: String,
    pub caption: String,
    pub hashtags: BTreeSet<String>,
    pub mentions: BTreeSet<String>,
}

impl FeedItem {
    pub fn from_entry(entry: PageEntry, tokens: CaptionTokens) -> Self {
        Self {
            media_url: entry.media_url,
            caption: entry.caption,
            hashtags: tokens.hashtags,
            mentions: tokens.mentions,
        }
    }
}
