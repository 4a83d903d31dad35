use std::fmt;
use std::path::PathBuf;

use mediaharvest_core::{EntryError, StopReason, Target};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestEvent {
    TargetStarted {
        target: Target,
        resumed_from: Option<u64>,
    },
    PageFetched {
        target: Target,
        depth: u32,
        entries: usize,
    },
    EntrySkipped {
        target: Target,
        error: EntryError,
    },
    ItemSaved {
        target: Target,
        file_index: u64,
        media_url: String,
        path: PathBuf,
    },
    DownloadFailed {
        target: Target,
        file_index: u64,
        media_url: String,
        error: FetchError,
    },
    TargetFinished(TargetReport),
}

/// Outcome of one target's run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub target: Target,
    /// New items the feed produced.
    pub yielded: usize,
    /// Items whose media and manifest row were written.
    pub saved: usize,
    pub failed: usize,
    /// First file index this run did not assign.
    pub next_index: u64,
    pub stop_reason: Option<StopReason>,
}

/// Media bytes plus the content type the server reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub bytes: bytes::Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
