//! Mediaharvest core: caption tokens, the pagination/dedup state machine and
//! resume bookkeeping. Nothing in this crate performs IO.
mod item;
mod paginator;
mod record;
mod resume;
mod target;
mod tokens;

pub use item::{EntryError, FeedItem, PageEntries, PageEntry};
pub use paginator::{Paginator, PaginatorError, RunProgress, Step, StopReason};
pub use record::{escape_caption, unescape_caption, ManifestRecord};
pub use resume::{ResumeLoadError, ResumeState};
pub use target::{Target, TargetError, TargetMode, TerminationPolicy, DEFAULT_BASE_URL};
pub use tokens::{CaptionTokens, TokenPatterns, MAX_TOKEN_LEN};
