use std::collections::HashSet;

use crate::record::ManifestRecord;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResumeLoadError {
    #[error("manifest line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },
    #[error("manifest line {line}: media url is empty")]
    MissingUrl { line: usize },
    #[error("manifest line {line}: invalid file index {value:?}")]
    InvalidIndex { line: usize, value: String },
}

/// Where a target's run picks up: URLs to treat as already seen and the index
/// for the next media file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeState {
    pub seed_seen: HashSet<String>,
    pub next_index: u64,
}

impl ResumeState {
    pub fn fresh() -> Self {
        Self::default()
    }

    /// Builds the seed from every recorded URL. The next index continues after
    /// the highest recorded index, so a gap left by a failed download never
    /// makes a new file reuse an existing name.
    pub fn load<I>(records: I) -> Result<Self, ResumeLoadError>
    where
        I: IntoIterator<Item = ManifestRecord>,
    {
        let mut state = Self::fresh();
        for (i, record) in records.into_iter().enumerate() {
            if record.media_url.trim().is_empty() {
                return Err(ResumeLoadError::MissingUrl { line: i + 1 });
            }
            state.next_index = state.next_index.max(record.file_index + 1);
            state.seed_seen.insert(record.media_url);
        }
        Ok(state)
    }

    pub fn is_fresh(&self) -> bool {
        self.seed_seen.is_empty()
    }
}
