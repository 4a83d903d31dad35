use crate::item::FeedItem;
use crate::resume::ResumeLoadError;

const LIST_SEPARATOR: &str = ", ";

/// One manifest row: a successfully downloaded item and the index its media
/// file is named after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub file_index: u64,
    pub media_url: String,
    pub caption: String,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

impl ManifestRecord {
    pub fn from_item(file_index: u64, item: &FeedItem) -> Self {
        Self {
            file_index,
            media_url: item.media_url.clone(),
            caption: item.caption.clone(),
            hashtags: item.hashtags.iter().cloned().collect(),
            mentions: item.mentions.iter().cloned().collect(),
        }
    }

    /// Row layout: index, url, escaped caption, joined hashtags, joined mentions.
    pub fn to_fields(&self) -> [String; 5] {
        [
            self.file_index.to_string(),
            self.media_url.clone(),
            escape_caption(&self.caption),
            self.hashtags.join(LIST_SEPARATOR),
            self.mentions.join(LIST_SEPARATOR),
        ]
    }

    /// Parses one stored row. `line` is 1-based and only used for errors.
    ///
    /// The index column also accepts the `12.jpg` form written by older runs.
    pub fn from_fields<S: AsRef<str>>(line: usize, fields: &[S]) -> Result<Self, ResumeLoadError> {
        let field = |i: usize| fields.get(i).map(|f| f.as_ref());

        let raw_index = field(0)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ResumeLoadError::MissingField {
                line,
                field: "file_index",
            })?;
        let numeric = raw_index
            .split_once('.')
            .map_or(raw_index, |(stem, _ext)| stem);
        let file_index = numeric
            .parse::<u64>()
            .map_err(|_| ResumeLoadError::InvalidIndex {
                line,
                value: raw_index.to_string(),
            })?;

        let media_url = field(1).map(str::trim).ok_or(ResumeLoadError::MissingField {
            line,
            field: "media_url",
        })?;
        if media_url.is_empty() {
            return Err(ResumeLoadError::MissingUrl { line });
        }

        Ok(Self {
            file_index,
            media_url: media_url.to_string(),
            caption: field(2).map(unescape_caption).unwrap_or_default(),
            hashtags: field(3).map(split_list).unwrap_or_default(),
            mentions: field(4).map(split_list).unwrap_or_default(),
        })
    }
}

/// Newlines become the literal two characters `\n` so each row stays on one line.
pub fn escape_caption(caption: &str) -> String {
    caption
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

pub fn unescape_caption(stored: &str) -> String {
    stored.replace("\\n", "\n").replace("\\r", "\r")
}

fn split_list(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
