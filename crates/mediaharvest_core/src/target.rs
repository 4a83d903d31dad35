use std::fmt;

use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.instagram.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetMode {
    Tag,
    User,
}

impl TargetMode {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetMode::Tag => "tag",
            TargetMode::User => "user",
        }
    }
}

/// How the paginator reacts to a URL it has already seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// A repeat on a page shorter than the requested count means the feed is exhausted.
    Bounded,
    /// Repeats are skipped and more pages are fetched.
    Unbounded,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    pub mode: TargetMode,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("target name is empty")]
    Empty,
    #[error("target name {0:?} contains a path separator or whitespace")]
    InvalidCharacters(String),
    #[error("target name {0:?} is reserved")]
    Reserved(String),
    #[error("cannot build feed url for {name:?}: {message}")]
    Url { name: String, message: String },
}

impl Target {
    /// Builds a validated target. The name doubles as a directory name, so it
    /// must not escape the output directory.
    pub fn new(mode: TargetMode, name: impl Into<String>) -> Result<Self, TargetError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(TargetError::Empty);
        }
        if name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
        {
            return Err(TargetError::InvalidCharacters(name));
        }
        if name == "." || name == ".." {
            return Err(TargetError::Reserved(name));
        }
        Ok(Self { mode, name })
    }

    pub fn tag(name: impl Into<String>) -> Result<Self, TargetError> {
        Self::new(TargetMode::Tag, name)
    }

    pub fn user(name: impl Into<String>) -> Result<Self, TargetError> {
        Self::new(TargetMode::User, name)
    }

    pub fn policy(&self) -> TerminationPolicy {
        match self.mode {
            TargetMode::User => TerminationPolicy::Bounded,
            TargetMode::Tag => TerminationPolicy::Unbounded,
        }
    }

    /// `{base}/explore/tags/{name}` for tags, `{base}/{name}` for users.
    pub fn feed_url(&self, base: &Url) -> Result<Url, TargetError> {
        let mut url = base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| TargetError::Url {
                name: self.name.clone(),
                message: "base url cannot be a base".to_string(),
            })?;
            segments.pop_if_empty();
            if self.mode == TargetMode::Tag {
                segments.push("explore").push("tags");
            }
            segments.push(&self.name);
        }
        Ok(url)
    }

    /// Label used in logs and reports, e.g. `tag:sunset`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.mode.as_str(), self.name)
    }
}
