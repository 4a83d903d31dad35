use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

/// Longest hashtag or handle accepted, in characters.
pub const MAX_TOKEN_LEN: usize = 30;

static SHARED: LazyLock<TokenPatterns> = LazyLock::new(TokenPatterns::new);

/// Hashtags and mentions found in one caption.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionTokens {
    pub hashtags: BTreeSet<String>,
    pub mentions: BTreeSet<String>,
}

/// Compiled caption patterns. Build once and share by reference.
///
/// A candidate token is the maximal run of `[A-Za-z0-9_.]` after the sigil.
/// It is kept only if it is 1-30 characters long, does not start or end with a
/// period, and has no two consecutive periods; otherwise the whole run is
/// dropped rather than trimmed to a valid prefix.
#[derive(Debug, Clone)]
pub struct TokenPatterns {
    hashtag: Regex,
    mention: Regex,
}

impl TokenPatterns {
    pub fn new() -> Self {
        Self {
            hashtag: Regex::new(r"#([A-Za-z0-9_.]+)").expect("hashtag pattern compiles"),
            mention: Regex::new(r"@([A-Za-z0-9_.]+)").expect("mention pattern compiles"),
        }
    }

    /// Process-wide instance.
    pub fn shared() -> &'static TokenPatterns {
        &SHARED
    }

    pub fn extract(&self, caption: &str) -> CaptionTokens {
        CaptionTokens {
            hashtags: collect_tokens(&self.hashtag, caption),
            mentions: collect_tokens(&self.mention, caption),
        }
    }
}

impl Default for TokenPatterns {
    fn default() -> Self {
        Self::new()
    }
}

fn collect_tokens(pattern: &Regex, caption: &str) -> BTreeSet<String> {
    pattern
        .captures_iter(caption)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|token| is_valid_token(token))
        .map(ToOwned::to_owned)
        .collect()
}

fn is_valid_token(token: &str) -> bool {
    // The character class is ASCII-only, so byte length equals char count.
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && !token.starts_with('.')
        && !token.ends_with('.')
        && !token.contains("..")
}
