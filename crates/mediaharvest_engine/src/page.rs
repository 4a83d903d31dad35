use mediaharvest_core::{EntryError, PageEntries, PageEntry};
use scraper::{Html, Selector};
use url::Url;

use crate::decode::decode_page;
use crate::fetch::{BodyKind, HttpClient};
use crate::FetchError;

/// Returns the entries visible on a feed at a given scroll/pagination depth.
///
/// Implementations are called with strictly increasing depths within one run.
#[async_trait::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, feed_url: &Url, depth: u32) -> Result<PageEntries, FetchError>;
}

#[derive(Debug, Clone)]
pub struct PageSettings {
    /// CSS selector for media elements; `src` holds the url and `alt` the caption.
    pub image_selector: String,
    /// Query parameter carrying the depth for `depth > 0`.
    pub page_param: String,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            image_selector: "img[alt]".to_string(),
            page_param: "page".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PageSettingsError {
    #[error("invalid image selector {selector:?}: {message}")]
    Selector { selector: String, message: String },
}

/// Fetches feed pages over HTTP and reads media entries out of the markup.
pub struct HttpPageFetcher {
    client: HttpClient,
    selector: Selector,
    page_param: String,
}

impl HttpPageFetcher {
    pub fn new(client: HttpClient, settings: &PageSettings) -> Result<Self, PageSettingsError> {
        let selector = parse_selector(&settings.image_selector)?;
        Ok(Self {
            client,
            selector,
            page_param: settings.page_param.clone(),
        })
    }

    /// `depth` 0 is the feed url itself; later depths add `{page_param}={depth}`.
    pub fn page_url(&self, feed_url: &Url, depth: u32) -> Url {
        let mut url = feed_url.clone();
        if depth > 0 {
            url.query_pairs_mut()
                .append_pair(&self.page_param, &depth.to_string());
        }
        url
    }
}

#[async_trait::async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, feed_url: &Url, depth: u32) -> Result<PageEntries, FetchError> {
        let url = self.page_url(feed_url, depth);
        let output = self.client.get(url.as_str(), BodyKind::Page).await?;
        let page = decode_page(&output.bytes, output.content_type.as_deref());
        let base = Url::parse(&output.final_url).unwrap_or(url);
        Ok(extract_entries(&page.html, &self.selector, Some(&base)))
    }
}

pub fn parse_selector(selector: &str) -> Result<Selector, PageSettingsError> {
    Selector::parse(selector).map_err(|err| PageSettingsError::Selector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

/// Reads `(src, alt)` pairs out of every element matching `selector`, in
/// document order. An element without a usable `src` or without `alt` becomes
/// an [`EntryError`] in its position so the caller can report and skip it.
pub fn extract_entries(html: &str, selector: &Selector, base_url: Option<&Url>) -> PageEntries {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .enumerate()
        .map(|(position, element)| {
            let src = element
                .value()
                .attr("src")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or(EntryError::MissingAttribute {
                    position,
                    attribute: "src",
                })?;
            let caption = element
                .value()
                .attr("alt")
                .ok_or(EntryError::MissingAttribute {
                    position,
                    attribute: "alt",
                })?;
            let url = resolve_url(src, base_url).ok_or_else(|| EntryError::InvalidUrl {
                position,
                raw: src.to_string(),
            })?;
            Ok(PageEntry::new(url, caption))
        })
        .collect()
}

fn resolve_url(reference: &str, base: Option<&Url>) -> Option<String> {
    let lower = reference.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with("javascript:") {
        return None;
    }
    if let Ok(url) = Url::parse(reference) {
        return Some(url.into());
    }
    base.and_then(|base| base.join(reference).ok()).map(Into::into)
}
