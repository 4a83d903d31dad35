use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::{FailureKind, FetchError};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_page_bytes: u64,
    pub max_media_bytes: u64,
    /// Exact content types accepted for feed pages.
    pub page_content_types: Vec<String>,
    /// Content type prefixes accepted for media downloads.
    pub media_content_types: Vec<String>,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_page_bytes: 5 * 1024 * 1024,
            max_media_bytes: 50 * 1024 * 1024,
            page_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
            media_content_types: vec![
                "image/".to_string(),
                "application/octet-stream".to_string(),
                "binary/octet-stream".to_string(),
            ],
            user_agent: concat!("mediaharvest/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Body and headers of a successful GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: bytes::Bytes,
    pub final_url: String,
    pub content_type: Option<String>,
}

/// Which responses a request accepts, and how large they may get.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BodyKind {
    Page,
    Media,
}

/// Shared reqwest client with the limits from [`FetchSettings`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl HttpClient {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { client, settings })
    }

    pub(crate) async fn get(&self, url: &str, kind: BodyKind) -> Result<FetchOutput, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::new(
                FailureKind::InvalidUrl,
                format!("unsupported scheme {}", parsed.scheme()),
            ));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.max_bytes(kind);
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct, kind) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchOutput {
            bytes: body.into(),
            final_url,
            content_type,
        })
    }

    fn max_bytes(&self, kind: BodyKind) -> u64 {
        match kind {
            BodyKind::Page => self.settings.max_page_bytes,
            BodyKind::Media => self.settings.max_media_bytes,
        }
    }

    fn is_content_type_allowed(&self, content_type: &str, kind: BodyKind) -> bool {
        let ct = content_type
            .split(';')
            .next()
            .unwrap_or(content_type)
            .trim()
            .to_ascii_lowercase();
        match kind {
            BodyKind::Page => self
                .settings
                .page_content_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(&ct)),
            BodyKind::Media => self
                .settings
                .media_content_types
                .iter()
                .any(|prefix| ct.starts_with(&prefix.to_ascii_lowercase())),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
