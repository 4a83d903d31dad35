use crate::fetch::{BodyKind, HttpClient};
use crate::{FetchError, MediaPayload};

#[async_trait::async_trait]
pub trait MediaDownloader: Send + Sync {
    async fn download(&self, media_url: &str) -> Result<MediaPayload, FetchError>;
}

pub struct HttpMediaDownloader {
    client: HttpClient,
}

impl HttpMediaDownloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl MediaDownloader for HttpMediaDownloader {
    async fn download(&self, media_url: &str) -> Result<MediaPayload, FetchError> {
        let output = self.client.get(media_url, BodyKind::Media).await?;
        Ok(MediaPayload {
            bytes: output.bytes,
            content_type: output.content_type,
        })
    }
}
