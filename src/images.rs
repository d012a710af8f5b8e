//! Menu item image re-hosting.
//!
//! Each menu item points at an image somewhere on the web. Before the item is
//! created the image is downloaded and uploaded into the bucket so the app
//! serves it from the backend. Anything that goes wrong here is absorbed: the
//! item keeps a fallback URL and the run carries on.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::ImageConfig;
use crate::errors::{ImageError, SeedError, SeedResult};
use crate::store::{FileId, FileStore, FileUpload};

const DEFAULT_CONTENT_TYPE: &str = "image/png";

#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError>;
}

/// Downloads images over HTTP(S).
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(config: &ImageConfig) -> SeedResult<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| SeedError::Config(format!("failed to build image client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, ImageError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageError::Request(e.to_string()))?;

        Ok(FetchedImage {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}

/// Outcome of re-hosting one image.
#[derive(Debug)]
pub enum ImageResolution {
    Uploaded { file_id: FileId, url: String },
    Fallback { url: String, reason: ImageError },
}

impl ImageResolution {
    /// URL to store on the menu item.
    pub fn url(&self) -> &str {
        match self {
            ImageResolution::Uploaded { url, .. } | ImageResolution::Fallback { url, .. } => url,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ImageResolution::Fallback { .. })
    }
}

pub struct ImageResolver {
    source: Arc<dyn ImageSource>,
    files: Arc<dyn FileStore>,
    bucket: String,
    enabled: bool,
    timeout: Duration,
    fallback_url: Option<String>,
}

impl ImageResolver {
    pub fn new(
        source: Arc<dyn ImageSource>,
        files: Arc<dyn FileStore>,
        bucket: impl Into<String>,
        config: &ImageConfig,
    ) -> Self {
        Self {
            source,
            files,
            bucket: bucket.into(),
            enabled: config.enabled,
            timeout: config.fetch_timeout(),
            fallback_url: config.fallback_url.clone(),
        }
    }

    /// Never fails; a failed upload comes back as [`ImageResolution::Fallback`].
    pub async fn resolve(&self, source_url: &str) -> ImageResolution {
        match self.upload(source_url).await {
            Ok(file_id) => {
                let url = self.files.file_view_url(&self.bucket, &file_id);
                info!("Uploaded image {} as {}", source_url, file_id);
                ImageResolution::Uploaded { file_id, url }
            }
            Err(reason) => {
                let url = self
                    .fallback_url
                    .clone()
                    .unwrap_or_else(|| source_url.to_string());
                match &reason {
                    ImageError::Disabled => debug!("Image uploads disabled, keeping {}", url),
                    _ => warn!(
                        "Failed to upload image {}: {}. Using fallback {}",
                        source_url, reason, url
                    ),
                }
                ImageResolution::Fallback { url, reason }
            }
        }
    }

    async fn upload(&self, source_url: &str) -> Result<FileId, ImageError> {
        if !self.enabled {
            return Err(ImageError::Disabled);
        }
        if source_url.trim().is_empty() {
            return Err(ImageError::MissingSource);
        }

        debug!("Fetching image: {}", source_url);
        let image = tokio::time::timeout(self.timeout, self.source.fetch(source_url))
            .await
            .map_err(|_| ImageError::Timeout(self.timeout))??;

        if image.bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let upload = FileUpload {
            name: file_name_for(source_url),
            content_type: image
                .content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            bytes: image.bytes,
        };
        debug!(
            "Prepared upload {} ({}, {} bytes)",
            upload.name,
            upload.content_type,
            upload.bytes.len()
        );

        Ok(self.files.create_file(&self.bucket, upload).await?)
    }
}

/// Last path segment of the source URL, or a timestamped name when there is none.
pub fn file_name_for(source_url: &str) -> String {
    url::Url::parse(source_url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("file-{}.jpg", chrono::Utc::now().timestamp_millis()))
}
