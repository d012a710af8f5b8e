use std::time::Duration;

use thiserror::Error;

use super::StoreError;

/// Reasons an image could not be re-hosted. These never abort a run; the
/// loader records them next to the fallback URL it used instead.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("menu item has no image url")]
    MissingSource,

    #[error("image uploads are disabled")]
    Disabled,

    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("downloaded image is empty")]
    Empty,

    #[error("fetch failed: {0}")]
    Request(String),

    #[error("upload failed: {0}")]
    Upload(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_error_wraps_store_error() {
        let err: ImageError = StoreError::Unavailable("bucket offline".to_string()).into();
        assert_eq!(
            err.to_string(),
            "upload failed: backend unavailable: bucket offline"
        );
    }

    #[test]
    fn test_timeout_display() {
        let err = ImageError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "fetch timed out after 30s");
    }
}
