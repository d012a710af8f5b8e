//! Backend error types
//!
//! Every call into the document store or the file bucket returns these. None
//! of them are retried; the loader decides whether a failure aborts the run.

use thiserror::Error;

/// Document store and file bucket errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The request never produced a response (DNS, TLS, connection reset, timeout)
    #[error("{operation} request failed: {source}")]
    Transport {
        /// Operation being attempted, e.g. "list documents"
        operation: String,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-success status
    #[error("{operation} returned HTTP {status}: {message}")]
    Status {
        operation: String,
        status: u16,
        message: String,
    },

    /// The backend answered, but not with the shape we expected
    #[error("unexpected response to {operation}: {message}")]
    Decode { operation: String, message: String },

    /// Document does not exist in the collection
    #[error("document '{id}' not found in collection '{collection}'")]
    DocumentNotFound { collection: String, id: String },

    /// File does not exist in the bucket
    #[error("file '{id}' not found in bucket '{bucket}'")]
    FileNotFound { bucket: String, id: String },

    /// Backend refused the call without a more specific reason
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn status(operation: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        StoreError::Status {
            operation: operation.into(),
            status,
            message: message.into(),
        }
    }

    /// Check if the backend reported the target as missing
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::DocumentNotFound { .. }
                | StoreError::FileNotFound { .. }
                | StoreError::Status { status: 404, .. }
        )
    }

    /// Check if the backend rejected our credentials or scopes
    pub fn is_auth_error(&self) -> bool {
        matches!(self, StoreError::Status { status: 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = StoreError::status("delete file", 500, "server error");
        assert_eq!(err.to_string(), "delete file returned HTTP 500: server error");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_not_found_variants() {
        let err = StoreError::DocumentNotFound {
            collection: "menu".to_string(),
            id: "abc".to_string(),
        };
        assert!(err.is_not_found());
        assert!(StoreError::status("get file", 404, "missing").is_not_found());
    }

    #[test]
    fn test_auth_error() {
        assert!(StoreError::status("list documents", 401, "unauthorized").is_auth_error());
        assert!(StoreError::status("list documents", 403, "forbidden").is_auth_error());
        assert!(!StoreError::Unavailable("down".to_string()).is_auth_error());
    }
}
