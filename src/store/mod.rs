//! Backend seams used by the loader.
//!
//! The loader only needs a handful of calls from the backend: list, create and
//! delete on documents and files, plus a public URL for a stored file. Both
//! traits are object safe so the loader can hold `Arc<dyn ...>` and tests can
//! swap in [`InMemoryBackend`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StoreResult;

pub mod appwrite;
pub mod memory;

pub use appwrite::AppwriteClient;
pub use memory::InMemoryBackend;

/// Identifier the backend assigned to a document.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct DocumentId(pub String);

/// Identifier the backend assigned to a stored file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct FileId(pub String);

impl DocumentId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes to store in a bucket, with the metadata the backend keeps for them.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<DocumentId>>;

    /// Create a document under a freshly generated id and return that id.
    async fn create_document(&self, collection: &str, data: Value) -> StoreResult<DocumentId>;

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()>;
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn list_files(&self, bucket: &str) -> StoreResult<Vec<FileId>>;

    /// Store the upload under a freshly generated id and return that id.
    async fn create_file(&self, bucket: &str, upload: FileUpload) -> StoreResult<FileId>;

    async fn delete_file(&self, bucket: &str, id: &FileId) -> StoreResult<()>;

    /// Publicly viewable URL for a stored file. Pure; does not call the backend.
    fn file_view_url(&self, bucket: &str, id: &FileId) -> String;
}

/// Ids handed to the backend on create. Appwrite accepts up to 36 characters
/// from `[a-zA-Z0-9._-]`, which a simple UUID satisfies.
pub fn unique_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_are_backend_safe() {
        let id = unique_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(id, unique_id());
    }

    #[test]
    fn document_id_serializes_as_plain_string() {
        let id = DocumentId("abc123".to_string());
        assert_eq!(serde_json::to_value(&id).expect("serialize"), "abc123");
    }
}
