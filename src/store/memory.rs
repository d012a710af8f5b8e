use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use super::{unique_id, DocumentId, DocumentStore, FileId, FileStore, FileUpload};
use crate::errors::{StoreError, StoreResult};

/// A document as the in-memory backend keeps it. `sequence` is a global
/// creation counter shared by documents and files.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub sequence: u64,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: FileId,
    pub sequence: u64,
    pub name: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Default)]
struct State {
    sequence: u64,
    collections: HashMap<String, Vec<StoredDocument>>,
    buckets: HashMap<String, Vec<StoredFile>>,
    failing_collections: HashSet<String>,
    failing_uploads: bool,
}

/// Process-local document store and bucket, used by `--dry-run` and tests.
#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    page_size: Option<usize>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return at most `page_size` entries per list call, like a paged REST API.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size.max(1));
        self
    }

    /// Make every `create_document` into `collection` fail.
    pub async fn fail_creates_in(&self, collection: &str) {
        self.state
            .lock()
            .await
            .failing_collections
            .insert(collection.to_string());
    }

    /// Make every `create_file` fail.
    pub async fn fail_uploads(&self) {
        self.state.lock().await.failing_uploads = true;
    }

    pub async fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn document(&self, collection: &str, id: &DocumentId) -> Option<StoredDocument> {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| &doc.id == id).cloned())
    }

    pub async fn files(&self, bucket: &str) -> Vec<StoredFile> {
        self.state
            .lock()
            .await
            .buckets
            .get(bucket)
            .cloned()
            .unwrap_or_default()
    }

    fn page<T, I>(&self, entries: &[T], id: impl Fn(&T) -> I) -> Vec<I> {
        let limit = self.page_size.unwrap_or(entries.len());
        entries.iter().take(limit).map(id).collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryBackend {
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<DocumentId>> {
        let state = self.state.lock().await;
        let docs = state
            .collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(self.page(docs, |doc| doc.id.clone()))
    }

    async fn create_document(&self, collection: &str, data: Value) -> StoreResult<DocumentId> {
        let mut state = self.state.lock().await;
        if state.failing_collections.contains(collection) {
            return Err(StoreError::status(
                "create document",
                500,
                format!("collection '{collection}' rejected the write"),
            ));
        }

        state.sequence += 1;
        let document = StoredDocument {
            id: DocumentId(unique_id()),
            sequence: state.sequence,
            data,
        };
        let id = document.id.clone();
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let docs = state.collections.entry(collection.to_string()).or_default();
        match docs.iter().position(|doc| &doc.id == id) {
            Some(index) => {
                docs.remove(index);
                Ok(())
            }
            None => Err(StoreError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

#[async_trait]
impl FileStore for InMemoryBackend {
    async fn list_files(&self, bucket: &str) -> StoreResult<Vec<FileId>> {
        let state = self.state.lock().await;
        let files = state
            .buckets
            .get(bucket)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Ok(self.page(files, |file| file.id.clone()))
    }

    async fn create_file(&self, bucket: &str, upload: FileUpload) -> StoreResult<FileId> {
        let mut state = self.state.lock().await;
        if state.failing_uploads {
            return Err(StoreError::status(
                "create file",
                507,
                format!("bucket '{bucket}' is full"),
            ));
        }

        state.sequence += 1;
        let file = StoredFile {
            id: FileId(unique_id()),
            sequence: state.sequence,
            name: upload.name,
            content_type: upload.content_type,
            size: upload.bytes.len(),
        };
        let id = file.id.clone();
        state.buckets.entry(bucket.to_string()).or_default().push(file);
        Ok(id)
    }

    async fn delete_file(&self, bucket: &str, id: &FileId) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let files = state.buckets.entry(bucket.to_string()).or_default();
        match files.iter().position(|file| &file.id == id) {
            Some(index) => {
                files.remove(index);
                Ok(())
            }
            None => Err(StoreError::FileNotFound {
                bucket: bucket.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn file_view_url(&self, bucket: &str, id: &FileId) -> String {
        format!("memory://{bucket}/{id}/view")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_delete_document() {
        let backend = InMemoryBackend::new();
        let id = backend
            .create_document("categories", json!({ "name": "Pizza" }))
            .await
            .expect("create");

        assert_eq!(backend.list_documents("categories").await.expect("list"), vec![id.clone()]);
        let stored = backend.document("categories", &id).await.expect("stored");
        assert_eq!(stored.data["name"], "Pizza");

        backend.delete_document("categories", &id).await.expect("delete");
        assert!(backend.list_documents("categories").await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn deleting_a_missing_document_is_not_found() {
        let backend = InMemoryBackend::new();
        let err = backend
            .delete_document("menu", &DocumentId("nope".to_string()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn listing_is_paged() {
        let backend = InMemoryBackend::new().with_page_size(2);
        for n in 0..5 {
            backend
                .create_document("menu", json!({ "n": n }))
                .await
                .expect("create");
        }
        assert_eq!(backend.list_documents("menu").await.expect("list").len(), 2);
        assert_eq!(backend.documents("menu").await.len(), 5);
    }

    #[tokio::test]
    async fn sequence_is_shared_by_documents_and_files() {
        let backend = InMemoryBackend::new();
        backend
            .create_file(
                "images",
                FileUpload {
                    name: "a.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                },
            )
            .await
            .expect("upload");
        let doc = backend
            .create_document("menu", json!({}))
            .await
            .expect("create");

        let files = backend.files("images").await;
        assert_eq!(files[0].size, 3);
        assert_eq!(files[0].sequence, 1);
        assert_eq!(backend.document("menu", &doc).await.expect("doc").sequence, 2);
    }

    #[tokio::test]
    async fn injected_failures() {
        let backend = InMemoryBackend::new();
        backend.fail_creates_in("menu").await;
        backend.fail_uploads().await;

        assert!(backend.create_document("menu", json!({})).await.is_err());
        assert!(backend.create_document("categories", json!({})).await.is_ok());
        let upload = FileUpload {
            name: "a.png".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![1],
        };
        assert!(backend.create_file("images", upload).await.is_err());
    }
}
