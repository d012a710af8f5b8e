//! Appwrite REST client.
//!
//! Implements [`DocumentStore`] and [`FileStore`] against the server API
//! (`/databases/{db}/collections/{collection}/documents` and
//! `/storage/buckets/{bucket}/files`), authenticating with a project id and an
//! API key. List calls return the first page the server hands out; the loader
//! drains a collection by listing again until nothing comes back.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{unique_id, DocumentId, DocumentStore, FileId, FileStore, FileUpload};
use crate::config::BackendConfig;
use crate::errors::{SeedError, SeedResult, StoreError, StoreResult};

const PROJECT_HEADER: &str = "x-appwrite-project";
const KEY_HEADER: &str = "x-appwrite-key";

pub struct AppwriteClient {
    client: Client,
    endpoint: String,
    project_id: String,
    database_id: String,
}

#[derive(Deserialize)]
struct Resource {
    #[serde(rename = "$id")]
    id: String,
}

#[derive(Deserialize)]
struct DocumentList {
    documents: Vec<Resource>,
}

#[derive(Deserialize)]
struct FileList {
    files: Vec<Resource>,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl AppwriteClient {
    pub fn new(config: &BackendConfig) -> SeedResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| SeedError::Config("an API key is required".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(PROJECT_HEADER, header_value("project id", &config.project_id)?);
        headers.insert(KEY_HEADER, header_value("api key", api_key)?);

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| SeedError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
        })
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn files_url(&self, bucket: &str) -> String {
        format!("{}/storage/buckets/{}/files", self.endpoint, bucket)
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await.map_err(|source| StoreError::Transport {
            operation: operation.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(StoreError::status(operation, status.as_u16(), error_message(&body)))
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        operation: &str,
        response: Response,
    ) -> StoreResult<T> {
        let body = response.text().await.map_err(|source| StoreError::Transport {
            operation: operation.to_string(),
            source,
        })?;
        serde_json::from_str(&body).map_err(|e| StoreError::Decode {
            operation: operation.to_string(),
            message: e.to_string(),
        })
    }
}

fn header_value(what: &str, value: &str) -> SeedResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| SeedError::Config(format!("{what} contains characters not allowed in a header")))
}

/// Appwrite errors come back as `{ "message": ..., "code": ..., "type": ... }`;
/// anything else is passed through as-is.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn list_documents(&self, collection: &str) -> StoreResult<Vec<DocumentId>> {
        let operation = "list documents";
        let response = self
            .send(operation, self.client.get(self.documents_url(collection)))
            .await?;
        let list: DocumentList = Self::decode(operation, response).await?;
        Ok(list
            .documents
            .into_iter()
            .map(|doc| DocumentId(doc.id))
            .collect())
    }

    async fn create_document(&self, collection: &str, data: Value) -> StoreResult<DocumentId> {
        let operation = "create document";
        let body = json!({ "documentId": unique_id(), "data": data });
        let response = self
            .send(
                operation,
                self.client.post(self.documents_url(collection)).json(&body),
            )
            .await?;
        let created: Resource = Self::decode(operation, response).await?;
        debug!("Appwrite created document {} in {}", created.id, collection);
        Ok(DocumentId(created.id))
    }

    async fn delete_document(&self, collection: &str, id: &DocumentId) -> StoreResult<()> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        self.send("delete document", self.client.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for AppwriteClient {
    async fn list_files(&self, bucket: &str) -> StoreResult<Vec<FileId>> {
        let operation = "list files";
        let response = self
            .send(operation, self.client.get(self.files_url(bucket)))
            .await?;
        let list: FileList = Self::decode(operation, response).await?;
        Ok(list.files.into_iter().map(|file| FileId(file.id)).collect())
    }

    async fn create_file(&self, bucket: &str, upload: FileUpload) -> StoreResult<FileId> {
        let operation = "create file";
        let part = Part::bytes(upload.bytes)
            .file_name(upload.name)
            .mime_str(&upload.content_type)
            .map_err(|source| StoreError::Transport {
                operation: operation.to_string(),
                source,
            })?;
        let form = Form::new().text("fileId", unique_id()).part("file", part);

        let response = self
            .send(
                operation,
                self.client.post(self.files_url(bucket)).multipart(form),
            )
            .await?;
        let created: Resource = Self::decode(operation, response).await?;
        Ok(FileId(created.id))
    }

    async fn delete_file(&self, bucket: &str, id: &FileId) -> StoreResult<()> {
        let url = format!("{}/{}", self.files_url(bucket), id);
        self.send("delete file", self.client.delete(url)).await?;
        Ok(())
    }

    fn file_view_url(&self, bucket: &str, id: &FileId) -> String {
        format!(
            "{}/{}/view?project={}",
            self.files_url(bucket),
            id,
            self.project_id
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AppwriteClient {
        AppwriteClient::new(&BackendConfig {
            endpoint: "https://cloud.appwrite.io/v1/".to_string(),
            project_id: "food-app".to_string(),
            api_key: Some("secret".to_string()),
            database_id: "db".to_string(),
            bucket_id: "assets".to_string(),
        })
        .expect("client to build")
    }

    #[test]
    fn urls_follow_the_rest_layout() {
        let client = client();
        assert_eq!(
            client.documents_url("menu"),
            "https://cloud.appwrite.io/v1/databases/db/collections/menu/documents"
        );
        assert_eq!(
            client.file_view_url("assets", &FileId("f1".to_string())),
            "https://cloud.appwrite.io/v1/storage/buckets/assets/files/f1/view?project=food-app"
        );
    }

    #[test]
    fn missing_api_key_is_a_config_error() {
        let err = AppwriteClient::new(&BackendConfig::default()).err().expect("error");
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn list_responses_decode_ids() {
        let docs: DocumentList = serde_json::from_str(
            r#"{ "total": 2, "documents": [
                { "$id": "a", "$collectionId": "menu", "name": "Margherita" },
                { "$id": "b", "$collectionId": "menu", "name": "Pepperoni" }
            ] }"#,
        )
        .expect("decode");
        let ids: Vec<_> = docs.documents.into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let files: FileList =
            serde_json::from_str(r#"{ "total": 0, "files": [] }"#).expect("decode");
        assert!(files.files.is_empty());
    }

    #[test]
    fn error_bodies_are_unwrapped() {
        assert_eq!(
            error_message(r#"{ "message": "Collection not found", "code": 404, "type": "collection_not_found" }"#),
            "Collection not found"
        );
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }
}
