//! REST surface of the travel-entry backend.
//!
//! [`TravelBackend`] is the seam the workflow talks to; [`HttpBackend`] is
//! the production implementation over [`HttpTransport`]. Mutating calls
//! take a `&Session`, so a missing session fails before any request is
//! built. Reads accept an optional session.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use wayfarer_core::transform::EntryPayload;
use wayfarer_core::types::{BackendRecord, EntryId, ImageId};

use crate::error::ClientError;
use crate::session::Session;
use crate::transport::HttpTransport;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Presigned upload target returned by `POST /uploads/presigned-url`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadSlot {
    /// Time-limited object storage URL to `PUT` the bytes to.
    #[serde(alias = "url")]
    pub upload_url: String,
    /// Object key to link to the entry once the bytes are stored.
    pub key: String,
}

/// An image association on an entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImageRecord {
    #[serde(default)]
    pub id: Option<ImageId>,
    #[serde(alias = "key")]
    pub image_key: String,
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    #[serde(alias = "url")]
    download_url: String,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Operations the client needs from the backend and object storage.
#[async_trait]
pub trait TravelBackend: Send + Sync {
    /// `GET /travel-entries`
    async fn list_entries(&self, session: Option<&Session>)
        -> Result<Vec<BackendRecord>, ClientError>;

    /// `POST /travel-entries`; returns the persisted record with its id.
    async fn create_entry(
        &self,
        session: &Session,
        payload: &EntryPayload,
    ) -> Result<BackendRecord, ClientError>;

    /// `PUT /travel-entries/{id}`; `None` when the backend sends no body.
    async fn update_entry(
        &self,
        session: &Session,
        id: EntryId,
        payload: &EntryPayload,
    ) -> Result<Option<BackendRecord>, ClientError>;

    /// `DELETE /travel-entries/{id}`
    async fn delete_entry(&self, session: &Session, id: EntryId) -> Result<(), ClientError>;

    /// `POST /uploads/presigned-url` with `{file_type}`.
    async fn request_upload_slot(
        &self,
        session: &Session,
        content_type: &str,
    ) -> Result<UploadSlot, ClientError>;

    /// `PUT {upload_url}` with the raw bytes.
    async fn upload_object(
        &self,
        slot: &UploadSlot,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), ClientError>;

    /// `POST /travel-entries/{id}/images` with `{image_key}`.
    async fn link_image(
        &self,
        session: &Session,
        entry_id: EntryId,
        key: &str,
    ) -> Result<Option<ImageRecord>, ClientError>;

    /// `GET /travel-entries/{id}/images`
    async fn list_images(
        &self,
        session: Option<&Session>,
        entry_id: EntryId,
    ) -> Result<Vec<ImageRecord>, ClientError>;

    /// `POST /uploads/download-url` with `{key}`.
    async fn download_url(&self, session: Option<&Session>, key: &str)
        -> Result<String, ClientError>;
}

// ---------------------------------------------------------------------------
// HttpBackend
// ---------------------------------------------------------------------------

/// [`TravelBackend`] over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    transport: HttpTransport,
}

impl HttpBackend {
    pub fn new(transport: HttpTransport) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

fn entry_path(id: EntryId) -> String {
    format!("/travel-entries/{id}")
}

#[async_trait]
impl TravelBackend for HttpBackend {
    async fn list_entries(
        &self,
        session: Option<&Session>,
    ) -> Result<Vec<BackendRecord>, ClientError> {
        self.transport.get_json("/travel-entries", session).await
    }

    async fn create_entry(
        &self,
        session: &Session,
        payload: &EntryPayload,
    ) -> Result<BackendRecord, ClientError> {
        self.transport
            .post_json("/travel-entries", Some(session), payload)
            .await
    }

    async fn update_entry(
        &self,
        session: &Session,
        id: EntryId,
        payload: &EntryPayload,
    ) -> Result<Option<BackendRecord>, ClientError> {
        self.transport
            .put_json(&entry_path(id), Some(session), payload)
            .await
    }

    async fn delete_entry(&self, session: &Session, id: EntryId) -> Result<(), ClientError> {
        self.transport.delete(&entry_path(id), Some(session)).await
    }

    async fn request_upload_slot(
        &self,
        session: &Session,
        content_type: &str,
    ) -> Result<UploadSlot, ClientError> {
        let body = json!({ "file_type": content_type });
        self.transport
            .post_json("/uploads/presigned-url", Some(session), &body)
            .await
    }

    async fn upload_object(
        &self,
        slot: &UploadSlot,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), ClientError> {
        self.transport
            .put_bytes(&slot.upload_url, content_type, bytes.to_vec())
            .await
    }

    async fn link_image(
        &self,
        session: &Session,
        entry_id: EntryId,
        key: &str,
    ) -> Result<Option<ImageRecord>, ClientError> {
        let body = json!({ "image_key": key });
        self.transport
            .post_json(&format!("{}/images", entry_path(entry_id)), Some(session), &body)
            .await
    }

    async fn list_images(
        &self,
        session: Option<&Session>,
        entry_id: EntryId,
    ) -> Result<Vec<ImageRecord>, ClientError> {
        self.transport
            .get_json(&format!("{}/images", entry_path(entry_id)), session)
            .await
    }

    async fn download_url(
        &self,
        session: Option<&Session>,
        key: &str,
    ) -> Result<String, ClientError> {
        let body = json!({ "key": key });
        let response: DownloadUrlResponse = self
            .transport
            .post_json("/uploads/download-url", session, &body)
            .await?;
        Ok(response.download_url)
    }
}
