//! Photo upload orchestration.
//!
//! Each photo goes through three steps: request a presigned slot, `PUT`
//! the bytes to object storage, then link the object key to the entry.
//! Photos are processed one after another so image associations land in
//! attachment order and the slot issuer sees one request at a time.
//!
//! A failed step skips that photo only. The rest of the batch is still
//! attempted and the failures are reported together at the end. Nothing
//! is rolled back, so a batch can partially succeed; callers compare the
//! requested count with [`UploadError::uploaded`] to notice.

use std::fmt;
use std::sync::Arc;

use uuid::Uuid;
use wayfarer_core::photo::{PendingPhoto, StoredPhoto};
use wayfarer_core::types::EntryId;

use crate::backend::TravelBackend;
use crate::error::ClientError;
use crate::session::Session;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// The step of the upload sequence that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    RequestSlot,
    Transmit,
    Link,
}

impl fmt::Display for UploadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UploadStep::RequestSlot => "request upload slot",
            UploadStep::Transmit => "transmit",
            UploadStep::Link => "link image",
        })
    }
}

/// One photo that did not make it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFailure {
    /// Position of the photo in the submitted batch.
    pub index: usize,
    /// Local handle of the pending photo.
    pub handle: Uuid,
    pub step: UploadStep,
    pub message: String,
}

/// A batch in which at least one photo failed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{} of {} photo uploads failed", .failures.len(), .attempted)]
pub struct UploadError {
    /// Number of photos in the batch.
    pub attempted: usize,
    /// Photos that completed all three steps, in batch order.
    pub uploaded: Vec<StoredPhoto>,
    /// Photos that failed, in batch order.
    pub failures: Vec<PhotoFailure>,
}

// ---------------------------------------------------------------------------
// PhotoUploader
// ---------------------------------------------------------------------------

/// Uploads pending photos and links them to an entry.
#[derive(Clone)]
pub struct PhotoUploader {
    backend: Arc<dyn TravelBackend>,
}

impl PhotoUploader {
    pub fn new(backend: Arc<dyn TravelBackend>) -> Self {
        Self { backend }
    }

    /// Upload and link every photo in `photos` to `entry_id`.
    ///
    /// Returns the stored photos when all succeed. Otherwise returns an
    /// [`UploadError`] after the whole batch has been attempted.
    pub async fn attach_photos(
        &self,
        session: &Session,
        entry_id: EntryId,
        photos: &[PendingPhoto],
    ) -> Result<Vec<StoredPhoto>, UploadError> {
        let mut uploaded = Vec::with_capacity(photos.len());
        let mut failures = Vec::new();

        for (index, photo) in photos.iter().enumerate() {
            match self.upload_one(session, entry_id, photo).await {
                Ok(stored) => {
                    tracing::info!(entry_id, index, key = %stored.key, "Photo uploaded");
                    uploaded.push(stored);
                }
                Err((step, e)) => {
                    tracing::warn!(
                        entry_id,
                        index,
                        handle = %photo.handle,
                        %step,
                        error = %e,
                        "Photo upload failed, continuing with the rest of the batch",
                    );
                    failures.push(PhotoFailure {
                        index,
                        handle: photo.handle,
                        step,
                        message: e.to_string(),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(uploaded)
        } else {
            Err(UploadError {
                attempted: photos.len(),
                uploaded,
                failures,
            })
        }
    }

    async fn upload_one(
        &self,
        session: &Session,
        entry_id: EntryId,
        photo: &PendingPhoto,
    ) -> Result<StoredPhoto, (UploadStep, ClientError)> {
        let slot = self
            .backend
            .request_upload_slot(session, &photo.content_type)
            .await
            .map_err(|e| (UploadStep::RequestSlot, e))?;

        self.backend
            .upload_object(&slot, &photo.content_type, &photo.bytes)
            .await
            .map_err(|e| (UploadStep::Transmit, e))?;

        let record = self
            .backend
            .link_image(session, entry_id, &slot.key)
            .await
            .map_err(|e| (UploadStep::Link, e))?;

        Ok(StoredPhoto {
            image_id: record.and_then(|r| r.id),
            key: slot.key,
            url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_error_display_counts() {
        let err = UploadError {
            attempted: 3,
            uploaded: Vec::new(),
            failures: vec![PhotoFailure {
                index: 1,
                handle: Uuid::nil(),
                step: UploadStep::RequestSlot,
                message: "boom".into(),
            }],
        };
        assert_eq!(err.to_string(), "1 of 3 photo uploads failed");
    }

    #[test]
    fn step_display() {
        assert_eq!(UploadStep::Transmit.to_string(), "transmit");
        assert_eq!(UploadStep::Link.to_string(), "link image");
    }
}
