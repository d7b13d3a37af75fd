//! Entry submission, update and deletion against the backend, with the
//! in-memory list reconciled after each completed operation.
//!
//! Every operation notifies the user about its outcome and also returns
//! it, so callers that only render toasts can ignore the `Result`. A
//! failed operation never changes the in-memory list: it keeps matching
//! the backend's last known-good state. Nothing is retried.

use std::sync::Arc;

use tokio::sync::RwLock;
use wayfarer_core::entry::TravelEntry;
use wayfarer_core::error::CoreError;
use wayfarer_core::photo::{PendingPhoto, Photo, StoredPhoto};
use wayfarer_core::store::EntryStore;
use wayfarer_core::transform::{from_backend, to_backend};
use wayfarer_core::types::EntryId;
use wayfarer_core::validation::{ensure_submittable, EntryDraft};

use crate::backend::TravelBackend;
use crate::error::ClientError;
use crate::notify::Notifier;
use crate::session::{optional_session, require_session, IdentityProvider, Session};
use crate::upload::{PhotoUploader, UploadError};

/// Outcome of a create or update.
///
/// The entry is persisted even when some photos failed; `upload_error`
/// then lists them.
#[derive(Debug, Clone)]
pub struct Submission {
    pub entry: TravelEntry,
    pub upload_error: Option<UploadError>,
}

impl Submission {
    /// `true` when every requested photo was uploaded and linked.
    pub fn is_complete(&self) -> bool {
        self.upload_error.is_none()
    }
}

pub struct EntryWorkflow {
    backend: Arc<dyn TravelBackend>,
    identity: Arc<dyn IdentityProvider>,
    uploader: PhotoUploader,
    notifier: Notifier,
    store: RwLock<EntryStore>,
}

impl EntryWorkflow {
    pub fn new(
        backend: Arc<dyn TravelBackend>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Notifier,
    ) -> Self {
        Self {
            uploader: PhotoUploader::new(Arc::clone(&backend)),
            backend,
            identity,
            notifier,
            store: RwLock::new(EntryStore::new()),
        }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Snapshot of the list in display order.
    pub async fn entries(&self) -> Vec<TravelEntry> {
        self.store.read().await.entries().to_vec()
    }

    pub async fn entry(&self, id: EntryId) -> Option<TravelEntry> {
        self.store.read().await.get(id).cloned()
    }

    /// Listed entry with `id`, or [`CoreError::NotFound`].
    pub async fn require_entry(&self, id: EntryId) -> Result<TravelEntry, ClientError> {
        Ok(self.store.read().await.require(id)?.clone())
    }

    /// Replace the list with the backend's entries, in the backend's order.
    pub async fn load(&self) -> Result<usize, ClientError> {
        let session = optional_session(self.identity.as_ref()).await;

        match self.backend.list_entries(session.as_ref()).await {
            Ok(records) => {
                let entries: Vec<TravelEntry> = records.into_iter().map(from_backend).collect();
                let count = entries.len();
                *self.store.write().await = EntryStore::from_loaded(entries);
                tracing::info!(count, "Entries loaded");
                Ok(count)
            }
            Err(e) => {
                self.report("load entries", &e);
                Err(e)
            }
        }
    }

    /// Create an entry from the form and attach its photos.
    ///
    /// An invalid draft fails before any session lookup or request.
    pub async fn submit(&self, draft: EntryDraft) -> Result<Submission, ClientError> {
        let result = self.try_submit(draft).await;
        match &result {
            Ok(submission) => self.report_saved("Entry saved", submission),
            Err(e) => self.report("save entry", e),
        }
        result
    }

    /// Replace an entry's mutable fields and upload any photos still
    /// pending on it. Stored photos are kept.
    pub async fn update(&self, entry: TravelEntry) -> Result<Submission, ClientError> {
        let result = self.try_update(entry).await;
        match &result {
            Ok(submission) => self.report_saved("Entry updated", submission),
            Err(e) => self.report("update entry", e),
        }
        result
    }

    /// Delete an entry on the backend, then drop it from the list.
    pub async fn delete(&self, id: EntryId) -> Result<(), ClientError> {
        let result = self.try_delete(id).await;
        match &result {
            Ok(()) => self.notifier.success("Entry deleted"),
            Err(e) => self.report("delete entry", e),
        }
        result
    }

    /// Resolve download URLs for an entry's images and store them on the
    /// entry. Images whose URL cannot be resolved are skipped.
    pub async fn resolve_photos(&self, id: EntryId) -> Result<Vec<String>, ClientError> {
        let session = optional_session(self.identity.as_ref()).await;

        let images = match self.backend.list_images(session.as_ref(), id).await {
            Ok(images) => images,
            Err(e) => {
                self.report("load photos", &e);
                return Err(e);
            }
        };

        let mut resolved = Vec::with_capacity(images.len());
        for image in images {
            match self
                .backend
                .download_url(session.as_ref(), &image.image_key)
                .await
            {
                Ok(url) => resolved.push(StoredPhoto {
                    image_id: image.id,
                    key: image.image_key,
                    url: Some(url),
                }),
                Err(e) => {
                    tracing::warn!(entry_id = id, key = %image.image_key, error = %e, "Skipping photo without download URL");
                }
            }
        }

        let urls = resolved.iter().filter_map(|p| p.url.clone()).collect();

        let mut store = self.store.write().await;
        if let Some(mut entry) = store.get(id).cloned() {
            entry.photos = resolved.into_iter().map(Photo::from).collect();
            store.replace(entry);
        }

        Ok(urls)
    }

    // ---- private helpers ----

    async fn try_submit(&self, draft: EntryDraft) -> Result<Submission, ClientError> {
        let entry = draft.into_entry()?;
        let session = require_session(self.identity.as_ref()).await?;

        let record = self
            .backend
            .create_entry(&session, &to_backend(&entry))
            .await?;
        let mut created = from_backend(record);
        let id = created
            .id
            .ok_or_else(|| ClientError::Decode("created entry has no id".into()))?;
        tracing::info!(entry_id = id, "Entry created");

        let (uploaded, upload_error) = self.attach(&session, id, &entry.pending_photos()).await;
        created.photos.extend(uploaded);

        // Already persisted, so a local conflict is only logged.
        if let Err(e) = self.store.write().await.append(created.clone()) {
            tracing::warn!(entry_id = id, error = %e, "Created entry not appended to the local list");
        }

        Ok(Submission {
            entry: created,
            upload_error,
        })
    }

    async fn try_update(&self, entry: TravelEntry) -> Result<Submission, ClientError> {
        let id = entry
            .id
            .ok_or_else(|| CoreError::Validation("entry has not been saved yet".into()))?;
        ensure_submittable(&entry)?;
        let session = require_session(self.identity.as_ref()).await?;

        let returned = self
            .backend
            .update_entry(&session, id, &to_backend(&entry))
            .await?;
        tracing::info!(entry_id = id, "Entry updated");

        let kept: Vec<Photo> = entry
            .photos
            .iter()
            .filter(|p| !p.is_pending())
            .cloned()
            .collect();
        let pending = entry.pending_photos();

        let mut updated = match returned {
            Some(record) => from_backend(record),
            None => TravelEntry {
                photos: Vec::new(),
                ..entry
            },
        };
        updated.id = Some(id);
        if updated.photos.is_empty() {
            updated.photos = kept;
        }

        let (uploaded, upload_error) = self.attach(&session, id, &pending).await;
        updated.photos.extend(uploaded);

        if !self.store.write().await.replace(updated.clone()) {
            tracing::debug!(entry_id = id, "Updated entry is not in the local list");
        }

        Ok(Submission {
            entry: updated,
            upload_error,
        })
    }

    async fn try_delete(&self, id: EntryId) -> Result<(), ClientError> {
        let session = require_session(self.identity.as_ref()).await?;
        self.backend.delete_entry(&session, id).await?;
        tracing::info!(entry_id = id, "Entry deleted");

        self.store.write().await.remove(id);
        Ok(())
    }

    /// Upload pending photos, returning the ones that made it plus the
    /// batch error if any did not.
    async fn attach(
        &self,
        session: &Session,
        id: EntryId,
        pending: &[PendingPhoto],
    ) -> (Vec<Photo>, Option<UploadError>) {
        if pending.is_empty() {
            return (Vec::new(), None);
        }

        match self.uploader.attach_photos(session, id, pending).await {
            Ok(stored) => (stored.into_iter().map(Photo::from).collect(), None),
            Err(e) => {
                let photos = e.uploaded.iter().cloned().map(Photo::from).collect();
                (photos, Some(e))
            }
        }
    }

    fn report_saved(&self, what: &str, submission: &Submission) {
        match &submission.upload_error {
            None => self.notifier.success(what),
            Some(e) => self.notifier.error(format!("{what}, but {e}")),
        }
    }

    fn report(&self, action: &str, err: &ClientError) {
        tracing::error!(action, error = %err, "Workflow operation failed");
        self.notifier.error(format!("Failed to {action}: {err}"));
    }
}
