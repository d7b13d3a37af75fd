//! Photo attachments: pending local blobs and persisted object references.
//!
//! A photo starts life as a [`PendingPhoto`] (raw bytes plus a local UUID
//! handle) and becomes a [`StoredPhoto`] once its bytes are in object
//! storage and the object key is linked to the parent entry.

use serde::Serialize;
use uuid::Uuid;

use crate::types::ImageId;

/// Content type used when none is declared and the bytes are not a
/// recognised image format.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

// ---------------------------------------------------------------------------
// PendingPhoto
// ---------------------------------------------------------------------------

/// A photo attached to an entry but not yet uploaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingPhoto {
    /// Local identity of the blob until it has an object key.
    pub handle: Uuid,
    /// Original file name, if the photo came from a file.
    pub file_name: Option<String>,
    /// MIME type sent as the `Content-Type` of the upload.
    pub content_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl PendingPhoto {
    /// Create a pending photo with an explicit content type.
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            handle: Uuid::new_v4(),
            file_name: None,
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Create a pending photo, sniffing the content type from the bytes
    /// when `declared` is absent or blank.
    pub fn from_bytes(bytes: Vec<u8>, declared: Option<&str>) -> Self {
        let content_type = match declared.map(str::trim) {
            Some(ct) if !ct.is_empty() => ct.to_string(),
            _ => sniff_content_type(&bytes).to_string(),
        };
        Self::new(bytes, content_type)
    }

    /// Attach the original file name.
    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Size of the blob in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Guess an image MIME type from the leading bytes of a blob.
pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

// ---------------------------------------------------------------------------
// StoredPhoto
// ---------------------------------------------------------------------------

/// A photo whose bytes live in object storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPhoto {
    /// Image record id from the link step, when the backend returned one.
    pub image_id: Option<ImageId>,
    /// Object storage key.
    pub key: String,
    /// Time-limited download URL, once resolved.
    pub url: Option<String>,
}

// ---------------------------------------------------------------------------
// Photo
// ---------------------------------------------------------------------------

/// One element of an entry's ordered photo list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Photo {
    Pending(PendingPhoto),
    Stored(StoredPhoto),
    /// A bare URL the backend returned without an object key.
    Url { url: String },
}

impl Photo {
    pub fn is_pending(&self) -> bool {
        matches!(self, Photo::Pending(_))
    }

    pub fn as_pending(&self) -> Option<&PendingPhoto> {
        match self {
            Photo::Pending(p) => Some(p),
            Photo::Stored(_) | Photo::Url { .. } => None,
        }
    }

    pub fn as_stored(&self) -> Option<&StoredPhoto> {
        match self {
            Photo::Stored(s) => Some(s),
            Photo::Pending(_) | Photo::Url { .. } => None,
        }
    }

    /// URL to display, if one is known without a further round trip.
    pub fn display_url(&self) -> Option<&str> {
        match self {
            Photo::Pending(_) => None,
            Photo::Stored(s) => s.url.as_deref(),
            Photo::Url { url } => Some(url),
        }
    }
}

impl From<PendingPhoto> for Photo {
    fn from(p: PendingPhoto) -> Self {
        Photo::Pending(p)
    }
}

impl From<StoredPhoto> for Photo {
    fn from(s: StoredPhoto) -> Self {
        Photo::Stored(s)
    }
}
