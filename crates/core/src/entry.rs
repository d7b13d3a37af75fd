//! The client-side canonical travel entry.

use chrono::NaiveDate;
use serde::Serialize;

use crate::photo::{PendingPhoto, Photo, StoredPhoto};
use crate::types::{BackendRecord, EntryId};

/// A point on the map in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite and inside latitude/longitude bounds.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A single travel journal record.
///
/// `id` is `None` until the backend has persisted the entry. Fields the
/// backend sends that the client does not model are kept in `extra` and
/// never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelEntry {
    pub id: Option<EntryId>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub visit_date: Option<NaiveDate>,
    pub photos: Vec<Photo>,
    #[serde(flatten)]
    pub extra: BackendRecord,
}

impl TravelEntry {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// The card thumbnail is the first photo, whatever its state.
    pub fn thumbnail(&self) -> Option<&Photo> {
        self.photos.first()
    }

    /// Photos attached locally that still need uploading, in order.
    pub fn pending_photos(&self) -> Vec<PendingPhoto> {
        self.photos
            .iter()
            .filter_map(Photo::as_pending)
            .cloned()
            .collect()
    }

    /// Photos that already live in object storage, in order.
    pub fn stored_photos(&self) -> Vec<StoredPhoto> {
        self.photos
            .iter()
            .filter_map(Photo::as_stored)
            .cloned()
            .collect()
    }
}
