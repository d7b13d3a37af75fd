//! Form-level gate in front of entry submission.
//!
//! An [`EntryDraft`] mirrors the entry form: every field may still be
//! empty. It only becomes a [`TravelEntry`] when the coordinates are both
//! present and finite and a visit date is set. A failed check never
//! reaches the network.

use chrono::NaiveDate;
use validator::{Validate, ValidationErrors};

use crate::entry::{Coordinates, TravelEntry};
use crate::error::CoreError;
use crate::photo::{PendingPhoto, Photo};

/// Editable form state for a new or existing entry.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct EntryDraft {
    pub title: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,

    #[validate(required(message = "a visit date is required"))]
    pub visit_date: Option<NaiveDate>,

    #[validate(
        required(message = "pick a point on the map"),
        range(min = -90.0, max = 90.0, message = "latitude out of range")
    )]
    pub lat: Option<f64>,

    #[validate(
        required(message = "pick a point on the map"),
        range(min = -180.0, max = 180.0, message = "longitude out of range")
    )]
    pub lng: Option<f64>,

    pub photos: Vec<PendingPhoto>,
}

impl EntryDraft {
    /// Set the coordinates from a map click.
    ///
    /// The location text is only overwritten when a place name is known,
    /// so a failed lookup leaves whatever the user typed.
    pub fn select_point(&mut self, lat: f64, lng: f64, place: Option<String>) {
        self.lat = Some(lat);
        self.lng = Some(lng);
        if let Some(name) = place {
            self.location = Some(name);
        }
    }

    /// Append a photo, keeping attachment order.
    pub fn attach_photo(&mut self, photo: PendingPhoto) {
        self.photos.push(photo);
    }

    /// Whether the submit button should be enabled.
    pub fn is_submittable(&self) -> bool {
        self.check().is_ok()
    }

    /// Run every field check and return all failures in one error.
    pub fn check(&self) -> Result<(), CoreError> {
        let mut problems = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => describe(&errors),
        };

        // `range` lets NaN through, so finiteness is checked separately.
        for (field, value) in [("lat", self.lat), ("lng", self.lng)] {
            if matches!(value, Some(v) if !v.is_finite()) {
                problems.push(format!("{field}: must be a finite number"));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            problems.sort();
            Err(CoreError::Validation(problems.join("; ")))
        }
    }

    /// Validate and convert into an unsaved entry with pending photos.
    pub fn into_entry(self) -> Result<TravelEntry, CoreError> {
        self.check()?;

        let coordinates = match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        };

        Ok(TravelEntry {
            id: None,
            title: self.title,
            location: self.location,
            description: self.description,
            coordinates,
            visit_date: self.visit_date,
            photos: self.photos.into_iter().map(Photo::from).collect(),
            extra: Default::default(),
        })
    }

    /// Load an existing entry back into the form.
    ///
    /// Only pending photos come across; stored photos stay on the entry.
    pub fn from_entry(entry: &TravelEntry) -> Self {
        Self {
            title: entry.title.clone(),
            location: entry.location.clone(),
            description: entry.description.clone(),
            visit_date: entry.visit_date,
            lat: entry.coordinates.map(|c| c.lat),
            lng: entry.coordinates.map(|c| c.lng),
            photos: entry.pending_photos(),
        }
    }
}

/// Apply the draft checks to an already-built entry (used before updates).
pub fn ensure_submittable(entry: &TravelEntry) -> Result<(), CoreError> {
    EntryDraft::from_entry(entry).check()
}

fn describe(errors: &ValidationErrors) -> Vec<String> {
    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                let msg = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                format!("{field}: {msg}")
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn valid_draft() -> EntryDraft {
        EntryDraft {
            title: Some("Kyoto".into()),
            location: Some("Kyoto, Japan".into()),
            description: Some("Temples".into()),
            visit_date: NaiveDate::from_ymd_opt(2023, 4, 2),
            lat: Some(35.0116),
            lng: Some(135.7681),
            photos: Vec::new(),
        }
    }

    #[test]
    fn valid_draft_is_submittable() {
        assert!(valid_draft().is_submittable());
    }

    #[test]
    fn missing_coordinates_block_submission() {
        let draft = EntryDraft {
            lat: None,
            lng: None,
            ..valid_draft()
        };
        let err = draft.check().unwrap_err();
        assert_matches!(err, CoreError::Validation(ref msg) if msg.contains("lat") && msg.contains("lng"));
    }

    #[test]
    fn missing_date_blocks_submission() {
        let draft = EntryDraft {
            visit_date: None,
            ..valid_draft()
        };
        let msg = draft.check().unwrap_err().to_string();
        assert!(msg.contains("visit_date"));
    }

    #[test]
    fn nan_and_out_of_range_rejected() {
        let nan = EntryDraft {
            lat: Some(f64::NAN),
            ..valid_draft()
        };
        assert!(nan.check().unwrap_err().to_string().contains("finite"));

        let far = EntryDraft {
            lng: Some(181.0),
            ..valid_draft()
        };
        assert!(far.check().unwrap_err().to_string().contains("longitude out of range"));
    }

    #[test]
    fn text_fields_are_optional() {
        let draft = EntryDraft {
            title: None,
            location: None,
            description: None,
            ..valid_draft()
        };
        assert!(draft.is_submittable());
    }

    #[test]
    fn into_entry_keeps_photo_order() {
        let mut draft = valid_draft();
        let a = PendingPhoto::new(vec![1], "image/png");
        let b = PendingPhoto::new(vec![2], "image/jpeg");
        draft.attach_photo(a.clone());
        draft.attach_photo(b.clone());

        let entry = draft.into_entry().unwrap();
        assert_eq!(entry.id, None);
        assert_eq!(entry.coordinates, Some(Coordinates::new(35.0116, 135.7681)));
        assert_eq!(entry.photos, vec![Photo::Pending(a), Photo::Pending(b)]);
    }

    #[test]
    fn select_point_without_place_keeps_location() {
        let mut draft = EntryDraft {
            location: Some("typed by hand".into()),
            ..Default::default()
        };
        draft.select_point(1.0, 2.0, None);
        assert_eq!(draft.location.as_deref(), Some("typed by hand"));
        assert_eq!((draft.lat, draft.lng), (Some(1.0), Some(2.0)));

        draft.select_point(3.0, 4.0, Some("Somewhere".into()));
        assert_eq!(draft.location.as_deref(), Some("Somewhere"));
    }

    #[test]
    fn ensure_submittable_checks_entries() {
        let entry = valid_draft().into_entry().unwrap();
        assert!(ensure_submittable(&entry).is_ok());

        let broken = TravelEntry {
            coordinates: None,
            ..entry
        };
        assert!(ensure_submittable(&broken).is_err());
    }
}
