//! Mapping between the client entry shape and the backend's flat record.
//!
//! The backend stores coordinates as `latitude`/`longitude` columns and has
//! used both `visitDate` and `visit_date` for the visit date. Reads accept
//! either spelling (and numbers sent as strings); writes emit both date keys
//! until every backend deployment has migrated.
//!
//! Nothing here validates. Missing fields pass through as `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::entry::{Coordinates, TravelEntry};
use crate::photo::{Photo, StoredPhoto};
use crate::types::{BackendRecord, Timestamp};

/// Current name of the visit date field.
pub const VISIT_DATE_KEY: &str = "visitDate";

/// Legacy name of the visit date field.
pub const VISIT_DATE_LEGACY_KEY: &str = "visit_date";

// ---------------------------------------------------------------------------
// Client -> backend
// ---------------------------------------------------------------------------

/// Request body for creating or replacing an entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub visit_date: Option<Timestamp>,
}

impl Serialize for EntryPayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("EntryPayload", 7)?;
        state.serialize_field("title", &self.title)?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("location", &self.location)?;
        state.serialize_field("latitude", &self.latitude)?;
        state.serialize_field("longitude", &self.longitude)?;
        state.serialize_field(VISIT_DATE_KEY, &self.visit_date)?;
        state.serialize_field(VISIT_DATE_LEGACY_KEY, &self.visit_date)?;
        state.end()
    }
}

/// Flatten an entry into the backend's request shape.
///
/// Photos and the id are not part of the body: photos go through the
/// upload flow and the id travels in the URL.
pub fn to_backend(entry: &TravelEntry) -> EntryPayload {
    EntryPayload {
        title: entry.title.clone(),
        description: entry.description.clone(),
        location: entry.location.clone(),
        latitude: entry.coordinates.map(|c| c.lat),
        longitude: entry.coordinates.map(|c| c.lng),
        visit_date: entry.visit_date.map(date_to_timestamp),
    }
}

/// Midnight UTC on the given calendar day.
pub fn date_to_timestamp(date: NaiveDate) -> Timestamp {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

// ---------------------------------------------------------------------------
// Backend -> client
// ---------------------------------------------------------------------------

/// Rebuild a client entry from a backend record.
///
/// Known fields are lifted into typed fields; everything else is kept in
/// [`TravelEntry::extra`] exactly as received.
pub fn from_backend(mut record: BackendRecord) -> TravelEntry {
    let id = record.remove("id").as_ref().and_then(as_i64);
    let title = take_string(&mut record, "title");
    let location = take_string(&mut record, "location");
    let description = take_string(&mut record, "description");

    let latitude = record.remove("latitude");
    let longitude = record.remove("longitude");
    let nested = record.remove("coordinates");
    let coordinates = coordinates_from(latitude.as_ref(), longitude.as_ref())
        .or_else(|| nested.as_ref().and_then(nested_coordinates));

    let current = record.remove(VISIT_DATE_KEY);
    let legacy = record.remove(VISIT_DATE_LEGACY_KEY);
    let visit_date = current
        .as_ref()
        .and_then(parse_visit_date)
        .or_else(|| legacy.as_ref().and_then(parse_visit_date));

    let photos = record
        .remove("photos")
        .map(|v| parse_photos(&v))
        .unwrap_or_default();

    TravelEntry {
        id,
        title,
        location,
        description,
        coordinates,
        visit_date,
        photos,
        extra: record,
    }
}

/// Parse a visit date sent either as `YYYY-MM-DD` or as a timestamp.
///
/// Timestamps are reduced to their UTC calendar day.
pub fn parse_visit_date(value: &Value) -> Option<NaiveDate> {
    let raw = value.as_str()?.trim();

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn take_string(record: &mut BackendRecord, key: &str) -> Option<String> {
    match record.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numbers may arrive as JSON numbers or, from numeric columns, as strings.
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coordinates_from(lat: Option<&Value>, lng: Option<&Value>) -> Option<Coordinates> {
    Some(Coordinates::new(as_f64(lat?)?, as_f64(lng?)?))
}

fn nested_coordinates(value: &Value) -> Option<Coordinates> {
    coordinates_from(value.get("lat"), value.get("lng"))
}

fn parse_photos(value: &Value) -> Vec<Photo> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(Photo::Url { url: url.clone() }),
            Value::Object(obj) => {
                let key = obj
                    .get("image_key")
                    .or_else(|| obj.get("key"))
                    .and_then(Value::as_str)?;
                Some(Photo::Stored(StoredPhoto {
                    image_id: obj.get("id").and_then(as_i64),
                    key: key.to_string(),
                    url: obj.get("url").and_then(Value::as_str).map(str::to_string),
                }))
            }
            _ => None,
        })
        .collect()
}
