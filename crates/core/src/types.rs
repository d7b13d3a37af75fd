/// Backend-assigned travel entry identifier.
pub type EntryId = i64;

/// Backend-assigned image record identifier.
pub type ImageId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A raw JSON object as returned by the backend.
pub type BackendRecord = serde_json::Map<String, serde_json::Value>;
