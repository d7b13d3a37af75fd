//! Shared in-memory fakes for the client's trait seams.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use wayfarer_client::backend::{ImageRecord, TravelBackend, UploadSlot};
use wayfarer_client::error::ClientError;
use wayfarer_client::geocode::{Geocoder, PlaceCandidate};
use wayfarer_client::notify::Notifier;
use wayfarer_client::session::{Session, StaticTokenProvider};
use wayfarer_client::workflow::EntryWorkflow;
use wayfarer_core::transform::EntryPayload;
use wayfarer_core::types::{BackendRecord, EntryId};

// ---------------------------------------------------------------------------
// FakeBackend
// ---------------------------------------------------------------------------

/// Records every call and answers from in-memory state.
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    next_id: AtomicI64,
    next_image_id: AtomicI64,
    slot_requests: AtomicUsize,
    object_uploads: AtomicUsize,
    image_links: AtomicUsize,
    records: Mutex<Vec<BackendRecord>>,
    images: Mutex<HashMap<EntryId, Vec<ImageRecord>>>,
    failing_slot_requests: Mutex<HashSet<usize>>,
    failing_uploads: Mutex<HashSet<usize>>,
    failing_links: Mutex<HashSet<usize>>,
    fail_create: AtomicBool,
    update_returns_empty: AtomicBool,
    fail_delete: AtomicBool,
    fail_list: AtomicBool,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
            next_image_id: AtomicI64::new(1),
            slot_requests: AtomicUsize::new(0),
            object_uploads: AtomicUsize::new(0),
            image_links: AtomicUsize::new(0),
            records: Mutex::new(Vec::new()),
            images: Mutex::new(HashMap::new()),
            failing_slot_requests: Mutex::new(HashSet::new()),
            failing_uploads: Mutex::new(HashSet::new()),
            failing_links: Mutex::new(HashSet::new()),
            fail_create: AtomicBool::new(false),
            update_returns_empty: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_list: AtomicBool::new(false),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed the list returned by `GET /travel-entries`.
    pub fn with_records(records: Vec<serde_json::Value>) -> Arc<Self> {
        let backend = Self::default();
        *backend.records.lock().unwrap() = records
            .into_iter()
            .map(|v| v.as_object().cloned().unwrap())
            .collect();
        Arc::new(backend)
    }

    /// Make the n-th (0-based) upload slot request fail.
    pub fn fail_slot_request(&self, n: usize) {
        self.failing_slot_requests.lock().unwrap().insert(n);
    }

    /// Make the n-th (0-based) object storage `PUT` fail.
    pub fn fail_upload_object(&self, n: usize) {
        self.failing_uploads.lock().unwrap().insert(n);
    }

    /// Make the n-th (0-based) image link request fail.
    pub fn fail_link(&self, n: usize) {
        self.failing_links.lock().unwrap().insert(n);
    }

    /// Answer `PUT /travel-entries/{id}` with an empty body.
    pub fn update_returns_empty(&self) {
        self.update_returns_empty.store(true, Ordering::SeqCst);
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_delete(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }

    pub fn fail_list(&self) {
        self.fail_list.store(true, Ordering::SeqCst);
    }

    pub fn seed_images(&self, entry_id: EntryId, keys: &[&str]) {
        let records = keys
            .iter()
            .map(|k| ImageRecord {
                id: Some(self.next_image_id.fetch_add(1, Ordering::SeqCst)),
                image_key: k.to_string(),
            })
            .collect();
        self.images.lock().unwrap().insert(entry_id, records);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn network_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn unreachable() -> ClientError {
        ClientError::Transport("connection refused".into())
    }
}

fn payload_record(id: EntryId, payload: &EntryPayload) -> BackendRecord {
    let mut value = serde_json::to_value(payload).unwrap();
    value["id"] = json!(id);
    value["user_id"] = json!(1);
    value.as_object().cloned().unwrap()
}

#[async_trait]
impl TravelBackend for FakeBackend {
    async fn list_entries(
        &self,
        _session: Option<&Session>,
    ) -> Result<Vec<BackendRecord>, ClientError> {
        self.record("list".into());
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_entry(
        &self,
        _session: &Session,
        payload: &EntryPayload,
    ) -> Result<BackendRecord, ClientError> {
        self.record("create".into());
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ClientError::Api {
                status: 500,
                body: "boom".into(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(payload_record(id, payload))
    }

    async fn update_entry(
        &self,
        _session: &Session,
        id: EntryId,
        payload: &EntryPayload,
    ) -> Result<Option<BackendRecord>, ClientError> {
        self.record(format!("update:{id}"));
        if self.update_returns_empty.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(payload_record(id, payload)))
    }

    async fn delete_entry(&self, _session: &Session, id: EntryId) -> Result<(), ClientError> {
        self.record(format!("delete:{id}"));
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::unreachable());
        }
        Ok(())
    }

    async fn request_upload_slot(
        &self,
        _session: &Session,
        content_type: &str,
    ) -> Result<UploadSlot, ClientError> {
        let n = self.slot_requests.fetch_add(1, Ordering::SeqCst);
        self.record(format!("slot:{content_type}"));
        if self.failing_slot_requests.lock().unwrap().contains(&n) {
            return Err(ClientError::Api {
                status: 503,
                body: "slot issuer unavailable".into(),
            });
        }
        Ok(UploadSlot {
            upload_url: format!("https://bucket.test/upload/{n}"),
            key: format!("photos/{n}"),
        })
    }

    async fn upload_object(
        &self,
        slot: &UploadSlot,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<(), ClientError> {
        let n = self.object_uploads.fetch_add(1, Ordering::SeqCst);
        self.record(format!("put:{}:{content_type}:{}", slot.upload_url, bytes.len()));
        if self.failing_uploads.lock().unwrap().contains(&n) {
            return Err(ClientError::Api {
                status: 403,
                body: "Request has expired".into(),
            });
        }
        Ok(())
    }

    async fn link_image(
        &self,
        _session: &Session,
        entry_id: EntryId,
        key: &str,
    ) -> Result<Option<ImageRecord>, ClientError> {
        let n = self.image_links.fetch_add(1, Ordering::SeqCst);
        self.record(format!("link:{entry_id}:{key}"));
        if self.failing_links.lock().unwrap().contains(&n) {
            return Err(Self::unreachable());
        }
        let record = ImageRecord {
            id: Some(self.next_image_id.fetch_add(1, Ordering::SeqCst)),
            image_key: key.to_string(),
        };
        self.images
            .lock()
            .unwrap()
            .entry(entry_id)
            .or_default()
            .push(record.clone());
        Ok(Some(record))
    }

    async fn list_images(
        &self,
        _session: Option<&Session>,
        entry_id: EntryId,
    ) -> Result<Vec<ImageRecord>, ClientError> {
        self.record(format!("images:{entry_id}"));
        Ok(self
            .images
            .lock()
            .unwrap()
            .get(&entry_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn download_url(
        &self,
        _session: Option<&Session>,
        key: &str,
    ) -> Result<String, ClientError> {
        self.record(format!("download:{key}"));
        if key.starts_with("missing/") {
            return Err(ClientError::Api {
                status: 404,
                body: "no such key".into(),
            });
        }
        Ok(format!("https://cdn.test/{key}"))
    }
}

// ---------------------------------------------------------------------------
// Workflow wiring
// ---------------------------------------------------------------------------

pub fn signed_in_workflow(backend: Arc<FakeBackend>) -> EntryWorkflow {
    EntryWorkflow::new(
        backend,
        Arc::new(StaticTokenProvider::new(Some("test-token".into()))),
        Notifier::default(),
    )
}

pub fn anonymous_workflow(backend: Arc<FakeBackend>) -> EntryWorkflow {
    EntryWorkflow::new(
        backend,
        Arc::new(StaticTokenProvider::new(None)),
        Notifier::default(),
    )
}

// ---------------------------------------------------------------------------
// Geocoders
// ---------------------------------------------------------------------------

/// Answers every search with one candidate named after the query.
#[derive(Default)]
pub struct RecordingGeocoder {
    queries: Mutex<Vec<String>>,
}

impl RecordingGeocoder {
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Geocoder for RecordingGeocoder {
    async fn search(&self, query: &str) -> Result<Vec<PlaceCandidate>, ClientError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(vec![PlaceCandidate {
            display_name: format!("{query}, France"),
            lat: 48.8566,
            lng: 2.3522,
        }])
    }

    async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<String>, ClientError> {
        Ok(Some(format!("Point {lat:.2},{lng:.2}")))
    }
}

/// Every call fails as if the service were unreachable.
pub struct FailingGeocoder;

#[async_trait]
impl Geocoder for FailingGeocoder {
    async fn search(&self, _query: &str) -> Result<Vec<PlaceCandidate>, ClientError> {
        Err(ClientError::Transport("geocoder unreachable".into()))
    }

    async fn reverse(&self, _lat: f64, _lng: f64) -> Result<Option<String>, ClientError> {
        Err(ClientError::Transport("geocoder unreachable".into()))
    }
}
