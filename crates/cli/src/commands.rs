//! Command definitions and their handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::json;
use wayfarer_client::backend::HttpBackend;
use wayfarer_client::config::ClientConfig;
use wayfarer_client::geocode::{LocationSearch, NominatimGeocoder};
use wayfarer_client::notify::Notifier;
use wayfarer_client::session::StaticTokenProvider;
use wayfarer_client::transport::HttpTransport;
use wayfarer_client::workflow::{EntryWorkflow, Submission};
use wayfarer_core::entry::Coordinates;
use wayfarer_core::photo::{PendingPhoto, Photo};
use wayfarer_core::types::EntryId;
use wayfarer_core::validation::EntryDraft;

#[derive(Parser, Debug)]
#[command(name = "wayfarer", version, about = "Travel journal client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List entries in backend order
    List,

    /// Create an entry and upload its photos
    Add {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Visit date, YYYY-MM-DD
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
        /// Fill the location from the coordinates when not given
        #[arg(long)]
        reverse_geocode: bool,
        /// Image file to attach (repeatable)
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },

    /// Change fields of an existing entry
    Update {
        id: EntryId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },

    /// Delete an entry
    Delete { id: EntryId },

    /// Print download URLs for an entry's photos
    Photos { id: EntryId },

    /// Forward geocode a place name
    Search { query: String },

    /// Reverse geocode a point
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
}

/// Wired-up client services.
pub struct App {
    workflow: EntryWorkflow,
    search: LocationSearch,
}

impl App {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let backend = Arc::new(HttpBackend::new(HttpTransport::new(config)?));
        let identity = Arc::new(StaticTokenProvider::new(config.api_token.clone()));
        let geocoder = Arc::new(NominatimGeocoder::new(config)?);

        Ok(Self {
            workflow: EntryWorkflow::new(backend, identity, Notifier::default()),
            search: LocationSearch::new(geocoder),
        })
    }

    pub async fn run(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::List => {
                self.workflow.load().await?;
                print_json(&self.workflow.entries().await)
            }
            Command::Add {
                title,
                location,
                description,
                date,
                lat,
                lng,
                reverse_geocode,
                photos,
            } => {
                let mut draft = EntryDraft {
                    title,
                    location,
                    description,
                    visit_date: date,
                    ..Default::default()
                };
                if let (Some(lat), Some(lng)) = (lat, lng) {
                    if reverse_geocode && draft.location.is_none() {
                        self.search.fill_draft_location(&mut draft, lat, lng).await;
                    } else {
                        draft.select_point(lat, lng, None);
                    }
                } else {
                    draft.lat = lat;
                    draft.lng = lng;
                }
                for path in &photos {
                    draft.attach_photo(read_photo(path).await?);
                }

                let submission = self.workflow.submit(draft).await?;
                finish(submission)
            }
            Command::Update {
                id,
                title,
                location,
                description,
                date,
                lat,
                lng,
                photos,
            } => {
                self.workflow.load().await?;
                let mut entry = self.workflow.require_entry(id).await?;

                if title.is_some() {
                    entry.title = title;
                }
                if location.is_some() {
                    entry.location = location;
                }
                if description.is_some() {
                    entry.description = description;
                }
                if date.is_some() {
                    entry.visit_date = date;
                }
                if let (Some(lat), Some(lng)) = (lat, lng) {
                    entry.coordinates = Some(Coordinates::new(lat, lng));
                }
                for path in &photos {
                    entry.photos.push(Photo::from(read_photo(path).await?));
                }

                let submission = self.workflow.update(entry).await?;
                finish(submission)
            }
            Command::Delete { id } => {
                self.workflow.delete(id).await?;
                print_json(&json!({ "deleted": id }))
            }
            Command::Photos { id } => {
                let urls = self.workflow.resolve_photos(id).await?;
                print_json(&urls)
            }
            Command::Search { query } => {
                let candidates = self.search.search(&query).await?;
                print_json(&candidates)
            }
            Command::Reverse { lat, lng } => {
                let place = self.search.reverse_geocode(lat, lng).await;
                print_json(&json!({ "lat": lat, "lng": lng, "location": place }))
            }
        }
    }
}

async fn read_photo(path: &Path) -> anyhow::Result<PendingPhoto> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read photo {}", path.display()))?;
    let photo = PendingPhoto::from_bytes(bytes, None);
    Ok(match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => photo.with_file_name(name),
        None => photo,
    })
}

/// Print the saved entry; a partial photo failure still exits non-zero.
fn finish(submission: Submission) -> anyhow::Result<()> {
    print_json(&submission.entry)?;
    match submission.upload_error {
        None => Ok(()),
        Some(e) => {
            for failure in &e.failures {
                tracing::error!(
                    index = failure.index,
                    step = %failure.step,
                    error = %failure.message,
                    "Photo not uploaded",
                );
            }
            Err(e.into())
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
