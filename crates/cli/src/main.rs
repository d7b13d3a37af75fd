//! `wayfarer` -- command-line client for the travel journal backend.
//!
//! Lists, creates, edits and deletes travel entries, uploads photos
//! through presigned URLs, and queries the geocoding service.
//!
//! # Environment variables
//!
//! | Variable               | Required   | Default                               |
//! |------------------------|------------|---------------------------------------|
//! | `API_BASE_URL`         | no         | `http://localhost:5000`               |
//! | `API_TOKEN`            | for writes | --                                    |
//! | `GEOCODER_BASE_URL`    | no         | `https://nominatim.openstreetmap.org` |
//! | `GEOCODER_USER_AGENT`  | no         | `wayfarer/<version>`                  |
//! | `SEARCH_RESULT_LIMIT`  | no         | `5`                                   |
//! | `REQUEST_TIMEOUT_SECS` | no         | `30`                                  |

mod commands;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfarer_client::config::ClientConfig;

use crate::commands::{App, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfarer_client=info,wayfarer_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::from_env()?;

    tracing::debug!(
        api_base_url = %config.api_base_url,
        geocoder_base_url = %config.geocoder_base_url,
        has_token = config.api_token.is_some(),
        "Configuration loaded",
    );

    let app = App::new(&config)?;
    app.run(cli.command).await
}
