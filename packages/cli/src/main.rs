#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the outdoor detector.
//!
//! Runs one detection against the configured places backend and prints the
//! result as JSON. The API key is read from the environment variable named
//! by the backend's registry entry (`GOOGLE_PLACES_API_KEY` by default).

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use touch_grass_outdoors::detect_outdoor_location;
use touch_grass_outdoors_models::{DetectionOptions, GeoCoordinates};
use touch_grass_places::google::GooglePlacesClient;
use touch_grass_places::service_registry;

#[derive(Parser)]
#[command(name = "touch_grass", about = "Outdoor / natural-area detector")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide whether a coordinate is outdoors in a natural place
    Detect {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Skip detection and confirm the location as outdoors
        #[arg(long)]
        manual_override: bool,
        /// Search radius in meters (overrides the options file)
        #[arg(long)]
        radius: Option<u32>,
        /// Disable free-text keyword searches
        #[arg(long)]
        no_keywords: bool,
        /// TOML file with `DetectionOptions` (camelCase keys)
        #[arg(long)]
        options: Option<PathBuf>,
        /// Places backend to use (e.g., "`google_places`"). Defaults to the
        /// highest-priority enabled backend.
        #[arg(long)]
        service: Option<String>,
        /// Pretty-print the JSON result
        #[arg(long)]
        pretty: bool,
    },
    /// List the configured places backends
    Services,
}

fn load_options(path: Option<&Path>) -> Result<DetectionOptions, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(DetectionOptions::default());
    };
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read options file {}: {e}", path.display()))?;
    let options = toml::de::from_str(&contents)
        .map_err(|e| format!("Failed to parse options file {}: {e}", path.display()))?;
    Ok(options)
}

fn places_client(service: Option<&str>) -> Result<GooglePlacesClient, Box<dyn std::error::Error>> {
    let Some(id) = service else {
        return Ok(GooglePlacesClient::from_env()?);
    };
    let service =
        service_registry::find_service(id).ok_or_else(|| format!("Unknown places service: {id}"))?;
    Ok(GooglePlacesClient::from_service(service)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Services => {
            println!("{:<16} {:<8} {:<9} BASE URL", "ID", "ENABLED", "PRIORITY");
            println!("{}", "-".repeat(72));
            for service in service_registry::services() {
                println!(
                    "{:<16} {:<8} {:<9} {}",
                    service.id, service.enabled, service.priority, service.endpoint.base_url
                );
            }
        }
        Commands::Detect {
            lat,
            lng,
            manual_override,
            radius,
            no_keywords,
            options,
            service,
            pretty,
        } => {
            let mut options = load_options(options.as_deref())?;
            options.is_manual_override |= manual_override;
            if let Some(radius) = radius {
                options.search.radius_meters = radius;
            }
            if no_keywords {
                options.search.keyword_search = false;
            }

            let client = places_client(service.as_deref())?;
            let coordinates = GeoCoordinates::new(lat, lng);
            log::info!("Detecting outdoor status at {lat},{lng}");

            let result = detect_outdoor_location(coordinates, &client, &options).await;

            let json = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{json}");
        }
    }

    Ok(())
}
