#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Outdoor / natural-area detection engine.
//!
//! Decides whether a coordinate is outdoors in a vegetated or natural
//! place, using signals from an external places directory. The pipeline
//! runs in four stages, sequenced by [`detector`]:
//!
//! 1. [`aggregator`]: concurrent places queries merged into a
//!    [`PlaceContext`], using the geometry in [`boundary`].
//! 2. [`classifier`]: an ordered rule table assigns a [`SpaceCategory`].
//! 3. [`confidence`]: independent adjustments on top of the rule's base
//!    confidence, clamped to 0-100, decide the verdict.
//! 4. [`explanations`]: user-facing phrases for the verdict.
//!
//! Aggregation, classification, and scoring log through an injected
//! `&dyn log::Log`. [`detect_outdoor_location`] passes the global logger.
//!
//! [`PlaceContext`]: touch_grass_outdoors_models::PlaceContext
//! [`SpaceCategory`]: touch_grass_outdoors_models::SpaceCategory

pub mod aggregator;
pub mod boundary;
pub mod classifier;
pub mod confidence;
pub mod detector;
pub mod explanations;
pub mod signals;

#[cfg(test)]
pub(crate) mod testing;

use std::any::Any;

use thiserror::Error;
use touch_grass_places::PlacesError;

pub use detector::{detect_outdoor_location, detect_outdoor_location_with_logger};

/// Errors that abort a detection pipeline.
///
/// These never escape [`detect_outdoor_location`]; they are turned into
/// its conservative fallback result.
#[derive(Debug, Error)]
pub enum OutdoorsError {
    /// The places backend failed hard.
    #[error("Places backend failed: {0}")]
    Places(#[from] PlacesError),

    /// The query coordinate is not a valid WGS84 position.
    #[error("Invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates {
        /// Latitude as given.
        lat: f64,
        /// Longitude as given.
        lng: f64,
    },

    /// A pipeline stage panicked.
    #[error("Detection panicked: {message}")]
    Panicked {
        /// Panic payload, if it was a string.
        message: String,
    },
}

/// Extracts the message of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
