#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Places directory query interface.
//!
//! The outdoor detection engine only ever talks to a places backend
//! through the [`PlacesQuery`] trait. This crate defines that trait, the
//! shared [`PlacesError`] type, and a concrete client for the Google
//! Places web service:
//!
//! - [`google`]: nearby search, keyword search, and place details.
//! - [`retry`]: HTTP retry with exponential backoff for transient errors.
//! - [`service_registry`]: backend configurations embedded from TOML
//!   files in `services/`.

pub mod google;
pub mod retry;
pub mod service_registry;

use async_trait::async_trait;
use thiserror::Error;

pub use touch_grass_places_models::{GeoCoordinates, Place, PlaceGeometry, Viewport};

/// Errors from places directory operations.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The backend rejected the request because of quota or rate limits.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The backend refused the request (bad key, malformed parameters).
    #[error("Request denied: {message}")]
    RequestDenied {
        /// Message returned by the backend, if any.
        message: String,
    },

    /// The response could not be interpreted.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// The backend is unreachable or reported an internal failure.
    #[error("Places backend unavailable: {message}")]
    Unavailable {
        /// Description of what went wrong.
        message: String,
    },

    /// Client configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl PlacesError {
    /// Returns `true` for failures that only affect a single query and
    /// should degrade to "no results" rather than abort the caller.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        match self {
            Self::Timeout | Self::RateLimited => true,
            Self::Http(e) => e.is_timeout(),
            Self::Json(_)
            | Self::RequestDenied { .. }
            | Self::Parse { .. }
            | Self::Unavailable { .. }
            | Self::Config { .. } => false,
        }
    }
}

/// Query surface of an external places directory.
///
/// Implementations are black boxes to the detection engine: every call
/// may be slow or fail, and each call is independent. Implementations are
/// responsible for their own per-request timeouts.
#[async_trait]
pub trait PlacesQuery: Send + Sync {
    /// Returns places of `place_type` within `radius_meters` of
    /// `coordinates`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the backend call fails.
    async fn search_nearby(
        &self,
        coordinates: GeoCoordinates,
        radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<Place>, PlacesError>;

    /// Returns places matching the free-text `keyword` within
    /// `radius_meters` of `coordinates`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the backend call fails.
    async fn search_by_keyword(
        &self,
        coordinates: GeoCoordinates,
        radius_meters: u32,
        keyword: &str,
    ) -> Result<Vec<Place>, PlacesError>;

    /// Returns the full record for `place_id`, or `None` if the backend
    /// does not know it.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the backend call fails.
    async fn get_details(&self, place_id: &str) -> Result<Option<Place>, PlacesError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_errors() {
        assert!(PlacesError::Timeout.is_soft());
        assert!(PlacesError::RateLimited.is_soft());
        assert!(
            !PlacesError::Unavailable {
                message: "down".to_string()
            }
            .is_soft()
        );
        assert!(
            !PlacesError::RequestDenied {
                message: "bad key".to_string()
            }
            .is_soft()
        );
    }
}
