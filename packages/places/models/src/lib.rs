#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Place record and coordinate types.
//!
//! These are a simplified, backend-agnostic projection of the records
//! returned by an external places directory. Every places backend maps its
//! own response shape into [`Place`] so that the outdoor detection engine
//! never depends on a particular provider.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    /// Latitude in degrees, positive north.
    pub lat: f64,
    /// Longitude in degrees, positive east.
    pub lng: f64,
}

impl GeoCoordinates {
    /// Creates a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` if both components are finite and inside the valid
    /// WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Northeast/southwest corners of a place's rough extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Northeast corner (maximum latitude and longitude).
    pub northeast: GeoCoordinates,
    /// Southwest corner (minimum latitude and longitude).
    pub southwest: GeoCoordinates,
}

/// Geometry attached to a place record. Either part may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceGeometry {
    /// Representative point of the place.
    pub location: Option<GeoCoordinates>,
    /// Recommended viewport for displaying the place.
    pub viewport: Option<Viewport>,
}

/// A single place returned by the places directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Provider-assigned unique identifier.
    pub id: String,
    /// Display name, if the provider returned one.
    pub name: Option<String>,
    /// Provider type tags (e.g. `"park"`, `"store"`).
    #[serde(default)]
    pub types: BTreeSet<String>,
    /// Location and viewport.
    pub geometry: Option<PlaceGeometry>,
    /// Short address or neighborhood description.
    pub vicinity: Option<String>,
}

impl Place {
    /// Creates a place with only an identifier set.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            types: BTreeSet::new(),
            geometry: None,
            vicinity: None,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds type tags.
    #[must_use]
    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Sets the representative point.
    #[must_use]
    pub fn with_location(mut self, location: GeoCoordinates) -> Self {
        self.geometry.get_or_insert_with(PlaceGeometry::default).location = Some(location);
        self
    }

    /// Sets the viewport.
    #[must_use]
    pub fn with_viewport(mut self, northeast: GeoCoordinates, southwest: GeoCoordinates) -> Self {
        self.geometry.get_or_insert_with(PlaceGeometry::default).viewport =
            Some(Viewport { northeast, southwest });
        self
    }

    /// Returns the representative point, if any.
    #[must_use]
    pub fn location(&self) -> Option<GeoCoordinates> {
        self.geometry.and_then(|g| g.location)
    }

    /// Returns the viewport, if any.
    #[must_use]
    pub fn viewport(&self) -> Option<Viewport> {
        self.geometry.and_then(|g| g.viewport)
    }

    /// Returns `true` if this place carries the given type tag.
    #[must_use]
    pub fn has_type(&self, place_type: &str) -> bool {
        self.types.contains(place_type)
    }

    /// Returns `true` if this place carries any of the given type tags.
    #[must_use]
    pub fn has_any_type(&self, place_types: &[&str]) -> bool {
        place_types.iter().any(|t| self.types.contains(*t))
    }
}
