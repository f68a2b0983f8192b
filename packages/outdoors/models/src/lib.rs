#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Outdoor detection types.
//!
//! Everything here is built fresh for one detection call and discarded
//! afterwards: the aggregated [`PlaceContext`], the intermediate
//! [`ClassificationResult`] and [`ConfidenceResult`], and the
//! [`OutdoorDetectionResult`] handed back to callers. All types serialize
//! to `camelCase` JSON for the UI.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use touch_grass_places_models::GeoCoordinates;

/// Diagnostic key/value pairs attached to each pipeline stage.
///
/// Ordered so that identical inputs always serialize identically.
pub type DebugMap = BTreeMap<String, serde_json::Value>;

/// Classifier output taxonomy.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceCategory {
    /// National parks, nature reserves, conservation land.
    ProtectedArea,
    /// Parks, forests, trails, campgrounds.
    NaturalArea,
    /// Beaches, rivers, lakes, waterfronts.
    WaterFeature,
    /// Maintained outdoor facilities (golf courses, sports fields, gardens).
    ManagedOutdoor,
    /// Plazas, playgrounds, and other open urban spaces.
    UrbanOutdoor,
    /// Residential neighborhoods.
    Residential,
    /// Built-up streets and transit.
    Urban,
    /// Inside a building or indoor venue.
    Indoor,
    /// Not enough evidence to say.
    #[default]
    Unknown,
}

impl SpaceCategory {
    /// Categories that count as outdoors when no building is in the way.
    pub const OUTDOOR: &[Self] = &[
        Self::NaturalArea,
        Self::ProtectedArea,
        Self::ManagedOutdoor,
        Self::WaterFeature,
        Self::UrbanOutdoor,
    ];

    /// Returns `true` for outdoor categories.
    #[must_use]
    pub fn is_outdoor(self) -> bool {
        Self::OUTDOOR.contains(&self)
    }

    /// Returns `true` for the two vegetated categories.
    #[must_use]
    pub const fn is_natural(self) -> bool {
        matches!(self, Self::NaturalArea | Self::ProtectedArea)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ProtectedArea,
            Self::NaturalArea,
            Self::WaterFeature,
            Self::ManagedOutdoor,
            Self::UrbanOutdoor,
            Self::Residential,
            Self::Urban,
            Self::Indoor,
            Self::Unknown,
        ]
    }
}

/// Axis-aligned lat/lng rectangle approximating a place's extent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boundary {
    /// Northeast corner (maximum latitude and longitude).
    pub northeast: GeoCoordinates,
    /// Southwest corner (minimum latitude and longitude).
    pub southwest: GeoCoordinates,
    /// Synthesized around a bare point because no viewport was available.
    pub is_fallback: bool,
    /// Taken from a viewport reported by the places backend.
    pub is_true_boundary: bool,
}

impl Boundary {
    /// A boundary taken from a backend viewport.
    #[must_use]
    pub const fn from_viewport(northeast: GeoCoordinates, southwest: GeoCoordinates) -> Self {
        Self {
            northeast,
            southwest,
            is_fallback: false,
            is_true_boundary: true,
        }
    }

    /// A boundary synthesized around a point.
    #[must_use]
    pub const fn fallback(northeast: GeoCoordinates, southwest: GeoCoordinates) -> Self {
        Self {
            northeast,
            southwest,
            is_fallback: true,
            is_true_boundary: false,
        }
    }
}

/// A place whose boundary contains the query coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainingPlace {
    /// Backend place identifier.
    pub place_id: String,
    /// Display name, if known.
    pub name: Option<String>,
    /// Type tags of the place.
    pub types: BTreeSet<String>,
    /// The containing boundary.
    pub boundary: Boundary,
    /// Edge distance of the query coordinate, in degrees (non-negative).
    pub distance_to_edge: f64,
}

/// Aggregated snapshot of the signals around one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceContext {
    /// The query coordinate.
    pub coordinates: GeoCoordinates,
    /// Union of the types of every observed place.
    pub place_types: BTreeSet<String>,
    /// Name of the most deeply containing place.
    pub place_name: Option<String>,
    /// Names of observed places that are not building candidates, sorted
    /// and deduplicated.
    pub place_names: Vec<String>,
    /// Boundary of every observed place that has one, in fan-in order,
    /// after refinement.
    pub boundaries: Vec<Boundary>,
    /// Places whose boundary contains the coordinate, most deeply
    /// contained first.
    pub containing_places: Vec<ContainingPlace>,
    /// Whether any boundary contains the coordinate.
    pub in_boundary: bool,
    /// Whether the coordinate is judged to be in or at a building.
    pub is_building: bool,
    /// Whether residential signals are present.
    pub is_residential_area: bool,
    /// Great-circle distance to the closest building candidate.
    pub nearest_building_distance_meters: Option<f64>,
    /// Edge distance inside the primary containing boundary, in degrees.
    pub distance_to_edge: Option<f64>,
    /// Aggregation diagnostics.
    pub debug: DebugMap,
}

impl PlaceContext {
    /// A context with no signals at all.
    #[must_use]
    pub const fn empty(coordinates: GeoCoordinates) -> Self {
        Self {
            coordinates,
            place_types: BTreeSet::new(),
            place_name: None,
            place_names: Vec::new(),
            boundaries: Vec::new(),
            containing_places: Vec::new(),
            in_boundary: false,
            is_building: false,
            is_residential_area: false,
            nearest_building_distance_meters: None,
            distance_to_edge: None,
            debug: BTreeMap::new(),
        }
    }

    /// An empty context carrying an error marker in its debug map.
    #[must_use]
    pub fn degraded(coordinates: GeoCoordinates, message: impl Into<String>) -> Self {
        let mut context = Self::empty(coordinates);
        context
            .debug
            .insert("error".to_string(), serde_json::Value::Bool(true));
        context.debug.insert(
            "errorMessage".to_string(),
            serde_json::Value::String(message.into()),
        );
        context
    }

    /// Returns `true` if any observed place carries `place_type`.
    #[must_use]
    pub fn has_type(&self, place_type: &str) -> bool {
        self.place_types.contains(place_type)
    }

    /// Returns `true` if any observed place carries one of `place_types`.
    #[must_use]
    pub fn has_any_type(&self, place_types: &[&str]) -> bool {
        place_types.iter().any(|t| self.place_types.contains(*t))
    }

    /// Returns `true` if a containing place carries one of `place_types`.
    #[must_use]
    pub fn containing_has_any_type(&self, place_types: &[&str]) -> bool {
        self.containing_places
            .iter()
            .any(|p| place_types.iter().any(|t| p.types.contains(*t)))
    }

    /// Names of the containing places.
    pub fn containing_names(&self) -> impl Iterator<Item = &str> {
        self.containing_places
            .iter()
            .filter_map(|p| p.name.as_deref())
    }
}

/// Output of the rule-table classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Category of the first matching rule.
    pub space_category: SpaceCategory,
    /// Outdoor category and no building in the way.
    pub is_likely_outdoors: bool,
    /// Starting confidence from the winning rule (0-100).
    pub base_confidence: u8,
    /// Reason of the winning rule.
    pub reasons: Vec<String>,
    /// Rule-matching diagnostics.
    pub debug: DebugMap,
}

/// One confidence adjustment that applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAdjustment {
    /// Adjustment rule name.
    pub name: String,
    /// Human-readable reason.
    pub reason: String,
    /// Signed change to the confidence.
    pub delta: i32,
}

/// Output of the confidence calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResult {
    /// Final confidence, clamped to 0-100.
    pub confidence: u8,
    /// Adjustments that applied, in table order.
    pub adjustments: Vec<AppliedAdjustment>,
    /// Classification reasons followed by adjustment reasons.
    pub reasons: Vec<String>,
    /// `confidence >= thresholds.outdoors`, or forced by manual override.
    pub is_outdoors: bool,
}

/// User-facing justification phrases.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanations {
    /// Phrases supporting an outdoor verdict.
    pub positive: Vec<String>,
    /// Caveats and phrases against an outdoor verdict.
    pub negative: Vec<String>,
}

/// Decision thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Thresholds {
    /// Minimum confidence for an outdoor verdict.
    pub outdoors: u8,
    /// A building closer than this (meters) costs confidence even when the
    /// location is not flagged as a building.
    pub building_proximity_meters: f64,
    /// Confidence at which a natural classification is "almost there".
    pub natural_area: u8,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            outdoors: 70,
            building_proximity_meters: 30.0,
            natural_area: 50,
        }
    }
}

/// How the aggregator queries the places backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    /// Search radius around the coordinate.
    pub radius_meters: u32,
    /// A building candidate closer than half of this marks the location as
    /// a building.
    pub building_proximity_meters: f64,
    /// Also run free-text keyword searches.
    pub keyword_search: bool,
    /// Fetch details for fallback boundaries of nearby natural places.
    pub refine_boundaries: bool,
    /// Upper bound on in-flight backend queries.
    pub max_concurrent_queries: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            radius_meters: 250,
            building_proximity_meters: 50.0,
            keyword_search: true,
            refine_boundaries: true,
            max_concurrent_queries: 8,
        }
    }
}

/// Caller options for one detection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionOptions {
    /// Force a positive verdict without querying anything.
    pub is_manual_override: bool,
    /// Decision thresholds.
    pub thresholds: Thresholds,
    /// Aggregator settings.
    pub search: SearchOptions,
}

/// The only value returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutdoorDetectionResult {
    /// Final verdict.
    pub is_outdoors: bool,
    /// Final confidence (0-100).
    pub confidence: u8,
    /// Machine-oriented reasons.
    pub reasons: Vec<String>,
    /// User-facing phrases.
    pub explanations: Explanations,
    /// Primary space category.
    pub space_category: SpaceCategory,
    /// Merged diagnostics of every stage.
    pub debug_info: DebugMap,
}
