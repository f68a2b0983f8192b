//! In-memory places backend and log capture for tests.
//!
//! Behaves like a tiny places directory: nearby search returns the seeded
//! places carrying the requested type within the radius, keyword search
//! matches names case-insensitively, and details look places up by id.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use touch_grass_places::{PlacesError, PlacesQuery};
use touch_grass_places_models::{GeoCoordinates, Place};

use crate::boundary::haversine_distance_meters;

/// How the stub answers queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    /// Every call fails with [`PlacesError::Unavailable`].
    Unavailable,
    /// Every call fails with [`PlacesError::Timeout`].
    Timeout,
}

#[derive(Default)]
pub struct StubPlaces {
    places: Vec<Place>,
    details: BTreeMap<String, Place>,
    failure: Option<Failure>,
    timeout_types: Vec<String>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    detail_calls: Mutex<Vec<String>>,
}

impl StubPlaces {
    pub fn new(places: Vec<Place>) -> Self {
        Self {
            places,
            ..Self::default()
        }
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Details lookups for `place.id` return `place`.
    pub fn with_details(mut self, place: Place) -> Self {
        self.details.insert(place.id.clone(), place);
        self
    }

    /// Nearby searches for `place_type` time out.
    pub fn timing_out_on(mut self, place_type: &str) -> Self {
        self.timeout_types.push(place_type.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Most searches that were ever pending at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Holds a search open across one scheduler turn so that overlapping
    /// searches are observable.
    async fn hold_open(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn detail_calls(&self) -> Vec<String> {
        self.detail_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn check_failure(&self) -> Result<(), PlacesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Some(Failure::Unavailable) => Err(PlacesError::Unavailable {
                message: "connection refused".to_string(),
            }),
            Some(Failure::Timeout) => Err(PlacesError::Timeout),
            None => Ok(()),
        }
    }

    fn within(&self, coordinates: GeoCoordinates, radius_meters: u32) -> impl Iterator<Item = &Place> {
        self.places.iter().filter(move |place| {
            place.location().is_some_and(|location| {
                haversine_distance_meters(coordinates, location) <= f64::from(radius_meters)
            })
        })
    }
}

#[async_trait]
impl PlacesQuery for StubPlaces {
    async fn search_nearby(
        &self,
        coordinates: GeoCoordinates,
        radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<Place>, PlacesError> {
        self.hold_open().await;
        self.check_failure()?;
        if self.timeout_types.iter().any(|t| t == place_type) {
            return Err(PlacesError::Timeout);
        }
        Ok(self
            .within(coordinates, radius_meters)
            .filter(|place| place.has_type(place_type))
            .cloned()
            .collect())
    }

    async fn search_by_keyword(
        &self,
        coordinates: GeoCoordinates,
        radius_meters: u32,
        keyword: &str,
    ) -> Result<Vec<Place>, PlacesError> {
        self.hold_open().await;
        self.check_failure()?;
        let keyword = keyword.to_lowercase();
        Ok(self
            .within(coordinates, radius_meters)
            .filter(|place| {
                place
                    .name
                    .as_deref()
                    .is_some_and(|name| name.to_lowercase().contains(&keyword))
            })
            .cloned()
            .collect())
    }

    async fn get_details(&self, place_id: &str) -> Result<Option<Place>, PlacesError> {
        self.check_failure()?;
        if let Ok(mut calls) = self.detail_calls.lock() {
            calls.push(place_id.to_string());
        }
        Ok(self.details.get(place_id).cloned())
    }
}

/// Offsets `origin` by `north_m` / `east_m` meters.
pub fn offset(origin: GeoCoordinates, north_m: f64, east_m: f64) -> GeoCoordinates {
    let meters_per_degree_lat = 111_195.0;
    let meters_per_degree_lng = meters_per_degree_lat * origin.lat.to_radians().cos();
    GeoCoordinates::new(
        origin.lat + north_m / meters_per_degree_lat,
        origin.lng + east_m / meters_per_degree_lng,
    )
}

/// Logger that keeps every record it receives.
pub struct CapturingLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

impl CapturingLogger {
    pub fn new() -> Self {
        log::set_max_level(log::LevelFilter::Trace);
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<(log::Level, String)> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, level: log::Level, needle: &str) -> bool {
        self.records()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl log::Log for CapturingLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}
