//! Google Places web service client.
//!
//! Implements [`PlacesQuery`] against the legacy JSON endpoints:
//!
//! - Nearby search: `GET {base}/nearbysearch/json?location=..&radius=..&type=..`
//! - Keyword search: same endpoint with `keyword=..` instead of `type=..`
//! - Details: `GET {base}/details/json?place_id=..&fields=..`
//!
//! Only the first result page (up to 20 places) is read; the detection
//! engine cares about the closest signals, which Google ranks first.
//!
//! See <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use async_trait::async_trait;

use crate::service_registry::{self, PlacesService};
use crate::{GeoCoordinates, Place, PlaceGeometry, PlacesError, PlacesQuery, Viewport, retry};

/// Fields requested from the details endpoint.
const DETAIL_FIELDS: &str = "place_id,name,types,geometry,vicinity";

/// Client for the Google Places web service.
#[derive(Debug, Clone)]
pub struct GooglePlacesClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    max_retries: u32,
}

impl GooglePlacesClient {
    /// Creates a client for `base_url` with the given per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Config`] if the API key is empty, or
    /// [`PlacesError::Http`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: std::time::Duration,
        max_retries: u32,
    ) -> Result<Self, PlacesError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(PlacesError::Config {
                message: "Google Places API key is empty".to_string(),
            });
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            max_retries,
        })
    }

    /// Creates a client from a registry entry, reading the API key from the
    /// environment variable the entry names.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Config`] if the environment variable is unset
    /// or empty.
    pub fn from_service(service: &PlacesService) -> Result<Self, PlacesError> {
        let endpoint = &service.endpoint;
        let api_key = std::env::var(&endpoint.api_key_env).map_err(|_| PlacesError::Config {
            message: format!("{} environment variable not set", endpoint.api_key_env),
        })?;

        log::debug!(
            "Using places backend '{}' at {}",
            service.id,
            endpoint.base_url
        );

        Self::new(
            endpoint.base_url.clone(),
            api_key,
            service.limits.timeout(),
            service.limits.max_retries,
        )
    }

    /// Creates a client for the highest-priority enabled backend.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Config`] if no backend is enabled or its API
    /// key is missing.
    pub fn from_env() -> Result<Self, PlacesError> {
        let service = service_registry::default_service().ok_or_else(|| PlacesError::Config {
            message: "No places backend is enabled".to_string(),
        })?;
        Self::from_service(service)
    }

    async fn search(
        &self,
        coordinates: GeoCoordinates,
        radius_meters: u32,
        filter: (&str, &str),
    ) -> Result<Vec<Place>, PlacesError> {
        let url = format!("{}/nearbysearch/json", self.base_url);
        let location = format!("{},{}", coordinates.lat, coordinates.lng);
        let radius = radius_meters.to_string();

        let body = retry::send_json(
            || {
                self.client.get(&url).query(&[
                    ("location", location.as_str()),
                    ("radius", radius.as_str()),
                    filter,
                    ("key", self.api_key.as_str()),
                ])
            },
            self.max_retries,
        )
        .await?;

        parse_search_response(&body)
    }
}

#[async_trait]
impl PlacesQuery for GooglePlacesClient {
    async fn search_nearby(
        &self,
        coordinates: GeoCoordinates,
        radius_meters: u32,
        place_type: &str,
    ) -> Result<Vec<Place>, PlacesError> {
        self.search(coordinates, radius_meters, ("type", place_type))
            .await
    }

    async fn search_by_keyword(
        &self,
        coordinates: GeoCoordinates,
        radius_meters: u32,
        keyword: &str,
    ) -> Result<Vec<Place>, PlacesError> {
        self.search(coordinates, radius_meters, ("keyword", keyword))
            .await
    }

    async fn get_details(&self, place_id: &str) -> Result<Option<Place>, PlacesError> {
        let url = format!("{}/details/json", self.base_url);

        let body = retry::send_json(
            || {
                self.client.get(&url).query(&[
                    ("place_id", place_id),
                    ("fields", DETAIL_FIELDS),
                    ("key", self.api_key.as_str()),
                ])
            },
            self.max_retries,
        )
        .await?;

        parse_details_response(&body)
    }
}

/// Outcome of the `status` field present on every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponseStatus {
    Ok,
    Empty,
}

fn check_status(body: &serde_json::Value) -> Result<ResponseStatus, PlacesError> {
    let status = body["status"].as_str().ok_or_else(|| PlacesError::Parse {
        message: "Places response has no status".to_string(),
    })?;
    let message = body["error_message"]
        .as_str()
        .unwrap_or(status)
        .to_string();

    match status {
        "OK" => Ok(ResponseStatus::Ok),
        "ZERO_RESULTS" | "NOT_FOUND" => Ok(ResponseStatus::Empty),
        "OVER_QUERY_LIMIT" => Err(PlacesError::RateLimited),
        "REQUEST_DENIED" | "INVALID_REQUEST" => Err(PlacesError::RequestDenied { message }),
        _ => Err(PlacesError::Unavailable { message }),
    }
}

/// Parses a nearby/keyword search response.
fn parse_search_response(body: &serde_json::Value) -> Result<Vec<Place>, PlacesError> {
    if check_status(body)? == ResponseStatus::Empty {
        return Ok(Vec::new());
    }

    let results = body["results"]
        .as_array()
        .ok_or_else(|| PlacesError::Parse {
            message: "Places search response has no results array".to_string(),
        })?;

    Ok(results.iter().filter_map(parse_place).collect())
}

/// Parses a details response.
fn parse_details_response(body: &serde_json::Value) -> Result<Option<Place>, PlacesError> {
    if check_status(body)? == ResponseStatus::Empty {
        return Ok(None);
    }

    Ok(parse_place(&body["result"]))
}

/// Converts one result object into a [`Place`]. Results without a
/// `place_id` are dropped since they cannot be deduplicated.
fn parse_place(value: &serde_json::Value) -> Option<Place> {
    let id = value["place_id"].as_str()?;

    let mut place = Place::new(id);
    place.name = value["name"].as_str().map(String::from);
    place.vicinity = value["vicinity"].as_str().map(String::from);

    if let Some(types) = value["types"].as_array() {
        place.types = types
            .iter()
            .filter_map(serde_json::Value::as_str)
            .map(String::from)
            .collect();
    }

    let geometry = &value["geometry"];
    if geometry.is_object() {
        let location = parse_coordinates(&geometry["location"]);
        let viewport = match (
            parse_coordinates(&geometry["viewport"]["northeast"]),
            parse_coordinates(&geometry["viewport"]["southwest"]),
        ) {
            (Some(northeast), Some(southwest)) => Some(Viewport {
                northeast,
                southwest,
            }),
            _ => None,
        };
        place.geometry = Some(PlaceGeometry { location, viewport });
    }

    Some(place)
}

fn parse_coordinates(value: &serde_json::Value) -> Option<GeoCoordinates> {
    let lat = value["lat"].as_f64()?;
    let lng = value["lng"].as_f64()?;
    Some(GeoCoordinates { lat, lng })
}
