//! Place context aggregation.
//!
//! Fans out nearby-type and keyword searches against the places backend,
//! merges and deduplicates the results, and derives the containment,
//! building, and residential signals the classifier works from.
//!
//! Soft query failures (timeouts, rate limits) only empty out the query
//! they hit. If no query succeeds and at least one failed hard, the
//! backend is considered down and aggregation returns
//! [`OutdoorsError::Places`].

use std::collections::{BTreeMap, BTreeSet};

use futures::stream::{self, StreamExt as _};
use serde_json::{Value, json};
use touch_grass_outdoors_models::{Boundary, ContainingPlace, PlaceContext, SearchOptions};
use touch_grass_places::{PlacesError, PlacesQuery};
use touch_grass_places_models::{GeoCoordinates, Place};

use crate::OutdoorsError;
use crate::boundary::{
    crossed_edge, distance_from_edge, extract_boundary_from_place, haversine_distance_meters,
    is_point_in_boundary,
};
use crate::signals::{
    BUILDING_NAME_RE, BUILDING_SEARCH_TYPES, BUILDING_TYPES, EXEMPTING_BOUNDARY_TYPES,
    NATURAL_SEARCH_TYPES, NATURAL_TYPES, OUTDOOR_EXEMPTION_NAME_RE, OUTDOOR_EXEMPTION_TYPES,
    RESIDENTIAL_NAME_RE, RESIDENTIAL_TYPES, SEARCH_KEYWORDS,
};

/// Upper bound on details lookups per call.
const MAX_REFINEMENTS: usize = 5;

/// One backend query in the fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Query {
    Nearby(&'static str),
    Keyword(&'static str),
}

impl Query {
    fn label(self) -> String {
        match self {
            Self::Nearby(place_type) => format!("type:{place_type}"),
            Self::Keyword(keyword) => format!("keyword:{keyword}"),
        }
    }

    async fn run(
        self,
        places: &dyn PlacesQuery,
        coordinates: GeoCoordinates,
        radius_meters: u32,
    ) -> Result<Vec<Place>, PlacesError> {
        match self {
            Self::Nearby(place_type) => {
                places
                    .search_nearby(coordinates, radius_meters, place_type)
                    .await
            }
            Self::Keyword(keyword) => {
                places
                    .search_by_keyword(coordinates, radius_meters, keyword)
                    .await
            }
        }
    }
}

fn planned_queries(options: &SearchOptions) -> Vec<Query> {
    let mut queries: Vec<Query> = NATURAL_SEARCH_TYPES
        .iter()
        .chain(BUILDING_SEARCH_TYPES)
        .copied()
        .map(Query::Nearby)
        .collect();

    if options.keyword_search {
        queries.extend(SEARCH_KEYWORDS.iter().copied().map(Query::Keyword));
    }

    queries
}

/// Merged, deduplicated results of the fan-out.
struct Fetched {
    places: Vec<Place>,
    issued: usize,
    degraded: Vec<String>,
    failed: Vec<String>,
}

async fn fetch_places(
    coordinates: GeoCoordinates,
    places: &dyn PlacesQuery,
    options: &SearchOptions,
    logger: &dyn log::Log,
) -> Result<Fetched, OutdoorsError> {
    let queries = planned_queries(options);
    let issued = queries.len();
    let radius = options.radius_meters;

    log::debug!(
        logger: logger,
        "Issuing {issued} places queries around {},{} (radius={radius}m)",
        coordinates.lat,
        coordinates.lng
    );

    let results: Vec<(Query, Result<Vec<Place>, PlacesError>)> =
        stream::iter(queries.into_iter().map(|query| async move {
            let result = query.run(places, coordinates, radius).await;
            (query, result)
        }))
        .buffered(options.max_concurrent_queries.max(1))
        .collect()
        .await;

    let mut seen = BTreeSet::new();
    let mut merged = Vec::new();
    let mut succeeded = 0_usize;
    let mut degraded = Vec::new();
    let mut failed = Vec::new();
    let mut first_hard_error = None;

    for (query, result) in results {
        match result {
            Ok(found) => {
                succeeded += 1;
                for place in found {
                    if seen.insert(place.id.clone()) {
                        merged.push(place);
                    }
                }
            }
            Err(e) if e.is_soft() => {
                log::debug!(logger: logger, "Places query {} degraded: {e}", query.label());
                degraded.push(query.label());
            }
            Err(e) => {
                log::warn!(logger: logger, "Places query {} failed: {e}", query.label());
                failed.push(query.label());
                first_hard_error.get_or_insert(e);
            }
        }
    }

    if succeeded == 0
        && let Some(e) = first_hard_error
    {
        return Err(OutdoorsError::Places(e));
    }

    Ok(Fetched {
        places: merged,
        issued,
        degraded,
        failed,
    })
}

/// Fetches details for natural places that only have a synthesized
/// boundary, returning the true viewports that came back.
async fn refine_boundaries(
    coordinates: GeoCoordinates,
    places: &dyn PlacesQuery,
    bounded: &[(&Place, Boundary)],
    options: &SearchOptions,
    logger: &dyn log::Log,
) -> BTreeMap<String, Boundary> {
    let mut candidates: Vec<(&Place, f64)> = bounded
        .iter()
        .filter(|(place, boundary)| boundary.is_fallback && place.has_any_type(NATURAL_TYPES))
        .filter_map(|(place, _)| {
            place
                .location()
                .map(|location| (*place, haversine_distance_meters(coordinates, location)))
        })
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    candidates.truncate(MAX_REFINEMENTS);

    let details: Vec<(String, Result<Option<Place>, PlacesError>)> =
        stream::iter(candidates.into_iter().map(|(place, _)| async move {
            (place.id.clone(), places.get_details(&place.id).await)
        }))
        .buffered(options.max_concurrent_queries.max(1))
        .collect()
        .await;

    let mut refined = BTreeMap::new();
    for (place_id, result) in details {
        match result {
            Ok(Some(detail)) => {
                if let Some(viewport) = detail.viewport() {
                    refined.insert(
                        place_id,
                        Boundary::from_viewport(viewport.northeast, viewport.southwest),
                    );
                }
            }
            Ok(None) => {
                log::debug!(logger: logger, "No details for place {place_id}");
            }
            Err(e) => {
                log::debug!(logger: logger, "Details lookup for {place_id} failed: {e}");
            }
        }
    }

    refined
}

fn is_building_candidate(place: &Place) -> bool {
    if place.has_any_type(BUILDING_TYPES) {
        return true;
    }
    !place.has_any_type(NATURAL_TYPES)
        && place
            .name
            .as_deref()
            .is_some_and(|name| BUILDING_NAME_RE.is_match(name))
}

fn is_outdoor_facility(place: &Place) -> bool {
    place.has_any_type(OUTDOOR_EXEMPTION_TYPES)
        || place
            .name
            .as_deref()
            .is_some_and(|name| OUTDOOR_EXEMPTION_NAME_RE.is_match(name))
}

fn is_residential(types: &BTreeSet<String>, name: Option<&str>) -> bool {
    RESIDENTIAL_TYPES.iter().any(|t| types.contains(*t))
        || name.is_some_and(|name| RESIDENTIAL_NAME_RE.is_match(name))
}

/// Why a nearby building does not make the location a building.
///
/// Either a park or natural boundary contains the coordinate, or an outdoor
/// facility (by type or name) is at least as close as the nearest building
/// candidate. The latter covers visitor centers and boathouses, which are
/// building candidates themselves.
fn exemption_reason(
    coordinates: GeoCoordinates,
    containing: &[ContainingPlace],
    places: &[Place],
    nearest_building_meters: Option<f64>,
) -> Option<&'static str> {
    let inside_natural = containing
        .iter()
        .any(|c| EXEMPTING_BOUNDARY_TYPES.iter().any(|t| c.types.contains(*t)));
    if inside_natural {
        return Some("inside park or natural boundary");
    }

    let building_meters = nearest_building_meters?;
    let facility_closer = places.iter().any(|place| {
        is_outdoor_facility(place)
            && place.location().is_some_and(|location| {
                haversine_distance_meters(coordinates, location) <= building_meters
            })
    });

    facility_closer.then_some("outdoor facility at least as close as nearest building")
}

/// Builds the [`PlaceContext`] for `coordinates`.
///
/// # Errors
///
/// Returns [`OutdoorsError::InvalidCoordinates`] for out-of-range input and
/// [`OutdoorsError::Places`] when the places backend is down.
#[allow(clippy::too_many_lines)]
pub async fn aggregate(
    coordinates: GeoCoordinates,
    places: &dyn PlacesQuery,
    options: &SearchOptions,
    logger: &dyn log::Log,
) -> Result<PlaceContext, OutdoorsError> {
    if !coordinates.is_valid() {
        return Err(OutdoorsError::InvalidCoordinates {
            lat: coordinates.lat,
            lng: coordinates.lng,
        });
    }

    let fetched = fetch_places(coordinates, places, options, logger).await?;
    let merged = &fetched.places;

    let mut bounded: Vec<(&Place, Boundary)> = merged
        .iter()
        .filter_map(|place| extract_boundary_from_place(place).map(|b| (place, b)))
        .collect();

    let refined = if options.refine_boundaries {
        refine_boundaries(coordinates, places, &bounded, options, logger).await
    } else {
        BTreeMap::new()
    };
    for (place, boundary) in &mut bounded {
        if let Some(better) = refined.get(&place.id) {
            *boundary = *better;
        }
    }

    let mut containing: Vec<ContainingPlace> = bounded
        .iter()
        .filter(|(_, boundary)| is_point_in_boundary(coordinates, boundary))
        .map(|(place, boundary)| ContainingPlace {
            place_id: place.id.clone(),
            name: place.name.clone(),
            types: place.types.clone(),
            boundary: *boundary,
            distance_to_edge: distance_from_edge(coordinates, boundary),
        })
        .collect();
    containing.sort_by(|a, b| b.distance_to_edge.total_cmp(&a.distance_to_edge));

    let nearby_natural: Vec<Value> = bounded
        .iter()
        .filter(|(place, _)| place.has_any_type(NATURAL_TYPES))
        .filter_map(|(place, boundary)| {
            crossed_edge(coordinates, boundary).map(|edge| {
                json!({
                    "placeId": place.id,
                    "crossedEdge": edge.as_str(),
                    "overshootDegrees": -distance_from_edge(coordinates, boundary),
                })
            })
        })
        .collect();

    let building_candidates: Vec<(&Place, f64)> = merged
        .iter()
        .filter(|place| is_building_candidate(place))
        .filter_map(|place| {
            place
                .location()
                .map(|location| (place, haversine_distance_meters(coordinates, location)))
        })
        .collect();
    let nearest_building = building_candidates
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .copied();
    let nearest_building_distance_meters = nearest_building.map(|(_, distance)| distance);

    let exemption = exemption_reason(
        coordinates,
        &containing,
        merged,
        nearest_building_distance_meters,
    );
    let is_building = exemption.is_none()
        && nearest_building_distance_meters
            .is_some_and(|distance| distance < options.building_proximity_meters / 2.0);

    let residential_radius = f64::from(options.radius_meters) / 2.0;
    let is_residential_area = containing
        .iter()
        .any(|c| is_residential(&c.types, c.name.as_deref()))
        || merged.iter().any(|place| {
            is_residential(&place.types, place.name.as_deref())
                && place.location().is_some_and(|location| {
                    haversine_distance_meters(coordinates, location) <= residential_radius
                })
        });

    let place_types: BTreeSet<String> = merged
        .iter()
        .flat_map(|place| place.types.iter().cloned())
        .collect();
    let place_names: Vec<String> = merged
        .iter()
        .filter(|place| !is_building_candidate(place))
        .filter_map(|place| place.name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let primary = containing.first();
    let place_name = primary.and_then(|p| p.name.clone());
    let distance_to_edge = primary.map(|p| p.distance_to_edge);

    let mut debug = BTreeMap::new();
    debug.insert("queriesIssued".to_string(), json!(fetched.issued));
    debug.insert("placesFound".to_string(), json!(merged.len()));
    debug.insert("degradedQueries".to_string(), json!(fetched.degraded));
    debug.insert("failedQueries".to_string(), json!(fetched.failed));
    debug.insert(
        "buildingCandidates".to_string(),
        json!(building_candidates.len()),
    );
    debug.insert(
        "nearestBuildingPlaceId".to_string(),
        json!(nearest_building.map(|(place, _)| place.id.as_str())),
    );
    debug.insert("exemptionReason".to_string(), json!(exemption));
    debug.insert(
        "primaryPlaceId".to_string(),
        json!(primary.map(|p| p.place_id.as_str())),
    );
    debug.insert(
        "refinedBoundaries".to_string(),
        json!(refined.keys().collect::<Vec<_>>()),
    );
    debug.insert(
        "nearbyNaturalBoundaries".to_string(),
        Value::Array(nearby_natural),
    );

    log::debug!(
        logger: logger,
        "Aggregated {} places: in_boundary={} is_building={is_building} \
         residential={is_residential_area} nearest_building={nearest_building_distance_meters:?}",
        merged.len(),
        !containing.is_empty(),
    );

    Ok(PlaceContext {
        coordinates,
        place_types,
        place_name,
        place_names,
        boundaries: bounded.iter().map(|(_, boundary)| *boundary).collect(),
        in_boundary: !containing.is_empty(),
        containing_places: containing,
        is_building,
        is_residential_area,
        nearest_building_distance_meters,
        distance_to_edge,
        debug,
    })
}

/// Like [`aggregate`], but never fails: errors produce
/// [`PlaceContext::degraded`], which downstream stages classify as
/// insufficient evidence.
pub async fn aggregate_or_degraded(
    coordinates: GeoCoordinates,
    places: &dyn PlacesQuery,
    options: &SearchOptions,
    logger: &dyn log::Log,
) -> PlaceContext {
    match aggregate(coordinates, places, options, logger).await {
        Ok(context) => context,
        Err(e) => {
            log::warn!(logger: logger, "Place aggregation failed, using empty context: {e}");
            PlaceContext::degraded(coordinates, e.to_string())
        }
    }
}
