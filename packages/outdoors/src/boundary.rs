//! Rectangle containment and distance primitives.
//!
//! Boundaries are axis-aligned lat/lng rectangles. Containment is
//! edge-inclusive. Edge distances are raw degree deltas used only for
//! coarse "well inside" / "near the edge" bucketing; they are not metric
//! distances and must not be compared against meters.

use touch_grass_outdoors_models::Boundary;
use touch_grass_places_models::{GeoCoordinates, Place};

/// Half the side of a boundary synthesized around a bare point, in
/// degrees (about 55 m of latitude, so the square is roughly 110 m wide).
pub const FALLBACK_HALF_SIZE_DEGREES: f64 = 0.0005;

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// One side of a boundary rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// Maximum latitude.
    North,
    /// Minimum latitude.
    South,
    /// Maximum longitude.
    East,
    /// Minimum longitude.
    West,
}

impl Edge {
    /// Lowercase edge name for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        }
    }
}

/// Returns `true` if `point` lies inside `boundary` or on any of its edges.
#[must_use]
pub fn is_point_in_boundary(point: GeoCoordinates, boundary: &Boundary) -> bool {
    boundary.southwest.lat <= point.lat
        && point.lat <= boundary.northeast.lat
        && boundary.southwest.lng <= point.lng
        && point.lng <= boundary.northeast.lng
}

/// Signed gap from `point` to each edge, positive on the inside.
fn edge_gaps(point: GeoCoordinates, boundary: &Boundary) -> [(Edge, f64); 4] {
    [
        (Edge::North, boundary.northeast.lat - point.lat),
        (Edge::South, point.lat - boundary.southwest.lat),
        (Edge::East, boundary.northeast.lng - point.lng),
        (Edge::West, point.lng - boundary.southwest.lng),
    ]
}

fn smallest_gap(point: GeoCoordinates, boundary: &Boundary) -> (Edge, f64) {
    let gaps = edge_gaps(point, boundary);
    gaps.into_iter()
        .skip(1)
        .fold(gaps[0], |best, gap| if gap.1 < best.1 { gap } else { best })
}

/// Distance from `point` to the nearest edge of `boundary`, in degrees.
///
/// Non-negative when the point is contained. Negative when it is outside,
/// with the magnitude of the largest overshoot past an edge (see
/// [`crossed_edge`] for which one).
#[must_use]
pub fn distance_from_edge(point: GeoCoordinates, boundary: &Boundary) -> f64 {
    smallest_gap(point, boundary).1
}

/// The edge `point` lies furthest beyond, or `None` if it is contained.
#[must_use]
pub fn crossed_edge(point: GeoCoordinates, boundary: &Boundary) -> Option<Edge> {
    let (edge, gap) = smallest_gap(point, boundary);
    (gap < 0.0).then_some(edge)
}

/// Builds a boundary for `place`.
///
/// Prefers the backend viewport. Falls back to a square of
/// [`FALLBACK_HALF_SIZE_DEGREES`] around the place's location. Returns
/// `None` when the place has no geometry at all.
#[must_use]
pub fn extract_boundary_from_place(place: &Place) -> Option<Boundary> {
    if let Some(viewport) = place.viewport() {
        return Some(Boundary::from_viewport(viewport.northeast, viewport.southwest));
    }

    let location = place.location()?;
    Some(Boundary::fallback(
        GeoCoordinates::new(
            location.lat + FALLBACK_HALF_SIZE_DEGREES,
            location.lng + FALLBACK_HALF_SIZE_DEGREES,
        ),
        GeoCoordinates::new(
            location.lat - FALLBACK_HALF_SIZE_DEGREES,
            location.lng - FALLBACK_HALF_SIZE_DEGREES,
        ),
    ))
}

/// Great-circle distance between two coordinates in meters.
#[must_use]
pub fn haversine_distance_meters(a: GeoCoordinates, b: GeoCoordinates) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Boundary {
        Boundary::from_viewport(GeoCoordinates::new(1.0, 1.0), GeoCoordinates::new(0.0, 0.0))
    }

    #[test]
    fn contains_interior_point() {
        assert!(is_point_in_boundary(GeoCoordinates::new(0.5, 0.5), &unit_box()));
    }

    #[test]
    fn containment_is_edge_inclusive() {
        let b = unit_box();
        for point in [
            GeoCoordinates::new(1.0, 0.5),
            GeoCoordinates::new(0.0, 0.5),
            GeoCoordinates::new(0.5, 1.0),
            GeoCoordinates::new(0.5, 0.0),
            GeoCoordinates::new(0.0, 0.0),
            GeoCoordinates::new(1.0, 1.0),
        ] {
            assert!(is_point_in_boundary(point, &b), "{point:?} should be inside");
        }
    }

    #[test]
    fn epsilon_outside_any_edge_is_excluded() {
        let b = unit_box();
        let eps = 1e-9;
        for point in [
            GeoCoordinates::new(1.0 + eps, 0.5),
            GeoCoordinates::new(-eps, 0.5),
            GeoCoordinates::new(0.5, 1.0 + eps),
            GeoCoordinates::new(0.5, -eps),
        ] {
            assert!(!is_point_in_boundary(point, &b), "{point:?} should be outside");
        }
    }

    #[test]
    fn distance_inside_is_smallest_gap() {
        let d = distance_from_edge(GeoCoordinates::new(0.2, 0.5), &unit_box());
        assert!((d - 0.2).abs() < 1e-12);

        let center = distance_from_edge(GeoCoordinates::new(0.5, 0.5), &unit_box());
        assert!((center - 0.5).abs() < 1e-12);
        assert!(crossed_edge(GeoCoordinates::new(0.5, 0.5), &unit_box()).is_none());
    }

    #[test]
    fn distance_on_edge_is_zero() {
        let d = distance_from_edge(GeoCoordinates::new(1.0, 0.5), &unit_box());
        assert!(d.abs() < 1e-12);
    }

    #[test]
    fn distance_outside_is_negative_and_names_edge() {
        let north = GeoCoordinates::new(1.3, 0.5);
        assert!((distance_from_edge(north, &unit_box()) - -0.3).abs() < 1e-12);
        assert_eq!(crossed_edge(north, &unit_box()), Some(Edge::North));

        let west = GeoCoordinates::new(0.5, -0.25);
        assert!(distance_from_edge(west, &unit_box()) < 0.0);
        assert_eq!(crossed_edge(west, &unit_box()), Some(Edge::West));

        // Beyond two edges: the larger overshoot wins.
        let corner = GeoCoordinates::new(1.1, 1.4);
        assert_eq!(crossed_edge(corner, &unit_box()), Some(Edge::East));
    }

    #[test]
    fn extracts_viewport_as_true_boundary() {
        let place = Place::new("p")
            .with_location(GeoCoordinates::new(0.5, 0.5))
            .with_viewport(GeoCoordinates::new(1.0, 1.0), GeoCoordinates::new(0.0, 0.0));
        let boundary = extract_boundary_from_place(&place).unwrap();
        assert!(boundary.is_true_boundary);
        assert!(!boundary.is_fallback);
        assert_eq!(boundary, unit_box());
    }

    #[test]
    fn synthesizes_fallback_around_location() {
        let center = GeoCoordinates::new(45.0, -122.0);
        let place = Place::new("p").with_location(center);
        let boundary = extract_boundary_from_place(&place).unwrap();

        assert!(boundary.is_fallback);
        assert!(!boundary.is_true_boundary);
        assert!(is_point_in_boundary(center, &boundary));

        let width = haversine_distance_meters(
            GeoCoordinates::new(center.lat, boundary.southwest.lng),
            GeoCoordinates::new(center.lat, boundary.northeast.lng),
        );
        let height = haversine_distance_meters(
            GeoCoordinates::new(boundary.southwest.lat, center.lng),
            GeoCoordinates::new(boundary.northeast.lat, center.lng),
        );
        assert!((100.0..120.0).contains(&height), "height {height}");
        // Longitude degrees shrink with latitude.
        assert!(width < height);
    }

    #[test]
    fn no_geometry_no_boundary() {
        assert!(extract_boundary_from_place(&Place::new("p")).is_none());
    }

    #[test]
    fn haversine_same_point_is_zero() {
        let p = GeoCoordinates::new(51.5074, -0.1278);
        assert!(haversine_distance_meters(p, p).abs() < f64::EPSILON);
    }

    #[test]
    fn haversine_known_value() {
        // London to Paris is approximately 344 km.
        let london = GeoCoordinates::new(51.5074, -0.1278);
        let paris = GeoCoordinates::new(48.8566, 2.3522);
        let d = haversine_distance_meters(london, paris);
        assert!((d - 343_560.0).abs() < 5_000.0, "distance {d}");
    }
}
