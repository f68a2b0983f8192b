//! Place-type and name vocabularies.
//!
//! Type lists use the Google Places type tags. Name patterns catch places
//! whose tags are too generic (`point_of_interest`, `establishment`) but
//! whose names give them away, e.g. "Marsh Creek Nature Preserve".

use regex::Regex;
use std::sync::LazyLock;

/// Types queried with nearby search to find natural areas.
pub const NATURAL_SEARCH_TYPES: &[&str] = &[
    "park",
    "natural_feature",
    "forest",
    "trail",
    "hiking_area",
    "campground",
    "national_park",
    "golf_course",
    "beach",
    "zoo",
];

/// Types queried with nearby search to find buildings.
pub const BUILDING_SEARCH_TYPES: &[&str] = &[
    "store",
    "restaurant",
    "bank",
    "shopping_mall",
    "lodging",
    "residential",
    "apartment_complex",
];

/// Free-text keyword searches.
pub const SEARCH_KEYWORDS: &[&str] = &[
    "park",
    "forest",
    "nature",
    "preserve",
    "conservation",
    "waterfront",
    "river",
    "lake",
    "trail",
    "beach",
];

/// Types that make a place a building candidate.
pub const BUILDING_TYPES: &[&str] = &[
    "store",
    "restaurant",
    "bank",
    "shopping_mall",
    "supermarket",
    "department_store",
    "cafe",
    "bar",
    "lodging",
    "office",
    "school",
    "hospital",
    "library",
    "gym",
    "church",
    "movie_theater",
    "residential",
    "apartment_complex",
    "premise",
    "subpremise",
];

/// Types that mark a place as natural or vegetated.
pub const NATURAL_TYPES: &[&str] = &[
    "park",
    "natural_feature",
    "forest",
    "trail",
    "hiking_area",
    "campground",
    "rv_park",
    "national_park",
    "beach",
];

/// Containing boundaries of these types exempt a location from being
/// flagged as a building.
pub const EXEMPTING_BOUNDARY_TYPES: &[&str] = &[
    "park",
    "natural_feature",
    "forest",
    "hiking_area",
    "campground",
    "national_park",
];

/// A building candidate carrying one of these types is an outdoor
/// facility (visitor center, boathouse) rather than an enclosing building.
pub const OUTDOOR_EXEMPTION_TYPES: &[&str] = &[
    "park",
    "natural_feature",
    "campground",
    "rv_park",
    "golf_course",
    "beach",
    "zoo",
    "stadium",
    "hiking_area",
];

/// Types that indicate housing.
pub const RESIDENTIAL_TYPES: &[&str] = &[
    "residential",
    "apartment_complex",
    "housing_complex",
    "condominium_complex",
    "neighborhood",
];

/// Enclosed venues.
pub const INDOOR_VENUE_TYPES: &[&str] = &[
    "shopping_mall",
    "department_store",
    "supermarket",
    "movie_theater",
    "museum",
    "library",
    "hospital",
    "airport",
    "lodging",
];

/// Streets and transit infrastructure.
pub const URBAN_TYPES: &[&str] = &[
    "route",
    "street_address",
    "intersection",
    "transit_station",
    "bus_station",
    "train_station",
    "subway_station",
    "parking",
];

/// Residential, commercial, and office keywords in place names.
pub static BUILDING_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(apartments?|condos?|condominiums?|lofts?|residences?|townhomes?|tower|mall|office|offices|building|hotel|inn|suites|store|market|bank|restaurant|headquarters)\b",
    )
    .expect("valid regex")
});

/// Names of outdoor facilities that should not count as enclosing
/// buildings.
pub static OUTDOOR_EXEMPTION_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(park|forest|trail|trailhead|nature|preserve|reserve|beach|garden|gardens|woods|greenway|campground|visitor center|boathouse|pavilion)\b",
    )
    .expect("valid regex")
});

/// Housing keywords in place names.
pub static RESIDENTIAL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(apartments?|condos?|condominiums?|townhomes?|townhouses?|residences?|residential|housing|homes|estates|subdivision)\b",
    )
    .expect("valid regex")
});

/// National parks, forests, and monuments.
pub static NATIONAL_PARK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bnational\s+(park|forest|monument|seashore|recreation area|grassland)\b")
        .expect("valid regex")
});

/// Reserves, preserves, and other conservation land.
pub static PROTECTED_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(nature\s+reserve|nature\s+preserve|preserve|conservation\s+area|conservancy|wilderness|wildlife\s+(refuge|sanctuary|area)|bird\s+sanctuary|state\s+park|state\s+forest|land\s+trust)\b",
    )
    .expect("valid regex")
});

/// Forests and woodland.
pub static FOREST_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(forest|woods|woodland|woodlands|grove|arboretum)\b").expect("valid regex")
});

/// Trails and greenways.
pub static TRAIL_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(trail|trailhead|greenway|footpath|nature\s+path)\b").expect("valid regex")
});

/// Beaches.
pub static BEACH_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(beach|dunes?)\b").expect("valid regex"));

/// Rivers, lakes, and waterfronts.
pub static WATER_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(river|riverfront|riverside|lake|lakefront|lakeshore|creek|pond|bay|harbou?r|waterfront|marina|lagoon|falls|shore)\b",
    )
    .expect("valid regex")
});

/// Plazas and squares.
pub static PLAZA_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(plaza|square|promenade|boardwalk|pier|esplanade|commons)\b")
        .expect("valid regex")
});

/// Returns `true` if any of `names` matches `pattern`.
pub fn any_name_matches<'a>(mut names: impl Iterator<Item = &'a str>, pattern: &Regex) -> bool {
    names.any(|name| pattern.is_match(name))
}
