//! Confidence scoring.
//!
//! Starts from the winning rule's base confidence and adds every applicable
//! adjustment. Adjustments are independent of each other, so their order
//! only affects the order they are reported in.

use touch_grass_outdoors_models::{
    AppliedAdjustment, ClassificationResult, ConfidenceResult, DetectionOptions, PlaceContext,
    SpaceCategory, Thresholds,
};

/// Nearest building further than this (meters) earns a bonus.
pub const NO_BUILDING_NEARBY_METERS: f64 = 100.0;

/// Edge distance above which the location is "well inside" its boundary.
///
/// Degree deltas, not meters.
pub const WELL_INSIDE_EDGE_DISTANCE: f64 = 30.0;

/// Edge distance below which the location is "near the edge".
///
/// Degree deltas, not meters.
pub const NEAR_EDGE_DISTANCE: f64 = 10.0;

/// Reason reported for a manual override.
pub const MANUAL_OVERRIDE_REASON: &str = "Manual override enabled";

/// One entry of the adjustment table.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceAdjustment {
    /// Stable adjustment name.
    pub name: &'static str,
    /// Whether the adjustment applies.
    pub predicate: fn(&PlaceContext, &ClassificationResult, &Thresholds) -> bool,
    /// Signed change to the confidence.
    pub delta: i32,
    /// Reason reported when the adjustment applies.
    pub reason: &'static str,
}

/// The adjustment table.
pub static ADJUSTMENTS: &[ConfidenceAdjustment] = &[
    ConfidenceAdjustment {
        name: "inside_building",
        predicate: |ctx, _, _| ctx.is_building,
        delta: -60,
        reason: "Location appears to be inside a building",
    },
    ConfidenceAdjustment {
        name: "building_nearby",
        predicate: |ctx, _, thresholds| {
            !ctx.is_building
                && ctx
                    .nearest_building_distance_meters
                    .is_some_and(|d| d < thresholds.building_proximity_meters)
        },
        delta: -30,
        reason: "A building is very close by",
    },
    ConfidenceAdjustment {
        name: "no_buildings_nearby",
        predicate: |ctx, _, _| {
            ctx.nearest_building_distance_meters
                .is_none_or(|d| d > NO_BUILDING_NEARBY_METERS)
        },
        delta: 15,
        reason: "No buildings nearby",
    },
    ConfidenceAdjustment {
        name: "well_inside_boundary",
        predicate: |ctx, _, _| {
            ctx.in_boundary
                && ctx
                    .distance_to_edge
                    .is_some_and(|d| d > WELL_INSIDE_EDGE_DISTANCE)
        },
        delta: 10,
        reason: "Well inside the area boundary",
    },
    ConfidenceAdjustment {
        name: "near_boundary_edge",
        predicate: |ctx, _, _| {
            ctx.in_boundary && ctx.distance_to_edge.is_some_and(|d| d < NEAR_EDGE_DISTANCE)
        },
        delta: -5,
        reason: "Near the edge of the area boundary",
    },
    ConfidenceAdjustment {
        name: "outside_boundaries",
        predicate: |ctx, _, _| !ctx.in_boundary,
        delta: -20,
        reason: "Not inside any known area boundary",
    },
    ConfidenceAdjustment {
        name: "protected_area_bonus",
        predicate: |_, classification, _| {
            classification.space_category == SpaceCategory::ProtectedArea
        },
        delta: 15,
        reason: "Protected natural area",
    },
    ConfidenceAdjustment {
        name: "natural_area_bonus",
        predicate: |_, classification, _| classification.space_category == SpaceCategory::NaturalArea,
        delta: 10,
        reason: "Natural area",
    },
    ConfidenceAdjustment {
        name: "water_feature_bonus",
        predicate: |_, classification, _| {
            classification.space_category == SpaceCategory::WaterFeature
        },
        delta: 10,
        reason: "Near water",
    },
    ConfidenceAdjustment {
        name: "managed_outdoor_bonus",
        predicate: |_, classification, _| {
            classification.space_category == SpaceCategory::ManagedOutdoor
        },
        delta: 5,
        reason: "Managed outdoor space",
    },
    ConfidenceAdjustment {
        name: "residential_area",
        predicate: |ctx, _, _| ctx.is_residential_area,
        delta: -25,
        reason: "Residential area",
    },
];

/// The result forced by a manual override.
#[must_use]
pub fn manual_override() -> ConfidenceResult {
    ConfidenceResult {
        confidence: 100,
        adjustments: Vec::new(),
        reasons: vec![MANUAL_OVERRIDE_REASON.to_string()],
        is_outdoors: true,
    }
}

fn clamp_confidence(total: i32) -> u8 {
    u8::try_from(total.clamp(0, 100)).unwrap_or(100)
}

/// Computes the final confidence and verdict.
#[must_use]
pub fn calculate_confidence(
    ctx: &PlaceContext,
    classification: &ClassificationResult,
    options: &DetectionOptions,
    logger: &dyn log::Log,
) -> ConfidenceResult {
    if options.is_manual_override {
        log::debug!(logger: logger, "Manual override, skipping confidence adjustments");
        return manual_override();
    }

    let thresholds = &options.thresholds;
    let adjustments: Vec<AppliedAdjustment> = ADJUSTMENTS
        .iter()
        .filter(|adjustment| (adjustment.predicate)(ctx, classification, thresholds))
        .map(|adjustment| AppliedAdjustment {
            name: adjustment.name.to_string(),
            reason: adjustment.reason.to_string(),
            delta: adjustment.delta,
        })
        .collect();

    let total = i32::from(classification.base_confidence)
        + adjustments.iter().map(|a| a.delta).sum::<i32>();
    let confidence = clamp_confidence(total);
    let is_outdoors = confidence >= thresholds.outdoors;

    log::debug!(
        logger: logger,
        "Confidence {confidence} (raw {total}, base {}, {} adjustments), outdoors={is_outdoors}",
        classification.base_confidence,
        adjustments.len()
    );

    let reasons = classification
        .reasons
        .iter()
        .cloned()
        .chain(adjustments.iter().map(|a| a.reason.clone()))
        .collect();

    ConfidenceResult {
        confidence,
        adjustments,
        reasons,
        is_outdoors,
    }
}
