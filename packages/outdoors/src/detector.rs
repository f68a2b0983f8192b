//! Detection entry points.
//!
//! Runs aggregation, classification, confidence scoring, and explanation
//! generation in sequence. Callers always get a result back: failures and
//! panics anywhere in the pipeline become a conservative negative verdict.

use std::panic::AssertUnwindSafe;

use futures::FutureExt as _;
use serde_json::{Value, json};
use touch_grass_outdoors_models::{
    DebugMap, DetectionOptions, GeoCoordinates, OutdoorDetectionResult, SpaceCategory,
};
use touch_grass_places::PlacesQuery;

use crate::aggregator::aggregate;
use crate::classifier::classify;
use crate::confidence::{self, calculate_confidence};
use crate::explanations::{self, generate_explanations};
use crate::{OutdoorsError, panic_message};

/// Confidence reported when detection fails.
pub const FAILURE_CONFIDENCE: u8 = 20;

/// First reason reported when detection fails.
pub const FAILURE_REASON: &str = "Detection failed";

fn manual_override_result() -> OutdoorDetectionResult {
    let confidence = confidence::manual_override();
    let mut debug_info = DebugMap::new();
    debug_info.insert("manualOverride".to_string(), Value::Bool(true));

    OutdoorDetectionResult {
        is_outdoors: confidence.is_outdoors,
        confidence: confidence.confidence,
        reasons: confidence.reasons,
        explanations: explanations::manual_override(),
        space_category: SpaceCategory::Unknown,
        debug_info,
    }
}

fn failure_result(message: String) -> OutdoorDetectionResult {
    let mut debug_info = DebugMap::new();
    debug_info.insert("error".to_string(), Value::Bool(true));
    debug_info.insert("errorMessage".to_string(), Value::String(message.clone()));

    OutdoorDetectionResult {
        is_outdoors: false,
        confidence: FAILURE_CONFIDENCE,
        reasons: vec![FAILURE_REASON.to_string(), message],
        explanations: explanations::failure(),
        space_category: SpaceCategory::Unknown,
        debug_info,
    }
}

fn merge_debug(target: &mut DebugMap, namespace: &str, source: &DebugMap) {
    for (key, value) in source {
        target.insert(format!("{namespace}.{key}"), value.clone());
    }
}

async fn run_pipeline(
    coordinates: GeoCoordinates,
    places: &dyn PlacesQuery,
    options: &DetectionOptions,
    logger: &dyn log::Log,
) -> Result<OutdoorDetectionResult, OutdoorsError> {
    let context = aggregate(coordinates, places, &options.search, logger).await?;
    let classification = classify(&context, logger);
    let confidence = calculate_confidence(&context, &classification, options, logger);
    let explanations =
        generate_explanations(&context, &classification, &confidence, &options.thresholds);

    let mut debug_info = DebugMap::new();
    merge_debug(&mut debug_info, "context", &context.debug);
    debug_info.insert("context.inBoundary".to_string(), json!(context.in_boundary));
    debug_info.insert("context.isBuilding".to_string(), json!(context.is_building));
    debug_info.insert(
        "context.isResidentialArea".to_string(),
        json!(context.is_residential_area),
    );
    debug_info.insert(
        "context.nearestBuildingDistanceMeters".to_string(),
        json!(context.nearest_building_distance_meters),
    );
    debug_info.insert(
        "context.distanceToEdge".to_string(),
        json!(context.distance_to_edge),
    );
    debug_info.insert("context.placeName".to_string(), json!(context.place_name));
    debug_info.insert("context.placeTypes".to_string(), json!(context.place_types));

    merge_debug(&mut debug_info, "classification", &classification.debug);
    debug_info.insert(
        "classification.baseConfidence".to_string(),
        json!(classification.base_confidence),
    );
    debug_info.insert(
        "classification.isLikelyOutdoors".to_string(),
        json!(classification.is_likely_outdoors),
    );

    debug_info.insert(
        "confidence.adjustments".to_string(),
        json!(confidence.adjustments),
    );

    Ok(OutdoorDetectionResult {
        is_outdoors: confidence.is_outdoors,
        confidence: confidence.confidence,
        reasons: confidence.reasons,
        explanations,
        space_category: classification.space_category,
        debug_info,
    })
}

/// Decides whether `coordinates` is outdoors in a natural place, logging
/// through the global logger.
pub async fn detect_outdoor_location(
    coordinates: GeoCoordinates,
    places: &dyn PlacesQuery,
    options: &DetectionOptions,
) -> OutdoorDetectionResult {
    detect_outdoor_location_with_logger(coordinates, places, options, log::logger()).await
}

/// Decides whether `coordinates` is outdoors in a natural place.
///
/// A manual override short-circuits before any places query. Any error or
/// panic in the pipeline produces the failure result
/// (`isOutdoors = false`, confidence [`FAILURE_CONFIDENCE`]).
pub async fn detect_outdoor_location_with_logger(
    coordinates: GeoCoordinates,
    places: &dyn PlacesQuery,
    options: &DetectionOptions,
    logger: &dyn log::Log,
) -> OutdoorDetectionResult {
    if options.is_manual_override {
        log::info!(logger: logger, "Manual override enabled, skipping detection");
        return manual_override_result();
    }

    let outcome = AssertUnwindSafe(run_pipeline(coordinates, places, options, logger))
        .catch_unwind()
        .await;

    let error = match outcome {
        Ok(Ok(result)) => {
            log::info!(
                logger: logger,
                "Detection at {},{}: outdoors={} confidence={} category={}",
                coordinates.lat,
                coordinates.lng,
                result.is_outdoors,
                result.confidence,
                result.space_category
            );
            return result;
        }
        Ok(Err(e)) => e,
        Err(payload) => OutdoorsError::Panicked {
            message: panic_message(&*payload),
        },
    };

    log::error!(
        logger: logger,
        "Detection at {},{} failed: {error}",
        coordinates.lat,
        coordinates.lng
    );
    failure_result(error.to_string())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use touch_grass_places::PlacesError;
    use touch_grass_places_models::Place;

    use super::*;
    use crate::testing::{CapturingLogger, Failure, StubPlaces, offset};

    const HERE: GeoCoordinates = GeoCoordinates::new(45.5152, -122.6784);

    struct PanickingPlaces;

    #[async_trait]
    impl PlacesQuery for PanickingPlaces {
        async fn search_nearby(
            &self,
            _coordinates: GeoCoordinates,
            _radius_meters: u32,
            _place_type: &str,
        ) -> Result<Vec<Place>, PlacesError> {
            panic!("backend exploded");
        }

        async fn search_by_keyword(
            &self,
            _coordinates: GeoCoordinates,
            _radius_meters: u32,
            _keyword: &str,
        ) -> Result<Vec<Place>, PlacesError> {
            Ok(Vec::new())
        }

        async fn get_details(&self, _place_id: &str) -> Result<Option<Place>, PlacesError> {
            Ok(None)
        }
    }

    fn park() -> Place {
        Place::new("park")
            .with_name("Lownsdale Square")
            .with_types(["park", "point_of_interest"])
            .with_location(HERE)
    }

    async fn detect(places: &dyn PlacesQuery) -> OutdoorDetectionResult {
        detect_outdoor_location(HERE, places, &DetectionOptions::default()).await
    }

    fn adjustment_names(result: &OutdoorDetectionResult) -> Vec<String> {
        result.debug_info["confidence.adjustments"]
            .as_array()
            .map(|adjustments| {
                adjustments
                    .iter()
                    .filter_map(|a| a["name"].as_str().map(ToString::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn inside_park_far_from_buildings() {
        let stub = StubPlaces::new(vec![park()]);
        let result = detect(&stub).await;

        assert!(result.is_outdoors);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.space_category, SpaceCategory::NaturalArea);
        assert_eq!(
            result.explanations.positive[0],
            "You're in Lownsdale Square, a natural area."
        );
        assert_eq!(result.reasons[0], "Inside park boundaries");
        assert_eq!(result.debug_info["classification.primaryRule"], "park_boundary");
        assert_eq!(result.debug_info["context.primaryPlaceId"], "park");
        assert_eq!(result.debug_info["context.inBoundary"], true);
    }

    #[tokio::test]
    async fn ten_meters_from_a_mall() {
        let mall = Place::new("mall")
            .with_name("Pioneer Place")
            .with_types(["shopping_mall"])
            .with_location(offset(HERE, 10.0, 0.0));
        let stub = StubPlaces::new(vec![mall]);
        let result = detect(&stub).await;

        assert!(!result.is_outdoors);
        assert_eq!(result.confidence, 0);
        assert_eq!(result.space_category, SpaceCategory::Indoor);
        assert!(adjustment_names(&result).contains(&"inside_building".to_string()));
        assert_eq!(
            result.explanations.negative[0],
            "You appear to be inside or right next to a building."
        );
    }

    #[tokio::test]
    async fn manual_override_skips_the_backend() {
        let stub = StubPlaces::failing(Failure::Unavailable);
        let options = DetectionOptions {
            is_manual_override: true,
            ..DetectionOptions::default()
        };
        let result = detect_outdoor_location(HERE, &stub, &options).await;

        assert_eq!(stub.calls(), 0);
        assert!(result.is_outdoors);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.space_category, SpaceCategory::Unknown);
        assert_eq!(result.reasons, vec!["Manual override enabled".to_string()]);
        assert_eq!(
            result.explanations.positive,
            vec!["Manual override enabled; outdoor status confirmed by you.".to_string()]
        );
        assert_eq!(result.debug_info["manualOverride"], true);
    }

    #[tokio::test]
    async fn backend_failure_falls_back() {
        let stub = StubPlaces::failing(Failure::Unavailable);
        let result = detect(&stub).await;

        assert!(!result.is_outdoors);
        assert_eq!(result.confidence, FAILURE_CONFIDENCE);
        assert_eq!(result.space_category, SpaceCategory::Unknown);
        assert_eq!(result.reasons[0], FAILURE_REASON);
        assert!(result.reasons[1].contains("connection refused"));
        assert_eq!(
            result.explanations.negative,
            vec!["We couldn't determine if you're outdoors.".to_string()]
        );
        assert_eq!(result.debug_info["error"], true);
        assert_eq!(result.debug_info["errorMessage"], json!(result.reasons[1]));
    }

    #[tokio::test]
    async fn panicking_backend_falls_back() {
        let logger = CapturingLogger::new();
        let result = detect_outdoor_location_with_logger(
            HERE,
            &PanickingPlaces,
            &DetectionOptions::default(),
            &logger,
        )
        .await;

        assert!(!result.is_outdoors);
        assert_eq!(result.confidence, FAILURE_CONFIDENCE);
        assert!(result.reasons[1].contains("backend exploded"));
        assert!(logger.contains(log::Level::Error, "backend exploded"));
    }

    #[tokio::test]
    async fn invalid_coordinates_fall_back() {
        let stub = StubPlaces::new(vec![]);
        let result = detect_outdoor_location(
            GeoCoordinates::new(f64::NAN, 0.0),
            &stub,
            &DetectionOptions::default(),
        )
        .await;

        assert!(!result.is_outdoors);
        assert_eq!(result.confidence, FAILURE_CONFIDENCE);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn nothing_nearby_is_unknown_and_negative() {
        let stub = StubPlaces::new(vec![]);
        let result = detect(&stub).await;

        assert!(!result.is_outdoors);
        assert_eq!(result.space_category, SpaceCategory::Unknown);
        assert_eq!(result.debug_info["classification.primaryRule"], Value::Null);
        assert!(result.debug_info.get("error").is_none());
    }

    #[tokio::test]
    async fn park_boundary_exempts_nearby_cafe() {
        let park = park().with_viewport(offset(HERE, 300.0, 300.0), offset(HERE, -300.0, -300.0));
        let cafe = Place::new("cafe")
            .with_name("Corner Coffee")
            .with_types(["cafe", "store"])
            .with_location(offset(HERE, 5.0, 5.0));
        let stub = StubPlaces::new(vec![park, cafe]);
        let result = detect(&stub).await;

        assert_eq!(result.debug_info["context.isBuilding"], false);
        assert_eq!(result.space_category, SpaceCategory::NaturalArea);
        assert!(!adjustment_names(&result).contains(&"inside_building".to_string()));
    }

    #[tokio::test]
    async fn water_named_restaurant_is_not_waterfront() {
        let grill = Place::new("grill")
            .with_name("River Grill")
            .with_types(["restaurant", "food", "establishment"])
            .with_location(offset(HERE, 150.0, 0.0));
        let stub = StubPlaces::new(vec![grill]);
        let result = detect(&stub).await;

        assert!(!result.is_outdoors);
        assert_ne!(result.space_category, SpaceCategory::WaterFeature);
        assert!(
            !result.debug_info["classification.allMatchingRules"]
                .as_array()
                .is_some_and(|rules| rules.iter().any(|rule| rule == "waterfront"))
        );
    }

    #[tokio::test]
    async fn repeated_calls_are_identical() {
        let stub = StubPlaces::new(vec![
            park(),
            Place::new("bank")
                .with_types(["bank"])
                .with_location(offset(HERE, 0.0, 60.0)),
        ]);

        let first = detect(&stub).await;
        let second = detect(&stub).await;
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn injected_logger_sees_the_pipeline() {
        let logger = CapturingLogger::new();
        let stub = StubPlaces::new(vec![park()]);
        detect_outdoor_location_with_logger(HERE, &stub, &DetectionOptions::default(), &logger)
            .await;

        assert!(logger.contains(log::Level::Debug, "Aggregated"));
        assert!(logger.contains(log::Level::Debug, "park_boundary"));
        assert!(logger.contains(log::Level::Info, "outdoors=true"));
    }
}
