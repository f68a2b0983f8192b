//! User-facing verdict phrases.
//!
//! Explanations describe a verdict that has already been made; nothing in
//! here feeds back into the confidence.

use touch_grass_outdoors_models::{
    ClassificationResult, ConfidenceResult, Explanations, PlaceContext, SpaceCategory, Thresholds,
};

use crate::confidence::WELL_INSIDE_EDGE_DISTANCE;

/// Positive phrase for a manual override.
pub const MANUAL_OVERRIDE_EXPLANATION: &str =
    "Manual override enabled; outdoor status confirmed by you.";

/// Negative phrase when detection failed outright.
pub const FAILURE_EXPLANATION: &str = "We couldn't determine if you're outdoors.";

fn positive_phrase(category: SpaceCategory, name: Option<&str>) -> String {
    match (category, name) {
        (SpaceCategory::ProtectedArea, Some(name)) => {
            format!("You're inside {name}, a protected natural area.")
        }
        (SpaceCategory::ProtectedArea, None) => "You're in a protected natural area.".to_string(),
        (SpaceCategory::NaturalArea, Some(name)) => format!("You're in {name}, a natural area."),
        (SpaceCategory::NaturalArea, None) => "You're in a natural area.".to_string(),
        (SpaceCategory::WaterFeature, Some(name)) => format!("You're by the water at {name}."),
        (SpaceCategory::WaterFeature, None) => {
            "You're by the water, near a beach, river, or lake.".to_string()
        }
        (SpaceCategory::ManagedOutdoor, Some(name)) => {
            format!("You're at {name}, a managed outdoor space.")
        }
        (SpaceCategory::ManagedOutdoor, None) => {
            "You're at a managed outdoor space like a golf course or sports field.".to_string()
        }
        _ => "You appear to be outdoors.".to_string(),
    }
}

fn negative_phrase(ctx: &PlaceContext, category: SpaceCategory) -> String {
    if ctx.is_building {
        return "You appear to be inside or right next to a building.".to_string();
    }
    match category {
        SpaceCategory::Residential => "You're in a residential area, not a natural space.",
        SpaceCategory::Urban => "You're in a built-up urban area.",
        SpaceCategory::Indoor => "You appear to be indoors.",
        _ => "We couldn't confirm that you're outdoors in a natural area.",
    }
    .to_string()
}

/// Builds the explanations for a finished verdict.
#[must_use]
pub fn generate_explanations(
    ctx: &PlaceContext,
    classification: &ClassificationResult,
    confidence: &ConfidenceResult,
    thresholds: &Thresholds,
) -> Explanations {
    let category = classification.space_category;
    let mut explanations = Explanations::default();

    if confidence.is_outdoors {
        explanations
            .positive
            .push(positive_phrase(category, ctx.place_name.as_deref()));
    } else {
        explanations.negative.push(negative_phrase(ctx, category));
    }

    if !ctx.is_building
        && let Some(distance) = ctx.nearest_building_distance_meters
        && distance < thresholds.building_proximity_meters
    {
        explanations.negative.push(format!(
            "There's a building very close by (about {distance:.0} m away)."
        ));
    }

    if confidence.is_outdoors
        && ctx.in_boundary
        && ctx
            .distance_to_edge
            .is_some_and(|d| d > WELL_INSIDE_EDGE_DISTANCE)
    {
        explanations
            .positive
            .push("You're well inside the area, away from its edges.".to_string());
    }

    if category.is_natural() && !ctx.in_boundary {
        explanations
            .negative
            .push("You're near a natural area but not inside its mapped boundary.".to_string());
    }

    if category.is_natural() && !confidence.is_outdoors {
        let hedge = if confidence.confidence >= thresholds.natural_area {
            "This looks like a natural area, but the signals aren't strong enough to confirm \
             you're outdoors."
        } else {
            "Signals are mixed: this looks like a natural area, but other signals suggest \
             you're not outdoors."
        };
        explanations.negative.push(hedge.to_string());
    }

    explanations
}

/// Explanations for a manual override.
#[must_use]
pub fn manual_override() -> Explanations {
    Explanations {
        positive: vec![MANUAL_OVERRIDE_EXPLANATION.to_string()],
        negative: Vec::new(),
    }
}

/// Explanations for a failed detection.
#[must_use]
pub fn failure() -> Explanations {
    Explanations {
        positive: Vec::new(),
        negative: vec![FAILURE_EXPLANATION.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use touch_grass_outdoors_models::{DebugMap, GeoCoordinates};

    use super::*;

    fn classification(category: SpaceCategory) -> ClassificationResult {
        ClassificationResult {
            space_category: category,
            is_likely_outdoors: category.is_outdoor(),
            base_confidence: 50,
            reasons: Vec::new(),
            debug: DebugMap::new(),
        }
    }

    fn verdict(confidence: u8, is_outdoors: bool) -> ConfidenceResult {
        ConfidenceResult {
            confidence,
            adjustments: Vec::new(),
            reasons: Vec::new(),
            is_outdoors,
        }
    }

    fn context() -> PlaceContext {
        PlaceContext::empty(GeoCoordinates::new(45.0, -122.0))
    }

    fn in_park(name: &str, distance_to_edge: f64) -> PlaceContext {
        let mut ctx = context();
        ctx.place_name = Some(name.to_string());
        ctx.in_boundary = true;
        ctx.distance_to_edge = Some(distance_to_edge);
        ctx
    }

    #[test]
    fn protected_area_names_the_place() {
        let explanations = generate_explanations(
            &in_park("Forest Park", 0.001),
            &classification(SpaceCategory::ProtectedArea),
            &verdict(100, true),
            &Thresholds::default(),
        );
        assert_eq!(
            explanations.positive,
            vec!["You're inside Forest Park, a protected natural area.".to_string()]
        );
        assert!(explanations.negative.is_empty());
    }

    #[test]
    fn generic_outdoor_phrase_for_urban_outdoor() {
        let explanations = generate_explanations(
            &in_park("Pioneer Courthouse Square", 0.001),
            &classification(SpaceCategory::UrbanOutdoor),
            &verdict(75, true),
            &Thresholds::default(),
        );
        assert_eq!(explanations.positive, vec!["You appear to be outdoors.".to_string()]);
    }

    #[test]
    fn well_inside_praise() {
        let explanations = generate_explanations(
            &in_park("Forest Park", 45.0),
            &classification(SpaceCategory::NaturalArea),
            &verdict(100, true),
            &Thresholds::default(),
        );
        assert_eq!(explanations.positive.len(), 2);
        assert!(explanations.positive[1].contains("well inside"));
    }

    #[test]
    fn building_verdict_and_proximity_caveat() {
        let mut ctx = context();
        ctx.is_building = true;
        let flagged = generate_explanations(
            &ctx,
            &classification(SpaceCategory::Indoor),
            &verdict(0, false),
            &Thresholds::default(),
        );
        assert_eq!(
            flagged.negative,
            vec!["You appear to be inside or right next to a building.".to_string()]
        );

        let mut ctx = in_park("Forest Park", 0.001);
        ctx.nearest_building_distance_meters = Some(27.4);
        let close = generate_explanations(
            &ctx,
            &classification(SpaceCategory::NaturalArea),
            &verdict(55, false),
            &Thresholds::default(),
        );
        assert!(close.negative.iter().any(|p| p.contains("about 27 m away")));
    }

    #[test]
    fn residential_and_urban_negatives() {
        for (category, expected) in [
            (SpaceCategory::Residential, "residential area"),
            (SpaceCategory::Urban, "urban area"),
            (SpaceCategory::Unknown, "couldn't confirm"),
        ] {
            let explanations = generate_explanations(
                &context(),
                &classification(category),
                &verdict(20, false),
                &Thresholds::default(),
            );
            assert!(explanations.positive.is_empty());
            assert!(explanations.negative[0].contains(expected), "{category}");
        }
    }

    #[test]
    fn natural_but_not_contained_gets_edge_caveat() {
        let explanations = generate_explanations(
            &context(),
            &classification(SpaceCategory::NaturalArea),
            &verdict(75, true),
            &Thresholds::default(),
        );
        assert_eq!(explanations.positive, vec!["You're in a natural area.".to_string()]);
        assert!(explanations.negative[0].contains("not inside its mapped boundary"));
    }

    #[test]
    fn contradictory_signals_are_hedged() {
        let ctx = in_park("Forest Park", 20.0);
        let natural = classification(SpaceCategory::NaturalArea);

        let almost = generate_explanations(&ctx, &natural, &verdict(55, false), &Thresholds::default());
        assert!(almost.negative.iter().any(|p| p.contains("aren't strong enough")));

        let weak = generate_explanations(&ctx, &natural, &verdict(30, false), &Thresholds::default());
        assert!(weak.negative.iter().any(|p| p.starts_with("Signals are mixed")));
    }

    #[test]
    fn override_and_failure_phrases() {
        assert_eq!(manual_override().positive, vec![MANUAL_OVERRIDE_EXPLANATION.to_string()]);
        assert!(manual_override().negative.is_empty());
        assert_eq!(failure().negative, vec![FAILURE_EXPLANATION.to_string()]);
    }
}
