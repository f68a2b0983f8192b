//! Rule-table space classification.
//!
//! Rules are declared in descending priority. Every rule is evaluated so
//! that all matches show up in the diagnostics, but the first match wins.

use std::panic::{self, AssertUnwindSafe};

use serde_json::json;
use touch_grass_outdoors_models::{ClassificationResult, DebugMap, PlaceContext, SpaceCategory};

use crate::panic_message;
use crate::signals::{
    BEACH_NAME_RE, FOREST_NAME_RE, INDOOR_VENUE_TYPES, NATIONAL_PARK_RE, PLAZA_NAME_RE,
    PROTECTED_NAME_RE, TRAIL_NAME_RE, URBAN_TYPES, WATER_NAME_RE, any_name_matches,
};

/// One entry of the classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    /// Stable rule name, reported in diagnostics.
    pub name: &'static str,
    /// Whether the rule applies to a context.
    pub predicate: fn(&PlaceContext) -> bool,
    /// Category assigned when this rule wins.
    pub category: SpaceCategory,
    /// Starting confidence when this rule wins.
    pub base_confidence: u8,
    /// Reason reported when this rule wins.
    pub reason: &'static str,
}

/// The classification table, highest priority first.
pub static RULES: &[ClassificationRule] = &[
    // Protected areas
    ClassificationRule {
        name: "national_park",
        predicate: in_national_park,
        category: SpaceCategory::ProtectedArea,
        base_confidence: 90,
        reason: "Inside a national park or monument",
    },
    ClassificationRule {
        name: "nature_reserve",
        predicate: in_nature_reserve,
        category: SpaceCategory::ProtectedArea,
        base_confidence: 85,
        reason: "Inside a nature reserve or conservation area",
    },
    // Natural areas
    ClassificationRule {
        name: "forest",
        predicate: in_forest,
        category: SpaceCategory::NaturalArea,
        base_confidence: 85,
        reason: "Inside a forest or woodland",
    },
    ClassificationRule {
        name: "park_boundary",
        predicate: in_park,
        category: SpaceCategory::NaturalArea,
        base_confidence: 80,
        reason: "Inside park boundaries",
    },
    ClassificationRule {
        name: "natural_feature",
        predicate: in_natural_feature,
        category: SpaceCategory::NaturalArea,
        base_confidence: 75,
        reason: "Inside a natural feature",
    },
    ClassificationRule {
        name: "trail",
        predicate: on_trail,
        category: SpaceCategory::NaturalArea,
        base_confidence: 75,
        reason: "On a trail or greenway",
    },
    ClassificationRule {
        name: "campground",
        predicate: in_campground,
        category: SpaceCategory::NaturalArea,
        base_confidence: 75,
        reason: "Inside a campground",
    },
    ClassificationRule {
        name: "nearby_park",
        predicate: near_park,
        category: SpaceCategory::NaturalArea,
        base_confidence: 60,
        reason: "Near a park or natural area",
    },
    // Water
    ClassificationRule {
        name: "beach",
        predicate: on_beach,
        category: SpaceCategory::WaterFeature,
        base_confidence: 80,
        reason: "On a beach",
    },
    ClassificationRule {
        name: "waterfront",
        predicate: near_water,
        category: SpaceCategory::WaterFeature,
        base_confidence: 70,
        reason: "Near a river, lake, or waterfront",
    },
    // Managed outdoor
    ClassificationRule {
        name: "golf_course",
        predicate: in_golf_course,
        category: SpaceCategory::ManagedOutdoor,
        base_confidence: 75,
        reason: "On a golf course",
    },
    ClassificationRule {
        name: "sports_field",
        predicate: in_sports_field,
        category: SpaceCategory::ManagedOutdoor,
        base_confidence: 65,
        reason: "At a sports field or stadium",
    },
    ClassificationRule {
        name: "garden_or_zoo",
        predicate: in_garden_or_zoo,
        category: SpaceCategory::ManagedOutdoor,
        base_confidence: 65,
        reason: "At a garden, zoo, or cemetery grounds",
    },
    // Urban outdoor
    ClassificationRule {
        name: "playground",
        predicate: in_playground,
        category: SpaceCategory::UrbanOutdoor,
        base_confidence: 60,
        reason: "At a playground or dog park",
    },
    ClassificationRule {
        name: "plaza",
        predicate: in_plaza,
        category: SpaceCategory::UrbanOutdoor,
        base_confidence: 55,
        reason: "In a plaza or public square",
    },
    // Residential
    ClassificationRule {
        name: "residential_area",
        predicate: in_residential_area,
        category: SpaceCategory::Residential,
        base_confidence: 30,
        reason: "In a residential area",
    },
    // Urban
    ClassificationRule {
        name: "urban_street",
        predicate: on_urban_street,
        category: SpaceCategory::Urban,
        base_confidence: 25,
        reason: "On a street or near transit",
    },
    // Indoor
    ClassificationRule {
        name: "inside_building",
        predicate: in_building,
        category: SpaceCategory::Indoor,
        base_confidence: 10,
        reason: "Inside or at a building",
    },
    ClassificationRule {
        name: "indoor_venue",
        predicate: in_indoor_venue,
        category: SpaceCategory::Indoor,
        base_confidence: 15,
        reason: "Inside an enclosed venue",
    },
];

/// Reason reported when no rule matches.
pub const NO_MATCH_REASON: &str = "No classification rule matched";

fn in_national_park(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["national_park"])
        || any_name_matches(ctx.containing_names(), &NATIONAL_PARK_RE)
}

fn in_nature_reserve(ctx: &PlaceContext) -> bool {
    any_name_matches(ctx.containing_names(), &PROTECTED_NAME_RE)
}

fn in_forest(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["forest"])
        || any_name_matches(ctx.containing_names(), &FOREST_NAME_RE)
}

fn in_park(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["park"])
}

fn in_natural_feature(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["natural_feature"])
}

fn on_trail(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["trail", "hiking_area"])
        || any_name_matches(ctx.containing_names(), &TRAIL_NAME_RE)
}

fn in_campground(ctx: &PlaceContext) -> bool {
    ctx.in_boundary && ctx.containing_has_any_type(&["campground", "rv_park"])
}

fn near_park(ctx: &PlaceContext) -> bool {
    ctx.has_any_type(&["park", "natural_feature", "forest", "hiking_area"])
}

fn on_beach(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["beach"])
        || any_name_matches(ctx.containing_names(), &BEACH_NAME_RE)
}

fn near_water(ctx: &PlaceContext) -> bool {
    any_name_matches(ctx.place_names.iter().map(String::as_str), &WATER_NAME_RE)
}

fn in_golf_course(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["golf_course"])
}

fn in_sports_field(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["stadium", "athletic_field", "sports_complex"])
}

fn in_garden_or_zoo(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["zoo", "botanical_garden", "cemetery"])
}

fn in_playground(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["playground", "dog_park"])
}

fn in_plaza(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(&["town_square", "plaza"])
        || any_name_matches(ctx.containing_names(), &PLAZA_NAME_RE)
}

const fn in_residential_area(ctx: &PlaceContext) -> bool {
    ctx.is_residential_area
}

fn on_urban_street(ctx: &PlaceContext) -> bool {
    ctx.has_any_type(URBAN_TYPES)
}

const fn in_building(ctx: &PlaceContext) -> bool {
    ctx.is_building
}

fn in_indoor_venue(ctx: &PlaceContext) -> bool {
    ctx.containing_has_any_type(INDOOR_VENUE_TYPES)
}

/// Evaluates one rule. `None` means the predicate panicked.
fn rule_matches(
    rule: &ClassificationRule,
    ctx: &PlaceContext,
    logger: &dyn log::Log,
) -> Option<bool> {
    match panic::catch_unwind(AssertUnwindSafe(|| (rule.predicate)(ctx))) {
        Ok(matched) => Some(matched),
        Err(payload) => {
            log::error!(
                logger: logger,
                "Classification rule {} panicked, treating as no match: {}",
                rule.name,
                panic_message(&*payload)
            );
            None
        }
    }
}

/// Classifies `ctx` with the built-in [`RULES`].
#[must_use]
pub fn classify(ctx: &PlaceContext, logger: &dyn log::Log) -> ClassificationResult {
    classify_with_rules(ctx, RULES, logger)
}

/// Classifies `ctx` with an explicit rule table.
#[must_use]
pub fn classify_with_rules(
    ctx: &PlaceContext,
    rules: &[ClassificationRule],
    logger: &dyn log::Log,
) -> ClassificationResult {
    let mut matching = Vec::new();
    let mut panicked = Vec::new();

    for rule in rules {
        match rule_matches(rule, ctx, logger) {
            Some(true) => matching.push(rule),
            Some(false) => {}
            None => panicked.push(rule.name),
        }
    }

    let mut debug = DebugMap::new();
    debug.insert(
        "allMatchingRules".to_string(),
        json!(matching.iter().map(|rule| rule.name).collect::<Vec<_>>()),
    );
    debug.insert(
        "primaryRule".to_string(),
        json!(matching.first().map(|rule| rule.name)),
    );
    if !panicked.is_empty() {
        debug.insert("panickedRules".to_string(), json!(panicked));
    }

    let Some(primary) = matching.first() else {
        log::debug!(logger: logger, "No classification rule matched");
        return ClassificationResult {
            space_category: SpaceCategory::Unknown,
            is_likely_outdoors: false,
            base_confidence: 0,
            reasons: vec![NO_MATCH_REASON.to_string()],
            debug,
        };
    };

    log::debug!(
        logger: logger,
        "Classified as {} by rule {} ({} rules matched)",
        primary.category,
        primary.name,
        matching.len()
    );

    ClassificationResult {
        space_category: primary.category,
        is_likely_outdoors: primary.category.is_outdoor() && !ctx.is_building,
        base_confidence: primary.base_confidence,
        reasons: vec![primary.reason.to_string()],
        debug,
    }
}
