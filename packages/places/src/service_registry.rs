//! Places backends known at compile time.
//!
//! Backends live as TOML files under `services/` and are parsed once, on
//! first use. [`default_service`] picks the preferred enabled backend;
//! [`find_service`] looks one up by id regardless of whether it is enabled.

use std::sync::LazyLock;
use std::time::Duration;

use serde::Deserialize;

/// One places backend.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesService {
    /// Unique identifier (e.g., `"google_places"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Disabled backends are only reachable through [`find_service`].
    #[serde(default)]
    pub enabled: bool,
    /// Lower values are preferred by [`default_service`].
    pub priority: u32,
    /// Where requests go and how they authenticate.
    pub endpoint: Endpoint,
    /// Per-request limits. Omitted keys fall back to [`RequestLimits::default`].
    #[serde(default)]
    pub limits: RequestLimits,
}

/// Location and credentials of a Places-compatible web service.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    /// Base URL up to `/place`, without a trailing slash.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

/// Timeout and retry budget for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestLimits {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retries for connection failures, 429 and 5xx responses.
    pub max_retries: u32,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_retries: 0,
        }
    }
}

impl RequestLimits {
    /// The timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn parse(file: &str, contents: &str) -> PlacesService {
    toml::de::from_str(contents)
        .unwrap_or_else(|e| panic!("Invalid places service file {file}: {e}"))
}

/// Every backend, in declaration order.
///
/// Panics on first access if an embedded file does not parse.
static SERVICES: LazyLock<Vec<PlacesService>> = LazyLock::new(|| {
    vec![
        parse(
            "google_places.toml",
            include_str!("../services/google_places.toml"),
        ),
        parse(
            "places_proxy.toml",
            include_str!("../services/places_proxy.toml"),
        ),
    ]
});

/// Every configured backend, enabled or not.
#[must_use]
pub fn services() -> &'static [PlacesService] {
    &SERVICES
}

/// The enabled backend with the lowest priority value.
#[must_use]
pub fn default_service() -> Option<&'static PlacesService> {
    SERVICES
        .iter()
        .filter(|service| service.enabled)
        .min_by_key(|service| service.priority)
}

/// Looks up a backend by id.
#[must_use]
pub fn find_service(id: &str) -> Option<&'static PlacesService> {
    SERVICES.iter().find(|service| service.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_is_the_default_backend() {
        let service = default_service().expect("an enabled backend");
        assert_eq!(service.id, "google_places");
        assert_eq!(service.endpoint.api_key_env, "GOOGLE_PLACES_API_KEY");
        assert!(!service.endpoint.base_url.ends_with('/'));
    }

    #[test]
    fn proxy_is_registered_but_disabled() {
        let proxy = find_service("places_proxy").expect("proxy registered");
        assert!(!proxy.enabled);
        assert!(proxy.priority > default_service().map_or(0, |s| s.priority));
        assert!(find_service("nope").is_none());
    }

    #[test]
    fn ids_are_distinct_and_limits_sane() {
        let ids: std::collections::BTreeSet<_> = services().iter().map(|s| &s.id).collect();
        assert_eq!(ids.len(), services().len());
        for service in services() {
            assert!(
                !service.limits.timeout().is_zero(),
                "{} has no timeout",
                service.id
            );
        }
    }

    #[test]
    fn limits_are_optional() {
        let service = parse(
            "inline.toml",
            r#"
                id = "bare"
                name = "Bare"
                priority = 9

                [endpoint]
                base_url = "http://localhost:1/maps/api/place"
                api_key_env = "BARE_KEY"
            "#,
        );
        assert!(!service.enabled);
        assert_eq!(service.limits, RequestLimits::default());
        assert_eq!(service.limits.timeout(), Duration::from_secs(5));
    }
}
