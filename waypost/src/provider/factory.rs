//! Centralized provider creation.
//!
//! Collapses provider selection into one place: callers describe the
//! provider and duration policy as data and receive an
//! `Arc<dyn RoutingProvider>`, so the scheduler and engine never name a
//! concrete provider type.

use std::sync::Arc;

use super::http::AsyncHttpClient;
use super::ors::{OpenRouteServiceProvider, DEFAULT_ORS_BASE_URL, DEFAULT_ORS_PROFILE};
use super::osrm::{OsrmProvider, DEFAULT_OSRM_BASE_URL, DEFAULT_OSRM_PROFILE};
use super::paced::FixedPaceProvider;
use super::types::RoutingProvider;

/// Which routing service to use.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    /// OSRM route service.
    Osrm {
        /// Base URL up to and including `/route/v1`.
        base_url: String,
        /// Routing profile, e.g. `foot`.
        profile: String,
    },

    /// openrouteservice directions API.
    OpenRouteService {
        /// Service base URL.
        base_url: String,
        /// Routing profile, e.g. `foot-walking`.
        profile: String,
        /// API key sent in the `Authorization` header.
        api_key: String,
    },
}

impl ProviderConfig {
    /// OSRM against the public demo server with the walking profile.
    pub fn osrm() -> Self {
        Self::Osrm {
            base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            profile: DEFAULT_OSRM_PROFILE.to_string(),
        }
    }

    /// Hosted openrouteservice with the walking profile.
    pub fn openrouteservice(api_key: impl Into<String>) -> Self {
        Self::OpenRouteService {
            base_url: DEFAULT_ORS_BASE_URL.to_string(),
            profile: DEFAULT_ORS_PROFILE.to_string(),
            api_key: api_key.into(),
        }
    }

    /// Short provider name for logs and config files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Osrm { .. } => "osrm",
            Self::OpenRouteService { .. } => "openrouteservice",
        }
    }
}

/// How walking duration is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationPolicy {
    /// Use the duration the provider reports.
    FromProvider,

    /// Derive duration from the routed distance at a fixed pace.
    FixedPace {
        /// Walking speed in meters per second.
        walking_speed_mps: f64,
    },
}

/// Creates providers from configuration.
pub struct ProviderFactory<C> {
    http_client: C,
}

impl<C> ProviderFactory<C>
where
    C: AsyncHttpClient + Clone + 'static,
{
    /// Create a factory sharing one HTTP client across providers.
    pub fn new(http_client: C) -> Self {
        Self { http_client }
    }

    /// Build the provider described by `config` and `policy`.
    pub fn create(
        &self,
        config: &ProviderConfig,
        policy: DurationPolicy,
    ) -> Arc<dyn RoutingProvider> {
        match config {
            ProviderConfig::Osrm { base_url, profile } => {
                let provider = OsrmProvider::with_endpoint(
                    self.http_client.clone(),
                    base_url.clone(),
                    profile.clone(),
                );
                Self::apply_policy(provider, policy)
            }
            ProviderConfig::OpenRouteService {
                base_url,
                profile,
                api_key,
            } => {
                let provider = OpenRouteServiceProvider::with_endpoint(
                    self.http_client.clone(),
                    base_url.clone(),
                    profile.clone(),
                    api_key.clone(),
                );
                Self::apply_policy(provider, policy)
            }
        }
    }

    fn apply_policy<P>(provider: P, policy: DurationPolicy) -> Arc<dyn RoutingProvider>
    where
        P: RoutingProvider + 'static,
    {
        match policy {
            DurationPolicy::FromProvider => Arc::new(provider),
            DurationPolicy::FixedPace { walking_speed_mps } => {
                Arc::new(FixedPaceProvider::new(provider, walking_speed_mps))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::tests::{ok_response, MockHttpClient};
    use crate::provider::{BoxFuture, HttpResponse, ProviderError};

    // MockHttpClient is not Clone, so factory tests use a trivial wrapper.
    #[derive(Clone)]
    struct SharedMock(std::sync::Arc<MockHttpClient>);

    impl AsyncHttpClient for SharedMock {
        fn get(&self, url: &str) -> BoxFuture<'_, Result<HttpResponse, ProviderError>> {
            self.0.get(url)
        }

        fn post_json(
            &self,
            url: &str,
            authorization: Option<&str>,
            body: Vec<u8>,
        ) -> BoxFuture<'_, Result<HttpResponse, ProviderError>> {
            self.0.post_json(url, authorization, body)
        }
    }

    fn mock() -> SharedMock {
        SharedMock(std::sync::Arc::new(MockHttpClient::with_response(
            ok_response(r#"{"code": "Ok", "routes": [{"distance": 100.0, "duration": 80.0}]}"#),
        )))
    }

    #[test]
    fn test_config_names() {
        assert_eq!(ProviderConfig::osrm().name(), "osrm");
        assert_eq!(
            ProviderConfig::openrouteservice("k").name(),
            "openrouteservice"
        );
    }

    #[test]
    fn test_create_osrm() {
        let factory = ProviderFactory::new(mock());
        let provider = factory.create(&ProviderConfig::osrm(), DurationPolicy::FromProvider);
        assert_eq!(provider.name(), "OSRM");
    }

    #[test]
    fn test_create_with_fixed_pace_policy() {
        let factory = ProviderFactory::new(mock());
        let provider = factory.create(
            &ProviderConfig::osrm(),
            DurationPolicy::FixedPace {
                walking_speed_mps: 1.4,
            },
        );
        assert_eq!(provider.name(), "OSRM (fixed pace)");
    }

    #[tokio::test]
    async fn test_fixed_pace_policy_changes_duration() {
        use crate::geo::Coordinate;

        let factory = ProviderFactory::new(mock());
        let provider = factory.create(
            &ProviderConfig::osrm(),
            DurationPolicy::FixedPace {
                walking_speed_mps: 1.0,
            },
        );
        let origin = Coordinate::new(48.85, 2.35).unwrap();
        let route = provider.route(origin, origin).await.unwrap();
        // 100 m at 1 m/s, not the provider's 80 s estimate.
        assert_eq!(route.duration_seconds, 100.0);
    }
}
