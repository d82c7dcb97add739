//! OSRM walking-route provider.
//!
//! Queries an OSRM `route` service for a walking leg between two
//! coordinates. The public demo instance at `router.project-osrm.org` is
//! the default endpoint; self-hosted instances work unchanged.
//!
//! # Wire Protocol
//!
//! One GET per lookup:
//!
//! `{base_url}/{profile}/{olon},{olat};{dlon},{dlat}?overview=false`
//!
//! OSRM takes coordinates as `longitude,latitude` pairs. The response is
//! JSON with a `code` field; `"Ok"` carries at least one route object with
//! `distance` (meters) and `duration` (seconds).

use serde::Deserialize;

use crate::geo::Coordinate;

use super::http::AsyncHttpClient;
use super::types::{BoxFuture, ProviderError, Route, RoutingProvider};

/// Default OSRM route endpoint (public demo server).
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org/route/v1";

/// Default OSRM routing profile.
pub const DEFAULT_OSRM_PROFILE: &str = "foot";

/// OSRM routing provider.
///
/// Reports both distance and duration straight from the provider.
pub struct OsrmProvider<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
    profile: String,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
}

impl<C: AsyncHttpClient> OsrmProvider<C> {
    /// Creates a provider against the public demo server.
    pub fn new(http_client: C) -> Self {
        Self::with_endpoint(
            http_client,
            DEFAULT_OSRM_BASE_URL.to_string(),
            DEFAULT_OSRM_PROFILE.to_string(),
        )
    }

    /// Creates a provider against a custom endpoint and profile.
    pub fn with_endpoint(http_client: C, base_url: String, profile: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile,
        }
    }

    /// Builds the route URL for the given leg.
    fn build_url(&self, origin: Coordinate, destination: Coordinate) -> String {
        format!(
            "{}/{}/{},{};{},{}?overview=false",
            self.base_url,
            self.profile,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        )
    }

    fn parse_body(body: &[u8]) -> Result<Route, ProviderError> {
        let parsed: OsrmResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::Network(format!("malformed OSRM response: {}", e)))?;

        if parsed.code != "Ok" {
            return Err(ProviderError::NoRoute);
        }
        let route = parsed.routes.first().ok_or(ProviderError::NoRoute)?;
        Ok(Route {
            distance_meters: route.distance,
            duration_seconds: route.duration,
        })
    }
}

impl<C: AsyncHttpClient> RoutingProvider for OsrmProvider<C> {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Route, ProviderError>> {
        let url = self.build_url(origin, destination);
        Box::pin(async move {
            let response = self.http_client.get(&url).await?;
            match response.status {
                429 => Err(ProviderError::RateLimited),
                status if !response.is_success() => Err(ProviderError::HttpStatus(status)),
                _ => Self::parse_body(&response.body),
            }
        })
    }

    fn name(&self) -> &str {
        "OSRM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::http::tests::{ok_response, MockHttpClient};
    use crate::provider::HttpResponse;

    fn paris() -> Coordinate {
        Coordinate::new(48.8566, 2.3522).unwrap()
    }

    fn eiffel() -> Coordinate {
        Coordinate::new(48.8584, 2.2945).unwrap()
    }

    const OK_BODY: &str =
        r#"{"code": "Ok", "routes": [{"distance": 4212.5, "duration": 3030.1}]}"#;

    #[test]
    fn test_provider_name() {
        let provider = OsrmProvider::new(MockHttpClient::with_response(ok_response(OK_BODY)));
        assert_eq!(provider.name(), "OSRM");
    }

    #[test]
    fn test_url_puts_longitude_first() {
        let provider = OsrmProvider::new(MockHttpClient::with_response(ok_response(OK_BODY)));
        let url = provider.build_url(paris(), eiffel());
        assert_eq!(
            url,
            "https://router.project-osrm.org/route/v1/foot/2.3522,48.8566;2.2945,48.8584?overview=false"
        );
    }

    #[test]
    fn test_custom_endpoint_trailing_slash_trimmed() {
        let provider = OsrmProvider::with_endpoint(
            MockHttpClient::with_response(ok_response(OK_BODY)),
            "http://localhost:5000/route/v1/".to_string(),
            "walking".to_string(),
        );
        let url = provider.build_url(paris(), eiffel());
        assert!(url.starts_with("http://localhost:5000/route/v1/walking/"));
    }

    #[tokio::test]
    async fn test_route_success() {
        let provider = OsrmProvider::new(MockHttpClient::with_response(ok_response(OK_BODY)));
        let route = provider.route(paris(), eiffel()).await.unwrap();
        assert_eq!(route.distance_meters, 4212.5);
        assert_eq!(route.duration_seconds, 3030.1);
    }

    #[tokio::test]
    async fn test_route_not_found() {
        let body = r#"{"code": "NoRoute", "routes": []}"#;
        let provider = OsrmProvider::new(MockHttpClient::with_response(ok_response(body)));
        let err = provider.route(paris(), eiffel()).await.unwrap_err();
        assert_eq!(err, ProviderError::NoRoute);
    }

    #[tokio::test]
    async fn test_ok_code_with_empty_routes_is_no_route() {
        let body = r#"{"code": "Ok", "routes": []}"#;
        let provider = OsrmProvider::new(MockHttpClient::with_response(ok_response(body)));
        let err = provider.route(paris(), eiffel()).await.unwrap_err();
        assert_eq!(err, ProviderError::NoRoute);
    }

    #[tokio::test]
    async fn test_rate_limit_classified() {
        let provider = OsrmProvider::new(MockHttpClient::with_response(Ok(HttpResponse {
            status: 429,
            body: vec![],
        })));
        let err = provider.route(paris(), eiffel()).await.unwrap_err();
        assert_eq!(err, ProviderError::RateLimited);
    }

    #[tokio::test]
    async fn test_http_error_classified() {
        let provider = OsrmProvider::new(MockHttpClient::with_response(Ok(HttpResponse {
            status: 502,
            body: vec![],
        })));
        let err = provider.route(paris(), eiffel()).await.unwrap_err();
        assert_eq!(err, ProviderError::HttpStatus(502));
    }

    #[tokio::test]
    async fn test_malformed_body_is_network_error() {
        let provider = OsrmProvider::new(MockHttpClient::with_response(ok_response("not json")));
        let err = provider.route(paris(), eiffel()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let provider = OsrmProvider::new(MockHttpClient::with_response(Err(
            ProviderError::Network("connection refused".to_string()),
        )));
        let err = provider.route(paris(), eiffel()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }
}
