//! openrouteservice walking-route provider.
//!
//! Queries the openrouteservice directions API. Requires an API key from
//! <https://openrouteservice.org/>; the free tier is rate limited, which
//! this provider classifies as [`ProviderError::RateLimited`] for the
//! scheduler to count like any other per-place failure.
//!
//! # Wire Protocol
//!
//! One POST per lookup to `{base_url}/v2/directions/{profile}` with an
//! `Authorization` header and a JSON body of `longitude,latitude` pairs:
//!
//! ```json
//! {"coordinates": [[2.3522, 48.8566], [2.2945, 48.8584]]}
//! ```
//!
//! The response carries `routes[0].summary.{distance, duration}` in
//! meters and seconds. A leg the service cannot route answers HTTP 404.

use serde::Deserialize;
use serde_json::json;

use crate::geo::Coordinate;

use super::http::AsyncHttpClient;
use super::types::{BoxFuture, ProviderError, Route, RoutingProvider};

/// Default openrouteservice endpoint.
pub const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";

/// Default openrouteservice walking profile.
pub const DEFAULT_ORS_PROFILE: &str = "foot-walking";

/// openrouteservice routing provider.
pub struct OpenRouteServiceProvider<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
    profile: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct OrsResponse {
    #[serde(default)]
    routes: Vec<OrsRoute>,
}

#[derive(Debug, Deserialize)]
struct OrsRoute {
    summary: OrsSummary,
}

#[derive(Debug, Deserialize)]
struct OrsSummary {
    distance: f64,
    duration: f64,
}

impl<C: AsyncHttpClient> OpenRouteServiceProvider<C> {
    /// Creates a provider against the hosted service.
    pub fn new(http_client: C, api_key: String) -> Self {
        Self::with_endpoint(
            http_client,
            DEFAULT_ORS_BASE_URL.to_string(),
            DEFAULT_ORS_PROFILE.to_string(),
            api_key,
        )
    }

    /// Creates a provider against a custom endpoint and profile.
    pub fn with_endpoint(http_client: C, base_url: String, profile: String, api_key: String) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile,
            api_key,
        }
    }

    fn directions_url(&self) -> String {
        format!("{}/v2/directions/{}", self.base_url, self.profile)
    }

    fn request_body(origin: Coordinate, destination: Coordinate) -> Vec<u8> {
        json!({
            "coordinates": [
                [origin.longitude, origin.latitude],
                [destination.longitude, destination.latitude],
            ]
        })
        .to_string()
        .into_bytes()
    }

    fn parse_body(body: &[u8]) -> Result<Route, ProviderError> {
        let parsed: OrsResponse = serde_json::from_slice(body)
            .map_err(|e| ProviderError::Network(format!("malformed ORS response: {}", e)))?;
        let route = parsed.routes.first().ok_or(ProviderError::NoRoute)?;
        Ok(Route {
            distance_meters: route.summary.distance,
            duration_seconds: route.summary.duration,
        })
    }
}

impl<C: AsyncHttpClient> RoutingProvider for OpenRouteServiceProvider<C> {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Route, ProviderError>> {
        let url = self.directions_url();
        let body = Self::request_body(origin, destination);
        Box::pin(async move {
            let response = self
                .http_client
                .post_json(&url, Some(self.api_key.as_str()), body)
                .await?;
            match response.status {
                429 => Err(ProviderError::RateLimited),
                404 => Err(ProviderError::NoRoute),
                status if !response.is_success() => Err(ProviderError::HttpStatus(status)),
                _ => Self::parse_body(&response.body),
            }
        })
    }

    fn name(&self) -> &str {
        "openrouteservice"
    }
}
