//! Fixed-pace duration decorator.
//!
//! Some deployments prefer a duration derived from the routed distance at
//! a configured walking speed over the provider's own estimate - the
//! provider's pace model may not match the audience (tourists with
//! strollers walk slower than OSRM's default pedestrian). This decorator
//! wraps any [`RoutingProvider`] and recomputes the duration, leaving the
//! distance untouched.

use crate::geo::Coordinate;

use super::types::{BoxFuture, ProviderError, Route, RoutingProvider};

/// Lower bound on the configured pace; slower values are clamped here so
/// a zero in a config file cannot produce infinite durations.
const MIN_WALKING_SPEED_MPS: f64 = 0.1;

/// Wraps a provider and derives duration from distance at a fixed pace.
pub struct FixedPaceProvider<P: RoutingProvider> {
    inner: P,
    walking_speed_mps: f64,
    name: String,
}

impl<P: RoutingProvider> FixedPaceProvider<P> {
    /// Wrap `inner`, deriving durations at `walking_speed_mps`.
    pub fn new(inner: P, walking_speed_mps: f64) -> Self {
        let walking_speed_mps = if walking_speed_mps.is_finite() {
            walking_speed_mps.max(MIN_WALKING_SPEED_MPS)
        } else {
            MIN_WALKING_SPEED_MPS
        };
        let name = format!("{} (fixed pace)", inner.name());
        Self {
            inner,
            walking_speed_mps,
            name,
        }
    }

    /// The effective walking speed in meters per second.
    pub fn walking_speed_mps(&self) -> f64 {
        self.walking_speed_mps
    }
}

impl<P: RoutingProvider> RoutingProvider for FixedPaceProvider<P> {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Route, ProviderError>> {
        Box::pin(async move {
            let route = self.inner.route(origin, destination).await?;
            Ok(Route {
                distance_meters: route.distance_meters,
                duration_seconds: route.distance_meters / self.walking_speed_mps,
            })
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
