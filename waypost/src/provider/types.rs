//! Routing provider trait and error taxonomy.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::geo::Coordinate;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A routed walking leg between two coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    /// Routed distance in meters.
    pub distance_meters: f64,
    /// Walking duration in seconds.
    pub duration_seconds: f64,
}

/// Classified failure of a single routing lookup.
///
/// All variants are per-place and non-fatal: the scheduler counts them
/// into the cycle's failure tally and leaves the cache untouched. No retry
/// logic lives at this layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// Transport-level failure, including timeouts.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success HTTP status.
    #[error("HTTP {0} from provider")]
    HttpStatus(u16),

    /// The provider signalled rate limiting.
    #[error("provider rate limited the request")]
    RateLimited,

    /// The provider found no route between the coordinates.
    #[error("no route found")]
    NoRoute,
}

/// An external walking-route lookup service.
///
/// One operation: given an origin and a destination, return the routed
/// distance and duration, or fail with a classified error. Implementations
/// must be `Send + Sync` so a single provider can serve a whole batch of
/// concurrent lookups.
///
/// # Dyn Compatibility
///
/// Uses `Pin<Box<dyn Future>>` so providers can be held as
/// `Arc<dyn RoutingProvider>` and swapped by configuration.
pub trait RoutingProvider: Send + Sync {
    /// Look up a walking route from `origin` to `destination`.
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> BoxFuture<'_, Result<Route, ProviderError>>;

    /// Human-readable provider name for logs and diagnostics.
    fn name(&self) -> &str;
}
