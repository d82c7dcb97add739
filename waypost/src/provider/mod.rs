//! Routing provider abstraction
//!
//! This module provides the trait and implementations for looking up a
//! walking route (distance and duration) between two coordinates from an
//! external routing service.
//!
//! Providers are interchangeable behind [`RoutingProvider`]: the scheduler,
//! cache, and view pipeline never see a concrete provider. Whether the
//! walking duration comes straight from the provider or is derived from
//! distance at a fixed pace is equally pluggable via
//! [`FixedPaceProvider`].
//!
//! # Factory Pattern
//!
//! For centralized provider creation, use the [`ProviderFactory`]:
//!
//! ```ignore
//! use waypost::provider::{ProviderFactory, ProviderConfig, DurationPolicy, ReqwestClient};
//!
//! let http_client = ReqwestClient::new()?;
//! let factory = ProviderFactory::new(http_client);
//! let provider = factory.create(&ProviderConfig::osrm(), DurationPolicy::FromProvider);
//! ```

mod factory;
mod http;
mod osrm;
mod ors;
mod paced;
mod types;

pub use factory::{DurationPolicy, ProviderConfig, ProviderFactory};
pub use http::{AsyncHttpClient, HttpResponse, ReqwestClient};
pub use osrm::OsrmProvider;
pub use ors::OpenRouteServiceProvider;
pub use paced::FixedPaceProvider;
pub use types::{BoxFuture, ProviderError, Route, RoutingProvider};

#[cfg(test)]
pub use http::tests::MockHttpClient;
