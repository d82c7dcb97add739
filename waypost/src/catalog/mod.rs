//! Place catalog
//!
//! The catalog is the static, immutable set of [`Place`] records the engine
//! works over. It is loaded once at startup from a JSON file and never
//! mutated afterwards; every place is uniquely identified by its `id` for
//! the lifetime of the catalog.
//!
//! # Example
//!
//! ```ignore
//! use waypost::catalog::Catalog;
//!
//! let catalog = Catalog::load("approved_places.json").await?;
//! println!("{} places loaded", catalog.len());
//! ```

mod loader;
mod model;

pub use loader::CatalogError;
pub use model::Place;

use std::sync::Arc;

/// The immutable place catalog.
///
/// Wraps the ordered list of places loaded at startup. The load order is
/// the canonical catalog order: the view pipeline's stable sort preserves
/// it among ties.
#[derive(Debug, Clone)]
pub struct Catalog {
    places: Arc<Vec<Place>>,
}

impl Catalog {
    /// Build a catalog from already-deserialized places.
    ///
    /// Validates the catalog invariants: unique ids and in-range
    /// coordinates.
    pub fn from_places(places: Vec<Place>) -> Result<Self, CatalogError> {
        loader::validate(&places)?;
        Ok(Self {
            places: Arc::new(places),
        })
    }

    /// Load and validate a catalog from a JSON file.
    ///
    /// A failure here is fatal to startup: without a catalog there is
    /// nothing to show.
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self, CatalogError> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Self::from_json_slice(&bytes)
    }

    /// Parse and validate a catalog from raw JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, CatalogError> {
        let places: Vec<Place> = serde_json::from_slice(bytes)?;
        Self::from_places(places)
    }

    /// All places in catalog order.
    pub fn places(&self) -> &[Place] {
        &self.places
    }

    /// Look up a place by id.
    pub fn get(&self, id: &str) -> Option<&Place> {
        self.places.iter().find(|p| p.id == id)
    }

    /// Number of places in the catalog.
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}
