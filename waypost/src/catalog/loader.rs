//! Catalog validation and load errors.

use std::collections::HashSet;

use thiserror::Error;

use crate::geo::{Coordinate, GeoError};

use super::model::Place;

/// Errors that can occur while loading the catalog.
///
/// Any of these is fatal to startup; the caller surfaces an empty state
/// rather than continuing with a partial catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not valid JSON for the expected schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two places share the same id.
    #[error("duplicate place id: {0}")]
    DuplicateId(String),

    /// A place carries an out-of-range coordinate.
    #[error("place {id} has an invalid coordinate: {source}")]
    InvalidCoordinate {
        id: String,
        #[source]
        source: GeoError,
    },
}

/// Check the catalog invariants: unique ids, valid coordinates.
pub(super) fn validate(places: &[Place]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(places.len());
    for place in places {
        if !seen.insert(place.id.as_str()) {
            return Err(CatalogError::DuplicateId(place.id.clone()));
        }
        Coordinate::new(place.latitude, place.longitude).map_err(|source| {
            CatalogError::InvalidCoordinate {
                id: place.id.clone(),
                source,
            }
        })?;
    }
    Ok(())
}
