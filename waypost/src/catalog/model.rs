//! Catalog data model.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::geo::Coordinate;

/// A point of interest in the catalog.
///
/// Places are immutable once loaded. Optional fields default to
/// empty/absent when missing from the source JSON rather than failing the
/// load.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    /// Unique identifier for the lifetime of the catalog.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Diacritic-free name variant used for matching.
    #[serde(default)]
    pub normalized_name: String,

    /// One-line description shown in list views.
    #[serde(default)]
    pub short_description: String,

    /// Longer free-form notes, if any.
    #[serde(default)]
    pub more_notes: Option<String>,

    /// Category tags; a place may carry several.
    #[serde(default)]
    pub category_tags: BTreeSet<String>,

    /// Latitude in degrees.
    pub latitude: f64,

    /// Longitude in degrees.
    pub longitude: f64,

    /// Optional query string for external map deep links.
    #[serde(default, rename = "google_maps_query")]
    pub maps_query: Option<String>,
}

impl Place {
    /// The place's coordinate.
    ///
    /// Coordinates are validated at catalog load time, so this cannot fail
    /// for a place obtained from a [`super::Catalog`].
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Whether the place carries any of the given category tags.
    pub fn matches_any_category(&self, categories: &BTreeSet<String>) -> bool {
        self.category_tags.iter().any(|t| categories.contains(t))
    }

    /// Lower-cased concatenation of all searchable text fields.
    pub fn search_haystack(&self) -> String {
        let mut haystack = String::new();
        for field in [
            Some(self.name.as_str()),
            Some(self.normalized_name.as_str()),
            Some(self.short_description.as_str()),
            self.more_notes.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            haystack.push_str(field);
            haystack.push(' ');
        }
        for tag in &self.category_tags {
            haystack.push_str(tag);
            haystack.push(' ');
        }
        haystack.to_lowercase()
    }
}
