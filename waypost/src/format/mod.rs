//! Display formatting helpers
//!
//! Pure functions turning engine outputs into the short strings a
//! frontend renders: walking durations, distances, cache-entry ages, and
//! external map deep links.

use std::time::Duration;

use crate::catalog::Place;
use crate::geo::Coordinate;

/// Format a walking duration, e.g. `12 min` or `1h 5m`.
pub fn format_duration(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round() as u64;
    if minutes < 60 {
        return format!("{} min", minutes);
    }
    let hours = minutes / 60;
    let rest = minutes % 60;
    if rest > 0 {
        format!("{}h {}m", hours, rest)
    } else {
        format!("{}h", hours)
    }
}

/// Format a distance, e.g. `850 m` or `1.2 km`.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{} m", meters.round() as u64)
    } else {
        format!("{:.1} km", meters / 1000.0)
    }
}

/// Format how long ago something happened, e.g. `just now` or `3m ago`.
pub fn format_age(age: Duration) -> String {
    let minutes = age.as_secs() / 60;
    if minutes < 1 {
        "just now".to_string()
    } else {
        format!("{}m ago", minutes)
    }
}

/// Build a Google Maps deep link for a place.
///
/// With an origin this is a walking-directions link; without one it is a
/// plain search. Uses the place's `maps_query` when present, falling back
/// to its name.
pub fn maps_url(place: &Place, origin: Option<Coordinate>) -> String {
    let query = place.maps_query.as_deref().unwrap_or(&place.name);
    let url = match origin {
        Some(origin) => reqwest::Url::parse_with_params(
            "https://www.google.com/maps/dir/",
            &[
                ("api", "1"),
                ("origin", &format!("{},{}", origin.latitude, origin.longitude)),
                ("destination", query),
                ("travelmode", "walking"),
            ],
        ),
        None => reqwest::Url::parse_with_params(
            "https://www.google.com/maps/search/",
            &[("api", "1"), ("query", query)],
        ),
    };
    // The base URLs above are statically valid; parse_with_params only
    // fails on a malformed base.
    url.map(String::from).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_minutes() {
        assert_eq!(format_duration(0.0), "0 min");
        assert_eq!(format_duration(90.0), "2 min");
        assert_eq!(format_duration(29.0), "0 min");
        assert_eq!(format_duration(3540.0), "59 min");
    }

    #[test]
    fn test_format_duration_hours() {
        assert_eq!(format_duration(3600.0), "1h");
        assert_eq!(format_duration(3900.0), "1h 5m");
        assert_eq!(format_duration(7200.0), "2h");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(850.4), "850 m");
        assert_eq!(format_distance(999.4), "999 m");
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(1234.0), "1.2 km");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(30)), "just now");
        assert_eq!(format_age(Duration::from_secs(60)), "1m ago");
        assert_eq!(format_age(Duration::from_secs(200)), "3m ago");
    }

    fn place(maps_query: Option<&str>) -> Place {
        let query_field = maps_query
            .map(|q| format!(r#", "google_maps_query": "{}""#, q))
            .unwrap_or_default();
        serde_json::from_str(&format!(
            r#"{{"id": "p", "name": "Eiffel Tower",
                "latitude": 48.8584, "longitude": 2.2945{query_field}}}"#
        ))
        .unwrap()
    }

    #[test]
    fn test_maps_url_search_without_origin() {
        let url = maps_url(&place(Some("Eiffel Tower, Paris")), None);
        assert!(url.starts_with("https://www.google.com/maps/search/"));
        assert!(url.contains("query=Eiffel+Tower%2C+Paris"));
    }

    #[test]
    fn test_maps_url_directions_with_origin() {
        let origin = Coordinate::new(48.8566, 2.3522).unwrap();
        let url = maps_url(&place(Some("Eiffel Tower, Paris")), Some(origin));
        assert!(url.starts_with("https://www.google.com/maps/dir/"));
        assert!(url.contains("origin=48.8566%2C2.3522"));
        assert!(url.contains("travelmode=walking"));
    }

    #[test]
    fn test_maps_url_falls_back_to_name() {
        let url = maps_url(&place(None), None);
        assert!(url.contains("query=Eiffel+Tower"));
    }
}
