//! Shared plumbing for CLI commands.

use std::path::Path;

use console::style;

use waypost::catalog::Catalog;
use waypost::config::ConfigFile;
use waypost::engine::Engine;
use waypost::format::{format_age, format_distance, format_duration, maps_url};
use waypost::provider::{ProviderFactory, ReqwestClient};

use crate::error::CliError;

/// Load the config file from an explicit path or the platform default.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    match path {
        Some(path) => Ok(ConfigFile::load(path)?),
        None => match ConfigFile::default_path() {
            Some(default) => Ok(ConfigFile::load_or_default(&default)?),
            None => Ok(ConfigFile::default()),
        },
    }
}

/// Load the catalog from a CLI override or the configured path.
pub async fn load_catalog(
    config: &ConfigFile,
    override_path: Option<&Path>,
) -> Result<Catalog, CliError> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(|| config.catalog_path.clone())
        .ok_or_else(|| {
            CliError::Config(
                "no catalog configured; pass --catalog or set catalog.path in the config file"
                    .to_string(),
            )
        })?;
    Ok(Catalog::load(&path).await?)
}

/// Build an engine session from the loaded configuration.
pub fn build_engine(config: &ConfigFile, catalog: Catalog) -> Result<Engine, CliError> {
    let http_client = ReqwestClient::new()?;
    let factory = ProviderFactory::new(http_client);
    let provider = factory.create(&config.provider, config.duration_policy);
    Ok(Engine::start(catalog, provider, config.engine.clone()))
}

/// Render the visible list to stdout.
///
/// Shows up to `limit` places with walking time, distance, a staleness
/// hint, name, tags, and description - everything read from the engine's
/// collaborator surface. With `links`, a Google Maps walking link is
/// printed per place.
pub fn render_places(engine: &Engine, limit: usize, links: bool) {
    let places = engine.visible_places();
    let total = places.len();

    if total == 0 {
        println!("{}", style("No places match the current filters.").dim());
        return;
    }

    for place in places.iter().take(limit) {
        let routing = match engine.cache_entry(&place.id) {
            Some(entry) => {
                let age = if engine.is_stale(&entry) {
                    format!(" ~{}", format_age(entry.computed_at.elapsed()))
                } else {
                    String::new()
                };
                format!(
                    "{:>7}  {:>7}{}",
                    style(format_duration(entry.duration_seconds)).green(),
                    format_distance(entry.distance_meters),
                    style(age).yellow()
                )
            }
            None if engine.position().is_some() => {
                format!("{:>16}", style("calculating…").dim())
            }
            None => String::new(),
        };

        let tags = place
            .category_tags
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");

        println!(
            "{}  {} {}",
            routing,
            style(&place.name).bold(),
            style(format!("[{}]", tags)).dim()
        );
        if !place.short_description.is_empty() {
            println!("{:18}{}", "", style(&place.short_description).dim());
        }
        if links {
            let origin = engine.position().map(|fix| fix.coordinate);
            println!("{:18}{}", "", style(maps_url(place, origin)).blue().underlined());
        }
    }

    if total > limit {
        println!("{}", style(format!("… and {} more", total - limit)).dim());
    }
    println!();
    println!(
        "{}",
        style(format!("{} place{}", total, if total == 1 { "" } else { "s" })).dim()
    );
}

/// Print the status line if the engine has one.
pub fn render_status(engine: &Engine) {
    if let Some(status) = engine.status() {
        println!("{}", style(status).yellow());
    }
}
