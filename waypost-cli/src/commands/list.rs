//! List command - one-shot view of the catalog with walking times.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use waypost::engine::EngineEvent;
use waypost::position::PositionFix;
use waypost::scheduler::CycleEvent;
use waypost::view::SortMode;

use crate::error::CliError;

use super::common;

/// Arguments for `waypost list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Path to the catalog JSON (overrides the config file)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Origin latitude; walking times are fetched when both are given
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Origin longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Keep only places with any of these categories (repeatable)
    #[arg(long = "category")]
    pub categories: Vec<String>,

    /// Keep only places matching this text
    #[arg(long)]
    pub search: Option<String>,

    /// Sort order
    #[arg(long, default_value = "walking-time")]
    pub sort: SortMode,

    /// Maximum places to print
    #[arg(long, default_value_t = 25)]
    pub limit: usize,

    /// Print a Google Maps walking link per place
    #[arg(long)]
    pub links: bool,
}

/// Run the list command.
pub async fn run(config_path: Option<&Path>, args: ListArgs) -> Result<(), CliError> {
    let config = common::load_config(config_path)?;
    let catalog = common::load_catalog(&config, args.catalog.as_deref()).await?;
    let engine = common::build_engine(&config, catalog)?;

    engine.set_sort(args.sort);
    if !args.categories.is_empty() {
        engine.set_categories(args.categories.iter().cloned().collect::<BTreeSet<_>>());
    }
    if let Some(search) = &args.search {
        engine.set_search(search.clone());
    }

    if let (Some(lat), Some(lon)) = (args.lat, args.lon) {
        // An empty view never starts a cycle; skip straight to rendering.
        if !engine.visible_places().is_empty() {
            let fix = PositionFix::new(lat, lon)
                .map_err(|e| CliError::Config(format!("invalid origin: {}", e)))?;
            fetch_walking_times(&engine, fix).await?;
        }
    }

    common::render_places(&engine, args.limit, args.links);
    common::render_status(&engine);
    engine.shutdown();
    Ok(())
}

/// Feed one fix into the engine and wait for the triggered cycle,
/// showing batch progress while it runs.
async fn fetch_walking_times(
    engine: &waypost::engine::Engine,
    fix: PositionFix,
) -> Result<(), CliError> {
    let mut events = engine.subscribe();
    let (tx, rx) = mpsc::channel(4);
    engine.start_tracking(rx);
    tx.send(Ok(fix))
        .await
        .map_err(|_| CliError::Config("position channel closed".to_string()))?;

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg} [{pos}/{len}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message("fetching walking times");

    loop {
        match events.recv().await {
            Ok(EngineEvent::Cycle(CycleEvent::Progress {
                completed_batches,
                total_batches,
                ..
            })) => {
                bar.set_length(total_batches as u64);
                bar.set_position(completed_batches as u64);
            }
            Ok(EngineEvent::Cycle(CycleEvent::Completed(report))) => {
                bar.finish_and_clear();
                tracing::info!(
                    succeeded = report.succeeded,
                    failed = report.failed,
                    "routing cycle done"
                );
                break;
            }
            Ok(_) => {}
            Err(_) => {
                bar.finish_and_clear();
                break;
            }
        }
    }
    Ok(())
}
