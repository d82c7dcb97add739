//! Watch command - follow a position stream and re-render continuously.
//!
//! Positions come either from a replay file (a JSON array of fixes with
//! hold times, handy for demos and testing) or from a fixed origin that
//! the periodic refresh timer keeps re-routing from.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use console::Term;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use waypost::engine::{Engine, EngineEvent};
use waypost::position::{PositionFix, PositionObservation};
use waypost::scheduler::CycleEvent;
use waypost::view::SortMode;

use crate::error::CliError;

use super::common;

/// Arguments for `waypost watch`.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Path to the catalog JSON (overrides the config file)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Fixed origin latitude
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Fixed origin longitude
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Replay file: JSON array of {latitude, longitude, hold_secs}
    #[arg(long, conflicts_with_all = ["lat", "lon"])]
    pub replay: Option<PathBuf>,

    /// Sort order
    #[arg(long, default_value = "walking-time")]
    pub sort: SortMode,

    /// Maximum places to print per refresh
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

/// One step of a replayed walk.
#[derive(Debug, Deserialize)]
struct ReplayPoint {
    latitude: f64,
    longitude: f64,
    /// How long to stay at this point before moving on.
    #[serde(default = "default_hold_secs")]
    hold_secs: u64,
}

fn default_hold_secs() -> u64 {
    10
}

/// Run the watch command.
pub async fn run(config_path: Option<&Path>, args: WatchArgs) -> Result<(), CliError> {
    let config = common::load_config(config_path)?;
    let catalog = common::load_catalog(&config, args.catalog.as_deref()).await?;
    let engine = common::build_engine(&config, catalog)?;
    engine.set_sort(args.sort);

    let route = load_route(&args)?;

    let cancel = CancellationToken::new();
    let ctrlc_cancel = cancel.clone();
    ctrlc::set_handler(move || ctrlc_cancel.cancel())
        .map_err(|e| CliError::Config(format!("failed to install Ctrl-C handler: {}", e)))?;

    let (tx, rx) = mpsc::channel(8);
    engine.start_tracking(rx);
    tokio::spawn(feed_positions(route, tx, cancel.clone()));

    watch_loop(&engine, args.limit, cancel).await;
    engine.shutdown();
    Ok(())
}

fn load_route(args: &WatchArgs) -> Result<Vec<ReplayPoint>, CliError> {
    if let Some(path) = &args.replay {
        let bytes = std::fs::read(path)?;
        let route: Vec<ReplayPoint> = serde_json::from_slice(&bytes)
            .map_err(|e| CliError::Replay(e.to_string()))?;
        if route.is_empty() {
            return Err(CliError::Replay("replay file holds no points".to_string()));
        }
        return Ok(route);
    }
    match (args.lat, args.lon) {
        (Some(latitude), Some(longitude)) => Ok(vec![ReplayPoint {
            latitude,
            longitude,
            hold_secs: u64::MAX,
        }]),
        _ => Err(CliError::Config(
            "watch needs either --lat/--lon or --replay".to_string(),
        )),
    }
}

/// Send the route's fixes into the tracker, holding at each point.
async fn feed_positions(
    route: Vec<ReplayPoint>,
    tx: mpsc::Sender<PositionObservation>,
    cancel: CancellationToken,
) {
    for point in route {
        let observation = PositionFix::new(point.latitude, point.longitude)
            .map_err(|e| waypost::position::ObservationError::Transient(e.to_string()));
        if tx.send(observation).await.is_err() {
            return;
        }
        if point.hold_secs == u64::MAX {
            // Fixed origin: hold forever; the periodic timer refreshes.
            cancel.cancelled().await;
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(Duration::from_secs(point.hold_secs)) => {}
        }
    }
    tracing::info!("replay finished; holding last position");
    cancel.cancelled().await;
}

/// Re-render on engine events until cancelled.
async fn watch_loop(engine: &Engine, limit: usize, cancel: CancellationToken) {
    let term = Term::stdout();
    let mut events = engine.subscribe();

    render(&term, engine, limit);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(
                    EngineEvent::FilterChanged
                    | EngineEvent::Cycle(CycleEvent::Progress { .. })
                    | EngineEvent::Cycle(CycleEvent::Completed(_)),
                ) => render(&term, engine, limit),
                Ok(_) => {}
                Err(_) => break,
            },
        }
    }
}

fn render(term: &Term, engine: &Engine, limit: usize) {
    let _ = term.clear_screen();
    if let Some(fix) = engine.position() {
        println!("origin {}", fix.coordinate);
    }
    common::render_places(engine, limit, false);
    common::render_status(engine);
}
