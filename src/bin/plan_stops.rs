//! Plan evenly distributed stops between two points and print the result
//! as JSON.
//!
//! Usage:
//!   GOOGLE_PLACES_API_KEY=... plan-stops --origin-lat 36.17 --origin-lon -115.14 \
//!       --dest-lat 39.53 --dest-lon -119.81 --max-stops 3

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use route_stops::cache::{DEFAULT_MAX_ENTRIES, RouteCache};
use route_stops::config::PlannerConfig;
use route_stops::error::{ConfigError, PlannerError};
use route_stops::haversine::StraightLineDirections;
use route_stops::models::{DEFAULT_MAX_STOPS, PlanRequest};
use route_stops::osrm::OsrmClient;
use route_stops::places::GooglePlacesClient;
use route_stops::planner::plan;
use route_stops::traits::DirectionsProvider;
use serde_json::json;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "plan-stops", about = "Pick evenly spaced stops along a trip")]
struct Args {
    #[arg(long, allow_negative_numbers = true)]
    origin_lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    origin_lon: f64,
    #[arg(long, allow_negative_numbers = true)]
    dest_lat: f64,
    #[arg(long, allow_negative_numbers = true)]
    dest_lon: f64,
    #[arg(long, default_value_t = DEFAULT_MAX_STOPS)]
    max_stops: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let request = PlanRequest {
        origin_lat: args.origin_lat,
        origin_lon: args.origin_lon,
        dest_lat: args.dest_lat,
        dest_lon: args.dest_lon,
        max_stops: args.max_stops,
    };

    match render(run(&request)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(output) => {
            println!("{output}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Plan(#[from] PlannerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start search pool: {0}")]
    SearchPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Maps a run to the text printed on stdout; `Err` means a non-zero exit.
fn render(result: Result<String, CliError>) -> Result<String, String> {
    result.map_err(|err| {
        tracing::error!(error = %err, "planning failed");
        json!({ "success": false, "error": err.to_string() }).to_string()
    })
}

fn run(request: &PlanRequest) -> Result<String, CliError> {
    let config = PlannerConfig::from_env()?;
    let places = GooglePlacesClient::new(config.places)?;
    let directions: Box<dyn DirectionsProvider> = match config.osrm {
        Some(osrm) => Box::new(OsrmClient::new(osrm)?),
        None => {
            tracing::info!("OSRM_BASE_URL not set, using straight-line routes");
            Box::new(StraightLineDirections)
        }
    };
    let cache = RouteCache::new(config.cache_ttl, DEFAULT_MAX_ENTRIES);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.options.max_concurrent_searches.max(1))
        .thread_name(|i| format!("stop-search-{i}"))
        .build()?;
    let options = config.options.with_search_pool(Arc::new(pool));

    let outcome = plan(request, &directions, &places, &options, Some(&cache))?;
    Ok(serde_json::to_string_pretty(&outcome.response)?)
}
