//! CLI entry point for the foot-traffic predictor.
//!
//! Provides subcommands for a full prediction and for inspecting each of the
//! three upstream signals on its own. Every subcommand prints JSON to stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use foot_traffic::config::{ScoringConfig, Settings};
use foot_traffic::geo::Coordinate;
use foot_traffic::infra::{area_provider_from_settings, narrator_from_settings, providers_from_settings};
use foot_traffic::output::{print_json, print_pretty};
use foot_traffic::predict::{DEFAULT_PLACE_QUERY, PredictionRequest, Predictor, guarded};
use foot_traffic::scoring::combine::{Combiner, Strategy};
use foot_traffic::scoring::types::RequestTime;
use foot_traffic::services::{AreaQuery, Bounds, EventsQuery, FootTrafficQuery, WeatherQuery};
use foot_traffic::summary::Summarizer;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_LATITUDE: f64 = 37.7749;
const DEFAULT_LONGITUDE: f64 = -122.4194;

#[derive(Parser)]
#[command(name = "foot_traffic")]
#[command(about = "Predict foot-traffic favorability for a place and time", long_about = None)]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine weather, events and popular times into a 0-100 score
    Predict {
        #[arg(long, default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true)]
        longitude: f64,

        /// ISO-8601 date or date/time (e.g. 2024-06-02T12:00)
        #[arg(short, long)]
        date: Option<String>,

        /// Place to look up events and popular times for
        #[arg(short, long, default_value = DEFAULT_PLACE_QUERY)]
        place_query: String,

        /// How the three signals are combined
        #[arg(short, long, value_enum, default_value_t = Strategy::Heuristic)]
        strategy: Strategy,

        /// Add a natural-language summary
        #[arg(long, default_value_t = false)]
        summary: bool,

        /// JSON file overriding scoring constants
        #[arg(long)]
        scoring_config: Option<String>,
    },
    /// Fetch the hourly forecast on its own
    Weather {
        #[arg(long, default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true)]
        latitude: f64,

        #[arg(long, default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true)]
        longitude: f64,

        #[arg(short, long)]
        date: Option<String>,
    },
    /// Search nearby events on their own
    Events {
        #[arg(short, long, default_value = DEFAULT_PLACE_QUERY)]
        query: String,

        #[arg(short, long)]
        date: Option<String>,

        /// Optional origin for event distances (requires --longitude)
        #[arg(long, allow_negative_numbers = true, requires = "longitude")]
        latitude: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "latitude")]
        longitude: Option<f64>,
    },
    /// Fetch the normalized popular-times profile on its own, or the average
    /// busyness of every place inside a map rectangle
    FootTraffic {
        #[arg(short, long, default_value = DEFAULT_PLACE_QUERY)]
        place_query: String,

        /// Date/time selecting a single (weekday, hour) slot
        #[arg(short, long)]
        date: Option<String>,

        /// South-west latitude of an area search
        #[arg(
            long,
            allow_negative_numbers = true,
            requires_all = ["sw_lng", "ne_lat", "ne_lng"],
            conflicts_with_all = ["place_query", "date"]
        )]
        sw_lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "sw_lat")]
        sw_lng: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "sw_lat")]
        ne_lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "sw_lat")]
        ne_lng: Option<f64>,

        /// Place types for an area search, comma separated
        #[arg(long, value_delimiter = ',', requires = "sw_lat")]
        types: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/foot_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("foot_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Predict {
            latitude,
            longitude,
            date,
            place_query,
            strategy,
            summary,
            scoring_config,
        } => {
            let scoring = match scoring_config {
                Some(path) => ScoringConfig::load(&path)?,
                None => ScoringConfig::default(),
            };
            let request = PredictionRequest::new(latitude, longitude, date.as_deref(), &place_query)?;

            let predictor = Predictor::new(providers_from_settings(&settings)?, Combiner::for_strategy(strategy))
                .with_scoring(scoring)?
                .with_provider_timeout(settings.provider_timeout);
            info!(strategy = ?predictor.combiner().strategy(), "Predictor ready");

            let mut result = predictor
                .predict_within(&request, settings.request_timeout)
                .await?;

            if summary {
                let backend = narrator_from_settings(&settings).unwrap_or_else(|e| {
                    warn!(error = %e, "Narrative backend unavailable, using template");
                    None
                });
                let text = Summarizer::new(backend)
                    .with_timeout(settings.provider_timeout)
                    .summarize(&result)
                    .await;
                result = result.with_summary(text);
            }

            print_pretty(&result);
            print_json(&result, cli.pretty)?;
        }
        Commands::Weather {
            latitude,
            longitude,
            date,
        } => {
            let query = WeatherQuery {
                coordinate: Coordinate::new(latitude, longitude)?,
                date: RequestTime::parse(date.as_deref()).date,
            };
            let providers = providers_from_settings(&settings)?;
            let result = guarded("weather", settings.provider_timeout, providers.weather.forecast(&query)).await;
            print_json(&result, cli.pretty)?;
        }
        Commands::Events {
            query,
            date,
            latitude,
            longitude,
        } => {
            let origin = match (latitude, longitude) {
                (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)?),
                _ => None,
            };
            let query = EventsQuery {
                query,
                date: RequestTime::parse(date.as_deref()).date,
                origin,
            };
            let providers = providers_from_settings(&settings)?;
            let result = guarded("events", settings.provider_timeout, providers.events.events(&query)).await;
            print_json(&result, cli.pretty)?;
        }
        Commands::FootTraffic {
            place_query,
            date,
            sw_lat,
            sw_lng,
            ne_lat,
            ne_lng,
            types,
        } => {
            if let (Some(sw_lat), Some(sw_lng), Some(ne_lat), Some(ne_lng)) = (sw_lat, sw_lng, ne_lat, ne_lng) {
                let query = AreaQuery::new(Bounds::new(sw_lat, sw_lng, ne_lat, ne_lng)?, &types);
                let provider = area_provider_from_settings(&settings)?;
                let result = guarded("area_foot_traffic", settings.provider_timeout, provider.area_popular_times(&query)).await;
                print_json(&result, cli.pretty)?;
            } else {
                let query = FootTrafficQuery {
                    place_query,
                    slot: RequestTime::parse(date.as_deref()).slot,
                };
                let providers = providers_from_settings(&settings)?;
                let result = guarded("foot_traffic", settings.provider_timeout, providers.foot.popular_times(&query)).await;
                print_json(&result, cli.pretty)?;
            }
        }
    }

    Ok(())
}
