//! manhattan — contract-net taxi dispatch over Manhattan yellow-cab trips.
//!
//! Usage: `manhattan [config.json]`
//!
//! Without a config file the run uses the defaults below and a small
//! embedded sample of New Year's Eve trips.  Point `trips` in the config at
//! a full NYC TLC export to replay a real day; lower `sim.sample_fraction`
//! accordingly.
//!
//! Logging goes through `tracing`; set `RUST_LOG=sim=debug,dispatch=debug`
//! to follow individual contracts and trades.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use tx_core::{DispatchConfig, Projection, SimConfig};
use tx_dispatch::TaxiState;
use tx_field::{DemandField, FieldBuilder, FieldConfig};
use tx_output::{CsvWriter, RunStatistics, SimOutputObserver, StatsTracker};
use tx_sim::SimBuilder;
use tx_trips::{DATETIME_FORMAT, LoadReport, Trip, TripFeed, load_trips_csv, load_trips_reader};

// ── Embedded sample ───────────────────────────────────────────────────────────

const TRIPS_CSV: &str = "\
tpep_pickup_datetime,passenger_count,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude\n\
\"2015-01-01 00:00:48\",5,-73.975416,40.749569,-73.991482,40.725471\n\
2015-01-01 00:01:38,1,-74.007956,40.716659,-73.997016,40.716342\n\
2015-01-01 00:02:42,1,-73.977321,40.762780,-73.977905,40.749676\n\
2015-01-01 00:03:43,1,-73.966159,40.765328,-74.015613,40.713811\n\
\"2015-01-01 00:04:18\",1,-73.968438,40.779586,-73.981995,40.762368\n\
2015-01-01 00:04:52,2,-73.976919,40.753979,-73.987794,40.750074\n\
2015-01-01 00:05:47,1,-73.972690,40.773118,-74.000541,40.729129\n\
2015-01-01 00:06:11,1,-73.978536,40.744837,-73.976876,40.743559\n\
\"2015-01-01 00:07:25\",1,-73.987427,40.727642,-74.008755,40.712814\n\
2015-01-01 00:08:30,3,-73.983598,40.746621,-73.993830,40.726261\n\
2015-01-01 00:09:11,1,-74.001915,40.736631,-73.976308,40.745725\n\
2015-01-01 00:09:39,1,-73.979431,40.773045,-73.982770,40.750774\n\
\"2015-01-01 00:10:42\",1,-73.990284,40.749163,-73.975371,40.775334\n\
2015-01-01 00:11:43,3,-74.004098,40.718719,-74.001923,40.727584\n\
2015-01-01 00:12:54,2,-73.962648,40.799807,-73.987408,40.725232\n\
2015-01-01 00:13:52,1,-74.014378,40.711874,-73.994604,40.748622\n\
\"2015-01-01 00:14:51\",2,-73.964145,40.784387,-74.011171,40.714834\n\
2015-01-01 00:15:51,1,-74.011005,40.709427,-73.981714,40.765238\n\
2015-01-01 00:16:48,5,-73.969536,40.784577,-73.984178,40.743521\n\
2015-01-01 00:17:27,1,-73.967864,40.783238,-73.992906,40.725462\n\
\"2015-01-01 00:18:22\",1,-73.972274,40.771202,-73.990750,40.752391\n\
2015-01-01 00:18:45,1,-74.002508,40.718032,-73.989168,40.731476\n\
2015-01-01 00:19:30,2,-73.976091,40.746715,-73.980552,40.753172\n\
2015-01-01 00:20:36,1,-74.002246,40.719629,-73.969175,40.768123\n\
\"2015-01-01 00:21:00\",2,-73.987756,40.727541,-73.975756,40.776907\n\
2015-01-01 00:21:46,5,-74.004768,40.730914,-73.992235,40.733940\n\
2015-01-01 00:22:14,1,-73.979743,40.741317,-73.949620,40.798205\n\
2015-01-01 00:23:18,1,-73.966035,40.762269,-73.985053,40.751681\n\
\"2015-01-01 00:23:57\",1,-74.004791,40.709956,-73.976422,40.752366\n\
2015-01-01 00:24:37,1,-73.961341,40.799941,-73.972637,40.758241\n\
";

// ── Demo configuration ────────────────────────────────────────────────────────

/// Everything the run needs, loadable from one JSON file.  Missing keys
/// keep their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct DemoConfig {
    sim:        SimConfig,
    dispatch:   DispatchConfig,
    field:      FieldConfig,
    /// Idle taxis follow the demand field when set.
    use_field:  bool,
    taxis:      usize,
    /// Wall-clock instant of tick 0, in the trip file's datetime format.
    start:      String,
    projection: Projection,
    /// CSV trip file; the embedded sample when absent.
    trips:      Option<PathBuf>,
    output_dir: PathBuf,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig {
                total_ticks:           30 * 60, // 30 min of requests at 1 s per tick
                max_drain_ticks:       2 * 3_600,
                seed:                  42,
                sample_fraction:       1.0,
                output_interval_ticks: 60,
                ..SimConfig::default()
            },
            dispatch:   DispatchConfig::default(),
            field:      FieldConfig::default(),
            use_field:  true,
            taxis:      8,
            start:      "2015-01-01 00:00:00".into(),
            projection: Projection::MANHATTAN,
            trips:      None,
            output_dir: PathBuf::from("output/manhattan"),
        }
    }
}

fn load_config() -> Result<DemoConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DemoConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading config {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {path}"))
}

// ── Setup helpers ─────────────────────────────────────────────────────────────

fn load_trips(config: &DemoConfig, start: NaiveDateTime) -> Result<LoadReport> {
    let report = match &config.trips {
        Some(path) => load_trips_csv(path, &config.projection, start)
            .with_context(|| format!("loading trips from {}", path.display()))?,
        None => load_trips_reader(Cursor::new(TRIPS_CSV), &config.projection, start)?,
    };
    if report.trips.is_empty() {
        bail!("no usable trips ({} rows skipped)", report.skipped());
    }
    Ok(report)
}

/// Build the demand field from every loaded pickup, including those before
/// tick 0.
fn build_field(config: &DemoConfig, trips: &[Trip]) -> Result<DemandField> {
    let feed_end_ms = (config.sim.total_ticks * config.sim.tick_ms) as i64;
    let origin_ms = trips.iter().map(|t| t.announce_ms).min().unwrap_or(0).min(0);
    let end_ms = trips.iter().map(|t| t.announce_ms + 1).max().unwrap_or(0).max(feed_end_ms);

    let mut builder = FieldBuilder::new(config.projection.bounds(), config.field.clone(), origin_ms, end_ms)?;
    for trip in trips {
        builder.add_pickup(trip.announce_ms, trip.pickup);
    }
    Ok(builder.build())
}

fn print_statistics(stats: &RunStatistics, elapsed_secs: f64) {
    println!("Simulation complete in {elapsed_secs:.3} s ({} ticks)", stats.ticks);
    println!();
    println!("  customers announced  : {}", stats.customers_announced);
    println!("  rejected (too large) : {}", stats.customers_rejected);
    println!("  taken by a taxi      : {}", stats.customers_taken);
    println!("  picked up            : {} ({} on time)", stats.pickups, stats.on_time_pickups);
    println!("  delivered            : {}", stats.deliveries);
    println!(
        "  waiting time (s)     : mean {:.1}  p50 {:.1}  p90 {:.1}  max {:.1}",
        stats.waiting_ms.mean / 1_000.0,
        stats.waiting_ms.p50 / 1_000.0,
        stats.waiting_ms.p90 / 1_000.0,
        stats.waiting_ms.max / 1_000.0,
    );
    println!("  requests per pickup  : {:.2}", stats.requests_before_pickup as f64 / stats.pickups.max(1) as f64);
    println!("  travel overhead      : {:.3}", stats.travel_overhead);
    println!("  trades               : {} (profit {:.3})", stats.trades, stats.trade_profit_total);
    println!("  mean idle taxis      : {:.2}", stats.mean_idle_taxis);
    println!("  mean waiting         : {:.2} (max {})", stats.mean_waiting_customers, stats.max_waiting_customers);
    println!("  distance travelled   : {:.2} ({:.2} idle)", stats.distance_total, stats.idle_distance_total);
    println!();
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let start = NaiveDateTime::parse_from_str(&config.start, DATETIME_FORMAT)
        .with_context(|| format!("bad start datetime {:?}", config.start))?;

    println!("=== manhattan — contract-net taxi dispatch ===");
    println!(
        "Taxis: {}  |  Feed: {} ticks of {} ms  |  Seed: {}  |  Field: {}  |  Trading: {}",
        config.taxis,
        config.sim.total_ticks,
        config.sim.tick_ms,
        config.sim.seed,
        if config.use_field { "on" } else { "off" },
        if config.dispatch.trading_enabled { "on" } else { "off" },
    );
    println!();

    // 1. Trips.
    let report = load_trips(&config, start)?;
    println!(
        "Loaded {} trips ({} malformed, {} outside the area)",
        report.trips.len(),
        report.malformed,
        report.out_of_area
    );

    // 2. Demand field from the whole history.
    let field = if config.use_field {
        let field = build_field(&config, &report.trips)?;
        println!("Demand field: {} cells × {} frames", field.shape().cell_count(), field.frames());
        Some(field)
    } else {
        None
    };

    // 3. Only trips at or after tick 0 become live requests.
    let feed = TripFeed::from_trips(report.trips.iter().copied().filter(|t| t.announce_ms >= 0));
    println!("Feeding {} trips at sample fraction {}", feed.len(), config.sim.sample_fraction);
    println!();

    // 4. Build.
    let mut builder = SimBuilder::new(config.sim.clone(), config.dispatch.clone(), config.projection.bounds())
        .trips(feed)
        .taxis(config.taxis);
    if let Some(field) = field {
        builder = builder.field(field);
    }
    let mut sim = builder.build()?;

    // 5. Output.
    let out_dir: &Path = &config.output_dir;
    std::fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let writer = CsvWriter::new(out_dir)?;
    let mut obs = (SimOutputObserver::new(writer), StatsTracker::new());

    // 6. Run.
    let t0 = Instant::now();
    let end = sim.run(&mut obs)?;
    let elapsed = t0.elapsed();

    let (mut output, tracker) = obs;
    if let Some(e) = output.take_error() {
        eprintln!("output error: {e}");
    }

    // 7. Summary.
    let stats = tracker.finish();
    print_statistics(&stats, elapsed.as_secs_f64());
    let stats_path = out_dir.join("stats.json");
    stats.write_json(&stats_path)?;
    println!("Wrote {}", stats_path.display());
    println!("Ended at {end}; {} customers still outstanding", sim.customers().count());
    println!();

    // 8. Final fleet table.
    println!("{:<6} {:<6} {:>10} {:>10} {:>10}", "Taxi", "State", "Open", "Distance", "Idle");
    println!("{}", "-".repeat(46));
    for (taxi, idle) in sim.taxis().iter().zip(&stats.idle_distance) {
        println!(
            "{:<6} {:<6} {:>10} {:>10.2} {:>10.2}",
            taxi.id().index(),
            match taxi.state() {
                TaxiState::Idle => "idle",
                TaxiState::Busy => "busy",
            },
            taxi.assigned().len(),
            taxi.distance_travelled(),
            idle,
        );
    }

    Ok(())
}
