//! Integration tests for tx-output.

#[cfg(test)]
mod csv_tests {
    use tempfile::TempDir;

    use crate::csv::{CsvWriter, SNAPSHOT_HEADER, SUMMARY_HEADER};
    use crate::row::{TaxiSnapshotRow, TickSummaryRow};
    use crate::writer::OutputWriter;

    fn tmp() -> TempDir {
        tempfile::tempdir().expect("create temp dir")
    }

    fn snap_row(taxi_id: u32, tick: u64) -> TaxiSnapshotRow {
        TaxiSnapshotRow {
            taxi_id,
            tick,
            x:           taxi_id as f64 + 0.5,
            y:           1.25,
            busy:        taxi_id % 2 == 1,
            assigned:    taxi_id,
            load:        0,
            idle_travel: 0.0,
        }
    }

    fn summary_row(tick: u64) -> TickSummaryRow {
        TickSummaryRow {
            tick,
            sim_time_ms: tick as i64 * 1_000,
            announced: 2,
            pickups: 1,
            deliveries: 0,
            trades: 0,
            waiting_customers: 3,
            riding_customers: 1,
            idle_taxis: 4,
            busy_taxis: 2,
            messages: 17,
        }
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("taxi_snapshots.csv").exists());
        assert!(dir.path().join("tick_summaries.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("taxi_snapshots.csv")).unwrap();
        let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers, SNAPSHOT_HEADER);

        let mut rdr2 = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        let headers2: Vec<_> = rdr2.headers().unwrap().iter().map(str::to_owned).collect();
        assert_eq!(headers2, SUMMARY_HEADER);
    }

    #[test]
    fn csv_snapshot_rows() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_snapshots(&[snap_row(0, 5), snap_row(1, 5), snap_row(2, 5)]).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("taxi_snapshots.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][0], "1");      // taxi_id
        assert_eq!(&rows[1][1], "5");      // tick
        assert_eq!(&rows[1][2], "1.5000"); // x
        assert_eq!(&rows[1][4], "1");      // busy
        assert_eq!(&rows[2][4], "0");
    }

    #[test]
    fn csv_tick_summary_rows() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_tick_summary(&summary_row(3)).unwrap();
        w.finish().unwrap();

        let mut rdr = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap();
        let rows: Vec<_> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "3");
        assert_eq!(&rows[0][1], "3000");
        assert_eq!(&rows[0][10], "17");
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod sqlite_tests {
    use rusqlite::Connection;

    use crate::row::{TaxiSnapshotRow, TickSummaryRow};
    use crate::sqlite::SqliteWriter;
    use crate::writer::OutputWriter;

    #[test]
    fn rows_land_in_tables() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = SqliteWriter::new(dir.path()).unwrap();
        let snap = TaxiSnapshotRow {
            taxi_id: 3, tick: 10, x: 1.0, y: 2.0, busy: true, assigned: 2, load: 1, idle_travel: 0.5,
        };
        w.write_snapshots(&[snap, TaxiSnapshotRow { taxi_id: 4, ..snap }]).unwrap();
        w.write_tick_summary(&TickSummaryRow {
            tick: 10, sim_time_ms: 10_000, announced: 1, pickups: 0, deliveries: 0, trades: 0,
            waiting_customers: 1, riding_customers: 0, idle_taxis: 3, busy_taxis: 2, messages: 9,
        })
        .unwrap();
        w.finish().unwrap();

        let conn = Connection::open(dir.path().join("output.db")).unwrap();
        let snaps: i64 = conn.query_row("SELECT COUNT(*) FROM taxi_snapshots", [], |r| r.get(0)).unwrap();
        assert_eq!(snaps, 2);
        let messages: i64 = conn.query_row("SELECT messages FROM tick_summaries WHERE tick = 10", [], |r| r.get(0)).unwrap();
        assert_eq!(messages, 9);
    }
}

#[cfg(test)]
mod stats_tests {
    use tx_core::{CustomerId, Point, TaxiId, Tick};
    use tx_dispatch::RequestInfo;
    use tx_sim::{SimEvent, SimObserver, TickSummary};

    use crate::{Distribution, RunStatistics, StatsTracker};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_distribution_is_zero() {
        assert_eq!(Distribution::from_samples(&[]), Distribution::default());
    }

    #[test]
    fn nearest_rank_percentiles() {
        let samples: Vec<f64> = (1..=10).rev().map(f64::from).collect();
        let d = Distribution::from_samples(&samples);
        assert_eq!(d.count, 10);
        assert!(close(d.mean, 5.5));
        assert!(close(d.min, 1.0));
        assert!(close(d.p50, 5.0));
        assert!(close(d.p90, 9.0));
        assert!(close(d.max, 10.0));
    }

    #[test]
    fn tracker_folds_events() {
        let c = CustomerId(0);
        let t = TaxiId(1);
        let request = RequestInfo { id: c, pickup: Point::new(0.0, 0.0), delivery: Point::new(1.0, 0.0), capacity: 1 };
        let mut tracker = StatsTracker::new();
        let events = [
            SimEvent::Announced { request, announce_ms: 0 },
            SimEvent::Rejected { announce_ms: 0, seats: 8 },
            SimEvent::Requested { customer: c, attempt: 1 },
            SimEvent::Taken { customer: c, taxi: t },
            SimEvent::PickedUp { customer: c, taxi: t, at_ms: 4_000, waiting_ms: 4_000, requests_sent: 2, on_time: true },
            SimEvent::Delivered { customer: c, taxi: t, at_ms: 10_000, ride_ms: 6_000, direct_ms: 4_000 },
            SimEvent::Traded { customer: CustomerId(7), from: t, to: TaxiId(2), profit: 0.75 },
        ];
        for e in &events {
            tracker.on_event(Tick(0), e);
        }
        for (tick, idle, waiting) in [(0, 2, 1), (1, 1, 3)] {
            tracker.on_tick_end(&TickSummary {
                tick: Tick(tick),
                idle_taxis: idle,
                waiting_customers: waiting,
                ..TickSummary::default()
            });
        }

        let s = tracker.finish();
        assert_eq!(s.ticks, 2);
        assert_eq!((s.customers_announced, s.customers_rejected, s.customers_taken), (1, 1, 1));
        assert_eq!((s.pickups, s.on_time_pickups, s.deliveries), (1, 1, 1));
        assert_eq!(s.requests_before_pickup, 2);
        assert!(close(s.waiting_ms.mean, 4_000.0));
        assert!(close(s.travel_overhead, 1.5));
        assert!(close(s.mean_idle_taxis, 1.5));
        assert!(close(s.mean_waiting_customers, 2.0));
        assert_eq!(s.max_waiting_customers, 3);
        assert_eq!(s.trades, 1);
        assert!(close(s.trade_profit_total, 0.75));
    }

    #[test]
    fn overhead_defaults_to_one() {
        let s = StatsTracker::new().finish();
        assert!(close(s.travel_overhead, 1.0));
        assert_eq!(s.waiting_ms.count, 0);
    }

    #[test]
    fn json_dump() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stats.json");
        let stats = RunStatistics { pickups: 12, idle_distance: vec![1.0, 2.5], ..RunStatistics::default() };
        stats.write_json(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["pickups"], 12);
        assert_eq!(value["idle_distance"][1], 2.5);
        assert!(value["waiting_ms"]["p90"].is_number());
    }
}

#[cfg(test)]
mod observer_tests {
    use tempfile::TempDir;

    use tx_core::{Bounds, DispatchConfig, Point, SimConfig};
    use tx_sim::SimBuilder;
    use tx_trips::{Trip, TripFeed};

    use crate::{CsvWriter, SimOutputObserver, StatsTracker};

    #[test]
    fn full_run_writes_rows_and_statistics() {
        let dir: TempDir = tempfile::tempdir().unwrap();
        let config = SimConfig {
            tick_ms: 1_000,
            total_ticks: 5,
            max_drain_ticks: 100,
            seed: 3,
            sample_fraction: 1.0,
            output_interval_ticks: 2,
        };
        let dispatch = DispatchConfig { taxi_speed: 3_600.0, ..DispatchConfig::default() };
        let trip = Trip {
            announce_ms: 0,
            passengers:  1,
            pickup:      Point::new(2.0, 0.0),
            dropoff:     Point::new(2.0, 2.0),
        };
        let mut sim = SimBuilder::new(config, dispatch, Bounds::from_size(10.0, 10.0))
            .trips(TripFeed::from_trips([trip]))
            .taxis(2)
            .taxi_positions(vec![Point::new(0.0, 0.0), Point::new(9.0, 9.0)])
            .build()
            .unwrap();

        let mut obs = (SimOutputObserver::new(CsvWriter::new(dir.path()).unwrap()), StatsTracker::new());
        let end = sim.run(&mut obs).unwrap();
        assert!(obs.0.take_error().is_none());

        let stats = obs.1.finish();
        assert_eq!(stats.ticks, end.0);
        assert_eq!((stats.pickups, stats.deliveries), (1, 1));
        assert_eq!(stats.idle_distance.len(), 2);
        assert!(stats.distance_total >= 4.0);
        assert!(stats.travel_overhead >= 1.0);

        let summaries = csv::Reader::from_path(dir.path().join("tick_summaries.csv")).unwrap().records().count();
        assert_eq!(summaries as u64, end.0);

        // Snapshots every second tick, two taxis each.
        let snapshots = csv::Reader::from_path(dir.path().join("taxi_snapshots.csv")).unwrap().records().count();
        assert_eq!(snapshots as u64, end.0.div_ceil(2) * 2);
    }
}
