use hh_bench::bench::report::{Accuracy, Band};
use hh_bench::data::export::{load_sweep, save_sweep_json};
use hh_bench::data::sqlite::{load_sweep_sqlite, save_sweep_sqlite};
use hh_bench::plot::{html, tradeoff};
use hh_bench::{AggregatedRecord, SweepPoint, SweepResult};

fn record(u: f64, s: f64, accuracy: Option<Accuracy>) -> AggregatedRecord {
    AggregatedRecord {
        updates_per_ms: u,
        space_bytes: s,
        trials: 2,
        updates_per_ms_stddev: 0.5,
        accuracy,
    }
}

fn sample() -> SweepResult {
    let band = Band { mean: 0.9, p5: 0.8, p95: 1.0 };
    let acc = Accuracy { recall: band, precision: band, freq_rel_error: band };

    let mut high = SweepPoint::new(8.0);
    high.attempted = 2;
    high.located = 2;
    high.records.insert("DIMSUM".into(), record(900.0, 4096.0, Some(acc)));
    high.records.insert("IMSUM".into(), record(400.0, 2048.0, None));

    let mut low = SweepPoint::new(0.8);
    low.attempted = 2;
    low.timed_out = 1;
    low.records.insert("IMSUM".into(), record(350.0, 1024.0, None));
    low.missing.push("DIMSUM".into());

    let mut dead = SweepPoint::new(2.0);
    dead.attempted = 2;
    dead.missing = vec!["DIMSUM".into(), "IMSUM".into()];

    SweepResult {
        algorithms: vec!["DIMSUM".into(), "IMSUM".into()],
        points: vec![high, low, dead],
    }
}

#[test]
fn sqlite_round_trip_keeps_order_and_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.db");
    let original = sample();

    save_sweep_sqlite(&original, &path).unwrap();
    // Saving again replaces the file instead of appending.
    save_sweep_sqlite(&original, &path).unwrap();

    let loaded = load_sweep_sqlite(&path).unwrap();
    assert_eq!(loaded, original);
    assert_eq!(loaded.parameters(), vec![8.0, 0.8, 2.0]);
    assert!(loaded.get("DIMSUM", 0.8).is_none());
}

#[test]
fn json_round_trip_through_extension_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.json");
    let original = sample();

    save_sweep_json(&original, &path).unwrap();
    assert_eq!(load_sweep(&path).unwrap(), original);
}

#[test]
fn plot_pages_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let result = sample();
    let path = dir.path().join("space.html");
    html::write_page(&tradeoff::space_plot(&result), "Space vs Runtime", &path).unwrap();

    let page = std::fs::read_to_string(&path).unwrap();
    assert!(page.contains("<title>Space vs Runtime</title>"));
    assert!(page.contains("DIMSUM"));
}

#[test]
fn sqlite_algo_idx_points_into_algorithm_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sweep.db");
    save_sweep_sqlite(&sample(), &path).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let rows: Vec<(i64, String, String)> = conn
        .prepare(
            "SELECT r.point_idx, r.algorithm, a.name
             FROM sweep_results r JOIN sweep_algorithms a ON a.algo_idx = r.algo_idx
             ORDER BY r.point_idx, r.algo_idx",
        )
        .unwrap()
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap();

    // The 0.8 point only has IMSUM, which still sits at index 1.
    let low_idx: i64 = conn
        .query_row("SELECT algo_idx FROM sweep_results WHERE point_idx = 1", [], |row| row.get(0))
        .unwrap();
    assert_eq!(low_idx, 1);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|(_, algorithm, name)| algorithm == name));
}

#[test]
fn unknown_algorithm_in_records_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut result = sample();
    result.points[0].records.insert("CGT".into(), record(1.0, 1.0, None));
    assert!(save_sweep_sqlite(&result, &dir.path().join("sweep.db")).is_err());
}
