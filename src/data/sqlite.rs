//! SQLite persistence for sweep results.
//!
//! Grid order and mapping order are stored explicitly so a reloaded sweep
//! zips the same way the live one did. Points without data keep their row in
//! `sweep_points`.

use std::path::Path;

use indexmap::IndexMap;
use rusqlite::{params, Connection};
use tracing::info;

use crate::bench::report::Accuracy;
use crate::bench::sweep::{SweepPoint, SweepResult};
use crate::error::{HarnessError, Result};
use crate::metrics::aggregate::AggregatedRecord;

const SCHEMA: &str = "
    CREATE TABLE sweep_algorithms (
        algo_idx INTEGER PRIMARY KEY, name TEXT NOT NULL
    );
    CREATE TABLE sweep_points (
        point_idx INTEGER PRIMARY KEY, parameter REAL NOT NULL,
        attempted INTEGER, located INTEGER, timed_out INTEGER
    );
    CREATE TABLE sweep_results (
        point_idx INTEGER, algo_idx INTEGER, algorithm TEXT,
        trials INTEGER, updates_per_ms REAL, space_bytes REAL,
        updates_stddev REAL, accuracy BLOB
    );
";

/// Write `result` to a fresh database at `path`, replacing any old file.
pub fn save_sweep_sqlite(result: &SweepResult, path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    let mut conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    {
        let mut algo_stmt = tx.prepare("INSERT INTO sweep_algorithms (algo_idx, name) VALUES (?1, ?2)")?;
        for (i, name) in result.algorithms.iter().enumerate() {
            algo_stmt.execute(params![i as i64, name])?;
        }

        let mut point_stmt = tx.prepare(
            "INSERT INTO sweep_points (point_idx, parameter, attempted, located, timed_out)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        let mut result_stmt = tx.prepare(
            "INSERT INTO sweep_results
                (point_idx, algo_idx, algorithm, trials, updates_per_ms, space_bytes, updates_stddev, accuracy)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;

        for (p, point) in result.points.iter().enumerate() {
            point_stmt.execute(params![
                p as i64,
                point.parameter,
                point.attempted as i64,
                point.located as i64,
                point.timed_out as i64,
            ])?;
            for (name, rec) in &point.records {
                let algo_idx = result
                    .algorithms
                    .iter()
                    .position(|n| n == name)
                    .ok_or_else(|| {
                        HarnessError::InvalidConfig(format!("{name} is not one of the sweep's algorithms"))
                    })?;
                let accuracy_blob = rec.accuracy.as_ref().map(bincode::serialize).transpose()?;
                result_stmt.execute(params![
                    p as i64,
                    algo_idx as i64,
                    name,
                    rec.trials as i64,
                    rec.updates_per_ms,
                    rec.space_bytes,
                    rec.updates_per_ms_stddev,
                    accuracy_blob,
                ])?;
            }
        }
    }
    tx.commit()?;
    info!(path = %path.display(), points = result.points.len(), "saved sweep to sqlite");
    Ok(())
}

pub fn load_sweep_sqlite(path: &Path) -> Result<SweepResult> {
    let conn = Connection::open(path)?;

    let algorithms: Vec<String> = conn
        .prepare("SELECT name FROM sweep_algorithms ORDER BY algo_idx")?
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut points: Vec<SweepPoint> = conn
        .prepare("SELECT parameter, attempted, located, timed_out FROM sweep_points ORDER BY point_idx")?
        .query_map([], |row| {
            let mut point = SweepPoint::new(row.get(0)?);
            point.attempted = row.get::<_, i64>(1)? as usize;
            point.located = row.get::<_, i64>(2)? as usize;
            point.timed_out = row.get::<_, i64>(3)? as usize;
            Ok(point)
        })?
        .collect::<rusqlite::Result<_>>()?;

    let mut stmt = conn.prepare(
        "SELECT point_idx, algorithm, trials, updates_per_ms, space_bytes, updates_stddev, accuracy
         FROM sweep_results ORDER BY point_idx, algo_idx",
    )?;
    let mut rows = stmt.query([])?;
    let mut by_point: IndexMap<usize, IndexMap<String, AggregatedRecord>> = IndexMap::new();
    while let Some(row) = rows.next()? {
        let point_idx = row.get::<_, i64>(0)? as usize;
        let algorithm: String = row.get(1)?;
        let blob: Option<Vec<u8>> = row.get(6)?;
        let accuracy: Option<Accuracy> = blob.as_deref().map(bincode::deserialize).transpose()?;
        let record = AggregatedRecord {
            trials: row.get::<_, i64>(2)? as usize,
            updates_per_ms: row.get(3)?,
            space_bytes: row.get(4)?,
            updates_per_ms_stddev: row.get(5)?,
            accuracy,
        };
        by_point.entry(point_idx).or_default().insert(algorithm, record);
    }

    for (idx, point) in points.iter_mut().enumerate() {
        point.records = by_point.swap_remove(&idx).unwrap_or_default();
        point.missing = algorithms
            .iter()
            .filter(|name| !point.records.contains_key(name.as_str()))
            .cloned()
            .collect();
    }

    Ok(SweepResult { algorithms, points })
}
