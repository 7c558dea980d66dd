use comfy_table::{presets::UTF8_FULL, Cell, Table};

use crate::bench::sweep::SweepResult;

/// Terminal table of a sweep: one row per (parameter, algorithm).
pub fn sweep_table(result: &SweepResult) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec![
        "Parameter",
        "Method",
        "Trials",
        "Updates/ms",
        "± stddev",
        "Space (bytes)",
        "Recall",
        "Precision",
        "Freq RE",
    ]);

    for point in &result.points {
        for name in &result.algorithms {
            let mut row = vec![Cell::new(point.parameter), Cell::new(name)];
            match point.records.get(name) {
                Some(rec) => {
                    row.push(Cell::new(format!("{}/{}", rec.trials, point.attempted)));
                    row.push(Cell::new(format!("{:.2}", rec.updates_per_ms)));
                    row.push(Cell::new(format!("{:.2}", rec.updates_per_ms_stddev)));
                    row.push(Cell::new(format!("{:.0}", rec.space_bytes)));
                    match &rec.accuracy {
                        Some(acc) => {
                            row.push(Cell::new(format!("{:.2}", acc.recall.mean)));
                            row.push(Cell::new(format!("{:.2}", acc.precision.mean)));
                            row.push(Cell::new(format!("{:.3}", acc.freq_rel_error.mean)));
                        }
                        None => row.extend((0..3).map(|_| Cell::new("-"))),
                    }
                }
                None => {
                    row.push(Cell::new(format!("0/{}", point.attempted)));
                    row.extend((0..6).map(|_| Cell::new("-")));
                }
            }
            table.add_row(row);
        }
    }
    table
}
