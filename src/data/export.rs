use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::bench::sweep::SweepResult;
use crate::error::Result;

pub fn save_sweep_json(result: &SweepResult, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, result)?;
    writer.flush()?;
    Ok(())
}

pub fn load_sweep_json(path: &Path) -> Result<SweepResult> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Load a sweep from either format, picking by file extension.
pub fn load_sweep(path: &Path) -> Result<SweepResult> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_sweep_json(path),
        _ => crate::data::sqlite::load_sweep_sqlite(path),
    }
}
