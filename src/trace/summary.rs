use std::collections::HashSet;
use std::io::BufRead;

use serde::Serialize;
use tracing::warn;

use crate::error::Result;
use crate::trace::record::TraceRecord;

/// Shape of a trace file, as a sanity check before a long sweep.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TraceSummary {
    pub records: u64,
    pub skipped: u64,
    pub distinct_senders: usize,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub mean_length: Option<f64>,
    pub total_bytes: u128,
}

/// Scan a trace once; `keep_lengths` also returns every packet length for plotting.
pub fn summarize<R: BufRead>(input: R, keep_lengths: bool) -> Result<(TraceSummary, Vec<u64>)> {
    let mut summary = TraceSummary::default();
    let mut senders = HashSet::new();
    let mut lengths = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let Some(record) = TraceRecord::parse(&line) else {
            warn!(line = idx + 1, "skipping malformed trace line");
            summary.skipped += 1;
            continue;
        };
        summary.records += 1;
        summary.total_bytes += u128::from(record.packet_length);
        senders.insert(record.sender_id);
        summary.min_length = Some(summary.min_length.map_or(record.packet_length, |m| m.min(record.packet_length)));
        summary.max_length = Some(summary.max_length.map_or(record.packet_length, |m| m.max(record.packet_length)));
        if keep_lengths {
            lengths.push(record.packet_length);
        }
    }

    summary.distinct_senders = senders.len();
    if summary.records > 0 {
        summary.mean_length = Some(summary.total_bytes as f64 / summary.records as f64);
    }
    Ok((summary, lengths))
}
