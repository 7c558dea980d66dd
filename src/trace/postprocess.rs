//! Reduce raw capture dumps to `<sender_id> <packet_length>` traces.
//!
//! Raw lines are whitespace separated; field 1 is a dotted sender address
//! and the last field is the packet length. Everything else is ignored.

use std::io::{self, BufRead, Write};

use tracing::{debug, warn};

use crate::error::{HarnessError, Result};
use crate::trace::record::TraceRecord;

const SENDER_FIELD: usize = 1;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReduceError {
    #[error("line has no sender field")]
    MissingSender,
    #[error("sender {0:?} is not numeric once dots are removed")]
    BadSender(String),
    #[error("packet length {0:?} is not a non-negative integer")]
    BadLength(String),
    #[error("domain modulus must be at least 1")]
    ZeroModulus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostprocessStats {
    pub emitted: u64,
    pub skipped: u64,
}

/// Turn one raw line into a trace record reduced modulo `domain_modulus`.
pub fn reduce(raw_line: &str, domain_modulus: u64) -> std::result::Result<TraceRecord, ReduceError> {
    if domain_modulus == 0 {
        return Err(ReduceError::ZeroModulus);
    }
    let fields: Vec<&str> = raw_line.split_whitespace().collect();
    let sender = fields.get(SENDER_FIELD).ok_or(ReduceError::MissingSender)?;
    // Dotted quads collapse to one integer: "10.0.0.1" -> 10001.
    let digits: String = sender.chars().filter(|c| *c != '.').collect();
    let sender_id = digits
        .parse::<u128>()
        .map_err(|_| ReduceError::BadSender(sender.to_string()))?;

    let length = fields[fields.len() - 1];
    let packet_length = length
        .parse::<u128>()
        .map_err(|_| ReduceError::BadLength(length.to_string()))?;

    let modulus = u128::from(domain_modulus);
    Ok(TraceRecord::new(
        (sender_id % modulus) as u64,
        (packet_length % modulus) as u64,
    ))
}

/// Reduce every line of `input` into `output`, skipping (and logging) bad ones.
pub fn postprocess<R: BufRead, W: Write>(
    input: R,
    output: &mut W,
    domain_modulus: u64,
) -> Result<PostprocessStats> {
    if domain_modulus == 0 {
        return Err(HarnessError::InvalidConfig(
            "domain modulus must be at least 1".into(),
        ));
    }
    let mut stats = PostprocessStats::default();
    for (idx, line) in input.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!(line = idx + 1, error = %e, "skipping undecodable line");
                stats.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if line.trim().is_empty() {
            continue;
        }
        match reduce(&line, domain_modulus) {
            Ok(record) => {
                writeln!(output, "{record}")?;
                stats.emitted += 1;
            }
            Err(e) => {
                warn!(line = idx + 1, error = %e, "skipping malformed capture line");
                stats.skipped += 1;
            }
        }
    }
    output.flush()?;
    debug!(emitted = stats.emitted, skipped = stats.skipped, "postprocess finished");
    Ok(stats)
}
