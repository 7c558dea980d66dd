use std::fmt;
use std::io::{self, Write};

/// One line of an estimator trace: `<sender_id> <packet_length>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceRecord {
    pub sender_id: u64,
    pub packet_length: u64,
}

impl TraceRecord {
    pub fn new(sender_id: u64, packet_length: u64) -> Self {
        Self {
            sender_id,
            packet_length,
        }
    }

    /// Parse a trace line; `None` if it is not two non-negative integers.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let sender_id = fields.next()?.parse().ok()?;
        let packet_length = fields.next()?.parse().ok()?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self::new(sender_id, packet_length))
    }
}

impl fmt::Display for TraceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.sender_id, self.packet_length)
    }
}

/// Stream records to `sink`, one per line. Returns the number written.
pub fn write_records<W, I>(sink: &mut W, records: I) -> io::Result<u64>
where
    W: Write,
    I: IntoIterator<Item = TraceRecord>,
{
    let mut written = 0u64;
    for record in records {
        writeln!(sink, "{record}")?;
        written += 1;
    }
    sink.flush()?;
    Ok(written)
}
