use plotly::common::Title;
use plotly::layout::{Axis, Layout};
use plotly::{Histogram, Plot};

use crate::trace::summary::TraceSummary;

/// Packet-length distribution of a trace.
pub fn length_histogram(lengths: Vec<u64>, summary: &TraceSummary) -> Plot {
    let mut plot = Plot::new();
    plot.add_trace(Histogram::new(lengths).name("packet length"));
    let title = format!(
        "Packet lengths ({} records, {} senders)",
        summary.records, summary.distinct_senders
    );
    plot.set_layout(
        Layout::new()
            .title(Title::new(&title))
            .x_axis(Axis::new().title(Title::new("Packet length")))
            .y_axis(Axis::new().title(Title::new("Count"))),
    );
    plot
}
