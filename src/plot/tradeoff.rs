//! Throughput/space trade-off curves from a sweep.

use plotly::common::{Mode, Title};
use plotly::layout::{Axis, AxisType, Layout};
use plotly::{Plot, Scatter};

use crate::bench::sweep::SweepResult;

/// x/y series for one algorithm; points without data are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

/// Space (bytes) against updates/ms, one series per algorithm.
pub fn space_series(result: &SweepResult) -> Vec<Series> {
    collect_series(result, |_, rec| (rec.space_bytes, rec.updates_per_ms))
}

/// Parameter against updates/ms, one series per algorithm.
pub fn parameter_series(result: &SweepResult) -> Vec<Series> {
    collect_series(result, |param, rec| (param, rec.updates_per_ms))
}

fn collect_series<F>(result: &SweepResult, pick: F) -> Vec<Series>
where
    F: Fn(f64, &crate::metrics::aggregate::AggregatedRecord) -> (f64, f64),
{
    result
        .algorithms
        .iter()
        .map(|name| {
            let (xs, ys) = result
                .series(name)
                .into_iter()
                .map(|(param, rec)| pick(param, rec))
                .unzip();
            Series {
                name: name.clone(),
                xs,
                ys,
            }
        })
        .collect()
}

fn build(series: Vec<Series>, title: &str, x_axis: Axis, y_label: &str) -> Plot {
    let mut plot = Plot::new();
    for s in series {
        let trace = Scatter::new(s.xs, s.ys)
            .mode(Mode::LinesMarkers)
            .name(&s.name);
        plot.add_trace(trace);
    }
    let layout = Layout::new()
        .title(Title::new(title))
        .x_axis(x_axis)
        .y_axis(Axis::new().title(Title::new(y_label)));
    plot.set_layout(layout);
    plot
}

pub fn space_plot(result: &SweepResult) -> Plot {
    build(
        space_series(result),
        "Sizes of Data Structure vs Runtime",
        Axis::new().title(Title::new("Space Used (Bytes)")),
        "Updates/ms",
    )
}

pub fn parameter_plot(result: &SweepResult, parameter_name: &str) -> Plot {
    build(
        parameter_series(result),
        &format!("Updates/ms across {parameter_name}"),
        Axis::new()
            .title(Title::new(parameter_name))
            .type_(AxisType::Log),
        "Updates/ms",
    )
}
