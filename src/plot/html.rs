use std::fs;
use std::path::Path;

use plotly::Plot;
use tracing::info;

use crate::error::Result;

/// Wrap a plot in a standalone page that pulls plotly.js from the CDN.
pub fn render_page(plot: &Plot, title: &str) -> String {
    let plot_html = plot.to_inline_html(None);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://cdn.plot.ly/plotly-latest.min.js"></script>
</head>
<body>
{plot_html}
</body>
</html>
"#
    )
}

pub fn write_page(plot: &Plot, title: &str, path: &Path) -> Result<()> {
    fs::write(path, render_page(plot, title))?;
    info!(path = %path.display(), "wrote plot");
    Ok(())
}
