//! Line plot with several series on a shared y-axis

use super::{Chart, ChartConfig, ChartStyle};

/// Configuration for line plot
#[derive(Debug, Clone, Default)]
pub struct LinePlotConfig {
    /// Base chart config
    pub base: ChartConfig,
    /// Chart style
    pub style: ChartStyle,
    /// Labels printed under the first and last column
    pub x_labels: Option<(String, String)>,
}

#[derive(Debug, Clone)]
struct PlotSeries {
    name: String,
    values: Vec<f64>,
    /// Positions on a shared x-axis; `None` spreads the values evenly
    xs: Option<Vec<f64>>,
    marker: char,
}

/// Line plot for time series
///
/// Series added with x positions share one axis spanning the smallest to the
/// largest position. Series without positions are resampled to the full
/// width. Later series are drawn on top of earlier ones.
#[derive(Debug, Clone)]
pub struct LinePlot {
    series: Vec<PlotSeries>,
    config: LinePlotConfig,
}

impl LinePlot {
    /// Create a new line plot
    pub fn new(config: LinePlotConfig) -> Self {
        Self {
            series: Vec::new(),
            config,
        }
    }

    /// Add a series using the next default marker
    pub fn add_series(&mut self, name: &str, values: &[f64]) -> &mut Self {
        let marker = self.config.style.marker(self.series.len());
        self.add_series_with_marker(name, values, marker)
    }

    /// Add a series drawn with `marker`; non-finite values are skipped
    pub fn add_series_with_marker(&mut self, name: &str, values: &[f64], marker: char) -> &mut Self {
        self.series.push(PlotSeries {
            name: name.to_string(),
            values: values.to_vec(),
            xs: None,
            marker,
        });
        self
    }

    /// Add a series whose points sit at `xs` on the shared x-axis
    ///
    /// Points past the shorter of the two slices are ignored.
    pub fn add_series_at(&mut self, name: &str, xs: &[f64], values: &[f64], marker: char) -> &mut Self {
        let n = xs.len().min(values.len());
        self.series.push(PlotSeries {
            name: name.to_string(),
            values: values[..n].to_vec(),
            xs: Some(xs[..n].to_vec()),
            marker,
        });
        self
    }

    fn x_range(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .filter_map(|s| s.xs.as_ref())
            .flat_map(|xs| xs.iter().copied())
            .filter(|x| x.is_finite())
            .fold(None, |acc, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
    }

    fn value_range(&self) -> Option<(f64, f64)> {
        let finite = self
            .series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite());
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }

    fn width(&self) -> usize {
        let longest = self.series.iter().map(|s| s.values.len()).max().unwrap_or(0);
        let span = self
            .x_range()
            .map_or(0, |(lo, hi)| (hi - lo).round() as usize + 1);
        self.config.base.width.min(longest.max(span)).max(1)
    }
}

impl Chart for LinePlot {
    fn render(&self) -> String {
        let (min_val, max_val) = match self.value_range() {
            Some(range) => range,
            None => return String::from("No data to display"),
        };

        let mut output = String::new();
        let style = self.config.style;
        let height = self.config.base.height.max(2);
        let width = self.width();
        let range = if (max_val - min_val).abs() < f64::EPSILON {
            1.0
        } else {
            max_val - min_val
        };

        if let Some(ref title) = self.config.base.title {
            output.push_str(&format!("{}\n", title));
        }

        let to_row = |val: f64| {
            (((val - min_val) / range * (height - 1) as f64).round() as usize).min(height - 1)
        };
        let x_range = self.x_range();

        // grid[row][col], row 0 at the bottom
        let mut grid = vec![vec![' '; width]; height];
        for series in &self.series {
            if series.values.is_empty() {
                continue;
            }
            match (&series.xs, x_range) {
                (Some(xs), Some((x_min, x_max))) => {
                    let x_span = if x_max > x_min { x_max - x_min } else { 1.0 };
                    for (&x, &val) in xs.iter().zip(&series.values) {
                        if !x.is_finite() || !val.is_finite() {
                            continue;
                        }
                        let col = ((x - x_min) / x_span * (width - 1) as f64).round() as usize;
                        grid[to_row(val)][col.min(width - 1)] = series.marker;
                    }
                }
                _ => {
                    let step = series.values.len() as f64 / width as f64;
                    for col in 0..width {
                        let idx = ((col as f64 * step).floor() as usize).min(series.values.len() - 1);
                        let val = series.values[idx];
                        if val.is_finite() {
                            grid[to_row(val)][col] = series.marker;
                        }
                    }
                }
            }
        }

        for row in (0..height).rev() {
            if self.config.base.show_labels {
                let y_val = min_val + (row as f64 / (height - 1) as f64) * range;
                output.push_str(&format!("{:>10.2} {}", y_val, style.vertical()));
            }
            output.extend(grid[row].iter());
            output.push('\n');
        }

        if self.config.base.show_labels {
            output.push_str(&format!("{:>12}", style.corner()));
            output.extend(std::iter::repeat(style.horizontal()).take(width));
            output.push('\n');

            if let Some((ref first, ref last)) = self.config.x_labels {
                let gap = (width + 1).saturating_sub(first.len() + last.len()).max(1);
                output.push_str(&format!("{:>12}{}{}{}\n", "", first, " ".repeat(gap), last));
            }
        }

        if self.series.len() > 1 {
            let legend: Vec<String> = self
                .series
                .iter()
                .map(|s| format!("{} {}", s.marker, s.name))
                .collect();
            output.push_str(&format!("{:>12}{}\n", "", legend.join("   ")));
        }

        output
    }
}
