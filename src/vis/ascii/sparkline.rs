//! Sparklines for compact inline series

use super::Chart;

/// A compact inline chart
#[derive(Debug, Clone)]
pub struct Sparkline {
    values: Vec<f64>,
    /// Custom range (None = auto)
    range: Option<(f64, f64)>,
}

impl Sparkline {
    /// Block characters for sparkline (8 levels)
    const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    /// Create a new sparkline
    pub fn new(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
            range: None,
        }
    }

    /// Create a sparkline of at most `width` points, sampled evenly
    pub fn sampled(values: &[f64], width: usize) -> Self {
        if width == 0 || values.len() <= width {
            return Self::new(values);
        }
        let step = values.len() as f64 / width as f64;
        let sampled: Vec<f64> = (0..width)
            .map(|i| values[((i as f64 * step).floor() as usize).min(values.len() - 1)])
            .collect();
        Self::new(&sampled)
    }

    /// Set custom range
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.range = Some((min, max));
        self
    }

    fn stats(&self) -> Option<(f64, f64, f64)> {
        let finite: Vec<f64> = self.values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }
        let min = finite.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = finite.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = finite.iter().sum::<f64>() / finite.len() as f64;
        Some((min, max, mean))
    }

    /// Sparkline followed by min, max and mean
    pub fn to_string_with_stats(&self) -> String {
        match self.stats() {
            Some((min, max, mean)) => format!(
                "{} (min: {:.2}, max: {:.2}, avg: {:.2})",
                self.render(),
                min,
                max,
                mean
            ),
            None => String::from("(empty)"),
        }
    }
}

impl Chart for Sparkline {
    fn render(&self) -> String {
        let (min, max) = match self.range.or_else(|| self.stats().map(|(lo, hi, _)| (lo, hi))) {
            Some(range) => range,
            None => return String::new(),
        };
        let range = if (max - min).abs() < f64::EPSILON {
            1.0
        } else {
            max - min
        };

        self.values
            .iter()
            .map(|&v| {
                if !v.is_finite() {
                    return ' ';
                }
                let normalized = ((v - min) / range).clamp(0.0, 1.0);
                let idx = (normalized * 7.0).round() as usize;
                Self::BLOCKS[idx.min(7)]
            })
            .collect()
    }
}

/// Named sparklines aligned under each other
#[derive(Debug, Clone, Default)]
pub struct MultiSparkline {
    series: Vec<(String, Sparkline)>,
}

impl MultiSparkline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series, sampled to `width` points
    pub fn add_series(&mut self, name: &str, values: &[f64], width: usize) {
        self.series
            .push((name.to_string(), Sparkline::sampled(values, width)));
    }
}

impl Chart for MultiSparkline {
    fn render(&self) -> String {
        let name_width = self
            .series
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);

        self.series
            .iter()
            .map(|(name, spark)| {
                format!(
                    "{:>width$} {}\n",
                    name,
                    spark.to_string_with_stats(),
                    width = name_width
                )
            })
            .collect()
    }
}
