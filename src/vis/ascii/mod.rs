//! Text charts for terminal output
//!
//! Line plots for series and forecasts, sparklines for compact component rows.

mod charts;
mod sparkline;

pub use charts::{LinePlot, LinePlotConfig};
pub use sparkline::{MultiSparkline, Sparkline};

/// Chart rendering trait
pub trait Chart {
    /// Render the chart to a string
    fn render(&self) -> String;
}

/// Common chart configuration
#[derive(Debug, Clone)]
pub struct ChartConfig {
    /// Chart width in characters
    pub width: usize,
    /// Chart height in characters
    pub height: usize,
    /// Show axis labels
    pub show_labels: bool,
    pub title: Option<String>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 60,
            height: 12,
            show_labels: true,
            title: None,
        }
    }
}

/// Character set used for axes and markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartStyle {
    /// Plain ASCII
    Ascii,
    /// Unicode box drawing and markers
    #[default]
    Unicode,
}

impl ChartStyle {
    /// Marker for the n-th series
    pub fn marker(&self, n: usize) -> char {
        const UNICODE: [char; 4] = ['●', '○', '·', '◆'];
        const ASCII: [char; 4] = ['*', 'o', '.', '+'];
        match self {
            ChartStyle::Unicode => UNICODE[n % UNICODE.len()],
            ChartStyle::Ascii => ASCII[n % ASCII.len()],
        }
    }

    fn vertical(&self) -> char {
        match self {
            ChartStyle::Unicode => '│',
            ChartStyle::Ascii => '|',
        }
    }

    fn horizontal(&self) -> char {
        match self {
            ChartStyle::Unicode => '─',
            ChartStyle::Ascii => '-',
        }
    }

    fn corner(&self) -> char {
        match self {
            ChartStyle::Unicode => '└',
            ChartStyle::Ascii => '+',
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_config_default() {
        let config = ChartConfig::default();
        assert_eq!(config.width, 60);
        assert_eq!(config.height, 12);
        assert!(config.show_labels);
    }

    #[test]
    fn test_markers_cycle() {
        assert_eq!(ChartStyle::Ascii.marker(0), '*');
        assert_eq!(ChartStyle::Ascii.marker(4), '*');
        assert_ne!(ChartStyle::Unicode.marker(0), ChartStyle::Unicode.marker(1));
    }
}
