//! Percentage-change comparison of two forecasts

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::forecast::ForecastResult;

/// Who wins when both changes are equal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The first selection wins only when strictly greater
    #[default]
    PreferSecond,
    /// The second selection wins only when strictly greater
    PreferFirst,
}

/// Percentage change from `last_actual` to `last_predicted`
pub fn pct_change(last_actual: f64, last_predicted: f64) -> Result<f64> {
    if !last_actual.is_finite() || !last_predicted.is_finite() {
        return Err(Error::InvalidComparison(format!(
            "non-finite input (last actual {}, last predicted {})",
            last_actual, last_predicted
        )));
    }
    if last_actual == 0.0 {
        return Err(Error::InvalidComparison(
            "last actual value is zero; percentage change is undefined".into(),
        ));
    }
    let pct = (last_predicted - last_actual) / last_actual * 100.0;
    if !pct.is_finite() {
        return Err(Error::InvalidComparison(format!(
            "percentage change overflowed ({} -> {})",
            last_actual, last_predicted
        )));
    }
    Ok(pct)
}

/// Outcome of comparing two forecasts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonVerdict {
    pub label_a: String,
    pub change_a: f64,
    pub label_b: String,
    pub change_b: f64,
    pub winner: String,
    pub winner_change: f64,
    /// Both changes were equal and the tie-break decided
    pub tied: bool,
}

impl ComparisonVerdict {
    /// Human-readable verdict, e.g. "The best trending stock is AAPL with an
    /// estimated increase of 12.35%."
    pub fn message(&self, kind: &str) -> String {
        format!(
            "The best trending {} is {} with an estimated increase of {:.2}%.",
            kind, self.winner, self.winner_change
        )
    }
}

/// Picks the selection with the larger forecast change
#[derive(Debug, Clone, Copy, Default)]
pub struct ComparisonEngine {
    tie_break: TieBreak,
}

impl ComparisonEngine {
    pub fn new(tie_break: TieBreak) -> Self {
        ComparisonEngine { tie_break }
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Compare the furthest-future prediction of each result against its last
    /// observed value
    pub fn compare(
        &self,
        result_a: &ForecastResult,
        last_actual_a: f64,
        label_a: &str,
        result_b: &ForecastResult,
        last_actual_b: f64,
        label_b: &str,
    ) -> Result<ComparisonVerdict> {
        let predicted = |result: &ForecastResult, label: &str| {
            result.last_predicted().ok_or_else(|| {
                Error::InvalidComparison(format!("forecast for {} has no rows", label))
            })
        };

        let change_a = pct_change(last_actual_a, predicted(result_a, label_a)?)
            .map_err(|e| labelled(e, label_a))?;
        let change_b = pct_change(last_actual_b, predicted(result_b, label_b)?)
            .map_err(|e| labelled(e, label_b))?;

        let tied = change_a == change_b;
        let a_wins = match self.tie_break {
            TieBreak::PreferSecond => change_a > change_b,
            TieBreak::PreferFirst => change_a >= change_b,
        };
        let (winner, winner_change) = if a_wins {
            (label_a, change_a)
        } else {
            (label_b, change_b)
        };

        log::info!(
            "comparison: {} {:+.2}% vs {} {:+.2}% -> {}",
            label_a,
            change_a,
            label_b,
            change_b,
            winner
        );

        Ok(ComparisonVerdict {
            label_a: label_a.to_string(),
            change_a,
            label_b: label_b.to_string(),
            change_b,
            winner: winner.to_string(),
            winner_change,
            tied,
        })
    }
}

fn labelled(err: Error, label: &str) -> Error {
    match err {
        Error::InvalidComparison(reason) => Error::InvalidComparison(format!("{}: {}", label, reason)),
        other => other,
    }
}
