use chrono::{Months, NaiveDate, TimeDelta};
use std::fmt;

/// Fixed step between consecutive synthesized dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// Every day
    Daily,
    /// Every 7 days
    Weekly,
    /// Same day of the next calendar month (clamped to month end)
    Monthly,
    /// Every `n` days
    Custom(i64),
}

impl Frequency {
    /// Parse a frequency string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "D" | "DAY" | "DAYS" | "DAILY" => Some(Frequency::Daily),
            "W" | "WEEK" | "WEEKS" | "WEEKLY" => Some(Frequency::Weekly),
            "M" | "MS" | "MONTH" | "MONTHS" | "MONTHLY" => Some(Frequency::Monthly),
            _ => parse_custom_frequency(s),
        }
    }

    /// Date `steps` periods after `start`; `None` when out of range
    pub fn advance(&self, start: NaiveDate, steps: i64) -> Option<NaiveDate> {
        match self {
            Frequency::Daily => start.checked_add_signed(TimeDelta::try_days(steps)?),
            Frequency::Weekly => start.checked_add_signed(TimeDelta::try_weeks(steps)?),
            Frequency::Custom(days) => {
                start.checked_add_signed(TimeDelta::try_days(days.checked_mul(steps)?)?)
            }
            Frequency::Monthly => {
                let months = u32::try_from(steps).ok()?;
                start.checked_add_months(Months::new(months))
            }
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Daily
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "D"),
            Frequency::Weekly => write!(f, "W"),
            Frequency::Monthly => write!(f, "M"),
            Frequency::Custom(days) => write!(f, "{}D", days),
        }
    }
}

/// Parse forms like "3D" or "2W"
fn parse_custom_frequency(s: &str) -> Option<Frequency> {
    let split = s.find(|c: char| !c.is_ascii_digit())?;
    if split == 0 {
        return None;
    }
    let (num, unit) = s.split_at(split);
    let num: i64 = num.parse().ok()?;
    if num <= 0 {
        return None;
    }

    match unit.to_uppercase().as_str() {
        "D" | "DAY" | "DAYS" => Some(Frequency::Custom(num)),
        "W" | "WEEK" | "WEEKS" => num.checked_mul(7).map(Frequency::Custom),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_parsing() {
        assert_eq!(Frequency::from_str("D"), Some(Frequency::Daily));
        assert_eq!(Frequency::from_str("daily"), Some(Frequency::Daily));
        assert_eq!(Frequency::from_str("W"), Some(Frequency::Weekly));
        assert_eq!(Frequency::from_str("M"), Some(Frequency::Monthly));
        assert_eq!(Frequency::from_str("3D"), Some(Frequency::Custom(3)));
        assert_eq!(Frequency::from_str("2W"), Some(Frequency::Custom(14)));
        assert_eq!(Frequency::from_str("D3"), None);
        assert_eq!(Frequency::from_str("invalid"), None);
    }

    #[test]
    fn test_advance() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            Frequency::Daily.advance(start, 1),
            NaiveDate::from_ymd_opt(2024, 2, 1)
        );
        assert_eq!(
            Frequency::Weekly.advance(start, 2),
            NaiveDate::from_ymd_opt(2024, 2, 14)
        );
        assert_eq!(
            Frequency::Monthly.advance(start, 1),
            NaiveDate::from_ymd_opt(2024, 2, 29)
        );
    }

    #[test]
    fn test_advance_out_of_range_is_none() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(Frequency::Custom(i64::MAX / 2).advance(start, 3), None);
        assert_eq!(Frequency::Custom(10_000_000_000).advance(start, 1), None);
        assert_eq!(Frequency::Daily.advance(start, i64::MAX), None);
        assert_eq!(Frequency::Weekly.advance(start, i64::MAX / 2), None);
        assert_eq!(Frequency::from_str(&format!("{}W", i64::MAX)), None);
    }
}
