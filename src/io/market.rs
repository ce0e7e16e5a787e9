//! Daily market history from the Yahoo Finance chart API

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};

const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// One daily bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Trading day (UTC)
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Close adjusted for splits and dividends
    pub adj_close: f64,
    pub volume: u64,
}

/// Source of daily market history
///
/// `end` is exclusive.
pub trait MarketDataProvider: Send + Sync {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Quote>>;
}

#[derive(Debug, Deserialize)]
struct YahooResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Yahoo Finance client over blocking HTTP
#[derive(Debug, Clone)]
pub struct YahooFinance {
    base_url: String,
    timeout: Duration,
}

impl Default for YahooFinance {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl YahooFinance {
    /// Create a client with a per-request timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            base_url: YAHOO_CHART_URL.to_string(),
            timeout,
        }
    }

    /// Point the client at another chart endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn unix_midnight(date: NaiveDate) -> i64 {
        date.and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default()
    }

    fn build_url(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{}?period1={}&period2={}&interval=1d&events=history",
            self.base_url,
            symbol,
            Self::unix_midnight(start),
            Self::unix_midnight(end)
        )
    }

    /// Parse a chart API response body
    ///
    /// Bars with any missing field are skipped; an empty result is an error.
    fn parse_response(json: &str) -> Result<Vec<Quote>> {
        let response: YahooResponse = serde_json::from_str(json)?;

        if let Some(error) = response.chart.error {
            return Err(Error::Http(format!(
                "API error [{}]: {}",
                error.code, error.description
            )));
        }

        let data = response
            .chart
            .result
            .as_ref()
            .and_then(|r| r.first())
            .ok_or_else(|| Error::Http("no data returned".to_string()))?;
        let quote_data = data
            .indicators
            .quote
            .first()
            .ok_or_else(|| Error::Http("no quote data returned".to_string()))?;
        let adj_close_data = data.indicators.adjclose.as_ref().and_then(|a| a.first());

        let mut quotes = Vec::with_capacity(data.timestamp.len());
        for (i, &ts) in data.timestamp.iter().enumerate() {
            let at = |v: &Vec<Option<f64>>| v.get(i).copied().flatten();
            let date = DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive());
            let volume = quote_data.volume.get(i).copied().flatten();
            let adj_close = adj_close_data.and_then(|a| at(&a.adjclose));

            if let (Some(date), Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
                date,
                at(&quote_data.open),
                at(&quote_data.high),
                at(&quote_data.low),
                at(&quote_data.close),
                volume,
            ) {
                quotes.push(Quote {
                    date,
                    open,
                    high,
                    low,
                    close,
                    adj_close: adj_close.unwrap_or(close),
                    volume,
                });
            }
        }

        if quotes.is_empty() {
            return Err(Error::Http("no data returned".to_string()));
        }

        Ok(quotes)
    }
}

impl MarketDataProvider for YahooFinance {
    fn fetch_daily(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Quote>> {
        let url = self.build_url(symbol, start, end);
        log::debug!("fetching {} history from {}", symbol, url);

        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.timeout)
            .build()?;

        let text = client.get(&url).send()?.error_for_status()?.text()?;

        Self::parse_response(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let client = YahooFinance::default();
        let url = client.build_url(
            "AAPL",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        );
        assert!(url.contains("/AAPL?"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1733011200"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn test_malformed_endpoint_is_http_error() {
        // rejected while building the request, before any connection
        let client = YahooFinance::new(Duration::from_secs(2)).with_base_url("no scheme here");
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(
            client.fetch_daily("AAPL", day, day),
            Err(Error::Http(_))
        ));
    }

    #[test]
    fn test_parse_response_bar_without_volume_is_skipped() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704067200,1704153600],"indicators":{"quote":[{"open":[185.0,186.0],"high":[186.0,187.0],"low":[184.0,185.0],"close":[185.5,186.5],"volume":[null,1100000]}]}}],"error":null}}"#;
        let quotes = YahooFinance::parse_response(json).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn test_parse_response_valid() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704067200,1704153600,1704240000],"indicators":{"quote":[{"open":[185.0,186.0,187.0],"high":[186.0,187.0,188.0],"low":[184.0,185.0,186.0],"close":[185.5,186.5,187.5],"volume":[1000000,1100000,1200000]}],"adjclose":[{"adjclose":[185.4,186.4,187.4]}]}}],"error":null}}"#;
        let quotes = YahooFinance::parse_response(json).unwrap();
        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(quotes[0].close, 185.5);
        assert_eq!(quotes[2].adj_close, 187.4);
    }

    #[test]
    fn test_parse_response_with_nulls() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704067200,1704153600,1704240000],"indicators":{"quote":[{"open":[185.0,null,187.0],"high":[186.0,null,188.0],"low":[184.0,null,186.0],"close":[185.5,null,187.5],"volume":[1000000,null,1200000]}]}}],"error":null}}"#;
        let quotes = YahooFinance::parse_response(json).unwrap();
        assert_eq!(quotes.len(), 2);
        // adj close falls back to close without an adjclose block
        assert_eq!(quotes[1].adj_close, 187.5);
    }

    #[test]
    fn test_parse_response_api_error() {
        let json = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooFinance::parse_response(json).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_parse_response_no_data() {
        let json = r#"{"chart":{"result":[],"error":null}}"#;
        assert!(matches!(
            YahooFinance::parse_response(json),
            Err(Error::Http(_))
        ));
    }

    #[test]
    fn test_parse_response_invalid_json() {
        assert!(matches!(
            YahooFinance::parse_response("not json"),
            Err(Error::Json(_))
        ));
    }
}
