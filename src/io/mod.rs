pub mod csv;
pub mod market;

// Re-export commonly used functions
pub use self::csv::{read_csv, read_csv_from_reader};
pub use self::market::{MarketDataProvider, Quote, YahooFinance};
