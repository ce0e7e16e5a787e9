//! Shared helpers for the integration tests
//!
//! - Temporary CSV files removed on drop
//! - Daily sales fixtures and a scripted market data provider

#![allow(dead_code)]

pub mod fixtures;
pub mod test_utils;

pub use fixtures::{daily_rows, sales_config, sales_csv, ScriptedMarket};
pub use test_utils::{create_test_csv, temp_dir, temp_file};
