//! Core module - fundamental types and configuration

pub mod config;
pub mod test_data;

pub use config::Config;
pub use test_data::{Channel, DataError, DataPoint, TestData};
