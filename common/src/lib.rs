pub mod config;
pub mod discover;
pub mod plot;
pub mod report;
pub mod run;
pub mod summary;

/// Format of the `Timestamp` column written by the performance test
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
