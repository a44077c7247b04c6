//! Exercise analytics over logged workout history: per-session metric
//! extraction, time windows, trend estimation, rep-max estimates and
//! dual-axis chart series.

pub mod analytics;
pub mod db;
pub mod goals;
pub mod models;
pub mod query;
pub mod render;
pub mod store;
pub mod types;
pub mod utils;
