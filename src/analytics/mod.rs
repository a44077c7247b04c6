//! Trend statistics and chart series over an exercise's session history.
//!
//! All functions here are pure: they take the sessions and parameters they
//! need and return plain data.

pub mod chart;
pub mod extract;
pub mod metrics;
pub mod trend;
pub mod window;

pub use chart::{AxisBounds, ChartPoint, ChartView, chart_data, nice_axis, rescale};
pub use extract::{data_point, data_points, session_value};
pub use metrics::{compute_metrics, value_series};
pub use trend::{TrendFit, classify_trend, fit_trend};
pub use window::{cutoff, filter_sessions};
