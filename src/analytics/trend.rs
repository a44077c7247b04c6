use serde::Serialize;

use crate::models::Trend;

/// Slopes within `±TREND_THRESHOLD` per session count as a plateau.
pub const TREND_THRESHOLD: f64 = 0.1;

/// Ordinary least-squares fit over the index of each value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    /// Fitted value at every input index. Empty when fewer than two values.
    pub regression_line: Vec<f64>,
}

/// Fit `y = slope·i + intercept` with `i` the zero-based position of each value.
///
/// The x-axis is the position, not elapsed time, so points render evenly
/// spaced whatever the gaps between sessions.
pub fn fit_trend(values: &[f64]) -> TrendFit {
    if values.len() < 2 {
        return TrendFit::default();
    }

    let n = values.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = values.iter().enumerate().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), (i, &y)| {
            let x = i as f64;
            (sx + x, sy + y, sxy + x * y, sxx + x * x)
        },
    );

    // Positive in exact arithmetic for n >= 2; guards against rounding.
    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return TrendFit::default();
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    let regression_line = (0..values.len())
        .map(|i| slope * i as f64 + intercept)
        .collect();

    TrendFit {
        slope,
        intercept,
        regression_line,
    }
}

/// Classify the slope of `values`.
///
/// At least two non-zero values are required; zeros still take part in the fit.
pub fn classify_trend(values: &[f64]) -> Trend {
    let non_zero = values.iter().filter(|&&v| v != 0.0).count();
    if non_zero < 2 {
        return Trend::InsufficientData;
    }

    let slope = fit_trend(values).slope;
    if slope > TREND_THRESHOLD {
        Trend::Ascending
    } else if slope < -TREND_THRESHOLD {
        Trend::Descending
    } else {
        Trend::Plateauing
    }
}
