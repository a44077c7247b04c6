use crate::{
    analytics::{
        extract::{matching_sets, session_value},
        trend::classify_trend,
    },
    models::{AggMode, AnalyticsMetrics, DataPoint, Metric},
    utils::{EST_3RM_FACTOR, EST_5RM_FACTOR, calculate_est_1rm},
};

/// Per-session values of `variable` for every data point, zeros included.
pub fn value_series(
    points: &[DataPoint<'_>],
    exercise_id: &str,
    variable: Metric,
    agg: AggMode,
) -> Vec<f64> {
    points
        .iter()
        .map(|p| session_value(p.session, exercise_id, variable, agg).unwrap_or(0.0))
        .collect()
}

/// Best Epley estimate over every set with a positive load and rep count.
pub fn best_est_1rm(points: &[DataPoint<'_>], exercise_id: &str) -> Option<f64> {
    points
        .iter()
        .flat_map(|p| matching_sets(p.session, exercise_id))
        .filter_map(|s| match (s.recorded(Metric::Load), s.reps) {
            (Some(load), Some(reps)) if load > 0.0 && reps > 0 => {
                Some(calculate_est_1rm(load, reps))
            }
            _ => None,
        })
        .reduce(f64::max)
}

/// Summary statistics of `variable` over the data points of one exercise.
///
/// `max`, `min` and `avg` skip sessions whose value is zero while the trend
/// is fitted over the whole series. `volume` is the total tonnage of the
/// window whatever the variable. Rep-max estimates are only filled in for
/// load and range-of-motion analyses.
pub fn compute_metrics(
    points: &[DataPoint<'_>],
    exercise_id: &str,
    variable: Metric,
    agg: AggMode,
) -> AnalyticsMetrics {
    let series = value_series(points, exercise_id, variable, agg);
    if series.is_empty() {
        return AnalyticsMetrics::default();
    }

    let non_zero: Vec<f64> = series.iter().copied().filter(|&v| v != 0.0).collect();
    let (max, min, avg) = if non_zero.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        (
            non_zero.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            non_zero.iter().copied().fold(f64::INFINITY, f64::min),
            non_zero.iter().sum::<f64>() / non_zero.len() as f64,
        )
    };

    let volume = points.iter().map(|p| p.volume).sum();

    let est_1rm = match variable {
        Metric::Load | Metric::Rom => best_est_1rm(points, exercise_id),
        _ => None,
    };

    let metrics = AnalyticsMetrics {
        max,
        min,
        avg,
        volume,
        est_1rm,
        est_3rm: est_1rm.map(|rm| rm * EST_3RM_FACTOR),
        est_5rm: est_1rm.map(|rm| rm * EST_5RM_FACTOR),
        trend: classify_trend(&series),
    };

    log::debug!(
        "metrics for {exercise_id}/{variable}: {} sessions, trend {}",
        series.len(),
        metrics.trend
    );

    metrics
}
