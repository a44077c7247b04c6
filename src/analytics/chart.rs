use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    analytics::{
        metrics::value_series,
        trend::{TrendFit, fit_trend},
    },
    models::{AggMode, DataPoint, Metric},
    utils::short_label,
};

/// Gridline count of every computed axis.
pub const AXIS_SECTIONS: usize = 10;
/// Upper bound used when nothing in the series is positive.
pub const MIN_REASONABLE_MAX: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    pub label: String,
    pub value: f64,
    pub secondary_value: f64,
}

/// One chart entry per data point, in the same order as the metrics series.
/// Without a secondary variable every `secondary_value` is `0`.
pub fn chart_data(
    points: &[DataPoint<'_>],
    exercise_id: &str,
    primary: Metric,
    secondary: Option<Metric>,
    primary_agg: AggMode,
    secondary_agg: AggMode,
) -> Vec<ChartPoint> {
    let values = value_series(points, exercise_id, primary, primary_agg);
    let secondary_values = match secondary {
        Some(metric) => value_series(points, exercise_id, metric, secondary_agg),
        None => vec![0.0; points.len()],
    };

    points
        .iter()
        .zip(values)
        .zip(secondary_values)
        .map(|((p, value), secondary_value)| ChartPoint {
            date: p.date,
            label: short_label(p.date),
            value,
            secondary_value,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub sections: usize,
}

impl AxisBounds {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }

    /// Gridline values from `min` to `max`, both included.
    pub fn ticks(&self) -> Vec<f64> {
        (0..=self.sections)
            .map(|i| self.min + self.step * i as f64)
            .collect()
    }
}

/// Smallest value of the form {1, 2, 5, 10}×10ⁿ that is at least `raw`.
pub fn nice_step(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 1.0;
    }

    let magnitude = 10f64.powf(raw.log10().floor());
    let fraction = raw / magnitude;
    let nice = if fraction <= 1.0 {
        1.0
    } else if fraction <= 2.0 {
        2.0
    } else if fraction <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

/// Rounded bounds with exactly [`AXIS_SECTIONS`] sections covering `values`.
///
/// The lower bound is `0` whenever no value is negative. When no value is
/// positive the upper bound starts from `min_reasonable_max`.
pub fn nice_axis(values: &[f64], min_reasonable_max: f64) -> AxisBounds {
    let (raw_min, raw_max) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((0.0_f64, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let low = raw_min.min(0.0);
    let high = if raw_max > 0.0 { raw_max } else { min_reasonable_max };
    let sections = AXIS_SECTIONS as f64;

    let mut step = nice_step((high - low) / sections);
    loop {
        let min = if low < 0.0 { (low / step).floor() * step } else { 0.0 };
        let max = min + step * sections;
        if max >= high {
            return AxisBounds {
                min,
                max,
                step,
                sections: AXIS_SECTIONS,
            };
        }
        // Flooring the minimum can leave the top uncovered; widen the step.
        step = nice_step(step * (1.0 + 1e-9));
    }
}

/// Map values from one axis into another axis' coordinates.
pub fn rescale(values: &[f64], from: &AxisBounds, to: &AxisBounds) -> Vec<f64> {
    let from_range = from.range();
    if from_range == 0.0 {
        return values.to_vec();
    }

    let ratio = to.range() / from_range;
    values
        .iter()
        .map(|v| (v - from.min) * ratio + to.min)
        .collect()
}

/// Everything a renderer needs for the dual-axis analysis chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartView {
    pub points: Vec<ChartPoint>,
    pub primary_axis: AxisBounds,
    pub primary_trend: TrendFit,
    pub secondary_axis: Option<AxisBounds>,
    pub secondary_trend: Option<TrendFit>,
    /// Secondary regression line expressed in primary axis coordinates.
    pub secondary_overlay: Vec<f64>,
}

impl ChartView {
    pub fn build(points: Vec<ChartPoint>, has_secondary: bool) -> Self {
        let primary: Vec<f64> = points.iter().map(|p| p.value).collect();
        let primary_trend = fit_trend(&primary);
        let primary_axis = nice_axis(
            &[primary.as_slice(), primary_trend.regression_line.as_slice()].concat(),
            MIN_REASONABLE_MAX,
        );

        if !has_secondary {
            return Self {
                points,
                primary_axis,
                primary_trend,
                secondary_axis: None,
                secondary_trend: None,
                secondary_overlay: Vec::new(),
            };
        }

        let secondary: Vec<f64> = points.iter().map(|p| p.secondary_value).collect();
        let secondary_trend = fit_trend(&secondary);
        let secondary_axis = nice_axis(
            &[secondary.as_slice(), secondary_trend.regression_line.as_slice()].concat(),
            MIN_REASONABLE_MAX,
        );

        let secondary_overlay = if secondary_axis == primary_axis {
            secondary_trend.regression_line.clone()
        } else {
            rescale(&secondary_trend.regression_line, &secondary_axis, &primary_axis)
        };

        Self {
            points,
            primary_axis,
            primary_trend,
            secondary_axis: Some(secondary_axis),
            secondary_trend: Some(secondary_trend),
            secondary_overlay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analytics::extract::data_points,
        models::{SetLog, WorkoutSession},
    };
    use chrono::{Duration, TimeZone};

    fn history(loads: &[(f64, u32)]) -> Vec<WorkoutSession> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        loads
            .iter()
            .enumerate()
            .map(|(i, &(load, reps))| WorkoutSession {
                id: format!("s{i}"),
                date: start + Duration::days(i as i64 * 2),
                sets: vec![SetLog {
                    exercise_id: "press".into(),
                    load_kg: Some(load),
                    reps: Some(reps),
                    completed: true,
                    ..SetLog::default()
                }],
                duration_mins: None,
                fatigue: None,
                pain: None,
            })
            .collect()
    }

    #[test]
    fn nice_steps() {
        assert_eq!(nice_step(4.7), 5.0);
        assert_eq!(nice_step(1.0), 1.0);
        assert_eq!(nice_step(1.3), 2.0);
        assert_eq!(nice_step(7.0), 10.0);
        assert_eq!(nice_step(23.0), 50.0);
        assert_eq!(nice_step(0.0), 1.0);
    }

    #[test]
    fn axis_for_positive_data_starts_at_zero() {
        let axis = nice_axis(&[0.0, 12.0, 47.0], MIN_REASONABLE_MAX);
        assert_eq!(axis.min, 0.0);
        assert_eq!(axis.step, 5.0);
        assert_eq!(axis.max, 50.0);
        assert_eq!(axis.sections, 10);
        assert_eq!(axis.ticks().len(), 11);

        let axis = nice_axis(&[31.0, 47.0], MIN_REASONABLE_MAX);
        assert_eq!(axis.min, 0.0);
    }

    #[test]
    fn axis_max_is_a_multiple_of_the_step() {
        for top in [3.0, 9.5, 51.0, 99.0, 101.0, 1234.0] {
            let axis = nice_axis(&[top], MIN_REASONABLE_MAX);
            assert!(axis.max >= top);
            let multiples = axis.max / axis.step;
            assert!((multiples - multiples.round()).abs() < 1e-9);
            assert_eq!(axis.sections, AXIS_SECTIONS);
        }
    }

    #[test]
    fn flat_zero_data_uses_the_floor() {
        let axis = nice_axis(&[0.0, 0.0], MIN_REASONABLE_MAX);
        assert_eq!((axis.min, axis.max, axis.step), (0.0, 10.0, 1.0));

        let axis = nice_axis(&[], MIN_REASONABLE_MAX);
        assert_eq!(axis.max, 10.0);
    }

    #[test]
    fn negative_data_extends_below_zero() {
        let axis = nice_axis(&[-13.0, 27.0], MIN_REASONABLE_MAX);
        assert_eq!(axis.step, 5.0);
        assert_eq!(axis.min, -15.0);
        assert_eq!(axis.max, 35.0);
    }

    #[test]
    fn rescale_maps_bounds_onto_bounds() {
        let from = AxisBounds { min: 0.0, max: 10.0, step: 1.0, sections: 10 };
        let to = AxisBounds { min: 0.0, max: 200.0, step: 20.0, sections: 10 };
        assert_eq!(rescale(&[0.0, 5.0, 10.0], &from, &to), [0.0, 100.0, 200.0]);
    }

    #[test]
    fn chart_points_line_up_with_data_points() {
        let sessions = history(&[(60.0, 10), (62.5, 8), (65.0, 6)]);
        let points = data_points(&sessions, "press");

        let chart = chart_data(&points, "press", Metric::Load, Some(Metric::Reps), AggMode::Max, AggMode::Max);
        assert_eq!(chart.len(), 3);
        assert_eq!(chart[1].value, 62.5);
        assert_eq!(chart[1].secondary_value, 8.0);
        assert_eq!(chart[0].label, "01/05");

        let single = chart_data(&points, "press", Metric::Load, None, AggMode::Max, AggMode::Max);
        assert!(single.iter().all(|p| p.secondary_value == 0.0));
    }

    #[test]
    fn secondary_regression_is_drawn_in_primary_coordinates() {
        let sessions = history(&[(100.0, 10), (120.0, 8), (140.0, 6)]);
        let points = data_points(&sessions, "press");
        let chart = chart_data(&points, "press", Metric::Load, Some(Metric::Reps), AggMode::Max, AggMode::Max);

        let view = ChartView::build(chart, true);
        assert_eq!(view.primary_axis.step, 20.0);
        assert_eq!(view.primary_axis.max, 200.0);
        let secondary_axis = view.secondary_axis.unwrap();
        assert_eq!(secondary_axis.max, 10.0);

        // reps fall 10, 8, 6; in primary space those sit at 200, 160, 120.
        assert_eq!(view.secondary_overlay.len(), 3);
        assert!((view.secondary_overlay[0] - 200.0).abs() < 1e-9);
        assert!((view.secondary_overlay[2] - 120.0).abs() < 1e-9);
        assert_eq!(view.primary_trend.regression_line.len(), 3);
    }
}
