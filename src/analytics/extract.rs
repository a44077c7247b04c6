//! Per-session metric extraction.
//!
//! Everything here reads only the sets that belong to the requested exercise;
//! sets of other exercises in the same session are never looked at.

use crate::models::{AggMode, DataPoint, Metric, SetLog, WorkoutSession};

/// Sets of `session` that belong to the exercise.
pub fn matching_sets<'a>(
    session: &'a WorkoutSession,
    exercise_id: &'a str,
) -> impl Iterator<Item = &'a SetLog> + 'a {
    session
        .sets
        .iter()
        .filter(move |s| s.exercise_id == exercise_id)
}

/// Collapse the exercise's sets in `session` into one number.
///
/// Missing fields count as `0`. `Volume` always sums `load × reps` and ignores
/// `agg`. Returns `None` when the session has no set for the exercise.
pub fn session_value(
    session: &WorkoutSession,
    exercise_id: &str,
    metric: Metric,
    agg: AggMode,
) -> Option<f64> {
    let sets: Vec<&SetLog> = matching_sets(session, exercise_id).collect();
    if sets.is_empty() {
        return None;
    }

    if metric == Metric::Volume {
        return Some(
            sets.iter()
                .map(|s| s.recorded(Metric::Volume).unwrap_or(0.0))
                .sum(),
        );
    }

    let values = sets.iter().map(|s| s.recorded(metric).unwrap_or(0.0));
    let value = match agg {
        AggMode::Sum => values.sum(),
        AggMode::Avg => values.sum::<f64>() / sets.len() as f64,
        AggMode::Min => values.fold(f64::INFINITY, f64::min),
        AggMode::Max => values.fold(f64::NEG_INFINITY, f64::max),
    };

    Some(value)
}

/// Reduce a session to a [`DataPoint`] using `max` for every single-field
/// metric. Sessions where nothing positive was recorded for the exercise yield
/// `None`.
pub fn data_point<'a>(session: &'a WorkoutSession, exercise_id: &str) -> Option<DataPoint<'a>> {
    let value = |m| session_value(session, exercise_id, m, AggMode::Max).unwrap_or(0.0);

    let point = DataPoint {
        date: session.date,
        load: value(Metric::Load),
        reps: value(Metric::Reps),
        volume: value(Metric::Volume),
        rom: value(Metric::Rom),
        time: value(Metric::Time),
        distance: value(Metric::Distance),
        session,
    };

    Metric::ALL
        .iter()
        .any(|&m| point.get(m) > 0.0)
        .then_some(point)
}

/// Data points for every contributing session, in session order.
pub fn data_points<'a>(sessions: &'a [WorkoutSession], exercise_id: &str) -> Vec<DataPoint<'a>> {
    sessions
        .iter()
        .filter_map(|s| data_point(s, exercise_id))
        .collect()
}
