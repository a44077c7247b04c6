use serde::Serialize;

use crate::{
    analytics::session_value,
    models::{AggMode, Goal, WorkoutSession},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub current: f64,
    pub target: f64,
    /// Share of the target reached, within `[0, 1]`.
    pub ratio: f64,
    pub achieved: bool,
}

/// Best per-session value of the goal's metric against its target.
pub fn goal_progress(goal: &Goal, sessions: &[WorkoutSession]) -> GoalProgress {
    let current = sessions
        .iter()
        .filter_map(|s| session_value(s, &goal.exercise_id, goal.metric, AggMode::Max))
        .fold(0.0, f64::max);

    let achieved = current >= goal.target;
    let ratio = if goal.target > 0.0 {
        (current / goal.target).clamp(0.0, 1.0)
    } else if achieved {
        1.0
    } else {
        0.0
    };

    GoalProgress {
        current,
        target: goal.target,
        ratio,
        achieved,
    }
}

/// Fixed-width text progress bar.
pub fn progress_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Metric, SetLog};
    use chrono::{TimeZone, Utc};

    fn sessions(loads: &[(f64, u32)]) -> Vec<WorkoutSession> {
        loads
            .iter()
            .enumerate()
            .map(|(i, &(load, reps))| WorkoutSession {
                id: format!("s{i}"),
                date: Utc.with_ymd_and_hms(2024, 4, 1 + i as u32, 0, 0, 0).unwrap(),
                sets: vec![SetLog {
                    exercise_id: "ohp".into(),
                    load_kg: Some(load),
                    reps: Some(reps),
                    ..SetLog::default()
                }],
                duration_mins: None,
                fatigue: None,
                pain: None,
            })
            .collect()
    }

    fn goal(metric: Metric, target: f64) -> Goal {
        Goal {
            id: "g".into(),
            exercise_id: "ohp".into(),
            metric,
            target,
        }
    }

    #[test]
    fn partial_progress() {
        let p = goal_progress(&goal(Metric::Load, 80.0), &sessions(&[(50.0, 5), (60.0, 3)]));
        assert_eq!(p.current, 60.0);
        assert!((p.ratio - 0.75).abs() < 1e-9);
        assert!(!p.achieved);
    }

    #[test]
    fn goals_can_be_exceeded() {
        let p = goal_progress(&goal(Metric::Volume, 250.0), &sessions(&[(50.0, 6)]));
        assert_eq!(p.current, 300.0);
        assert_eq!(p.ratio, 1.0);
        assert!(p.achieved);
    }

    #[test]
    fn no_history_no_progress() {
        let p = goal_progress(&goal(Metric::Reps, 12.0), &[]);
        assert_eq!((p.current, p.ratio, p.achieved), (0.0, 0.0, false));
    }

    #[test]
    fn bars() {
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(1.7, 3), "███");
    }
}
