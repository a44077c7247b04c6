//! Stateful analysis query for the currently selected exercise.
//!
//! Holds the fetched history and the time window; every statistic is
//! recomputed from those on demand.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::{
    analytics::{self, ChartPoint, ChartView},
    models::{AggMode, AnalyticsMetrics, Metric, TimeFrame, TimeWindow, WorkoutSession},
    store::{HistorySet, SessionStore, group_sessions},
};

/// Handed out when a fetch starts; a response is only applied if its ticket
/// is still the latest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    exercise_id: String,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct ExerciseAnalytics {
    exercise_id: Option<String>,
    generation: u64,
    sessions: Vec<WorkoutSession>,
    loading: bool,
    window: TimeWindow,
    anchor: Option<DateTime<Utc>>,
}

impl ExerciseAnalytics {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    /// Evaluate time windows relative to `now` instead of the wall clock.
    pub fn anchored_at(mut self, now: DateTime<Utc>) -> Self {
        self.anchor = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.anchor.unwrap_or_else(Utc::now)
    }

    pub fn exercise_id(&self) -> Option<&str> {
        self.exercise_id.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// The whole fetched history, before any time filtering.
    pub fn sessions(&self) -> &[WorkoutSession] {
        &self.sessions
    }

    pub fn time_frame(&self) -> TimeFrame {
        self.window.frame
    }

    pub fn set_time_frame(&mut self, frame: TimeFrame) {
        self.window.frame = frame;
    }

    pub fn custom_days(&self) -> u32 {
        self.window.custom_days
    }

    pub fn set_custom_days(&mut self, days: u32) {
        self.window.custom_days = days;
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Select `exercise_id` and mark the query as loading. Any response still
    /// in flight for an earlier selection becomes stale.
    pub fn begin_fetch(&mut self, exercise_id: &str) -> FetchTicket {
        self.generation += 1;
        self.exercise_id = Some(exercise_id.to_string());
        self.sessions.clear();
        self.loading = true;

        FetchTicket {
            exercise_id: exercise_id.to_string(),
            generation: self.generation,
        }
    }

    /// Apply a fetch result. Returns `false` and leaves state untouched when
    /// the ticket is stale. A failed fetch leaves an empty history.
    pub fn finish_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<HistorySet>>) -> bool {
        if ticket.generation != self.generation {
            log::debug!(
                "discarding stale history for `{}` (request {}, current {})",
                ticket.exercise_id,
                ticket.generation,
                self.generation
            );
            return false;
        }

        self.sessions = match result {
            Ok(history) => group_sessions(history),
            Err(e) => {
                log::warn!("failed to fetch history for `{}`: {e:#}", ticket.exercise_id);
                Vec::new()
            }
        };
        self.loading = false;
        log::debug!(
            "loaded {} sessions for `{}`",
            self.sessions.len(),
            ticket.exercise_id
        );

        true
    }

    /// Fetch and apply the history of `exercise_id` from `store`.
    pub async fn load<S: SessionStore>(&mut self, store: &S, exercise_id: &str) {
        let ticket = self.begin_fetch(exercise_id);
        let result = store.fetch_exercise_history(exercise_id).await;
        self.finish_fetch(ticket, result);
    }

    /// Sessions inside the current time window.
    pub fn filtered_sessions(&self) -> Vec<WorkoutSession> {
        analytics::filter_sessions(&self.sessions, self.window, self.now())
    }

    pub fn compute_metrics(&self, variable: Metric, agg: AggMode) -> AnalyticsMetrics {
        let Some(exercise_id) = self.exercise_id.as_deref() else {
            return AnalyticsMetrics::default();
        };

        let filtered = self.filtered_sessions();
        let points = analytics::data_points(&filtered, exercise_id);
        analytics::compute_metrics(&points, exercise_id, variable, agg)
    }

    pub fn chart_data(
        &self,
        primary: Metric,
        secondary: Option<Metric>,
        primary_agg: AggMode,
        secondary_agg: AggMode,
    ) -> Vec<ChartPoint> {
        let Some(exercise_id) = self.exercise_id.as_deref() else {
            return Vec::new();
        };

        let filtered = self.filtered_sessions();
        let points = analytics::data_points(&filtered, exercise_id);
        analytics::chart_data(&points, exercise_id, primary, secondary, primary_agg, secondary_agg)
    }

    /// Chart points with regression overlays and axis bounds.
    pub fn chart_view(
        &self,
        primary: Metric,
        secondary: Option<Metric>,
        primary_agg: AggMode,
        secondary_agg: AggMode,
    ) -> ChartView {
        let points = self.chart_data(primary, secondary, primary_agg, secondary_agg);
        ChartView::build(points, secondary.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{SetLog, Trend},
        store::MemoryStore,
    };
    use anyhow::anyhow;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn history(exercise: &str, entries: &[(DateTime<Utc>, f64)]) -> Vec<HistorySet> {
        entries
            .iter()
            .enumerate()
            .map(|(i, &(date, load))| HistorySet {
                session_id: format!("{exercise}-{i}"),
                date,
                duration_mins: None,
                fatigue: None,
                pain: None,
                set: SetLog {
                    id: format!("set-{i}"),
                    exercise_id: exercise.into(),
                    load_kg: Some(load),
                    reps: Some(5),
                    completed: true,
                    ..SetLog::default()
                },
            })
            .collect()
    }

    struct FailingStore;

    impl SessionStore for FailingStore {
        async fn fetch_exercise_history(&self, _: &str) -> Result<Vec<HistorySet>> {
            Err(anyhow!("connection reset"))
        }

        async fn fetch_exercises(&self) -> Result<Vec<crate::models::Exercise>> {
            Err(anyhow!("connection reset"))
        }
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut q = ExerciseAnalytics::new(TimeWindow::default());
        let bench = q.begin_fetch("bench");
        let squat = q.begin_fetch("squat");

        // The abandoned request resolves first; it must not land.
        assert!(!q.finish_fetch(bench, Ok(history("bench", &[(day(2024, 1, 1), 80.0)]))));
        assert!(q.loading());
        assert!(q.sessions().is_empty());

        assert!(q.finish_fetch(squat, Ok(history("squat", &[(day(2024, 1, 2), 120.0)]))));
        assert!(!q.loading());
        assert_eq!(q.exercise_id(), Some("squat"));
        assert_eq!(q.sessions()[0].sets[0].exercise_id, "squat");
    }

    #[test]
    fn late_response_after_reselection_is_ignored() {
        let mut q = ExerciseAnalytics::new(TimeWindow::default());
        let first = q.begin_fetch("bench");
        let second = q.begin_fetch("bench");
        assert!(q.finish_fetch(second, Ok(history("bench", &[(day(2024, 1, 1), 80.0)]))));
        assert!(!q.finish_fetch(first, Ok(Vec::new())));
        assert_eq!(q.sessions().len(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_is_an_empty_history() {
        let mut q = ExerciseAnalytics::new(TimeWindow::default());
        q.load(&FailingStore, "bench").await;

        assert!(!q.loading());
        assert!(q.sessions().is_empty());
        let metrics = q.compute_metrics(Metric::Load, AggMode::Max);
        assert_eq!(metrics, AnalyticsMetrics::default());
        assert_eq!(metrics.trend, Trend::InsufficientData);
    }

    #[tokio::test]
    async fn window_changes_apply_without_refetching() {
        let mut store = MemoryStore::new();
        for session in group_sessions(history(
            "bench",
            &[
                (day(2024, 1, 1), 70.0),
                (day(2024, 6, 1), 75.0),
                (day(2024, 11, 1), 80.0),
                (day(2024, 12, 1), 85.0),
            ],
        )) {
            store.add_session(session);
        }

        let mut q = ExerciseAnalytics::new(TimeWindow {
            frame: TimeFrame::All,
            custom_days: 30,
        })
        .anchored_at(day(2025, 1, 1));
        q.load(&store, "bench").await;

        let all = q.compute_metrics(Metric::Load, AggMode::Max);
        assert_eq!((all.min, all.max), (70.0, 85.0));
        assert_eq!(all.trend, Trend::Ascending);

        q.set_time_frame(TimeFrame::ThreeMonths);
        let recent = q.compute_metrics(Metric::Load, AggMode::Max);
        assert_eq!((recent.min, recent.max), (80.0, 85.0));
        assert_eq!(q.chart_data(Metric::Load, None, AggMode::Max, AggMode::Max).len(), 2);

        q.set_time_frame(TimeFrame::Custom);
        q.set_custom_days(10);
        assert_eq!(q.compute_metrics(Metric::Load, AggMode::Max).trend, Trend::InsufficientData);
        assert!(q.chart_data(Metric::Load, None, AggMode::Max, AggMode::Max).is_empty());
    }

    #[test]
    fn nothing_selected_means_nothing_to_show() {
        let q = ExerciseAnalytics::new(TimeWindow::default());
        assert_eq!(q.compute_metrics(Metric::Load, AggMode::Max), AnalyticsMetrics::default());
        assert!(q.chart_data(Metric::Load, Some(Metric::Reps), AggMode::Max, AggMode::Max).is_empty());
        assert!(!q.loading());
    }
}
