//! Session storage behind the analytics engine.
//!
//! The engine only ever reads through [`SessionStore`]. Two implementations
//! live here: [`MemoryStore`], an owned in-process store, and [`SqliteStore`],
//! backed by the local database.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use crate::{
    db::DB,
    models::{Exercise, Goal, Metric, SetLog, SetTarget, WorkoutSession},
    utils::parse_day,
};

/// One historical set together with the session it was performed in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySet {
    pub session_id: String,
    pub date: DateTime<Utc>,
    pub duration_mins: Option<u32>,
    pub fatigue: Option<u8>,
    pub pain: Option<u8>,
    pub set: SetLog,
}

#[allow(async_fn_in_trait)]
pub trait SessionStore {
    /// Every logged set of one exercise, each with its host session attached.
    async fn fetch_exercise_history(&self, exercise_id: &str) -> Result<Vec<HistorySet>>;

    /// The full exercise catalog.
    async fn fetch_exercises(&self) -> Result<Vec<Exercise>>;
}

/// Rebuild sessions from a flat set history, ordered by date then session id.
/// Sets keep the order they arrived in.
pub fn group_sessions(mut history: Vec<HistorySet>) -> Vec<WorkoutSession> {
    history.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });

    let chunks = history.into_iter().chunk_by(|h| h.session_id.clone());
    let mut sessions = Vec::new();
    for (id, group) in &chunks {
        let group: Vec<HistorySet> = group.collect();
        let Some(first) = group.first() else { continue };

        sessions.push(WorkoutSession {
            id,
            date: first.date,
            duration_mins: first.duration_mins,
            fatigue: first.fatigue,
            pain: first.pain,
            sets: group.into_iter().map(|h| h.set).collect(),
        });
    }

    sessions
}

fn flatten(session: &WorkoutSession, exercise_id: &str) -> Vec<HistorySet> {
    session
        .sets
        .iter()
        .filter(|s| s.exercise_id == exercise_id)
        .map(|s| HistorySet {
            session_id: session.id.clone(),
            date: session.date,
            duration_mins: session.duration_mins,
            fatigue: session.fatigue,
            pain: session.pain,
            set: s.clone(),
        })
        .collect()
}

/// In-process store owned by its caller.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    exercises: Vec<Exercise>,
    sessions: Vec<WorkoutSession>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_exercise(&mut self, exercise: Exercise) {
        self.exercises.push(exercise);
    }

    pub fn add_session(&mut self, session: WorkoutSession) {
        self.sessions.push(session);
    }
}

impl SessionStore for MemoryStore {
    async fn fetch_exercise_history(&self, exercise_id: &str) -> Result<Vec<HistorySet>> {
        Ok(self
            .sessions
            .iter()
            .flat_map(|s| flatten(s, exercise_id))
            .collect())
    }

    async fn fetch_exercises(&self) -> Result<Vec<Exercise>> {
        Ok(self.exercises.clone())
    }
}

#[derive(FromRow)]
struct HistoryRow {
    session_id: String,
    date: String,
    duration_mins: Option<i64>,
    fatigue: Option<i64>,
    pain: Option<i64>,
    id: String,
    exercise_id: String,
    load_kg: Option<f64>,
    reps: Option<i64>,
    time_secs: Option<f64>,
    distance_m: Option<f64>,
    rom_cm: Option<f64>,
    rpe: Option<f64>,
    rir: Option<i64>,
    tempo: Option<String>,
    completed: bool,
    target_load: Option<f64>,
    target_reps: Option<i64>,
    target_time: Option<f64>,
    target_dist: Option<f64>,
    target_rom: Option<f64>,
}

impl HistoryRow {
    fn into_history(self) -> Option<HistorySet> {
        let Some(date) = parse_day(&self.date) else {
            log::warn!("skipping set {}: unreadable session date `{}`", self.id, self.date);
            return None;
        };

        let target = SetTarget {
            load_kg: self.target_load,
            reps: self.target_reps.and_then(|r| u32::try_from(r).ok()),
            time_secs: self.target_time,
            distance_m: self.target_dist,
            rom_cm: self.target_rom,
        };
        let target = (target != SetTarget::default()).then_some(target);

        Some(HistorySet {
            session_id: self.session_id,
            date,
            duration_mins: self.duration_mins.and_then(|d| u32::try_from(d).ok()),
            fatigue: self.fatigue.and_then(|f| u8::try_from(f).ok()),
            pain: self.pain.and_then(|p| u8::try_from(p).ok()),
            set: SetLog {
                id: self.id,
                exercise_id: self.exercise_id,
                load_kg: self.load_kg,
                reps: self.reps.and_then(|r| u32::try_from(r).ok()),
                time_secs: self.time_secs,
                distance_m: self.distance_m,
                rom_cm: self.rom_cm,
                rpe: self.rpe,
                rir: self.rir.and_then(|r| u32::try_from(r).ok()),
                tempo: self.tempo,
                completed: self.completed,
                target,
            },
        })
    }
}

const HISTORY_SELECT: &str = r#"
    SELECT ws.id AS session_id, ws.date, ws.duration_mins, ws.fatigue, ws.pain,
           sl.id, sl.exercise_id, sl.load_kg, sl.reps, sl.time_secs, sl.distance_m,
           sl.rom_cm, sl.rpe, sl.rir, sl.tempo, sl.completed, sl.target_load, sl.target_reps,
           sl.target_time, sl.target_dist, sl.target_rom
    FROM set_logs sl
    JOIN workout_sessions ws ON ws.id = sl.session_id
"#;

fn parse_metrics(raw: &str) -> Vec<Metric> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| match s.parse::<Metric>() {
            Ok(m) => Some(m),
            Err(e) => {
                log::warn!("ignoring enabled metric: {e}");
                None
            }
        })
        .collect()
}

/// Store backed by the local SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: DB,
}

impl SqliteStore {
    pub fn new(pool: DB) -> Self {
        Self { pool }
    }

    pub async fn add_exercise(&self, name: &str, metrics: &[Metric]) -> Result<Exercise> {
        let exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            enabled_metrics: metrics.to_vec(),
        };

        sqlx::query(
            r#"
            INSERT INTO exercises (id, name, enabled_metrics, created_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            "#,
        )
        .bind(&exercise.id)
        .bind(&exercise.name)
        .bind(metrics.iter().join(","))
        .execute(&self.pool)
        .await?;

        Ok(exercise)
    }

    /// Persist a session and all of its sets in one transaction.
    pub async fn log_session(&self, session: &WorkoutSession) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO workout_sessions (id, date, duration_mins, fatigue, pain) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session.id)
        .bind(session.date.to_rfc3339())
        .bind(session.duration_mins.map(i64::from))
        .bind(session.fatigue.map(i64::from))
        .bind(session.pain.map(i64::from))
        .execute(&mut *tx)
        .await
        .with_context(|| format!("DB error inserting session `{}`", session.id))?;

        for (position, set) in session.sets.iter().enumerate() {
            let target = set.target.clone().unwrap_or_default();
            sqlx::query(
                r#"
                INSERT INTO set_logs
                  (id, session_id, exercise_id, position, load_kg, reps, time_secs, distance_m,
                   rom_cm, rpe, rir, tempo, completed, target_load, target_reps,
                   target_time, target_dist, target_rom)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                "#,
            )
            .bind(&set.id)
            .bind(&session.id)
            .bind(&set.exercise_id)
            .bind(position as i64)
            .bind(set.load_kg)
            .bind(set.reps.map(i64::from))
            .bind(set.time_secs)
            .bind(set.distance_m)
            .bind(set.rom_cm)
            .bind(set.rpe)
            .bind(set.rir.map(i64::from))
            .bind(set.tempo.as_deref())
            .bind(set.completed)
            .bind(target.load_kg)
            .bind(target.reps.map(i64::from))
            .bind(target.time_secs)
            .bind(target.distance_m)
            .bind(target.rom_cm)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("DB error inserting set {} of session `{}`", position + 1, session.id))?;
        }

        tx.commit().await?;
        log::info!("logged session {} with {} sets", session.id, session.sets.len());
        Ok(())
    }

    /// Every session with all of its sets, oldest first.
    pub async fn list_sessions(&self) -> Result<Vec<WorkoutSession>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "{HISTORY_SELECT} ORDER BY ws.date, ws.id, sl.position"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut sessions =
            group_sessions(rows.into_iter().filter_map(HistoryRow::into_history).collect());

        // Sessions whose sets were all removed still show up.
        let empty = sqlx::query(
            "SELECT id, date, duration_mins, fatigue, pain FROM workout_sessions \
             WHERE id NOT IN (SELECT session_id FROM set_logs)",
        )
        .fetch_all(&self.pool)
        .await?;
        for r in empty {
            let raw: String = r.get("date");
            let Some(date) = parse_day(&raw) else { continue };
            sessions.push(WorkoutSession {
                id: r.get("id"),
                date,
                sets: Vec::new(),
                duration_mins: r.get::<Option<i64>, _>("duration_mins").and_then(|d| u32::try_from(d).ok()),
                fatigue: r.get::<Option<i64>, _>("fatigue").and_then(|f| u8::try_from(f).ok()),
                pain: r.get::<Option<i64>, _>("pain").and_then(|p| u8::try_from(p).ok()),
            });
        }
        sessions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        Ok(sessions)
    }

    /// Delete a session by id or unique id prefix. Returns the deleted id.
    pub async fn delete_session(&self, id_or_prefix: &str) -> Result<Option<String>> {
        // Plain prefix comparison so `%` and `_` in the input match literally.
        let matches: Vec<String> =
            sqlx::query_scalar("SELECT id FROM workout_sessions WHERE substr(id, 1, length(?1)) = ?1")
                .bind(id_or_prefix)
                .fetch_all(&self.pool)
                .await?;

        let id = match matches.as_slice() {
            [] => return Ok(None),
            [id] => id.clone(),
            _ => return Err(anyhow!("`{id_or_prefix}` matches {} sessions", matches.len())),
        };

        sqlx::query("DELETE FROM workout_sessions WHERE id = ?1")
            .bind(&id)
            .execute(&self.pool)
            .await?;

        Ok(Some(id))
    }

    pub async fn add_goal(&self, exercise_id: &str, metric: Metric, target: f64) -> Result<Goal> {
        let goal = Goal {
            id: Uuid::new_v4().to_string(),
            exercise_id: exercise_id.to_string(),
            metric,
            target,
        };

        sqlx::query(
            "INSERT INTO goals (id, exercise_id, metric, target, created_at) VALUES (?1, ?2, ?3, ?4, datetime('now'))",
        )
        .bind(&goal.id)
        .bind(&goal.exercise_id)
        .bind(goal.metric.to_string())
        .bind(goal.target)
        .execute(&self.pool)
        .await?;

        Ok(goal)
    }

    pub async fn list_goals(&self) -> Result<Vec<Goal>> {
        let rows: Vec<(String, String, String, f64)> =
            sqlx::query_as("SELECT id, exercise_id, metric, target FROM goals ORDER BY created_at, id")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(id, exercise_id, metric, target)| {
                Ok(Goal {
                    id,
                    exercise_id,
                    metric: metric.parse()?,
                    target,
                })
            })
            .collect()
    }
}

impl SessionStore for SqliteStore {
    async fn fetch_exercise_history(&self, exercise_id: &str) -> Result<Vec<HistorySet>> {
        let rows: Vec<HistoryRow> = sqlx::query_as(&format!(
            "{HISTORY_SELECT} WHERE sl.exercise_id = ?1 ORDER BY ws.date, ws.id, sl.position"
        ))
        .bind(exercise_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Failed to load history for exercise `{exercise_id}`"))?;

        Ok(rows.into_iter().filter_map(HistoryRow::into_history).collect())
    }

    async fn fetch_exercises(&self) -> Result<Vec<Exercise>> {
        let rows = sqlx::query("SELECT id, name, enabled_metrics FROM exercises ORDER BY idx")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| Exercise {
                id: r.get("id"),
                name: r.get("name"),
                enabled_metrics: parse_metrics(r.get("enabled_metrics")),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn history(session: &str, day: u32, load: f64) -> HistorySet {
        HistorySet {
            session_id: session.into(),
            date: Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
            duration_mins: Some(60),
            fatigue: None,
            pain: None,
            set: SetLog {
                id: format!("{session}-{load}"),
                exercise_id: "dl".into(),
                load_kg: Some(load),
                reps: Some(3),
                completed: true,
                ..SetLog::default()
            },
        }
    }

    #[test]
    fn grouping_orders_sessions_by_date_and_keeps_set_order() {
        let grouped = group_sessions(vec![
            history("b", 9, 180.0),
            history("a", 2, 170.0),
            history("b", 9, 185.0),
            history("a", 2, 175.0),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].id, "a");
        let loads: Vec<_> = grouped[1].sets.iter().map(|s| s.load_kg).collect();
        assert_eq!(loads, [Some(180.0), Some(185.0)]);
        assert_eq!(grouped[1].duration_mins, Some(60));
    }

    #[test]
    fn metric_lists_skip_unknown_names() {
        assert_eq!(parse_metrics("load, reps,,bogus"), [Metric::Load, Metric::Reps]);
        assert!(parse_metrics("").is_empty());
    }

    #[tokio::test]
    async fn memory_store_lists_added_exercises() {
        let mut store = MemoryStore::new();
        assert!(store.fetch_exercises().await.unwrap().is_empty());

        store.add_exercise(Exercise {
            id: "plank".into(),
            name: "Plank".into(),
            enabled_metrics: vec![Metric::Time],
        });
        let exercises = store.fetch_exercises().await.unwrap();
        assert_eq!(exercises.len(), 1);
        assert_eq!(exercises[0].name, "Plank");
        assert_eq!(exercises[0].enabled_metrics, [Metric::Time]);
    }

    #[tokio::test]
    async fn memory_store_only_returns_the_requested_exercise() {
        let mut store = MemoryStore::new();
        let date = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        store.add_session(WorkoutSession {
            id: "s".into(),
            date,
            sets: vec![
                SetLog { exercise_id: "dl".into(), load_kg: Some(200.0), ..SetLog::default() },
                SetLog { exercise_id: "bench".into(), load_kg: Some(100.0), ..SetLog::default() },
            ],
            duration_mins: None,
            fatigue: None,
            pain: None,
        });

        let history = store.fetch_exercise_history("dl").await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].set.load_kg, Some(200.0));
        assert_eq!(history[0].date, date);
    }
}
