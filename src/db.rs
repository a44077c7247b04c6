use std::path::Path;

use anyhow::{Context, Result};
use sqlx::{
    Executor, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

pub type DB = SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS exercises (
    idx             INTEGER PRIMARY KEY AUTOINCREMENT,
    id              TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL UNIQUE,
    enabled_metrics TEXT NOT NULL DEFAULT 'load,reps',
    created_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS workout_sessions (
    id            TEXT PRIMARY KEY,
    date          TEXT NOT NULL,
    duration_mins INTEGER,
    fatigue       INTEGER,
    pain          INTEGER
);

CREATE TABLE IF NOT EXISTS set_logs (
    id            TEXT PRIMARY KEY,
    session_id    TEXT NOT NULL REFERENCES workout_sessions(id) ON DELETE CASCADE,
    exercise_id   TEXT NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    position      INTEGER NOT NULL,
    load_kg       REAL,
    reps          INTEGER,
    time_secs     REAL,
    distance_m    REAL,
    rom_cm        REAL,
    rpe           REAL,
    rir           INTEGER,
    tempo         TEXT,
    completed     INTEGER NOT NULL DEFAULT 1,
    target_load   REAL,
    target_reps   INTEGER,
    target_time   REAL,
    target_dist   REAL,
    target_rom    REAL
);

CREATE INDEX IF NOT EXISTS set_logs_exercise ON set_logs(exercise_id);

CREATE TABLE IF NOT EXISTS goals (
    id          TEXT PRIMARY KEY,
    exercise_id TEXT NOT NULL REFERENCES exercises(id) ON DELETE CASCADE,
    metric      TEXT NOT NULL,
    target      REAL NOT NULL,
    created_at  TEXT NOT NULL
);
"#;

/// Columns added to `set_logs` after its first release.
const LATE_SET_COLUMNS: [(&str, &str); 3] = [
    ("target_time", "REAL"),
    ("target_dist", "REAL"),
    ("target_rom", "REAL"),
];

async fn add_missing_columns(pool: &DB) -> Result<()> {
    for (name, kind) in LATE_SET_COLUMNS {
        let present: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info('set_logs') WHERE name = ?1")
                .bind(name)
                .fetch_one(pool)
                .await?;

        if present == 0 {
            log::info!("adding column set_logs.{name}");
            pool.execute(format!("ALTER TABLE set_logs ADD COLUMN {name} {kind}").as_str())
                .await
                .with_context(|| format!("Failed to add column set_logs.{name}"))?;
        }
    }

    Ok(())
}

/// Open (creating if needed) the database at `path` and make sure every table exists.
pub async fn open(path: &Path) -> Result<DB> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let opts = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    pool.execute(SCHEMA).await.context("Failed to create tables")?;
    add_missing_columns(&pool).await?;
    log::debug!("opened database {}", path.display());

    Ok(pool)
}
