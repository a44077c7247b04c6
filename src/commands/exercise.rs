use crate::cli::ExerciseCmd;
use anyhow::Result;
use colored::Colorize;
use itertools::Itertools;
use repscope::{
    store::{SessionStore, SqliteStore},
    types::{OutputFmt, emit, parse_metric_list},
};
use serde::Serialize;

#[derive(Serialize)]
struct ExJson {
    idx: usize,
    id: String,
    name: String,
    enabled_metrics: Vec<String>,
}

fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        // 2067 = SQLITE_CONSTRAINT_UNIQUE
        Some(sqlx::Error::Database(db_err)) => db_err.code().as_deref() == Some("2067"),
        _ => false,
    }
}

pub async fn handle(cmd: ExerciseCmd, store: &SqliteStore, fmt: OutputFmt) -> Result<()> {
    match cmd {
        ExerciseCmd::Add { name, metrics } => {
            let metrics = match parse_metric_list(&metrics) {
                Ok(metrics) => metrics,
                Err(e) => {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
            };

            match store.add_exercise(&name, &metrics).await {
                Ok(ex) => println!(
                    "{} Exercise \"{}\" added, tracking {}",
                    "info:".blue().bold(),
                    ex.name,
                    ex.enabled_metrics.iter().join(", ").yellow()
                ),
                Err(e) if is_unique_violation(&e) => println!(
                    "{} Exercise \"{}\" already exists, use `ex list` to view all exercises",
                    "warning:".yellow().bold(),
                    name
                ),
                Err(e) => {
                    println!("{} {}", "error:".red().bold(), e.to_string().red());
                    return Err(e);
                }
            }
        }

        ExerciseCmd::List => {
            let exercises = store.fetch_exercises().await?;
            let json_rows: Vec<ExJson> = exercises
                .into_iter()
                .enumerate()
                .map(|(i, ex)| ExJson {
                    idx: i + 1,
                    id: ex.id,
                    name: ex.name,
                    enabled_metrics: ex.enabled_metrics.iter().map(ToString::to_string).collect(),
                })
                .collect();

            emit(fmt, &json_rows, || {
                println!("{}", "Exercises:".cyan().bold());

                let idx_w = json_rows.iter().map(|e| e.idx.to_string().len()).max().unwrap_or(1);
                let name_w = json_rows.iter().map(|e| e.name.chars().count()).max().unwrap_or(0);

                for ex in &json_rows {
                    println!(
                        " {} • {} {} {}",
                        format!("{:>idx_w$}", ex.idx).yellow(),
                        format!("{:<name_w$}", ex.name).bold(),
                        "|".blue(),
                        ex.enabled_metrics.join(", ").dimmed(),
                    );
                }

                if json_rows.is_empty() {
                    println!("{}", "  (no exercises found)".dimmed());
                }
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bad_metric_list_is_reported_without_adding() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(repscope::db::open(&dir.path().join("t.db")).await.unwrap());

        for metrics in ["load,speed", "volume", ""] {
            let cmd = ExerciseCmd::Add {
                name: "Sled Push".into(),
                metrics: metrics.into(),
            };
            assert!(handle(cmd, &store, OutputFmt::Text).await.is_ok());
        }
        assert!(store.fetch_exercises().await.unwrap().is_empty());
    }
}
