use std::collections::HashMap;

use anyhow::Result;
use colored::Colorize;
use repscope::{
    goals::{GoalProgress, goal_progress, progress_bar},
    models::Goal,
    store::{SessionStore, SqliteStore, group_sessions},
    types::{OutputFmt, emit},
};
use serde::Serialize;

use crate::{cli::GoalCmd, commands::resolve_exercise};

#[derive(Serialize)]
struct GoalJson {
    #[serde(flatten)]
    goal: Goal,
    exercise: String,
    progress: GoalProgress,
}

pub async fn handle(cmd: GoalCmd, store: &SqliteStore, fmt: OutputFmt) -> Result<()> {
    match cmd {
        GoalCmd::Add {
            exercise,
            metric,
            target,
        } => {
            let Some(ex) = resolve_exercise(store, &exercise).await? else {
                return Ok(());
            };

            if !ex.allows(metric) {
                println!(
                    "{} `{}` does not track {}",
                    "warning:".yellow().bold(),
                    ex.name,
                    metric.to_string().yellow()
                );
                return Ok(());
            }
            if !(target.is_finite() && target > 0.0) {
                println!("{} target must be a positive number", "error:".red().bold());
                return Ok(());
            }

            let goal = store.add_goal(&ex.id, metric, target).await?;
            println!(
                "{} goal set: {} {} {} {}",
                "ok:".green().bold(),
                ex.name.bold(),
                goal.metric,
                goal.target,
                goal.metric.unit()
            );
        }

        GoalCmd::List => {
            let names: HashMap<String, String> = store
                .fetch_exercises()
                .await?
                .into_iter()
                .map(|e| (e.id, e.name))
                .collect();

            let mut rows = Vec::new();
            for goal in store.list_goals().await? {
                let sessions = group_sessions(store.fetch_exercise_history(&goal.exercise_id).await?);
                rows.push(GoalJson {
                    exercise: names.get(&goal.exercise_id).cloned().unwrap_or_default(),
                    progress: goal_progress(&goal, &sessions),
                    goal,
                });
            }

            emit(fmt, &rows, || {
                println!("{}", "Goals:".cyan().bold());

                let name_w = rows.iter().map(|r| r.exercise.chars().count()).max().unwrap_or(0);
                for r in &rows {
                    let status = if r.progress.achieved {
                        "done".green().bold()
                    } else {
                        format!("{:>3.0}%", r.progress.ratio * 100.0).yellow()
                    };
                    println!(
                        " {} {:<8} {} {} {:.1}/{:.1} {}",
                        format!("{:<name_w$}", r.exercise).bold(),
                        r.goal.metric.to_string(),
                        progress_bar(r.progress.ratio, 20).blue(),
                        status,
                        r.progress.current,
                        r.progress.target,
                        r.goal.metric.unit()
                    );
                }

                if rows.is_empty() {
                    println!("{}", "  (no goals set)".dimmed());
                }
            })?;
        }
    }

    Ok(())
}
