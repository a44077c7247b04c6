use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail, ensure};
use chrono::Utc;
use colored::Colorize;
use itertools::Itertools;
use repscope::{
    models::{Exercise, Metric, SetLog, WorkoutSession},
    store::{SessionStore, SqliteStore},
    types::{OutputFmt, emit},
    utils::{calculate_est_1rm, format_duration, parse_day},
};
use uuid::Uuid;

use crate::{cli::SessionCmd, commands::resolve_exercise};

fn parse_num<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("invalid {key}: `{raw}`"))
}

/// Parse one set. Accepts the short form `LOADxREPS[@RPE]` (`bw` for an
/// unloaded set) or comma separated `key=value` pairs over `load`, `reps`,
/// `time`, `distance`, `rom`, `rpe`, `rir` and `tempo`.
pub fn parse_set(input: &str, exercise_id: &str) -> Result<SetLog> {
    let mut set = SetLog {
        id: Uuid::new_v4().to_string(),
        exercise_id: exercise_id.to_string(),
        completed: true,
        ..SetLog::default()
    };

    let input = input.trim();
    if input.contains('=') {
        for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, val) = pair
                .split_once('=')
                .with_context(|| format!("expected key=value, got `{pair}`"))?;
            match key.trim().to_ascii_lowercase().as_str() {
                "load" => set.load_kg = Some(parse_num("load", val)?),
                "reps" => set.reps = Some(parse_num("reps", val)?),
                "time" => set.time_secs = Some(parse_num("time", val)?),
                "distance" => set.distance_m = Some(parse_num("distance", val)?),
                "rom" => set.rom_cm = Some(parse_num("rom", val)?),
                "rpe" => set.rpe = Some(parse_num("rpe", val)?),
                "rir" => set.rir = Some(parse_num("rir", val)?),
                "tempo" => set.tempo = Some(val.trim().to_string()),
                other => bail!("unknown set field `{other}`"),
            }
        }
    } else {
        let (body, rpe) = match input.split_once('@') {
            Some((body, rpe)) => (body, Some(parse_num::<f64>("rpe", rpe)?)),
            None => (input, None),
        };
        let (load, reps) = body
            .split_once(['x', 'X', '×'])
            .with_context(|| format!("expected LOADxREPS, got `{input}`"))?;

        if !load.trim().eq_ignore_ascii_case("bw") {
            set.load_kg = Some(parse_num("load", load)?);
        }
        set.reps = Some(parse_num("reps", reps)?);
        set.rpe = rpe;
    }

    for (name, v) in [
        ("load", set.load_kg),
        ("time", set.time_secs),
        ("distance", set.distance_m),
        ("rom", set.rom_cm),
    ] {
        if let Some(v) = v {
            ensure!(v.is_finite() && v >= 0.0, "{name} must be a non-negative number");
        }
    }
    if let Some(rpe) = set.rpe {
        ensure!((0.0..=10.0).contains(&rpe), "rpe must be between 0 and 10");
    }

    Ok(set)
}

/// Metrics recorded on `set` that `exercise` does not track.
fn untracked(exercise: &Exercise, set: &SetLog) -> Vec<Metric> {
    Metric::ALL
        .into_iter()
        .filter(|&m| m != Metric::Volume)
        .filter(|&m| set.recorded(m).is_some() && !exercise.enabled_metrics.contains(&m))
        .collect()
}

/// First eight characters of a session id, or the whole id when shorter.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn describe_set(set: &SetLog) -> String {
    let mut parts = Vec::new();
    match (set.load_kg, set.reps) {
        (Some(load), Some(reps)) => parts.push(format!("{load}×{reps}")),
        (None, Some(reps)) => parts.push(format!("bw×{reps}")),
        (Some(load), None) => parts.push(format!("{load}kg")),
        (None, None) => {}
    }
    if let Some(t) = set.time_secs {
        parts.push(format!("{t}s"));
    }
    if let Some(d) = set.distance_m {
        parts.push(format!("{d}m"));
    }
    if let Some(r) = set.rom_cm {
        parts.push(format!("rom {r}cm"));
    }
    if let Some(rpe) = set.rpe {
        parts.push(format!("@{rpe}"));
    }

    parts.join(" ")
}

pub async fn handle(cmd: SessionCmd, store: &SqliteStore, fmt: OutputFmt) -> Result<()> {
    match cmd {
        SessionCmd::Log {
            exercise,
            date,
            sets,
            duration,
            fatigue,
            pain,
        } => {
            let Some(ex) = resolve_exercise(store, &exercise).await? else {
                return Ok(());
            };

            let date = match date {
                Some(raw) => match parse_day(&raw) {
                    Some(d) => d,
                    None => {
                        println!("{} invalid date `{}` (expected YYYY-MM-DD)", "error:".red().bold(), raw);
                        return Ok(());
                    }
                },
                None => Utc::now(),
            };

            let sets = match sets
                .iter()
                .map(|input| parse_set(input, &ex.id))
                .collect::<Result<Vec<_>>>()
            {
                Ok(sets) => sets,
                Err(e) => {
                    println!("{} {}", "error:".red().bold(), e);
                    return Ok(());
                }
            };

            for (i, set) in sets.iter().enumerate() {
                let extra = untracked(&ex, set);
                if !extra.is_empty() {
                    println!(
                        "{} set {} records {} which `{}` does not track",
                        "warning:".yellow().bold(),
                        i + 1,
                        extra.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
                        ex.name
                    );
                }
            }

            let session = WorkoutSession {
                id: Uuid::new_v4().to_string(),
                date,
                sets,
                duration_mins: duration,
                fatigue,
                pain,
            };
            store.log_session(&session).await?;

            emit(fmt, &session, || {
                println!(
                    "{} logged {} sets of {} on {} (id {})",
                    "ok:".green().bold(),
                    session.sets.len(),
                    ex.name.bold(),
                    session.date.format("%Y-%m-%d"),
                    short_id(&session.id).dimmed()
                );

                let best = session
                    .sets
                    .iter()
                    .filter_map(|s| Some(calculate_est_1rm(s.load_kg?, s.reps?)))
                    .fold(0.0, f64::max);
                if best > 0.0 {
                    println!("  {} {:.1}kg", "est. 1RM:".cyan(), best);
                }
            })?;
        }

        SessionCmd::List { exercise } => {
            let filter = match exercise {
                Some(q) => match resolve_exercise(store, &q).await? {
                    Some(ex) => Some(ex.id),
                    None => return Ok(()),
                },
                None => None,
            };

            let names: HashMap<String, String> = store
                .fetch_exercises()
                .await?
                .into_iter()
                .map(|e| (e.id, e.name))
                .collect();

            let sessions: Vec<WorkoutSession> = store
                .list_sessions()
                .await?
                .into_iter()
                .filter(|s| match &filter {
                    Some(id) => s.sets.iter().any(|set| &set.exercise_id == id),
                    None => true,
                })
                .collect();

            emit(fmt, &sessions, || {
                println!("{}", "Sessions:".cyan().bold());

                for s in &sessions {
                    let mut header = format!(
                        " {} {}",
                        s.date.format("%Y-%m-%d").to_string().yellow(),
                        short_id(&s.id).dimmed()
                    );
                    if let Some(mins) = s.duration_mins {
                        header.push_str(&format!(" {}", format_duration(chrono::Duration::minutes(mins.into()))));
                    }
                    if let Some(f) = s.fatigue {
                        header.push_str(&format!(" fatigue {f}"));
                    }
                    if let Some(p) = s.pain {
                        header.push_str(&format!(" pain {p}"));
                    }
                    println!("{header}");

                    // Sets stay in logged order; consecutive sets of one exercise share a line.
                    for (ex_id, group) in &s.sets.iter().chunk_by(|set| set.exercise_id.as_str()) {
                        let name = names.get(ex_id).map(String::as_str).unwrap_or("(deleted)");
                        let sets: Vec<String> = group.map(describe_set).collect();
                        println!("   • {} {}", name.bold(), sets.join(", "));
                    }
                }

                if sessions.is_empty() {
                    println!("{}", "  (no sessions found)".dimmed());
                }
            })?;
        }

        SessionCmd::Delete { id } => match store.delete_session(&id).await? {
            Some(deleted) => println!("{} deleted session `{}`", "ok:".green().bold(), deleted),
            None => println!("{} no session matching `{}`", "error:".red().bold(), id),
        },
    }

    Ok(())
}
