use anyhow::Result;
use colored::Colorize;
use repscope::{
    models::Exercise,
    store::SessionStore,
    types::{best_name_suggestion, find_exercise},
};

pub mod analyze;
pub mod config;
pub mod exercise;
pub mod goal;
pub mod session;

/// Look up an exercise by index or name. Prints an error (with a suggestion
/// when one is close enough) and returns `None` when nothing matches.
pub async fn resolve_exercise<S: SessionStore>(store: &S, query: &str) -> Result<Option<Exercise>> {
    let exercises = store.fetch_exercises().await?;
    if let Some(ex) = find_exercise(&exercises, query) {
        return Ok(Some(ex.clone()));
    }

    match best_name_suggestion(query, exercises.iter().map(|e| e.name.as_str())) {
        Some(sug) => println!(
            "{} no exercise `{}` -- did you mean: `{}`?",
            "error:".red().bold(),
            query,
            sug.green()
        ),
        None => println!(
            "{} no exercise `{}`, use `ex list` to view all exercises",
            "error:".red().bold(),
            query
        ),
    }

    Ok(None)
}
