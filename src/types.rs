use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use strsim::jaro_winkler;

use crate::models::{Exercise, Metric, TimeFrame, TimeWindow};

/// How command results are printed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFmt {
    Text,
    Json,
}

impl OutputFmt {
    pub fn from_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }
}

/// Print `data` as JSON, or run `pretty` for the human-readable rendering.
pub fn emit<T: Serialize>(fmt: OutputFmt, data: &T, pretty: impl FnOnce()) -> Result<()> {
    match fmt {
        OutputFmt::Json => println!("{}", serde_json::to_string_pretty(data)?),
        OutputFmt::Text => pretty(),
    }
    Ok(())
}

/// Flat key/value settings persisted as TOML.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Config {
    pub map: BTreeMap<String, String>,
}

impl Config {
    pub const DB_PATH: &'static str = "db_path";
    pub const TIMEFRAME: &'static str = "timeframe";
    pub const CUSTOM_DAYS: &'static str = "custom_days";

    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("repscope").join("config"))
            .context("Could not determine config directory")
    }

    /// Load the config at `path`; a missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }

        let content = toml::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to save config to {}", path.display()))
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        if let Some(p) = self.map.get(Self::DB_PATH) {
            return Ok(PathBuf::from(p));
        }

        dirs::data_dir()
            .map(|d| d.join("repscope").join("repscope.db"))
            .context("Could not determine data directory; set `db_path` with `repscope config set`")
    }

    /// The default analysis window, falling back to 3 months / 30 days.
    pub fn window(&self) -> Result<TimeWindow> {
        let mut window = TimeWindow::default();
        if let Some(frame) = self.map.get(Self::TIMEFRAME) {
            window.frame = frame.parse::<TimeFrame>()?;
        }
        if let Some(days) = self.map.get(Self::CUSTOM_DAYS) {
            window.custom_days = days
                .trim()
                .parse()
                .with_context(|| format!("`{}` must be a whole number of days, got `{days}`", Self::CUSTOM_DAYS))?;
        }
        Ok(window)
    }
}

/// Parse a comma separated metric list such as `load,reps,rom`.
pub fn parse_metric_list(raw: &str) -> Result<Vec<Metric>> {
    let mut metrics = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let m = part.parse::<Metric>()?;
        anyhow::ensure!(m != Metric::Volume, "volume is derived from load and reps; enable those instead");
        if !metrics.contains(&m) {
            metrics.push(m);
        }
    }
    anyhow::ensure!(!metrics.is_empty(), "at least one metric must be enabled");
    Ok(metrics)
}

/// Return the closest name to `input`
/// if similarity ≥ 0.80 *and* clearly better than the runner-up.
pub fn best_name_suggestion<'a>(input: &str, names: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let inp = input.to_ascii_lowercase();

    let mut scores: Vec<(&'a str, f64)> = names
        .into_iter()
        .map(|n| (n, jaro_winkler(&inp, &n.to_ascii_lowercase())))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best_name, best_score) = *scores.first()?;
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best_name)
    } else {
        None
    }
}

/// Find an exercise by its 1-based position in `exercises` or by name
/// (case-insensitive).
pub fn find_exercise<'a>(exercises: &'a [Exercise], query: &str) -> Option<&'a Exercise> {
    let query = query.trim();
    if let Ok(idx) = query.parse::<usize>() {
        return idx.checked_sub(1).and_then(|i| exercises.get(i));
    }

    exercises.iter().find(|e| e.name.eq_ignore_ascii_case(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Exercise> {
        ["Bench Press", "Back Squat", "Deadlift"]
            .iter()
            .enumerate()
            .map(|(i, name)| Exercise {
                id: format!("e{i}"),
                name: name.to_string(),
                enabled_metrics: vec![Metric::Load, Metric::Reps],
            })
            .collect()
    }

    #[test]
    fn find_by_index_or_name() {
        let ex = catalog();
        assert_eq!(find_exercise(&ex, "2").map(|e| e.id.as_str()), Some("e1"));
        assert_eq!(find_exercise(&ex, "deadlift").map(|e| e.id.as_str()), Some("e2"));
        assert!(find_exercise(&ex, "0").is_none());
        assert!(find_exercise(&ex, "Curl").is_none());
    }

    #[test]
    fn suggests_close_names_only() {
        let ex = catalog();
        let names = || ex.iter().map(|e| e.name.as_str());
        assert_eq!(best_name_suggestion("deadlfit", names()), Some("Deadlift"));
        assert_eq!(best_name_suggestion("zzz", names()), None);
        assert_eq!(best_name_suggestion("anything", std::iter::empty()), None);
    }

    #[test]
    fn metric_lists() {
        assert_eq!(parse_metric_list("load, reps,load").unwrap(), [Metric::Load, Metric::Reps]);
        assert!(parse_metric_list("volume").is_err());
        assert!(parse_metric_list("").is_err());
        assert!(parse_metric_list("speed").is_err());
    }

    #[test]
    fn config_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config");

        let mut cfg = Config::load(&path).unwrap();
        assert!(cfg.map.is_empty());

        cfg.map.insert(Config::TIMEFRAME.into(), "1y".into());
        cfg.map.insert(Config::CUSTOM_DAYS.into(), "45".into());
        cfg.save(&path).unwrap();

        let cfg = Config::load(&path).unwrap();
        let window = cfg.window().unwrap();
        assert_eq!(window.frame, TimeFrame::OneYear);
        assert_eq!(window.custom_days, 45);
    }

    #[test]
    fn bad_config_values_are_reported() {
        let mut cfg = Config::default();
        cfg.map.insert(Config::TIMEFRAME.into(), "2W".into());
        assert!(cfg.window().is_err());
    }
}
