use std::fmt::Display;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A trackable quantity. Every kind except `Volume` maps to one field of a
/// [`SetLog`]; volume is always `load × reps` summed over a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Load,
    Reps,
    Time,
    Distance,
    Rom,
    Volume,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Load,
        Metric::Reps,
        Metric::Time,
        Metric::Distance,
        Metric::Rom,
        Metric::Volume,
    ];

    /// Unit suffix used when printing values.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Load => "kg",
            Self::Reps => "reps",
            Self::Time => "s",
            Self::Distance => "m",
            Self::Rom => "cm",
            Self::Volume => "kg",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Load => "load",
            Self::Reps => "reps",
            Self::Time => "time",
            Self::Distance => "distance",
            Self::Rom => "rom",
            Self::Volume => "volume",
        };

        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("unknown metric `{s}`"))
    }
}

/// How the sets of one session collapse into a single number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggMode {
    #[default]
    Max,
    Min,
    Avg,
    Sum,
}

impl Display for AggMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Avg => "avg",
            Self::Sum => "sum",
        };

        write!(f, "{}", s)
    }
}

/// Rolling range selector for the analysis window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum TimeFrame {
    #[value(name = "1M")]
    #[serde(rename = "1M")]
    OneMonth,
    #[default]
    #[value(name = "3M")]
    #[serde(rename = "3M")]
    ThreeMonths,
    #[value(name = "6M")]
    #[serde(rename = "6M")]
    SixMonths,
    #[value(name = "1Y")]
    #[serde(rename = "1Y")]
    OneYear,
    #[value(name = "ALL")]
    #[serde(rename = "ALL")]
    All,
    #[value(name = "CUSTOM")]
    #[serde(rename = "CUSTOM")]
    Custom,
}

impl Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::All => "ALL",
            Self::Custom => "CUSTOM",
        };

        write!(f, "{}", s)
    }
}

impl std::str::FromStr for TimeFrame {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <TimeFrame as ValueEnum>::from_str(s.trim(), true)
            .map_err(|_| anyhow::anyhow!("unknown timeframe `{s}` (expected 1M, 3M, 6M, 1Y, ALL or CUSTOM)"))
    }
}

/// A [`TimeFrame`] paired with the day count used when the frame is `Custom`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub frame: TimeFrame,
    pub custom_days: u32,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            frame: TimeFrame::default(),
            custom_days: 30,
        }
    }
}

/// Target values shown as placeholders while logging. Analytics never reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetTarget {
    pub load_kg: Option<f64>,
    pub reps: Option<u32>,
    pub time_secs: Option<f64>,
    pub distance_m: Option<f64>,
    pub rom_cm: Option<f64>,
}

/// One performed set. Every measurement is optional: not every exercise
/// tracks every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SetLog {
    pub id: String,
    pub exercise_id: String,
    pub load_kg: Option<f64>,
    pub reps: Option<u32>,
    pub time_secs: Option<f64>,
    pub distance_m: Option<f64>,
    pub rom_cm: Option<f64>,
    pub rpe: Option<f64>,
    pub rir: Option<u32>,
    pub tempo: Option<String>,
    pub completed: bool,
    pub target: Option<SetTarget>,
}

impl SetLog {
    /// The recorded value of a single-field metric, `None` when not logged.
    /// Non-finite values read as not logged.
    /// `Volume` is derived from load and reps and is `None` only when both are missing.
    pub fn recorded(&self, metric: Metric) -> Option<f64> {
        let finite = |v: Option<f64>| v.filter(|v| v.is_finite());
        match metric {
            Metric::Load => finite(self.load_kg),
            Metric::Reps => self.reps.map(f64::from),
            Metric::Time => finite(self.time_secs),
            Metric::Distance => finite(self.distance_m),
            Metric::Rom => finite(self.rom_cm),
            Metric::Volume => match (finite(self.load_kg), self.reps) {
                (None, None) => None,
                (load, reps) => Some(load.unwrap_or(0.0) * f64::from(reps.unwrap_or(0))),
            },
        }
    }
}

/// One completed workout. Sets keep the order they were logged in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: String,
    pub date: DateTime<Utc>,
    pub sets: Vec<SetLog>,
    pub duration_mins: Option<u32>,
    pub fatigue: Option<u8>,
    pub pain: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub enabled_metrics: Vec<Metric>,
}

impl Exercise {
    /// Whether `metric` can be selected as an analysis variable.
    /// Volume needs both load and reps.
    pub fn allows(&self, metric: Metric) -> bool {
        match metric {
            Metric::Volume => {
                self.enabled_metrics.contains(&Metric::Load)
                    && self.enabled_metrics.contains(&Metric::Reps)
            }
            m => self.enabled_metrics.contains(&m),
        }
    }
}

/// One session reduced to its per-metric values for a single exercise.
#[derive(Debug, Clone, Copy)]
pub struct DataPoint<'a> {
    pub date: DateTime<Utc>,
    pub load: f64,
    pub reps: f64,
    pub volume: f64,
    pub rom: f64,
    pub time: f64,
    pub distance: f64,
    pub session: &'a WorkoutSession,
}

impl DataPoint<'_> {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Load => self.load,
            Metric::Reps => self.reps,
            Metric::Time => self.time,
            Metric::Distance => self.distance,
            Metric::Rom => self.rom,
            Metric::Volume => self.volume,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Ascending,
    Descending,
    Plateauing,
    #[default]
    InsufficientData,
}

impl Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
            Self::Plateauing => "plateauing",
            Self::InsufficientData => "insufficient data",
        };

        write!(f, "{}", s)
    }
}

/// Summary statistics for one variable over the filtered window.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsMetrics {
    pub max: f64,
    pub min: f64,
    pub avg: f64,
    pub volume: f64,
    pub est_1rm: Option<f64>,
    pub est_3rm: Option<f64>,
    pub est_5rm: Option<f64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub exercise_id: String,
    pub metric: Metric,
    pub target: f64,
}
