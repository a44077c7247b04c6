use clap::{Args, Parser, Subcommand};
use repscope::models::{AggMode, Metric, TimeFrame};

#[derive(Parser)]
#[command(name = "repscope", version, about = "Exercise progress analytics")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Emit machine-readable JSON instead of colorful text.
    #[arg(global = true, long)]
    pub json: bool,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Exercise management
    #[command(subcommand, visible_alias = "ex")]
    Exercise(ExerciseCmd),

    /// Log, list and delete workout sessions
    #[command(subcommand, visible_alias = "s")]
    Session(SessionCmd),

    /// Metrics, trend and chart for one exercise
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),

    /// Per-exercise targets and progress towards them
    #[command(subcommand, visible_alias = "g")]
    Goal(GoalCmd),

    /// View or edit repscope config
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Debug, Subcommand)]
pub enum ExerciseCmd {
    /// Add a new exercise
    #[command(visible_alias = "a")]
    Add {
        /// Exercise name
        name: String,

        /// Tracked metrics, comma separated (load, reps, time, distance, rom)
        #[arg(short, long, default_value = "load,reps")]
        metrics: String,
    },

    /// List all exercises
    #[command(visible_alias = "l")]
    List,
}

#[derive(Debug, Subcommand)]
pub enum SessionCmd {
    /// Log a completed session - Usage: session log EXERCISE --set 100x5 --set 100x5@8
    #[command(visible_alias = "l")]
    Log {
        /// Exercise index or name
        exercise: String,

        /// Session date as YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        date: Option<String>,

        /// One set: `LOADxREPS[@RPE]` or `key=value` pairs such as `time=60,distance=400`
        #[arg(short, long = "set", value_name = "SET", required = true)]
        sets: Vec<String>,

        /// Session duration in minutes
        #[arg(long)]
        duration: Option<u32>,

        /// Perceived fatigue, 1-10
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        fatigue: Option<u8>,

        /// Pain level, 0-10
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=10))]
        pain: Option<u8>,
    },

    /// List logged sessions
    #[command(visible_alias = "ls")]
    List {
        /// Only sessions containing this exercise (index or name)
        exercise: Option<String>,
    },

    /// Delete a session by id or id prefix
    #[command(visible_alias = "d")]
    Delete { id: String },
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    /// Exercise index or name
    pub exercise: String,

    /// Time window (defaults to the `timeframe` config key, then 3M)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub timeframe: Option<TimeFrame>,

    /// Window length in days for `-t custom`
    #[arg(long)]
    pub days: Option<u32>,

    /// Primary variable
    #[arg(short, long, value_enum, default_value_t = Metric::Load)]
    pub var: Metric,

    /// How sets of one session are reduced for the primary variable
    #[arg(short, long, value_enum, default_value_t = AggMode::Max)]
    pub agg: AggMode,

    /// Secondary variable drawn against its own axis
    #[arg(long, value_enum)]
    pub var2: Option<Metric>,

    /// Set aggregation for the secondary variable
    #[arg(long, value_enum, default_value_t = AggMode::Max)]
    pub agg2: AggMode,

    /// Show the chart in the terminal
    #[arg(short, long)]
    pub graph: bool,

    /// Also write the chart as an SVG image
    #[arg(long, value_name = "PATH")]
    pub svg: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum GoalCmd {
    /// Set a target for one metric of an exercise - Usage: goal add EXERCISE METRIC TARGET
    #[command(visible_alias = "a")]
    #[command(override_usage = "goal add <EXERCISE> <METRIC> <TARGET>")]
    Add {
        /// Exercise index or name
        exercise: String,

        #[arg(value_enum)]
        metric: Metric,

        target: f64,
    },

    /// Show every goal with its progress
    #[command(visible_alias = "l")]
    List,
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Show all config keys
    List,

    /// Get the value of a key
    Get { key: String },

    /// Set or override a key
    Set { key: String, val: String },

    /// Remove a key
    Unset { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_defaults() {
        let cli = Cli::try_parse_from(["repscope", "analyze", "bench", "-t", "1y", "--var2", "reps"]).unwrap();
        let Commands::Analyze(args) = cli.cmd else {
            panic!("expected analyze");
        };
        assert_eq!(args.timeframe, Some(TimeFrame::OneYear));
        assert_eq!(args.var, Metric::Load);
        assert_eq!(args.var2, Some(Metric::Reps));
        assert_eq!(args.agg, AggMode::Max);
    }
}
