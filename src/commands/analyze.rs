use std::path::Path;

use anyhow::Result;
use colored::{ColoredString, Colorize};
use repscope::{
    analytics::ChartView,
    models::{AggMode, AnalyticsMetrics, Exercise, Metric, TimeFrame, TimeWindow, Trend},
    query::ExerciseAnalytics,
    render::{ascii_chart, write_svg},
    store::SqliteStore,
    types::{Config, OutputFmt, emit},
};
use serde::Serialize;

use crate::{cli::AnalyzeArgs, commands::resolve_exercise};

#[derive(Serialize)]
struct VariableJson {
    variable: Metric,
    agg: AggMode,
    metrics: AnalyticsMetrics,
}

#[derive(Serialize)]
struct AnalyzeJson<'a> {
    exercise: &'a Exercise,
    window: TimeWindow,
    sessions: usize,
    primary: VariableJson,
    secondary: Option<VariableJson>,
    chart: &'a ChartView,
}

fn trend_label(trend: Trend) -> ColoredString {
    let s = trend.to_string();
    match trend {
        Trend::Ascending => s.green().bold(),
        Trend::Descending => s.red().bold(),
        Trend::Plateauing => s.yellow().bold(),
        Trend::InsufficientData => s.dimmed(),
    }
}

fn print_metrics(metric: Metric, agg: AggMode, m: &AnalyticsMetrics) {
    let unit = metric.unit();
    println!("{} {} ({})", "Variable:".cyan().bold(), metric.to_string().bold(), agg);
    println!("  {:<8} {:.1} {unit}", "max", m.max);
    println!("  {:<8} {:.1} {unit}", "min", m.min);
    println!("  {:<8} {:.1} {unit}", "avg", m.avg);
    println!("  {:<8} {}", "trend", trend_label(m.trend));

    if let (Some(one), Some(three), Some(five)) = (m.est_1rm, m.est_3rm, m.est_5rm) {
        println!(
            "  {:<8} 1RM {:.1}  3RM {:.1}  5RM {:.1} kg",
            "est.", one, three, five
        );
    }
}

/// The configured window with command-line overrides applied. `--days`
/// alone selects a custom window.
fn resolve_window(cfg: &Config, args: &AnalyzeArgs) -> Result<TimeWindow> {
    let mut window = cfg.window()?;
    if let Some(days) = args.days {
        window.custom_days = days;
        window.frame = TimeFrame::Custom;
    }
    if let Some(frame) = args.timeframe {
        window.frame = frame;
    }
    Ok(window)
}

pub async fn handle(args: AnalyzeArgs, store: &SqliteStore, cfg: &Config, fmt: OutputFmt) -> Result<()> {
    let Some(ex) = resolve_exercise(store, &args.exercise).await? else {
        return Ok(());
    };

    for metric in std::iter::once(args.var).chain(args.var2) {
        if !ex.allows(metric) {
            println!(
                "{} `{}` does not track {} (tracked: {})",
                "warning:".yellow().bold(),
                ex.name,
                metric.to_string().yellow(),
                ex.enabled_metrics.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            );
            return Ok(());
        }
    }

    let mut query = ExerciseAnalytics::new(resolve_window(cfg, &args)?);
    query.load(store, &ex.id).await;

    let sessions = query.filtered_sessions().len();
    let primary = query.compute_metrics(args.var, args.agg);
    let secondary = args.var2.map(|v| (v, query.compute_metrics(v, args.agg2)));
    let view = query.chart_view(args.var, args.var2, args.agg, args.agg2);

    if let Some(path) = &args.svg {
        write_svg(&view, Path::new(path), (960, 540))?;
    }

    let report = AnalyzeJson {
        exercise: &ex,
        window: query.window(),
        sessions,
        primary: VariableJson {
            variable: args.var,
            agg: args.agg,
            metrics: primary,
        },
        secondary: secondary.map(|(variable, metrics)| VariableJson {
            variable,
            agg: args.agg2,
            metrics,
        }),
        chart: &view,
    };

    emit(fmt, &report, || {
        let window = query.window();
        let span = match window.frame {
            TimeFrame::Custom => format!("last {} days", window.custom_days),
            frame => frame.to_string(),
        };
        println!(
            "{} {} ({}, {} sessions)",
            "Exercise:".cyan().bold(),
            ex.name.bold(),
            span,
            sessions
        );

        print_metrics(args.var, args.agg, &primary);
        println!("  {:<8} {:.1} kg", "volume", primary.volume);

        if let Some(s) = &report.secondary {
            print_metrics(s.variable, s.agg, &s.metrics);
        }

        if args.graph {
            let (w, h) = term_size::dimensions().unwrap_or((80, 24));
            let title = match args.var2 {
                Some(v2) => format!("{} ● / {} ○", args.var, v2),
                None => format!("{} ●", args.var),
            };
            for line in ascii_chart(&view, (w / 2).min(60), (h / 2).min(15), &title) {
                println!("{}", line);
            }
        }

        if let Some(path) = &args.svg {
            println!("{} chart written to {}", "info:".blue().bold(), path);
        }
    })
}
