//! Terminal and SVG renderings of a [`ChartView`].

use std::path::Path;

use anyhow::{Result, anyhow};
use colored::Colorize;
use plotters::prelude::*;

use crate::analytics::{ChartView, rescale};

fn row_of(value: f64, min: f64, range: f64, height: usize) -> Option<usize> {
    if !value.is_finite() || range <= 0.0 {
        return None;
    }
    let y = ((value - min) / range * (height - 1) as f64).round();
    if y < 0.0 || y > (height - 1) as f64 {
        return None;
    }
    Some(height - 1 - y as usize) // Flip the y-axis
}

fn col_of(i: usize, n: usize, width: usize) -> usize {
    if n <= 1 { 0 } else { i * (width - 1) / (n - 1) }
}

/// Secondary values mapped into primary axis coordinates.
fn secondary_in_primary(view: &ChartView) -> Vec<f64> {
    match view.secondary_axis {
        Some(axis) => {
            let raw: Vec<f64> = view.points.iter().map(|p| p.secondary_value).collect();
            rescale(&raw, &axis, &view.primary_axis)
        }
        None => Vec::new(),
    }
}

/// Draw `view` as text: `●` primary values, `○` secondary values, `·` and `:`
/// their regression lines. Left labels follow the primary axis, right labels
/// the secondary one.
pub fn ascii_chart(view: &ChartView, width: usize, height: usize, title: &str) -> Vec<String> {
    if view.points.is_empty() {
        return vec!["No data available".to_string()];
    }

    let width = width.max(2);
    let height = height.max(2);
    let axis = view.primary_axis;
    let n = view.points.len();
    let mut grid = vec![vec![' '; width]; height];

    let mut plot = |values: &[f64], mark: char, overwrite: bool| {
        for (i, &v) in values.iter().enumerate() {
            if let Some(y) = row_of(v, axis.min, axis.range(), height) {
                let x = col_of(i, n, width);
                if overwrite || grid[y][x] == ' ' {
                    grid[y][x] = mark;
                }
            }
        }
    };

    plot(&view.primary_trend.regression_line, '·', false);
    plot(&view.secondary_overlay, ':', false);
    plot(&secondary_in_primary(view), '○', true);
    let primary: Vec<f64> = view.points.iter().map(|p| p.value).collect();
    plot(&primary, '●', true);

    let mut result = Vec::new();
    result.push(format!("\n{}", title.bold()));
    result.push("─".repeat(width + 18));

    for (i, row) in grid.iter().enumerate() {
        let frac = (height - 1 - i) as f64 / (height - 1) as f64;
        let left = axis.min + axis.range() * frac;
        let right = view
            .secondary_axis
            .map(|s| format!("│ {:.0}", s.min + s.range() * frac))
            .unwrap_or_default();
        result.push(format!("{:7.1} │{}{}", left, row.iter().collect::<String>(), right));
    }

    result.push(format!("        └{}", "─".repeat(width)));

    if let (Some(first), Some(last)) = (view.points.first(), view.points.last()) {
        let first_label = first.date.format("%Y-%m-%d").to_string();
        let last_label = last.date.format("%Y-%m-%d").to_string();
        let gap = width.saturating_sub(first_label.len() + last_label.len());
        result.push(format!("         {}{}{}", first_label, " ".repeat(gap), last_label));
    }

    result
}

/// Write `view` as an SVG image: both value lines, both regression overlays
/// and one gridline per axis section. No text is drawn.
pub fn write_svg(view: &ChartView, path: &Path, size: (u32, u32)) -> Result<()> {
    let draw_err = |e: DrawingAreaErrorKind<std::io::Error>| anyhow!("failed to draw chart: {e:?}");

    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(draw_err)?;

    let axis = view.primary_axis;
    let last_x = view.points.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .build_cartesian_2d(0f64..last_x, axis.min..axis.max)
        .map_err(draw_err)?;

    for tick in axis.ticks() {
        chart
            .draw_series(LineSeries::new([(0.0, tick), (last_x, tick)], BLACK.mix(0.1).stroke_width(1)))
            .map_err(draw_err)?;
    }

    let indexed = |values: &[f64]| -> Vec<(f64, f64)> {
        values.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect()
    };

    let primary: Vec<f64> = view.points.iter().map(|p| p.value).collect();
    chart
        .draw_series(LineSeries::new(indexed(&primary), BLUE.stroke_width(2)))
        .map_err(draw_err)?;
    chart
        .draw_series(indexed(&primary).into_iter().map(|p| Circle::new(p, 3, BLUE.filled())))
        .map_err(draw_err)?;
    chart
        .draw_series(LineSeries::new(
            indexed(&view.primary_trend.regression_line),
            BLUE.mix(0.4).stroke_width(1),
        ))
        .map_err(draw_err)?;

    if view.secondary_axis.is_some() {
        chart
            .draw_series(LineSeries::new(indexed(&secondary_in_primary(view)), RED.stroke_width(2)))
            .map_err(draw_err)?;
        chart
            .draw_series(LineSeries::new(indexed(&view.secondary_overlay), RED.mix(0.4).stroke_width(1)))
            .map_err(draw_err)?;
    }

    root.present().map_err(draw_err)?;
    log::info!("wrote chart to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ChartPoint;
    use chrono::{Duration, TimeZone, Utc};

    fn view(values: &[(f64, f64)], secondary: bool) -> ChartView {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let points = values
            .iter()
            .enumerate()
            .map(|(i, &(value, secondary_value))| {
                let date = start + Duration::days(i as i64 * 7);
                ChartPoint {
                    date,
                    label: date.format("%d/%m").to_string(),
                    value,
                    secondary_value,
                }
            })
            .collect();
        ChartView::build(points, secondary)
    }

    #[test]
    fn empty_chart_says_so() {
        let lines = ascii_chart(&view(&[], false), 40, 10, "Load");
        assert_eq!(lines, ["No data available"]);
    }

    #[test]
    fn ascii_chart_has_one_row_per_line_plus_frame() {
        let lines = ascii_chart(&view(&[(40.0, 0.0), (45.0, 0.0), (50.0, 0.0)], false), 30, 8, "Load");
        // title, rule, 8 rows, axis, dates
        assert_eq!(lines.len(), 12);
        let marks: usize = lines.iter().map(|l| l.matches('●').count()).sum();
        assert_eq!(marks, 3);
        assert!(lines.last().unwrap().contains("2024-01-15"));
    }

    #[test]
    fn secondary_series_gets_right_labels() {
        let lines = ascii_chart(&view(&[(100.0, 10.0), (120.0, 8.0)], true), 20, 6, "Load / reps");
        assert!(lines[2].ends_with("│ 10"));
        assert!(lines.iter().any(|l| l.contains('○')));
    }

    #[test]
    fn svg_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.svg");
        write_svg(&view(&[(60.0, 8.0), (65.0, 6.0), (62.0, 7.0)], true), &path, (640, 360)).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("polyline"));
    }
}
