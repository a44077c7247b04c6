use chrono::{DateTime, NaiveDate, Utc};

/// Estimated 3RM as a fixed fraction of the estimated 1RM.
pub const EST_3RM_FACTOR: f64 = 0.93;
/// Estimated 5RM as a fixed fraction of the estimated 1RM.
pub const EST_5RM_FACTOR: f64 = 0.87;

/// Epley one-rep-max estimate. A single rep is its own max and zero reps
/// estimate nothing.
pub fn calculate_est_1rm(load: f64, reps: u32) -> f64 {
    match reps {
        0 => 0.0,
        1 => load,
        r => load * (1.0 + f64::from(r) / 30.0),
    }
}

pub fn format_duration(duration: chrono::Duration) -> String {
    let hours = duration.num_hours();
    let minutes = duration.num_minutes() % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Parse `YYYY-MM-DD` (or a full RFC 3339 timestamp) into a UTC instant at midnight.
pub fn parse_day(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(d) = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Short axis label for a session date.
pub fn short_label(date: DateTime<Utc>) -> String {
    date.format("%d/%m").to_string()
}
