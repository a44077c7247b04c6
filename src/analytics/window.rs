use chrono::{DateTime, Duration, Months, Utc};

use crate::models::{TimeFrame, TimeWindow, WorkoutSession};

/// Earliest date kept by `window`, relative to `now`.
///
/// Month arithmetic clamps to the last valid day of the target month
/// (31 March minus one month is 29 February in a leap year).
pub fn cutoff(window: TimeWindow, now: DateTime<Utc>) -> DateTime<Utc> {
    let months = match window.frame {
        TimeFrame::OneMonth => 1,
        TimeFrame::ThreeMonths => 3,
        TimeFrame::SixMonths => 6,
        TimeFrame::OneYear => 12,
        TimeFrame::All => return DateTime::<Utc>::UNIX_EPOCH,
        TimeFrame::Custom => {
            return now
                .checked_sub_signed(Duration::days(i64::from(window.custom_days)))
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        }
    };

    now.checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Sessions dated on or after the window's cutoff, in their original order.
pub fn filter_sessions(
    sessions: &[WorkoutSession],
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Vec<WorkoutSession> {
    let from = cutoff(window, now);
    sessions
        .iter()
        .filter(|s| s.date >= from)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn sessions() -> Vec<WorkoutSession> {
        [day(2024, 1, 1), day(2024, 6, 1), day(2024, 12, 1)]
            .into_iter()
            .enumerate()
            .map(|(i, date)| WorkoutSession {
                id: format!("s{i}"),
                date,
                sets: Vec::new(),
                duration_mins: None,
                fatigue: None,
                pain: None,
            })
            .collect()
    }

    fn window(frame: TimeFrame) -> TimeWindow {
        TimeWindow {
            frame,
            custom_days: 30,
        }
    }

    fn ids(v: &[WorkoutSession]) -> Vec<&str> {
        v.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn one_year_keeps_everything_from_the_cutoff_day() {
        let kept = filter_sessions(&sessions(), window(TimeFrame::OneYear), day(2025, 1, 1));
        assert_eq!(ids(&kept), ["s0", "s1", "s2"]);
    }

    #[test]
    fn three_months_keeps_only_recent_sessions() {
        let kept = filter_sessions(&sessions(), window(TimeFrame::ThreeMonths), day(2025, 1, 1));
        assert_eq!(ids(&kept), ["s2"]);

        let kept = filter_sessions(&sessions(), window(TimeFrame::ThreeMonths), day(2025, 6, 1));
        assert!(kept.is_empty());
    }

    #[test]
    fn all_ignores_now() {
        for now in [day(2025, 1, 1), day(2040, 1, 1), day(1999, 1, 1)] {
            let kept = filter_sessions(&sessions(), window(TimeFrame::All), now);
            assert_eq!(kept.len(), 3);
        }
    }

    #[test]
    fn custom_uses_day_count() {
        let w = TimeWindow {
            frame: TimeFrame::Custom,
            custom_days: 31,
        };
        assert_eq!(cutoff(w, day(2025, 1, 1)), day(2024, 12, 1));

        let kept = filter_sessions(&sessions(), w, day(2025, 1, 1));
        assert_eq!(ids(&kept), ["s2"]);
    }

    #[test]
    fn month_subtraction_clamps_to_month_end() {
        assert_eq!(cutoff(window(TimeFrame::OneMonth), day(2024, 3, 31)), day(2024, 2, 29));
        assert_eq!(cutoff(window(TimeFrame::SixMonths), day(2024, 8, 31)), day(2024, 2, 29));
    }
}
