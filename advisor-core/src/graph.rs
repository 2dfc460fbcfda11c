//! Fixed 6-point hourly temperature series for the temperature graph.

use chrono::{DateTime, Utc};

use crate::model::{GraphPoint, HourlyTemp};

/// Number of sampled points.
pub const GRAPH_POINTS: usize = 6;

/// Spacing between points, in local hours.
const STEP_HOURS: i64 = 3;

/// Sample the hourly series into exactly [`GRAPH_POINTS`] points spaced
/// [`STEP_HOURS`] apart in the location's local time, starting from "local
/// now" truncated to the top of the hour. Each point takes the temperature
/// of the hourly entry closest to its UTC target, so sparse input degrades
/// to repeated nearest matches rather than gaps.
///
/// Returns an empty vector when `hourly` is empty.
pub fn sample_hourly(
    hourly: &[HourlyTemp],
    timezone_offset_secs: i64,
    now: DateTime<Utc>,
) -> Vec<GraphPoint> {
    if hourly.is_empty() {
        return Vec::new();
    }

    let local_now = (now.timestamp() + timezone_offset_secs).div_euclid(3600) * 3600;

    let mut points = Vec::with_capacity(GRAPH_POINTS);
    for i in 0..GRAPH_POINTS as i64 {
        let target_local = local_now + i * STEP_HOURS * 3600;
        let target_utc = target_local - timezone_offset_secs;

        let closest = hourly
            .iter()
            .min_by_key(|h| (h.dt - target_utc).abs())
            .copied()
            .unwrap_or(hourly[0]);

        let local_hour = target_local.div_euclid(3600).rem_euclid(24);
        points.push(GraphPoint {
            hour: clock_label(local_hour),
            temp: closest.temp.round() as i32,
        });
    }

    points
}

/// 12-hour clock label for a local hour in `0..24`: "12am", "3am", ... "9pm".
fn clock_label(hour: i64) -> String {
    let twelve = if hour % 12 == 0 { 12 } else { hour % 12 };
    let suffix = if hour < 12 { "am" } else { "pm" };
    format!("{twelve}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hourly_from(start: i64, hours: usize) -> Vec<HourlyTemp> {
        (0..hours)
            .map(|i| HourlyTemp { dt: start + i as i64 * 3600, temp: 10.0 + i as f64 })
            .collect()
    }

    #[test]
    fn always_six_points_for_non_empty_input() {
        let now = Utc.with_ymd_and_hms(2025, 6, 4, 11, 30, 0).unwrap();
        let hourly = hourly_from(now.timestamp() - now.timestamp() % 3600, 48);

        for offset in [0, 32400, -18000] {
            let points = sample_hourly(&hourly, offset, now);
            assert_eq!(points.len(), GRAPH_POINTS);
        }
    }

    #[test]
    fn points_step_three_local_hours_apart() {
        // 2025-06-04 02:00:00 UTC, offset +9h => local 11:00.
        let now = Utc.with_ymd_and_hms(2025, 6, 4, 2, 0, 0).unwrap();
        let hourly = hourly_from(now.timestamp(), 48);

        let points = sample_hourly(&hourly, 32400, now);
        let labels: Vec<&str> = points.iter().map(|p| p.hour.as_str()).collect();
        assert_eq!(labels, ["11am", "2pm", "5pm", "8pm", "11pm", "2am"]);
    }

    #[test]
    fn midnight_and_noon_labels() {
        assert_eq!(clock_label(0), "12am");
        assert_eq!(clock_label(3), "3am");
        assert_eq!(clock_label(12), "12pm");
        assert_eq!(clock_label(21), "9pm");
        assert_eq!(clock_label(23), "11pm");
    }

    #[test]
    fn nearest_entry_wins() {
        let now = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
        let base = now.timestamp();
        // Sparse series: entries at now and now+6h only.
        let hourly = vec![
            HourlyTemp { dt: base, temp: 20.0 },
            HourlyTemp { dt: base + 6 * 3600, temp: 26.0 },
        ];

        let points = sample_hourly(&hourly, 0, now);
        assert_eq!(points.len(), GRAPH_POINTS);
        // Targets at +0h and +3h sit closest (or tied-first) to the first
        // entry; +6h onward snap to the second.
        assert_eq!(points[0].temp, 20);
        assert_eq!(points[2].temp, 26);
        assert_eq!(points[5].temp, 26);
    }

    #[test]
    fn temperatures_round_to_nearest_integer() {
        let now = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
        let hourly = vec![HourlyTemp { dt: now.timestamp(), temp: 21.6 }];

        let points = sample_hourly(&hourly, 0, now);
        assert!(points.iter().all(|p| p.temp == 22));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let now = Utc.with_ymd_and_hms(2025, 6, 4, 12, 0, 0).unwrap();
        assert!(sample_hourly(&[], 0, now).is_empty());
    }
}
