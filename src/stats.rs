//! Rolling statistics over the ordered solve history.
//!
//! Everything is recomputed from the full list of raw times after each mutation.
//! Sessions hold at most a few thousand solves, and a full pass keeps the
//! derived window lists correct after deleting a solve from the middle.

use crate::time_format::format_time_seconds;
use crate::util::{mean, std_dev, trimmed_mean};

pub const AO5_WINDOW: usize = 5;
pub const AO12_WINDOW: usize = 12;

/// Shown wherever a statistic is undefined
pub const NOT_AVAILABLE: &str = "n/a";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Metric {
    #[strum(serialize = "single")]
    Single,
    #[strum(serialize = "ao5")]
    Ao5,
    #[strum(serialize = "ao12")]
    Ao12,
}

/// What happened to the solve list before the recomputation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Append,
    Removal,
    /// Whole history replaced, e.g. a session was opened
    Reload,
}

/// A metric strictly improved by the solve that was just appended
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalBest {
    pub metric: Metric,
    pub value: f64,
    pub formatted: String,
    pub previous: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub current_single: Option<f64>,
    pub current_ao5: Option<f64>,
    pub current_ao12: Option<f64>,
    pub best_time: Option<f64>,
    pub best_ao5: Option<f64>,
    pub best_ao12: Option<f64>,
    /// Trimmed average of every 5-solve window, oldest first
    pub all_ao5: Vec<f64>,
    /// Trimmed average of every 12-solve window, oldest first
    pub all_ao12: Vec<f64>,
    pub new_bests: Vec<PersonalBest>,
}

impl Statistics {
    pub fn current(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Single => self.current_single,
            Metric::Ao5 => self.current_ao5,
            Metric::Ao12 => self.current_ao12,
        }
    }

    pub fn best(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Single => self.best_time,
            Metric::Ao5 => self.best_ao5,
            Metric::Ao12 => self.best_ao12,
        }
    }
}

/// Trimmed averages of every contiguous `window`-sized slice of `times`.
pub fn rolling_averages(times: &[f64], window: usize) -> Vec<f64> {
    if window == 0 {
        return Vec::new();
    }
    times.windows(window).filter_map(trimmed_mean).collect()
}

/// Recompute all statistics for `times`.
///
/// Personal-best events are only produced for [`Mutation::Append`]. The bests
/// before the append are recomputed from the history without the last solve,
/// so the comparison never depends on what a display happened to show.
pub fn compute_statistics(times: &[f64], mutation: Mutation) -> Statistics {
    let mut stats = summarize(times);

    if mutation == Mutation::Append {
        if let Some((_, before)) = times.split_last() {
            stats.new_bests = personal_bests(&summarize(before), &stats);
        }
    }

    stats
}

/// Metrics whose best strictly improved from `previous` to `current`.
///
/// A metric that had no value before counts as previously infinite.
pub fn personal_bests(previous: &Statistics, current: &Statistics) -> Vec<PersonalBest> {
    [Metric::Single, Metric::Ao5, Metric::Ao12]
        .into_iter()
        .filter_map(|metric| {
            let value = current.best(metric)?;
            let before = previous.best(metric);
            (value < before.unwrap_or(f64::INFINITY)).then(|| PersonalBest {
                metric,
                value,
                formatted: format_time_seconds(value),
                previous: before,
            })
        })
        .collect()
}

/// The rolling average whose window ends at 1-based solve `index`.
pub fn average_ending_at(averages: &[f64], window: usize, index: usize) -> Option<f64> {
    index
        .checked_sub(window)
        .and_then(|start| averages.get(start))
        .copied()
}

/// Format an optional statistic, `n/a` when undefined.
pub fn format_optional(value: Option<f64>) -> String {
    value
        .map(format_time_seconds)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn summarize(times: &[f64]) -> Statistics {
    let all_ao5 = rolling_averages(times, AO5_WINDOW);
    let all_ao12 = rolling_averages(times, AO12_WINDOW);

    Statistics {
        count: times.len(),
        mean: mean(times),
        std_dev: std_dev(times),
        current_single: times.last().copied(),
        current_ao5: all_ao5.last().copied(),
        current_ao12: all_ao12.last().copied(),
        best_time: minimum(times),
        best_ao5: minimum(&all_ao5),
        best_ao12: minimum(&all_ao12),
        all_ao5,
        all_ao12,
        new_bests: Vec::new(),
    }
}

fn minimum(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: [f64; 5] = [12.1, 13.4, 11.9, 14.0, 12.8];

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_empty_history_is_all_undefined() {
        let stats = compute_statistics(&[], Mutation::Reload);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean, None);
        assert_eq!(stats.best_time, None);
        assert_eq!(stats.current_ao5, None);
        assert!(stats.all_ao5.is_empty());
        assert!(stats.new_bests.is_empty());
    }

    #[test]
    fn test_ao5_trims_min_and_max() {
        let stats = compute_statistics(&FIVE, Mutation::Reload);
        assert!(close(stats.current_ao5, (12.1 + 13.4 + 12.8) / 3.0));
        assert!(close(stats.best_ao5, 12.766_666_666_666_667));
        assert_eq!(stats.all_ao5.len(), 1);
        assert_eq!(stats.best_time, Some(11.9));
        assert_eq!(stats.current_single, Some(12.8));
        assert!(close(stats.mean, 12.84));
    }

    #[test]
    fn test_ao5_undefined_under_five() {
        let stats = compute_statistics(&FIVE[..4], Mutation::Reload);
        assert_eq!(stats.current_ao5, None);
        assert_eq!(stats.best_ao5, None);
        assert!(stats.mean.is_some());
    }

    #[test]
    fn test_ao12_needs_twelve() {
        let times: Vec<f64> = (0..12).map(|i| 10.0 + i as f64).collect();
        let stats = compute_statistics(&times[..11], Mutation::Reload);
        assert_eq!(stats.current_ao12, None);

        let stats = compute_statistics(&times, Mutation::Reload);
        // drops 10 and 21, averages 11..=20
        assert!(close(stats.current_ao12, 15.5));
        assert_eq!(stats.all_ao12.len(), 1);
    }

    #[test]
    fn test_best_average_spans_all_windows() {
        let times = [
            20.0, 10.0, 10.0, 10.0, 10.0, 10.0, 30.0, 30.0, 30.0, 30.0, 30.0,
        ];
        let stats = compute_statistics(&times, Mutation::Reload);
        assert_eq!(stats.all_ao5.len(), 7);
        assert_eq!(stats.best_ao5, Some(10.0));
        assert_eq!(stats.current_ao5, Some(30.0));
    }

    #[test]
    fn test_sixth_solve_only_improves_best_when_strictly_lower() {
        let mut times = FIVE.to_vec();
        let before = compute_statistics(&times, Mutation::Reload);

        times.push(30.0);
        let after = compute_statistics(&times, Mutation::Append);
        assert_eq!(after.best_ao5, before.best_ao5);
        assert!(after.new_bests.is_empty());

        times.pop();
        times.push(11.0);
        let after = compute_statistics(&times, Mutation::Append);
        assert!(after.best_ao5 < before.best_ao5);
        let metrics: Vec<Metric> = after.new_bests.iter().map(|pb| pb.metric).collect();
        assert_eq!(metrics, vec![Metric::Single, Metric::Ao5]);
    }

    #[test]
    fn test_equal_average_is_not_a_new_best() {
        let times = [10.0, 10.0, 10.0, 10.0, 10.0, 10.0];
        let stats = compute_statistics(&times, Mutation::Append);
        assert!(stats.new_bests.is_empty());
    }

    #[test]
    fn test_first_values_count_as_personal_bests() {
        let stats = compute_statistics(&[12.0], Mutation::Append);
        assert_eq!(stats.new_bests.len(), 1);
        assert_eq!(stats.new_bests[0].metric, Metric::Single);
        assert_eq!(stats.new_bests[0].formatted, "12.00");
        assert_eq!(stats.new_bests[0].previous, None);

        let stats = compute_statistics(&[15.0, 15.0, 15.0, 15.0, 16.0], Mutation::Append);
        let metrics: Vec<Metric> = stats.new_bests.iter().map(|pb| pb.metric).collect();
        assert_eq!(metrics, vec![Metric::Ao5]);
    }

    #[test]
    fn test_removal_never_reports_personal_bests() {
        let stats = compute_statistics(&[9.0, 15.0], Mutation::Removal);
        assert!(stats.new_bests.is_empty());
        let stats = compute_statistics(&[9.0], Mutation::Reload);
        assert!(stats.new_bests.is_empty());
    }

    #[test]
    fn test_removing_to_four_clears_ao5() {
        let mut times = FIVE.to_vec();
        assert!(compute_statistics(&times, Mutation::Reload).best_ao5.is_some());

        times.remove(0);
        let stats = compute_statistics(&times, Mutation::Removal);
        assert_eq!(times.len(), 4);
        assert_eq!(stats.current_ao5, None);
        assert_eq!(stats.best_ao5, None);
        assert!(stats.all_ao5.is_empty());
    }

    #[test]
    fn test_removing_middle_solve_recomputes_windows() {
        let mut times = vec![10.0, 10.0, 10.0, 10.0, 10.0, 50.0, 50.0, 50.0, 50.0];
        times.remove(2);
        let stats = compute_statistics(&times, Mutation::Removal);
        assert_eq!(stats.all_ao5, vec![10.0, 70.0 / 3.0, 110.0 / 3.0, 50.0]);
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(None), "n/a");
        assert_eq!(format_optional(Some(67.3)), "1:07.30");
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::Ao12.to_string(), "ao12");
        assert_eq!(Metric::Single.to_string(), "single");
    }

    #[test]
    fn test_average_ending_at() {
        let all_ao5 = [10.0, 11.0, 12.0];
        assert_eq!(average_ending_at(&all_ao5, AO5_WINDOW, 4), None);
        assert_eq!(average_ending_at(&all_ao5, AO5_WINDOW, 5), Some(10.0));
        assert_eq!(average_ending_at(&all_ao5, AO5_WINDOW, 7), Some(12.0));
        assert_eq!(average_ending_at(&all_ao5, AO5_WINDOW, 8), None);
    }
}
