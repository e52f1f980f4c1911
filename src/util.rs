use itertools::{Itertools, MinMaxResult};

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Mean after dropping one minimum and one maximum.
///
/// Needs at least three values so something is left to average. Ties drop a
/// single occurrence, which leaves the remaining multiset the same either way.
pub fn trimmed_mean(data: &[f64]) -> Option<f64> {
    if data.len() < 3 {
        return None;
    }

    // index-based so an infinite extreme never reaches the sum
    match data.iter().position_minmax() {
        MinMaxResult::MinMax(lowest, highest) => {
            let sum = data
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != lowest && i != highest)
                .map(|(_, value)| value)
                .sum::<f64>();
            Some(sum / (data.len() - 2) as f64)
        }
        MinMaxResult::OneElement(_) | MinMaxResult::NoElements => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[10., 20., 30., 15., 22.]), Some(19.4));
        assert_eq!(mean(&[15., 7., 55., 12., 4.]), Some(18.6));
    }

    #[test]
    fn test_mean_single_value() {
        assert_eq!(mean(&[42.0]), Some(42.0));
    }

    #[test]
    fn test_mean_empty_slice() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_std_dev() {
        assert_eq!(
            std_dev(&[100., 120., 90., 102., 94.]),
            Some(10.322790320451151)
        );
        assert_eq!(std_dev(&[15., 7., 55.]), Some(20.997354330698162));
    }

    #[test]
    fn test_std_dev_empty_slice() {
        assert_eq!(std_dev(&[]), None);
    }

    #[test]
    fn test_std_dev_identical_values() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0, 5.0]), Some(0.0));
    }

    #[test]
    fn test_trimmed_mean_drops_extremes() {
        let avg = trimmed_mean(&[12.1, 13.4, 11.9, 14.0, 12.8]).unwrap();
        assert!(close(avg, (12.1 + 13.4 + 12.8) / 3.0));
        assert!(close(avg, 12.766_666_666_666_667));
    }

    #[test]
    fn test_trimmed_mean_with_ties() {
        assert_eq!(trimmed_mean(&[10.0, 10.0, 10.0, 10.0, 10.0]), Some(10.0));
        let avg = trimmed_mean(&[9.0, 9.0, 12.0, 15.0, 15.0]).unwrap();
        assert!(close(avg, 12.0));
    }

    #[test]
    fn test_trimmed_mean_needs_three_values() {
        assert_eq!(trimmed_mean(&[]), None);
        assert_eq!(trimmed_mean(&[1.0, 2.0]), None);
        assert_eq!(trimmed_mean(&[1.0, 2.0, 9.0]), Some(2.0));
    }

    #[test]
    fn test_trimmed_mean_infinite_value_is_trimmed() {
        assert_eq!(trimmed_mean(&[10.0, 11.0, f64::INFINITY, 12.0, 13.0]), Some(12.0));
    }
}
