use cubik::time_series::SessionSeries;

/// Compute X (solve number) and Y (seconds) upper bounds for the session chart
pub fn compute_chart_params(series: &SessionSeries) -> (f64, f64) {
    let solves = series.singles.last().map(|p| p.solve).unwrap_or(1.0).max(1.0);
    // a little headroom so the slowest solve is not drawn on the border
    let slowest = series.slowest().map(|s| (s + s / 10.0).ceil()).unwrap_or(1.0).max(1.0);

    (solves, slowest)
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubik::time_series::TimeSeriesPoint;

    #[test]
    fn test_compute_chart_params_empty() {
        let (x, y) = compute_chart_params(&SessionSeries::default());
        assert_eq!(x, 1.0);
        assert_eq!(y, 1.0);
    }

    #[test]
    fn test_compute_chart_params_with_points() {
        let series = SessionSeries {
            singles: vec![TimeSeriesPoint::new(1.0, 12.0), TimeSeriesPoint::new(2.0, 20.0)],
            ..SessionSeries::default()
        };
        assert_eq!(compute_chart_params(&series), (2.0, 22.0));
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label(1.0), "1");
        assert_eq!(format_label(1.2345), "1.23");
    }
}
