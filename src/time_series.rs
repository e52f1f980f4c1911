use crate::session::SessionData;
use crate::stats::{AO12_WINDOW, AO5_WINDOW};

/// One chart point: 1-based solve number and seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub solve: f64,
    pub secs: f64,
}

impl TimeSeriesPoint {
    pub fn new(solve: f64, secs: f64) -> Self {
        Self { solve, secs }
    }
}

impl From<(f64, f64)> for TimeSeriesPoint {
    fn from(v: (f64, f64)) -> Self {
        TimeSeriesPoint {
            solve: v.0,
            secs: v.1,
        }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.solve, p.secs)
    }
}

/// Singles, ao5 and ao12 lines of a session, each average placed at the solve that completes its window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSeries {
    pub singles: Vec<TimeSeriesPoint>,
    pub ao5: Vec<TimeSeriesPoint>,
    pub ao12: Vec<TimeSeriesPoint>,
}

fn placed(values: &[f64], first_solve: usize) -> Vec<TimeSeriesPoint> {
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| TimeSeriesPoint::new((first_solve + i) as f64, *v))
        .collect()
}

impl SessionSeries {
    pub fn from_session(session: &SessionData) -> Self {
        Self {
            singles: placed(&session.times(), 1),
            ao5: placed(session.all_ao5(), AO5_WINDOW),
            ao12: placed(session.all_ao12(), AO12_WINDOW),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.singles.is_empty()
    }

    /// Largest finite value across all three lines
    pub fn slowest(&self) -> Option<f64> {
        self.singles
            .iter()
            .chain(&self.ao5)
            .chain(&self.ao12)
            .map(|p| p.secs)
            .reduce(f64::max)
    }
}
