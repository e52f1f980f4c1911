//! CSV export of a session, one row per solve with the averages ending at it.

use std::io;
use std::path::Path;

use serde::Serialize;

use crate::session::SessionData;
use crate::stats::{average_ending_at, AO12_WINDOW, AO5_WINDOW};
use crate::time_format::format_time_seconds;

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    index: usize,
    time: &'a str,
    scramble: &'a str,
    date: String,
    ao5: String,
    ao12: String,
}

/// Average of the window ending at 1-based row `index`, blank before the window fills.
fn window_cell(averages: &[f64], window: usize, index: usize) -> String {
    average_ending_at(averages, window, index)
        .map(format_time_seconds)
        .unwrap_or_default()
}

/// Write `index,time,scramble,date,ao5,ao12` rows, returning how many solves were written.
pub fn export_csv<W: io::Write>(session: &SessionData, writer: W) -> Result<usize, csv::Error> {
    let mut csv = csv::Writer::from_writer(writer);

    for (i, solve) in session.solves().iter().enumerate() {
        let index = i + 1;
        csv.serialize(ExportRow {
            index,
            time: &solve.time,
            scramble: &solve.scramble,
            date: solve.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            ao5: window_cell(session.all_ao5(), AO5_WINDOW, index),
            ao12: window_cell(session.all_ao12(), AO12_WINDOW, index),
        })?;
    }

    // an empty session still gets a header
    if session.is_empty() {
        csv.write_record(["index", "time", "scramble", "date", "ao5", "ao12"])?;
    }

    csv.flush()?;
    Ok(session.len())
}

pub fn export_csv_file<P: AsRef<Path>>(session: &SessionData, path: P) -> Result<usize, csv::Error> {
    let file = std::fs::File::create(path)?;
    export_csv(session, io::BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scramble::CubeSize;
    use crate::session::Solve;
    use chrono::{Local, TimeZone};

    fn session_with(times: &[&str]) -> SessionData {
        let date = Local.with_ymd_and_hms(2024, 3, 9, 18, 30, 0).unwrap();
        let solves = times
            .iter()
            .map(|t| Solve::new(*t, "R U2 F'", date).unwrap())
            .collect();
        SessionData::with_solves("export", CubeSize::Three, solves)
    }

    fn export(session: &SessionData) -> Vec<String> {
        let mut out = Vec::new();
        export_csv(session, &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_empty_session_has_only_header() {
        let lines = export(&session_with(&[]));
        assert_eq!(lines, vec!["index,time,scramble,date,ao5,ao12"]);
    }

    #[test]
    fn test_ao5_column_aligns_with_window_end() {
        let lines = export(&session_with(&["12.10", "13.40", "11.90", "14.00", "12.80", "30.00"]));
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "index,time,scramble,date,ao5,ao12");
        assert_eq!(lines[1], "1,12.10,R U2 F',2024-03-09 18:30:00,,");
        assert!(lines[4].ends_with(",,"));
        assert_eq!(lines[5], "5,12.80,R U2 F',2024-03-09 18:30:00,12.77,");
        assert_eq!(lines[6], "6,30.00,R U2 F',2024-03-09 18:30:00,13.40,");
    }

    #[test]
    fn test_ao12_column_starts_at_twelfth_row() {
        let times: Vec<String> = (10..22).map(|s| format!("{s}.00")).collect();
        let refs: Vec<&str> = times.iter().map(String::as_str).collect();
        let lines = export(&session_with(&refs));
        assert!(lines[11].ends_with(','));
        assert!(lines[12].ends_with(",15.50"));
    }
}
