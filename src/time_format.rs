use crate::error::TimeFormatError;

/// Marker for "no value yet" in best-time tracking.
pub const INFINITY_SENTINEL: &str = "inf";

/// What the timer shows while nothing is being timed.
pub const IDLE_DISPLAY: &str = "0.00";

const CENTIS_PER_MINUTE: u64 = 6_000;
const DECIS_PER_MINUTE: u64 = 600;

/// Render a finalized duration as `S.ff`, `SS.ff` or `M:SS.ff`.
///
/// The value is rounded to the nearest centisecond. Seconds are only zero-padded
/// when a minutes part is present. Positive infinity renders as `inf`.
pub fn format_time_seconds(secs: f64) -> String {
    if secs == f64::INFINITY {
        return INFINITY_SENTINEL.to_string();
    }

    // NaN and negatives collapse to zero
    let centis = (secs.max(0.0) * 100.0).round() as u64;
    let minutes = centis / CENTIS_PER_MINUTE;
    let seconds = (centis / 100) % 60;
    let fraction = centis % 100;

    if minutes > 0 {
        format!("{minutes}:{seconds:02}.{fraction:02}")
    } else {
        format!("{seconds}.{fraction:02}")
    }
}

/// Render the live running display from a decisecond tick count.
pub fn format_deciseconds(ticks: u64) -> String {
    let minutes = ticks / DECIS_PER_MINUTE;
    let seconds = (ticks / 10) % 60;
    let tenth = ticks % 10;

    if minutes > 0 {
        format!("{minutes}:{seconds:02}.{tenth}")
    } else {
        format!("{seconds}.{tenth}")
    }
}

/// Parse a finalized time string (`1:07.30`, `47.02`, `7.30` or `inf`) back to seconds.
pub fn interpret_time(input: &str) -> Result<f64, TimeFormatError> {
    if input.is_empty() {
        return Err(TimeFormatError::Empty);
    }
    if input == INFINITY_SENTINEL {
        return Ok(f64::INFINITY);
    }

    let (whole, fraction) = input
        .split_once('.')
        .ok_or_else(|| TimeFormatError::MissingFraction(input.to_string()))?;

    if fraction.len() != 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TimeFormatError::BadFraction(input.to_string()));
    }
    let fraction = parse_digits(input, fraction)?;

    let (minutes, seconds) = match whole.split_once(':') {
        Some((minutes, seconds)) => {
            if seconds.len() != 2 {
                return Err(TimeFormatError::InvalidNumber {
                    input: input.to_string(),
                    part: seconds.to_string(),
                });
            }
            (parse_digits(input, minutes)?, parse_digits(input, seconds)?)
        }
        None => {
            if whole.len() > 2 {
                return Err(TimeFormatError::SecondsOutOfRange(input.to_string()));
            }
            (0, parse_digits(input, whole)?)
        }
    };

    if seconds >= 60 {
        return Err(TimeFormatError::SecondsOutOfRange(input.to_string()));
    }

    let centis = minutes
        .checked_mul(CENTIS_PER_MINUTE)
        .and_then(|m| m.checked_add(seconds * 100 + fraction))
        .ok_or_else(|| TimeFormatError::InvalidNumber {
            input: input.to_string(),
            part: whole.to_string(),
        })?;

    Ok(centis as f64 / 100.0)
}

fn parse_digits(input: &str, part: &str) -> Result<u64, TimeFormatError> {
    let invalid = || TimeFormatError::InvalidNumber {
        input: input.to_string(),
        part: part.to_string(),
    };

    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    part.parse::<u64>().map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_format_under_a_minute() {
        assert_eq!(format_time_seconds(47.02), "47.02");
        assert_eq!(format_time_seconds(7.3), "7.30");
        assert_eq!(format_time_seconds(0.0), "0.00");
    }

    #[test]
    fn test_format_with_minutes_pads_seconds() {
        assert_eq!(format_time_seconds(67.3), "1:07.30");
        assert_eq!(format_time_seconds(600.0), "10:00.00");
    }

    #[test]
    fn test_format_rounds_to_centiseconds() {
        assert_eq!(format_time_seconds(12.345_6), "12.35");
        assert_eq!(format_time_seconds(59.999), "1:00.00");
    }

    #[test]
    fn test_format_infinity_and_negative() {
        assert_eq!(format_time_seconds(f64::INFINITY), "inf");
        assert_eq!(format_time_seconds(-3.0), "0.00");
    }

    #[test]
    fn test_format_deciseconds() {
        assert_eq!(format_deciseconds(0), "0.0");
        assert_eq!(format_deciseconds(7), "0.7");
        assert_eq!(format_deciseconds(599), "59.9");
        assert_eq!(format_deciseconds(600), "1:00.0");
        assert_eq!(format_deciseconds(6123), "10:12.3");
    }

    #[test]
    fn test_interpret_examples() {
        assert_eq!(interpret_time("1:07.30"), Ok(67.3));
        assert_eq!(interpret_time("47.02"), Ok(47.02));
        assert_eq!(interpret_time("7.30"), Ok(7.3));
        assert_eq!(interpret_time("inf"), Ok(f64::INFINITY));
    }

    #[test]
    fn test_interpret_rejects_malformed() {
        assert_matches!(interpret_time(""), Err(TimeFormatError::Empty));
        assert_matches!(interpret_time("12"), Err(TimeFormatError::MissingFraction(_)));
        assert_matches!(interpret_time("12.3"), Err(TimeFormatError::BadFraction(_)));
        assert_matches!(interpret_time("12.345"), Err(TimeFormatError::BadFraction(_)));
        assert_matches!(interpret_time("ab.12"), Err(TimeFormatError::InvalidNumber { .. }));
        assert_matches!(interpret_time("1:7.30"), Err(TimeFormatError::InvalidNumber { .. }));
        assert_matches!(interpret_time("1:75.00"), Err(TimeFormatError::SecondsOutOfRange(_)));
        assert_matches!(interpret_time("75.00"), Err(TimeFormatError::SecondsOutOfRange(_)));
        assert_matches!(interpret_time("-1.00"), Err(TimeFormatError::InvalidNumber { .. }));
    }

    #[test]
    fn test_interpret_format_round_trip() {
        for centis in (0..400_000u64).step_by(37) {
            let secs = centis as f64 / 100.0;
            assert_eq!(interpret_time(&format_time_seconds(secs)), Ok(secs));
        }
    }

    #[test]
    fn test_format_interpret_round_trip() {
        for s in ["0.00", "9.99", "10.00", "59.99", "1:00.00", "1:07.30", "12:34.56", "inf"] {
            let secs = interpret_time(s).unwrap();
            assert_eq!(format_time_seconds(secs), s);
        }
    }
}
