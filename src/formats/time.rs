use once_cell::sync::Lazy;
use regex::Regex;

static COMPACT_DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)m(\d+)s(\d+)ms").expect("valid compact duration regex"));

/// Parse `[HH:MM:SS.mmm]`, `[MM:SS.mmm]` or the unbracketed forms into seconds.
///
/// Anything unrecognized yields `0.0`; callers treat that as start-of-range.
pub fn parse_bracketed_timestamp(s: &str) -> f64 {
    let t = s.trim().trim_matches(|c| c == '[' || c == ']');
    let parts: Vec<&str> = t.split(':').map(str::trim).collect();

    let fields = match parts.as_slice() {
        [h, m, sec] => h
            .parse::<i64>()
            .ok()
            .zip(m.parse::<i64>().ok())
            .zip(sec.parse::<f64>().ok())
            .map(|((h, m), sec)| (h, m, sec)),
        [m, sec] => m
            .parse::<i64>()
            .ok()
            .zip(sec.parse::<f64>().ok())
            .map(|(m, sec)| (0, m, sec)),
        _ => None,
    };

    match fields {
        Some((h, m, sec)) if sec.is_finite() => (h * 3600 + m * 60) as f64 + sec,
        _ => 0.0,
    }
}

/// Coarse `H:MM:SS.CC` label for a clip length. Negative input clamps to zero.
pub fn seconds_to_clock_string(seconds: f64) -> String {
    let s = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
    let hours = (s / 3600.0).floor() as i64;
    let minutes = ((s % 3600.0) / 60.0).floor() as i64;
    let rem = s % 60.0;
    format!("{hours}:{minutes:02}:{rem:05.2}")
}

/// Parse the compact debug form `<m>m<s>s<ms>ms` (e.g. `0m0s175ms`) into milliseconds.
pub fn parse_compact_duration(s: &str) -> i64 {
    let Some(caps) = COMPACT_DURATION.captures(s) else {
        return 0;
    };
    let field = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    };
    (field(1) * 60 + field(2)) * 1000 + field(3)
}

/// Format milliseconds as `H:MM:SS.CC`, truncating to centiseconds.
pub fn ms_to_subtitle_time(ms_in: i64) -> String {
    let ms = ms_in.max(0);
    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let seconds = (ms % 60_000) / 1000;
    let centis = (ms % 1000) / 10;
    format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// Inverse of the debug dump's offset notation: `0m<s>s<ms>ms`.
pub fn format_compact_duration(ms_in: i64) -> String {
    let ms = ms_in.max(0);
    format!("0m{}s{}ms", ms / 1000, ms % 1000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_three_field_timestamp() {
        assert_eq!(parse_bracketed_timestamp("[1:02:03.500]"), 3723.5);
        assert_eq!(parse_bracketed_timestamp("01:00:00"), 3600.0);
    }

    #[test]
    fn parses_two_field_timestamp() {
        assert_eq!(parse_bracketed_timestamp("[2:05.250]"), 125.25);
        assert_eq!(parse_bracketed_timestamp("0:00.000"), 0.0);
    }

    #[test]
    fn unrecognized_timestamps_are_zero() {
        assert_eq!(parse_bracketed_timestamp(""), 0.0);
        assert_eq!(parse_bracketed_timestamp("[12]"), 0.0);
        assert_eq!(parse_bracketed_timestamp("1:2:3:4"), 0.0);
        assert_eq!(parse_bracketed_timestamp("[aa:bb.cc]"), 0.0);
        assert_eq!(parse_bracketed_timestamp("1:nan"), 0.0);
    }

    #[test]
    fn clock_string_keeps_two_decimal_seconds() {
        // Seconds are two digits wide (`SS.CC`); a six-wide pad would give `0:00:005.00`.
        assert_eq!(seconds_to_clock_string(116.22), "0:01:56.22");
        assert_eq!(seconds_to_clock_string(3723.5), "1:02:03.50");
        assert_eq!(seconds_to_clock_string(5.0), "0:00:05.00");
        assert_eq!(seconds_to_clock_string(-3.0), "0:00:00.00");
    }

    #[test]
    fn compact_duration_parses_or_zero() {
        assert_eq!(parse_compact_duration("0m0s175ms"), 175);
        assert_eq!(parse_compact_duration("2m3s40ms"), 123_040);
        assert_eq!(parse_compact_duration("3s40ms"), 0);
        assert_eq!(parse_compact_duration(""), 0);
    }

    #[test]
    fn compact_duration_round_trips_debug_form() {
        assert_eq!(format_compact_duration(12_345), "0m12s345ms");
        assert_eq!(parse_compact_duration(&format_compact_duration(12_345)), 12_345);
    }

    #[test]
    fn subtitle_time_truncates_to_centiseconds() {
        assert_eq!(ms_to_subtitle_time(3_723_500), "1:02:03.50");
        assert_eq!(ms_to_subtitle_time(1_999), "0:00:01.99");
        assert_eq!(ms_to_subtitle_time(0), "0:00:00.00");
        assert_eq!(ms_to_subtitle_time(-50), "0:00:00.00");
    }
}
