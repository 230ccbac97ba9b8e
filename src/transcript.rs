use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    error::CaptionError,
    formats::time::parse_bracketed_timestamp,
    model::{TimeRange, TranscriptLine, Word},
};

static LINE_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]+)\]\s*(Speaker \d+):\s*(.+)").expect("valid transcript line regex")
});

/// Estimates where a word falls, in seconds after its line's timestamp.
///
/// Forced-alignment data can be plugged in here without touching segmentation.
pub trait WordTimer {
    fn offset_secs(&self, index: usize, line_text: &str) -> f64;
}

impl<F> WordTimer for F
where
    F: Fn(usize, &str) -> f64,
{
    fn offset_secs(&self, index: usize, line_text: &str) -> f64 {
        self(index, line_text)
    }
}

/// Every word gets the same slot, regardless of how long the line actually took to say.
#[derive(Debug, Clone, Copy)]
pub struct FixedSpacing {
    spacing_secs: f64,
}

impl FixedSpacing {
    pub fn from_ms(spacing_ms: u32) -> Self {
        Self {
            spacing_secs: spacing_ms as f64 / 1000.0,
        }
    }
}

impl Default for FixedSpacing {
    fn default() -> Self {
        Self::from_ms(400)
    }
}

impl WordTimer for FixedSpacing {
    fn offset_secs(&self, index: usize, _line_text: &str) -> f64 {
        index as f64 * self.spacing_secs
    }
}

/// Match `[<timestamp>] Speaker <N>: <text>`. Other shapes are `None`.
pub fn parse_line(raw: &str) -> Option<TranscriptLine> {
    let caps = LINE_SHAPE.captures(raw)?;
    let stamp = caps.get(1)?.as_str();
    Some(TranscriptLine {
        timestamp_secs: parse_bracketed_timestamp(&format!("[{stamp}]")),
        speaker: caps.get(2)?.as_str().to_string(),
        text: caps.get(3)?.as_str().trim().to_string(),
    })
}

/// All well-formed lines, in file order. Malformed lines are skipped.
pub fn scan_lines(input: &str) -> Vec<TranscriptLine> {
    let mut skipped = 0usize;
    let lines: Vec<TranscriptLine> = input
        .lines()
        .filter_map(|l| {
            let parsed = parse_line(l);
            if parsed.is_none() && !l.trim().is_empty() {
                skipped += 1;
            }
            parsed
        })
        .collect();

    if skipped > 0 {
        tracing::debug!(skipped, kept = lines.len(), "ignored non-matching transcript lines");
    }
    lines
}

/// Expand every line inside `range` into words with offsets relative to `range.start`.
pub fn select_words(
    lines: &[TranscriptLine],
    range: &TimeRange,
    timer: &dyn WordTimer,
) -> Result<Vec<Word>, CaptionError> {
    let mut words = Vec::new();

    for line in lines.iter().filter(|l| range.contains(l.timestamp_secs)) {
        let adjusted = line.timestamp_secs - range.start;
        for (i, token) in line.text.split_whitespace().enumerate() {
            let at = adjusted + timer.offset_secs(i, &line.text);
            words.push(Word::new(token, (at * 1000.0) as i64));
        }
    }

    if words.is_empty() {
        return Err(CaptionError::EmptySelection {
            start: range.start,
            end: range.end,
        });
    }
    Ok(words)
}

/// Scan raw transcript text and select words in one step.
pub fn select_words_from_text(
    input: &str,
    range: &TimeRange,
    timer: &dyn WordTimer,
) -> Result<Vec<Word>, CaptionError> {
    select_words(&scan_lines(input), range, timer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(words: &[Word]) -> Vec<i64> {
        words.iter().map(|w| w.offset_ms).collect()
    }

    #[test]
    fn parses_speaker_line() {
        let line = parse_line("[14:21.843] Speaker 2:   hello   world ").unwrap();
        assert!((line.timestamp_secs - 861.843).abs() < 1e-9);
        assert_eq!(line.speaker, "Speaker 2");
        assert_eq!(line.text, "hello   world");
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(parse_line("Speaker 1: no stamp").is_none());
        assert!(parse_line("[0:01.000] Narrator: not a speaker").is_none());
        assert!(parse_line("[0:01.000] Speaker X: bad id").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn spaces_words_four_hundred_ms_apart() {
        let input = "[0:00.000] Speaker 1: one two three\n";
        let range = TimeRange::parse("0:00.000", "0:10.000");
        let words = select_words_from_text(input, &range, &FixedSpacing::default()).unwrap();
        assert_eq!(words.len(), 3);
        assert_eq!(offsets(&words), vec![0, 400, 800]);
        assert_eq!(words[2].text, "three");
    }

    #[test]
    fn offsets_are_relative_to_range_start() {
        let input = "\
[1:00.000] Speaker 1: before
[1:05.500] Speaker 1: in range
garbage line
[1:07.000] Speaker 2: also
[1:30.000] Speaker 1: after
";
        let range = TimeRange::parse("1:05.000", "1:10.000");
        let words = select_words_from_text(input, &range, &FixedSpacing::default()).unwrap();
        let texts: Vec<&str> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["in", "range", "also"]);
        assert_eq!(offsets(&words), vec![500, 900, 2000]);
    }

    #[test]
    fn empty_selection_is_explicit() {
        let input = "[0:30.000] Speaker 1: late words\n";
        let range = TimeRange::new(0.0, 10.0);
        let err = select_words_from_text(input, &range, &FixedSpacing::default()).unwrap_err();
        assert_eq!(
            err,
            CaptionError::EmptySelection {
                start: 0.0,
                end: 10.0
            }
        );
    }

    #[test]
    fn reversed_range_selects_nothing() {
        let input = "[0:05.000] Speaker 1: hi\n";
        let range = TimeRange::new(10.0, 0.0);
        assert!(select_words_from_text(input, &range, &FixedSpacing::default()).is_err());
    }

    #[test]
    fn custom_timer_replaces_spacing() {
        let input = "[0:01.000] Speaker 1: a b c\n";
        let range = TimeRange::new(0.0, 5.0);
        let timer = |i: usize, _: &str| i as f64 * 0.25;
        let words = select_words_from_text(input, &range, &timer).unwrap();
        assert_eq!(offsets(&words), vec![1000, 1250, 1500]);
    }

    #[test]
    fn long_lines_drift_without_correction() {
        let text = (0..20).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let input = format!("[0:00.000] Speaker 1: {text}\n");
        let range = TimeRange::new(0.0, 1.0);
        let words = select_words_from_text(&input, &range, &FixedSpacing::default()).unwrap();
        assert_eq!(words.last().unwrap().offset_ms, 7600);
    }
}
