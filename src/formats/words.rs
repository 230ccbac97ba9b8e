use crate::{
    formats::time::{format_compact_duration, parse_compact_duration},
    model::Word,
};

/// Space-joined `word [0m<s>s<ms>ms]` entries, written next to the subtitles for debugging.
pub fn write_words(words: &[Word]) -> String {
    words
        .iter()
        .map(|w| format!("{} [{}]", w.text, format_compact_duration(w.offset_ms)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read a dump produced by [`write_words`]. A stamp that does not parse reads as `0`.
pub fn parse_words(input: &str) -> Vec<Word> {
    let mut words = Vec::new();
    let mut pending: Option<&str> = None;

    for token in input.split_whitespace() {
        match (pending, token.strip_prefix('[').and_then(|t| t.strip_suffix(']'))) {
            (Some(text), Some(stamp)) => {
                words.push(Word::new(text, parse_compact_duration(stamp)));
                pending = None;
            }
            (Some(text), None) => {
                words.push(Word::new(text, 0));
                pending = Some(token);
            }
            (None, _) => pending = Some(token),
        }
    }

    if let Some(text) = pending {
        words.push(Word::new(text, 0));
    }
    words
}
