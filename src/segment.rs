use crate::{
    config::CaptionCfg,
    error::CaptionError,
    model::{CaptionEvent, Word},
};

/// Groups words into timed caption events that never overlap.
#[derive(Debug, Clone)]
pub struct Segmenter<'a> {
    cfg: &'a CaptionCfg,
}

impl<'a> Segmenter<'a> {
    pub fn new(cfg: &'a CaptionCfg) -> Self {
        Self { cfg }
    }

    fn ends_sentence(&self, word: &str) -> bool {
        word.chars()
            .last()
            .is_some_and(|c| self.cfg.sentence_terminators.contains(&c))
    }

    /// Times are relative to the first word's offset.
    pub fn segment(&self, words: &[Word]) -> Result<Vec<CaptionEvent>, CaptionError> {
        let first = words.first().ok_or(CaptionError::NoWords)?;
        let base = first.offset_ms;
        let max_words = self.cfg.max_words_per_event.max(1);

        let mut events = Vec::new();
        let mut current: Vec<&str> = Vec::with_capacity(max_words);
        let mut current_start: Option<i64> = None;
        let mut last_end: Option<i64> = None;

        for (i, word) in words.iter().enumerate() {
            let ms = word.offset_ms - base;
            let opened_at = *current_start.get_or_insert(ms);
            current.push(word.text.as_str());

            let next = words.get(i + 1);
            let closes =
                self.ends_sentence(&word.text) || current.len() >= max_words || next.is_none();
            if !closes {
                continue;
            }

            let mut end = match next {
                Some(n) => n.offset_ms - base,
                None => ms + self.cfg.fallback_tail_ms,
            };

            let mut start = opened_at;
            if let Some(prev_end) = last_end {
                if start <= prev_end {
                    start = prev_end + self.cfg.min_gap_ms;
                }
            }

            if end <= start {
                end = start + self.cfg.min_event_span_ms;
            }

            events.push(CaptionEvent {
                start_ms: start,
                end_ms: end,
                text: current.join(" "),
            });

            last_end = Some(end);
            current.clear();
            current_start = None;
        }

        Ok(events)
    }
}
