use thiserror::Error;

/// Failures the caption engine reports to its caller.
#[derive(Debug, Error, PartialEq)]
pub enum CaptionError {
    /// No transcript line fell inside the requested range.
    #[error("no words found between {start:.3}s and {end:.3}s")]
    EmptySelection { start: f64, end: f64 },

    /// The segmenter was handed an empty word sequence.
    #[error("caption segmenter requires at least one word")]
    NoWords,
}
