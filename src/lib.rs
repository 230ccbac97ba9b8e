//! Caption synthesis for vertical reels.
//!
//! A transcript with line-level `[MM:SS.mmm] Speaker N: text` stamps is windowed to a
//! time range, expanded into per-word timing estimates, grouped into non-overlapping
//! caption events and rendered as an ASS document for ffmpeg to burn in.

pub mod cli;
pub mod config;
pub mod error;
pub mod formats;
pub mod media;
pub mod model;
pub mod pipeline;
pub mod segment;
pub mod transcript;

pub use error::CaptionError;
pub use model::{CaptionEvent, TimeRange, TitleBlock, TranscriptLine, Word};
