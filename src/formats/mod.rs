pub mod ass;
pub mod time;
pub mod words;
