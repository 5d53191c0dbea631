// src/reader/mod.rs
mod swath_cursor;

pub use swath_cursor::{ReadSeek, SwathCursor};
