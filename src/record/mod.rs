// src/record/mod.rs
mod decoder;
pub mod header;
pub mod packed;
pub mod timestamp;

pub use decoder::HeaderDecoder;
pub use header::PingHeader;
pub use packed::{decode_optional_packed, encode_optional_packed};
pub use timestamp::TimestampMatcher;
