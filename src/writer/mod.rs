// src/writer/mod.rs
mod ping_writer;

pub use ping_writer::DeltaTWriter;
