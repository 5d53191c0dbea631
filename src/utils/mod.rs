// src/utils/mod.rs
pub mod coord;

pub use coord::{lat_from_83p, lat_to_83p, lon_from_83p, lon_to_83p, wgs84_displace};
