// src/lib.rs
//! # deltat-rs
//!
//! Reader for DeltaT multibeam echosounder logs (`.83P`): decodes the fixed
//! 256-byte ping headers, geocodes every beam into a bathymetry swath and
//! keeps a cached summary of the whole survey.
//!
//! ## Features
//!
//! - **Header decoding**: big-endian fields, presence-flagged attitude and
//!   sound velocity, ASCII timestamps
//! - **Swath geocoding**: per-beam heights and offsets with optional
//!   sound-speed correction and roll bias
//! - **Random access**: sequential reads, timestamp seeks and rewind over a
//!   single cursor
//! - **Survey summary**: bounding box, depth range and point count, cached
//!   beside the log after the first scan
//! - **Writing**: author 83P files, useful for fixtures and conversions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deltat_rs::*;
//!
//! fn main() -> Result<()> {
//!     let group = DirectoryLogGroup::new("logs/2014-11-12");
//!     let mut parser = DeltaTParser::open(&group, NoNavigation, ParserConfig::default())?;
//!
//!     let info = parser.bathymetry_info();
//!     println!("{} points, depths {} to {}", info.total_number_of_points, info.min_depth, info.max_depth);
//!
//!     while let Some(swath) = parser.next_swath()? {
//!         println!("{}: {} returns", swath.timestamp_ms, swath.point_count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Reading a file directly
//!
//! ```rust,no_run
//! use deltat_rs::*;
//!
//! fn main() -> Result<()> {
//!     let mut cursor = SwathCursor::open("Data.83P", NoNavigation, &ParserConfig::default())?;
//!     if let Some(swath) = cursor.seek_to(1_415_787_630_000)? {
//!         for point in swath.valid_points() {
//!             println!("{:.2} {:.2} {:.2}", point.along_track, point.cross_track, point.height);
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Modules
pub mod error;
pub mod types;
pub mod record;
pub mod swath;
pub mod position;
pub mod reader;
pub mod summary;
pub mod source;
pub mod parser;
pub mod report;
pub mod writer;
pub mod config;
pub mod utils;

// Re-export commonly used types at the crate root for convenience
pub use error::{DecodeError, DeltaTError, Result};

pub use types::{
    BathymetryPoint,
    BathymetrySwath,
    OptionFlags,
    Pose,
    PoseSource,
    UNKNOWN_DEPTH,
};

pub use record::{HeaderDecoder, PingHeader};
pub use swath::{SwathDecoder, SwathOptions};
pub use position::{NoNavigation, PoseTrack, PositionResolver};
pub use reader::SwathCursor;
pub use summary::{AggregateSummary, SummaryCache};
pub use source::{find_data_source, DirectoryLogGroup, LogGroup};
pub use parser::DeltaTParser;
pub use report::ProcessReport;
pub use writer::DeltaTWriter;
pub use config::ParserConfig;

// Prelude module for glob imports
pub mod prelude {
    //! Convenient imports for common use cases.
    //!
    //! ```rust
    //! use deltat_rs::prelude::*;
    //! ```

    pub use crate::error::{DeltaTError, Result};
    pub use crate::types::{BathymetryPoint, BathymetrySwath, Pose};
    pub use crate::position::PositionResolver;
    pub use crate::reader::SwathCursor;
    pub use crate::parser::DeltaTParser;
    pub use crate::config::ParserConfig;
}

/// Size of every 83P ping header in bytes
pub const HEADER_SIZE: usize = PingHeader::SIZE;

/// The library version
pub const LIBRARY_VERSION: &str = env!("CARGO_PKG_VERSION");
