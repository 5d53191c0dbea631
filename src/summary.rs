// src/summary.rs
use crate::config::ParserConfig;
use crate::error::Result;
use crate::position::PositionResolver;
use crate::reader::{ReadSeek, SwathCursor};
use crate::report::ProcessReport;
use crate::types::BathymetrySwath;
use crate::utils::coord::wgs84_displace;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Survey-wide figures gathered by one full scan of a log
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub top_left_latitude: f64,
    pub top_left_longitude: f64,
    pub bottom_right_latitude: f64,
    pub bottom_right_longitude: f64,
    pub min_depth: f64,
    pub max_depth: f64,
    pub total_number_of_points: u64,
    pub first_timestamp_ms: i64,
    pub last_timestamp_ms: i64,
}

/// Running state of a summary scan
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
    min_depth: f64,
    max_depth: f64,
    points: u64,
    first_timestamp_ms: Option<i64>,
    last_timestamp_ms: i64,
}

impl Default for SummaryBuilder {
    fn default() -> Self {
        SummaryBuilder {
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            min_depth: f64::INFINITY,
            max_depth: f64::NEG_INFINITY,
            points: 0,
            first_timestamp_ms: None,
            last_timestamp_ms: 0,
        }
    }
}

impl SummaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, swath: &BathymetrySwath) {
        let (lat, lon) = (swath.pose.latitude_deg, swath.pose.longitude_deg);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
        self.min_lon = self.min_lon.min(lon);
        self.max_lon = self.max_lon.max(lon);

        if self.first_timestamp_ms.is_none() {
            self.first_timestamp_ms = Some(swath.timestamp_ms);
        }
        self.last_timestamp_ms = swath.timestamp_ms;

        for point in swath.valid_points() {
            let depth = point.height as f64;
            self.min_depth = self.min_depth.min(depth);
            self.max_depth = self.max_depth.max(depth);
            self.points += 1;
        }
    }

    /// Close the scan. The box corners are pushed out by the maximum depth
    /// in every direction to cover the swath footprint.
    pub fn finish(self) -> AggregateSummary {
        let first_timestamp_ms = match self.first_timestamp_ms {
            Some(t) => t,
            None => return AggregateSummary::default(),
        };

        let (min_depth, max_depth) = if self.points > 0 {
            (self.min_depth, self.max_depth)
        } else {
            (0.0, 0.0)
        };

        let (top_left_latitude, top_left_longitude) =
            wgs84_displace(self.max_lat, self.min_lon, max_depth, -max_depth);
        let (bottom_right_latitude, bottom_right_longitude) =
            wgs84_displace(self.min_lat, self.max_lon, -max_depth, max_depth);

        AggregateSummary {
            top_left_latitude,
            top_left_longitude,
            bottom_right_latitude,
            bottom_right_longitude,
            min_depth,
            max_depth,
            total_number_of_points: self.points,
            first_timestamp_ms,
            last_timestamp_ms: self.last_timestamp_ms,
        }
    }
}

/// Drive `cursor` to the end of its channel and summarize what it decoded
pub fn scan<R: ReadSeek, P: PositionResolver>(cursor: &mut SwathCursor<R, P>) -> Result<AggregateSummary> {
    let mut builder = SummaryBuilder::new();
    while let Some(swath) = cursor.next()? {
        builder.add(&swath);
    }
    Ok(builder.finish())
}

struct ReportTarget {
    path: PathBuf,
    log_name: String,
    config: ParserConfig,
}

/// Disk cache of the [`AggregateSummary`] of one log.
///
/// The cache is looked up by presence only. It is never checked against the
/// source file; delete it to force a new scan.
pub struct SummaryCache {
    path: PathBuf,
    report: Option<ReportTarget>,
}

impl SummaryCache {
    pub const DIR_NAME: &'static str = "mra";
    pub const FILE_NAME: &'static str = "bathy.info";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        SummaryCache {
            path: path.into(),
            report: None,
        }
    }

    /// `<source dir>/mra/bathy.info`
    pub fn for_source(source: impl AsRef<Path>) -> Self {
        Self::new(work_dir(source.as_ref()).join(Self::FILE_NAME))
    }

    /// Write a processing report next to the cache when a scan runs and no
    /// report exists yet.
    pub fn with_process_report(mut self, source: impl AsRef<Path>, config: &ParserConfig) -> Self {
        let source = source.as_ref();
        let log_name = source
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.report = Some(ReportTarget {
            path: work_dir(source).join(ProcessReport::FILE_NAME),
            log_name,
            config: config.clone(),
        });
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn load(&self) -> Result<AggregateSummary> {
        let text = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn store(&self, summary: &AggregateSummary) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(summary)?)?;
        Ok(())
    }

    /// Return the cached summary, or scan a cursor from `factory` and cache
    /// the result. An unreadable cache is rebuilt; a failed write is logged
    /// and the fresh summary still returned.
    pub fn load_or_build<R, P, F>(&self, factory: F) -> Result<AggregateSummary>
    where
        R: ReadSeek,
        P: PositionResolver,
        F: FnOnce() -> Result<SwathCursor<R, P>>,
    {
        if self.exists() {
            match self.load() {
                Ok(summary) => {
                    info!("Loaded bathymetry summary from {}", self.path.display());
                    return Ok(summary);
                }
                Err(e) => warn!("Discarding unreadable summary cache {}: {}", self.path.display(), e),
            }
        }

        let mut cursor = factory()?;
        let report_target = self.report.as_ref().filter(|t| !t.path.exists());
        if let Some(target) = report_target {
            match ProcessReport::create(&target.path) {
                Ok(report) => cursor.attach_report(report),
                Err(e) => warn!("Could not start process report {}: {}", target.path.display(), e),
            }
        }

        let summary = scan(&mut cursor)?;
        info!(
            "Built bathymetry summary: {} points, depths [{}, {}]",
            summary.total_number_of_points, summary.min_depth, summary.max_depth
        );

        if let Err(e) = self.store(&summary) {
            warn!("Could not write summary cache {}: {}", self.path.display(), e);
        }

        if let (Some(target), Some(report)) = (report_target, cursor.take_report()) {
            if let Err(e) = report.finish(&target.log_name, &summary, &target.config) {
                warn!("Could not write process report {}: {}", target.path.display(), e);
            }
        }

        Ok(summary)
    }
}

fn work_dir(source: &Path) -> PathBuf {
    source
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(SummaryCache::DIR_NAME)
}
