// src/parser.rs
use crate::config::ParserConfig;
use crate::error::{DeltaTError, Result};
use crate::position::{NoNavigation, PositionResolver};
use crate::reader::SwathCursor;
use crate::record::PingHeader;
use crate::source::{find_data_source, LogGroup, DATA_SOURCE_NAMES};
use crate::summary::{AggregateSummary, SummaryCache};
use crate::types::BathymetrySwath;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Ping times and intensity flag read from the headers alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeSpan {
    pub first_timestamp_ms: i64,
    pub last_timestamp_ms: i64,
    pub has_intensity: bool,
}

impl TimeSpan {
    /// Span recorded in a summary; only the first header is read, for the
    /// intensity flag
    pub fn from_summary(path: impl AsRef<Path>, summary: &AggregateSummary) -> Result<Self> {
        let mut cursor = SwathCursor::open(path, NoNavigation, &ParserConfig::default())?;
        let has_intensity = cursor.next_header()?.map(|h| h.has_intensity).unwrap_or(false);
        Ok(TimeSpan {
            first_timestamp_ms: summary.first_timestamp_ms,
            last_timestamp_ms: summary.last_timestamp_ms,
            has_intensity,
        })
    }

    /// Walk every header of `path` without decoding payloads
    pub fn of_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cursor = SwathCursor::open(path, NoNavigation, &ParserConfig::default())?;
        let mut span = TimeSpan::default();
        let mut first = true;
        while let Some(header) = cursor.next_header()? {
            if first {
                span.first_timestamp_ms = header.timestamp_ms;
                span.has_intensity = header.has_intensity;
                first = false;
            }
            span.last_timestamp_ms = header.timestamp_ms;
        }
        Ok(span)
    }
}

/// Bathymetry access to the 83P file of a log.
///
/// Opening builds (or loads) the survey summary, then positions a fresh
/// cursor at the first ping. Times reported by the parser come from the
/// summary, so a cached summary is trusted for them too.
pub struct DeltaTParser<P: PositionResolver> {
    source: PathBuf,
    cursor: SwathCursor<BufReader<File>, P>,
    summary: AggregateSummary,
    span: TimeSpan,
    config: ParserConfig,
}

impl<P: PositionResolver> DeltaTParser<P> {
    pub fn open<G: LogGroup + ?Sized>(group: &G, resolver: P, config: ParserConfig) -> Result<Self> {
        let source = find_data_source(group)
            .ok_or_else(|| DeltaTError::SourceNotFound(DATA_SOURCE_NAMES.join(", ")))?;
        Self::open_file(source, resolver, config)
    }

    pub fn open_file(source: impl Into<PathBuf>, mut resolver: P, config: ParserConfig) -> Result<Self> {
        let source = source.into();
        config.validate()?;

        let mut cache = SummaryCache::for_source(&source);
        if config.generate_process_report {
            cache = cache.with_process_report(&source, &config);
        }
        let scan_resolver = &mut resolver;
        let (scan_source, scan_config) = (&source, &config);
        let summary = cache.load_or_build(move || SwathCursor::open(scan_source, scan_resolver, scan_config))?;

        let span = TimeSpan::from_summary(&source, &summary)?;
        let cursor = SwathCursor::open(&source, resolver, &config)?;

        Ok(DeltaTParser {
            source,
            cursor,
            summary,
            span,
            config,
        })
    }

    /// Whether `group` holds an 83P file this parser can open
    pub fn can_be_applied<G: LogGroup + ?Sized>(group: &G) -> bool {
        find_data_source(group).is_some()
    }

    pub fn next_swath(&mut self) -> Result<Option<BathymetrySwath>> {
        self.cursor.next()
    }

    /// First swath at or after `timestamp_ms`
    pub fn swath_at(&mut self, timestamp_ms: i64) -> Result<Option<BathymetrySwath>> {
        self.cursor.seek_to(timestamp_ms)
    }

    pub fn rewind(&mut self) {
        self.cursor.rewind();
    }

    pub fn bathymetry_info(&self) -> &AggregateSummary {
        &self.summary
    }

    pub fn first_timestamp(&self) -> i64 {
        self.span.first_timestamp_ms
    }

    pub fn last_timestamp(&self) -> i64 {
        self.span.last_timestamp_ms
    }

    /// Intensity flag of the current ping, or of the first ping before any
    /// has been read
    pub fn has_intensity(&self) -> bool {
        self.cursor
            .current_header()
            .map(|h| h.has_intensity)
            .unwrap_or(self.span.has_intensity)
    }

    pub fn current_header(&self) -> Option<&PingHeader> {
        self.cursor.current_header()
    }

    /// Byte offset of the next ping
    pub fn current_position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn source_path(&self) -> &Path {
        &self.source
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DirectoryLogGroup;
    use crate::writer::DeltaTWriter;

    const T0: i64 = 1_415_787_630_000;

    fn write_log(dir: &Path, name: &str, count: usize, has_intensity: bool) {
        let mut writer = DeltaTWriter::create(dir.join(name)).unwrap();
        for i in 0..count {
            let header = PingHeader::new(2, has_intensity, T0 + i as i64 * 250);
            let intensities = [10u16, 20];
            writer
                .write_ping(&header, &[500, 600], has_intensity.then_some(&intensities[..]))
                .unwrap();
        }
        writer.flush().unwrap();
    }

    #[test]
    fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let group = DirectoryLogGroup::new(dir.path());
        assert!(!DeltaTParser::<NoNavigation>::can_be_applied(&group));
        assert!(matches!(
            DeltaTParser::open(&group, NoNavigation, ParserConfig::default()),
            Err(DeltaTError::SourceNotFound(_))
        ));
    }

    #[test]
    fn test_time_span_and_intensity() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path(), "Data.83P", 4, true);
        let group = DirectoryLogGroup::new(dir.path());
        assert!(DeltaTParser::<NoNavigation>::can_be_applied(&group));

        let mut parser = DeltaTParser::open(&group, NoNavigation, ParserConfig::default()).unwrap();
        assert_eq!(parser.first_timestamp(), T0);
        assert_eq!(parser.last_timestamp(), T0 + 750);
        assert!(parser.has_intensity());
        assert!(parser.current_header().is_none());
        assert_eq!(parser.current_position(), 0);
        assert_eq!(parser.bathymetry_info().total_number_of_points, 8);

        let swath = parser.swath_at(T0 + 300).unwrap().unwrap();
        assert_eq!(swath.timestamp_ms, T0 + 500);
        assert_eq!(parser.current_position(), 3 * 264);
    }

    #[test]
    fn test_time_span_from_cached_summary() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path(), "data.83P", 3, false);
        let cached = AggregateSummary {
            first_timestamp_ms: T0 - 1_000,
            last_timestamp_ms: T0 + 9_000,
            ..AggregateSummary::default()
        };
        SummaryCache::for_source(dir.path().join("data.83P")).store(&cached).unwrap();

        let parser = DeltaTParser::open_file(dir.path().join("data.83P"), NoNavigation, ParserConfig::default()).unwrap();
        assert_eq!(parser.first_timestamp(), T0 - 1_000);
        assert_eq!(parser.last_timestamp(), T0 + 9_000);
        assert!(!parser.has_intensity());
    }

    #[test]
    fn test_time_span_header_walk() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path(), "data.83P", 5, true);
        let span = TimeSpan::of_file(dir.path().join("data.83P")).unwrap();
        assert_eq!(
            span,
            TimeSpan { first_timestamp_ms: T0, last_timestamp_ms: T0 + 1_000, has_intensity: true }
        );
    }

    #[test]
    fn test_process_report_written_once() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path(), "data.83P", 2, false);
        let group = DirectoryLogGroup::new(dir.path());
        let config = ParserConfig { generate_process_report: true, ..ParserConfig::default() };

        DeltaTParser::open(&group, NoNavigation, config.clone()).unwrap();
        let report_path = dir.path().join("mra").join("deltaT-process.txt");
        let text = std::fs::read_to_string(&report_path).unwrap();
        assert!(text.contains("% Total number of points: 4"));
        assert_eq!(text.matches("% Swath type & version").count(), 2);

        // summary now cached: no new scan, report untouched
        std::fs::write(&report_path, "kept").unwrap();
        DeltaTParser::open(&group, NoNavigation, config).unwrap();
        assert_eq!(std::fs::read_to_string(&report_path).unwrap(), "kept");
    }
}
