// src/report.rs
//! Human-readable trace of a summary scan (`mra/deltaT-process.txt`).
//!
//! Ping blocks go to a side file as they are produced. The summary preamble
//! is only known at the end of the scan, so [`ProcessReport::finish`] writes
//! the preamble to the report path and appends the side file after it.
use crate::config::ParserConfig;
use crate::error::Result;
use crate::record::PingHeader;
use crate::summary::AggregateSummary;
use crate::types::{BathymetrySwath, Pose};
use chrono::{TimeZone, Utc};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const EOL: &str = "\r\n";
const RULE: &str = "% -------------------------------------------------------------------------------";

/// Streams one block per ping to disk; the summary preamble is added on finish.
///
/// The side file is removed when the report is dropped, finished or not.
#[derive(Debug)]
pub struct ProcessReport {
    path: PathBuf,
    body_path: PathBuf,
    body: Option<BufWriter<File>>,
    pings: usize,
}

impl ProcessReport {
    pub const FILE_NAME: &'static str = "deltaT-process.txt";

    /// Start a report that will end up at `path`
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let body_path = path.with_extension("body");
        let body = BufWriter::new(File::create(&body_path)?);
        Ok(ProcessReport {
            path,
            body_path,
            body: Some(body),
            pings: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ping_count(&self) -> usize {
        self.pings
    }

    /// Append the block for one decoded ping.
    ///
    /// `ranges` are the per-beam ranges the swath was computed from, zero for
    /// beams with no return. `pose_time_ms` is the time the pose was asked for.
    pub fn record_ping(
        &mut self,
        header: &PingHeader,
        swath: &BathymetrySwath,
        ranges: &[f64],
        pose_time_ms: i64,
        sound_speed_corrected: bool,
    ) -> Result<()> {
        let pose = &swath.pose;
        self.pings += 1;

        self.line("")?;
        self.line(format!("% Swath type & version : {}, {}", header.file_type, header.version))?;
        self.line(format!("% Swath time           : {}", format_time(pose_time_ms)))?;
        self.line(format!(
            "% Swath position       : {} {} {:.2}m depth  :: {:.2}m altitude {}",
            pose.latitude_deg,
            pose.longitude_deg,
            pose.depth,
            pose.altitude,
            if pose.is_degraded() { "from data" } else { "from corrected position" }
        ))?;
        self.line(format!("% Swath attitude       : {}", attitude(pose)))?;
        self.line(format!(
            "% Orient. module       : R{:.1}\u{B0} P{:.1}\u{B0} H{:.1}\u{B0}",
            header.roll_degrees(),
            header.pitch_degrees(),
            header.heading_degrees()
        ))?;
        self.line(format!("% Ship Course          : {}\u{B0}", header.course))?;
        self.line(format!("% Ship Lat/Lon         : {}  {}", header.gnss_latitude, header.gnss_longitude))?;
        self.line(format!(
            "% Sonar XYZ offsets    : {}m, {}m, {}m",
            header.sonar_offset[0], header.sonar_offset[1], header.sonar_offset[2]
        ))?;
        self.line(format!(
            "% Angle start/increment: {}\u{B0}, {}\u{B0}",
            header.start_angle, header.angle_increment
        ))?;
        self.line(format!("% Beams                : {}", header.num_beams))?;
        self.line(format!("% Samples per beam     : {}", header.samples_per_beam))?;
        self.line(format!("% Number of pings avg  : {}", header.pings_averaged))?;
        self.line(format!(
            "% Sample rate high/std : {} [std(1 in 500)/high (1 in 5000)]",
            if header.sample_rate_high { "high" } else { "std" }
        ))?;
        self.line(format!("% Range                : {}m", header.max_range))?;
        self.line(format!("% Range resolution     : {}mm", header.range_resolution_mm))?;
        self.line(format!("% Sonar Freq.          : {}kHz", header.frequency_khz))?;
        self.line(format!("% Pulse length         : {}\u{3BC}s", header.pulse_length_us))?;
        let prf = if header.pulse_repetition_ms > 0 {
            format!("{:.1}Hz", 1000.0 / header.pulse_repetition_ms as f64)
        } else {
            "-".to_string()
        };
        self.line(format!("% 1/PRF                : {}ms ({})", header.pulse_repetition_ms, prf))?;
        self.line(format!("% Ping number          : {}", header.ping_number))?;
        self.line(format!(
            "% Sector size          : {}\u{B0} :: {}\u{B0} calculated",
            header.sector_size,
            header.angle_increment * header.num_beams as f64
        ))?;
        self.line(format!("% Speed                : {:.1}m/s", header.speed))?;
        self.line(format!(
            "% Sound speed          : {}m/s{}",
            header.sound_velocity_mps(),
            if sound_speed_corrected { "" } else { " (1500m/s used for calculation)" }
        ))?;
        self.line(format!("% Roll correction      : {}", yes_no(header.options.is_roll_corrected())))?;
        self.line(format!("% RayBending correction: {}", yes_no(header.options.is_ray_bending_corrected())))?;
        self.line(format!("% Op overlap mode      : {}", yes_no(header.options.is_overlapped_mode())))?;
        self.line(format!("% Altitude             : {}m", header.altitude))?;
        self.line("% ---------------------")?;

        let mut range_col = String::new();
        let mut height_col = String::new();
        let mut intensity_col = String::new();
        let mut x_col = String::new();
        let mut y_col = String::new();
        let mut delta_col = String::new();
        let mut previous: Option<(f32, f32)> = None;

        for (c, slot) in swath.points.iter().enumerate() {
            range_col.push_str(&format!(" {:.3}", ranges.get(c).copied().unwrap_or(0.0)));
            match slot {
                Some(p) => {
                    height_col.push_str(&format!(" {:.3}", p.height));
                    match p.intensity {
                        Some(i) => intensity_col.push_str(&format!(" {i}")),
                        None => intensity_col.push_str(" NaN"),
                    }
                    x_col.push_str(&format!(" {:.3}", p.along_track));
                    y_col.push_str(&format!(" {:.3}", p.cross_track));
                    match previous {
                        Some((px, py)) => {
                            let d = ((p.along_track - px).powi(2) + (p.cross_track - py).powi(2)).sqrt();
                            delta_col.push_str(&format!(" {d:.3}"));
                        }
                        None => delta_col.push_str(" NaN"),
                    }
                    previous = Some((p.along_track, p.cross_track));
                }
                None => {
                    for col in [&mut height_col, &mut intensity_col, &mut x_col, &mut y_col, &mut delta_col] {
                        col.push_str(" NaN");
                    }
                    previous = None;
                }
            }
        }

        for (title, col) in [
            ("Ranges", range_col),
            ("Heights", height_col),
            ("Intensities", intensity_col),
            ("Offsets X", x_col),
            ("Offsets Y", y_col),
            ("Deltas", delta_col),
        ] {
            self.line(format!("% {title}:"))?;
            self.line(col)?;
        }
        self.line(format!(
            "% Number of beams vs read: {} vs {}",
            header.num_beams,
            swath.point_count()
        ))?;
        Ok(())
    }

    /// Summary lines that open the report
    pub fn preamble(log_name: &str, summary: &AggregateSummary, config: &ParserConfig) -> String {
        let mut text = String::new();
        let mut push = |s: String| {
            text.push_str(&s);
            text.push_str(EOL);
        };
        push(format!("% Log                   : {log_name}"));
        push(format!(
            "% Box top left          : {} {}",
            summary.top_left_latitude, summary.top_left_longitude
        ));
        push(format!(
            "% Box bottom right      : {} {}",
            summary.bottom_right_latitude, summary.bottom_right_longitude
        ));
        push(format!("% Total number of points: {}", summary.total_number_of_points));
        push(format!("% Depths                : [{}, {}]", summary.min_depth, summary.max_depth));
        if config.timestamp_increment_ms != 0 {
            push(format!("% Added milliseconds    :{}", config.timestamp_increment_ms));
        }
        if config.sound_speed_correction {
            push("% Sound speed correction applied to data".to_string());
        }
        push(RULE.to_string());
        text
    }

    /// Write the preamble to the report path and append the ping blocks.
    ///
    /// A report that fails half way is removed so a later scan can try again.
    pub fn finish(mut self, log_name: &str, summary: &AggregateSummary, config: &ParserConfig) -> Result<()> {
        let result = self.assemble(log_name, summary, config);
        if result.is_err() {
            let _ = fs::remove_file(&self.path);
        }
        result
    }

    fn assemble(&mut self, log_name: &str, summary: &AggregateSummary, config: &ParserConfig) -> Result<()> {
        if let Some(mut body) = self.body.take() {
            body.flush()?;
        }
        let mut out = BufWriter::new(File::create(&self.path)?);
        out.write_all(Self::preamble(log_name, summary, config).as_bytes())?;
        io::copy(&mut File::open(&self.body_path)?, &mut out)?;
        out.flush()?;
        Ok(())
    }

    fn line(&mut self, text: impl AsRef<str>) -> Result<()> {
        if let Some(body) = self.body.as_mut() {
            body.write_all(text.as_ref().as_bytes())?;
            body.write_all(EOL.as_bytes())?;
        }
        Ok(())
    }
}

impl Drop for ProcessReport {
    fn drop(&mut self) {
        self.body = None;
        let _ = fs::remove_file(&self.body_path);
    }
}

fn attitude(pose: &Pose) -> String {
    format!(
        "R{:.1}\u{B0} P{:.1}\u{B0} Y{:.1}\u{B0}",
        pose.roll.to_degrees(),
        pose.pitch.to_degrees(),
        pose.yaw.to_degrees()
    )
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn format_time(epoch_ms: i64) -> String {
    match Utc.timestamp_millis_opt(epoch_ms).single() {
        Some(t) => t.format("%Y-%m-%d_%H-%M-%S.%3f").to_string(),
        None => epoch_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BathymetryPoint;

    fn swath() -> BathymetrySwath {
        BathymetrySwath {
            timestamp_ms: 1_415_787_630_456,
            pose: Pose::new(1_415_787_630_456, 41.0, -8.0, 2.0),
            points: vec![
                Some(BathymetryPoint::new(0.0, -1.0, 5.0)),
                None,
                Some(BathymetryPoint::new(0.0, 1.0, 5.0).with_intensity(300)),
            ],
            num_beams: 3,
        }
    }

    fn finished(report: ProcessReport) -> String {
        let path = report.path().to_path_buf();
        report
            .finish("log", &AggregateSummary::default(), &ParserConfig::default())
            .unwrap();
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_ping_block() {
        let dir = tempfile::tempdir().unwrap();
        let header = PingHeader::new(3, false, 1_415_787_630_456);
        let mut report = ProcessReport::create(dir.path().join(ProcessReport::FILE_NAME)).unwrap();
        report
            .record_ping(&header, &swath(), &[3.0, 0.0, 3.0], 1_415_787_630_456, false)
            .unwrap();
        assert_eq!(report.ping_count(), 1);

        let text = finished(report);
        assert!(text.contains("% Swath type & version : 83P, 10\r\n"));
        assert!(text.contains("% Swath time           : 2014-11-12_10-20-30.456\r\n% Swath position       :"));
        assert!(text.contains("from corrected position"));
        assert!(text.contains(" 3.000 0.000 3.000\r\n"));
        assert!(text.contains(" NaN NaN 300\r\n"));
        assert!(text.contains("(1500m/s used for calculation)"));
        assert!(text.contains("% Number of beams vs read: 3 vs 2"));
        assert_eq!(text.matches("% ---------------------\r\n").count(), 1);
    }

    #[test]
    fn test_blocks_reach_disk_during_scan() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ProcessReport::create(dir.path().join(ProcessReport::FILE_NAME)).unwrap();
        let body_path = report.body_path.clone();
        for i in 0..200 {
            report
                .record_ping(&PingHeader::new(3, false, i), &swath(), &[3.0, 0.0, 3.0], i, false)
                .unwrap();
        }
        // past the write buffer, so most of the body is already on disk
        assert!(std::fs::metadata(&body_path).unwrap().len() > 64 * 1024);

        let text = finished(report);
        assert_eq!(text.matches("% Swath type & version").count(), 200);
        assert!(!body_path.exists());
    }

    #[test]
    fn test_dropped_report_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mra").join(ProcessReport::FILE_NAME);
        let mut report = ProcessReport::create(&path).unwrap();
        report
            .record_ping(&PingHeader::new(3, false, 0), &swath(), &[3.0, 0.0, 3.0], 0, false)
            .unwrap();
        drop(report);

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path().join("mra")).unwrap().count(), 0);
    }

    #[test]
    fn test_preamble() {
        let summary = AggregateSummary {
            total_number_of_points: 11,
            min_depth: 1.5,
            max_depth: 9.0,
            ..AggregateSummary::default()
        };
        let config = ParserConfig {
            timestamp_increment_ms: 250,
            sound_speed_correction: true,
            ..ParserConfig::default()
        };
        let text = ProcessReport::preamble("survey-1", &summary, &config);
        assert!(text.starts_with("% Log                   : survey-1\r\n"));
        assert!(text.contains("% Total number of points: 11\r\n"));
        assert!(text.contains("% Depths                : [1.5, 9]\r\n"));
        assert!(text.contains("% Added milliseconds    :250\r\n"));
        assert!(text.contains("Sound speed correction applied"));
        assert!(text.ends_with(&format!("{RULE}\r\n")));

        let plain = ProcessReport::preamble("survey-1", &summary, &ParserConfig::default());
        assert!(!plain.contains("Added milliseconds"));
    }

    #[test]
    fn test_preamble_precedes_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = ProcessReport::create(dir.path().join(ProcessReport::FILE_NAME)).unwrap();
        report
            .record_ping(&PingHeader::new(3, false, 0), &swath(), &[3.0, 0.0, 3.0], 0, false)
            .unwrap();

        let text = finished(report);
        assert!(text.starts_with("% Log"));
        let rule = text.find(RULE).unwrap();
        let block = text.find("% Swath time           : 1970-01-01_00-00-00.000").unwrap();
        assert!(rule < block);
    }
}
