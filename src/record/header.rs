// src/record/header.rs
use crate::error::{DeltaTError, Result};
use crate::record::packed::{encode_optional_packed, ATTITUDE_BIAS, NO_BIAS};
use crate::record::timestamp::encode_timestamp;
use crate::types::OptionFlags;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte offsets inside the fixed 256-byte ping header.
///
/// Multi-byte integers are big-endian. The sonar offsets are big-endian
/// floats, the altitude float is stored little-endian.
pub mod layout {
    pub const FILE_TYPE: usize = 0;
    pub const VERSION: usize = 3;
    pub const RECORD_LENGTH: usize = 4;
    pub const DATE_TIME: usize = 8;
    pub const GNSS_LATITUDE: usize = 33;
    pub const GNSS_LONGITUDE: usize = 47;
    pub const GNSS_FIELD_LEN: usize = 14;
    pub const SPEED: usize = 61;
    pub const COURSE: usize = 62;
    pub const PITCH: usize = 64;
    pub const ROLL: usize = 66;
    pub const HEADING: usize = 68;
    pub const NUM_BEAMS: usize = 70;
    pub const SAMPLES_PER_BEAM: usize = 72;
    pub const SECTOR_SIZE: usize = 74;
    pub const START_ANGLE: usize = 76;
    pub const ANGLE_INCREMENT: usize = 78;
    pub const MAX_RANGE: usize = 79;
    pub const FREQUENCY: usize = 81;
    pub const SOUND_VELOCITY: usize = 83;
    pub const RANGE_RESOLUTION: usize = 85;
    pub const PULSE_LENGTH: usize = 87;
    pub const PROFILE_TILT: usize = 89;
    pub const REPETITION_PERIOD: usize = 91;
    pub const PING_NUMBER: usize = 93;
    pub const SONAR_X_OFFSET: usize = 100;
    pub const SONAR_Y_OFFSET: usize = 104;
    pub const SONAR_Z_OFFSET: usize = 108;
    pub const MILLIS: usize = 112;
    pub const HAS_INTENSITY: usize = 117;
    pub const PING_LATENCY: usize = 118;
    pub const DATA_LATENCY: usize = 120;
    pub const SAMPLE_RATE: usize = 122;
    pub const OPTION_FLAGS: usize = 123;
    pub const PINGS_AVERAGED: usize = 125;
    pub const ALTITUDE: usize = 133;
}

pub const KNOTS_TO_MPS: f64 = 0.51444;

/// Decoded 83P ping header
#[derive(Debug, Clone, PartialEq)]
pub struct PingHeader {
    pub file_type: String,
    /// 10 = v1.10
    pub version: u8,
    /// Bytes on disk for this ping, header included
    pub record_length: u16,
    /// Epoch milliseconds, UTC
    pub timestamp_ms: i64,
    pub gnss_latitude: String,
    pub gnss_longitude: String,
    /// m/s
    pub speed: f64,
    /// degrees
    pub course: f64,
    // Orientation module, degrees; None when the presence bit is clear
    pub pitch: Option<f64>,
    pub roll: Option<f64>,
    pub heading: Option<f64>,
    pub num_beams: u16,
    pub samples_per_beam: u16,
    /// degrees
    pub sector_size: u16,
    /// Beam 0 angle, degrees
    pub start_angle: f64,
    /// degrees per beam
    pub angle_increment: f64,
    /// meters
    pub max_range: u16,
    pub frequency_khz: u16,
    /// m/s; None when the presence bit is clear
    pub sound_velocity: Option<f64>,
    pub range_resolution_mm: u16,
    pub pulse_length_us: u16,
    /// Mounting offset, degrees
    pub profile_tilt_angle: f64,
    pub pulse_repetition_ms: u16,
    pub ping_number: u32,
    /// Sonar x, y, z offsets in meters
    pub sonar_offset: [f32; 3],
    pub has_intensity: bool,
    /// units of 100 µs
    pub ping_latency: u16,
    /// units of 100 µs
    pub data_latency: u16,
    /// 1 in 5000 instead of 1 in 500
    pub sample_rate_high: bool,
    pub options: OptionFlags,
    pub pings_averaged: u8,
    /// meters
    pub altitude: f32,
}

impl PingHeader {
    pub const SIZE: usize = 256;
    pub const FILE_TYPE_TAG: &'static str = "83P";
    pub const REFERENCE_SOUND_VELOCITY: f64 = 1500.0;

    /// A header with the given geometry and neutral defaults elsewhere
    pub fn new(num_beams: u16, has_intensity: bool, timestamp_ms: i64) -> Self {
        let record_length = Self::expected_record_length(num_beams, has_intensity).min(u16::MAX as u32) as u16;
        PingHeader {
            file_type: Self::FILE_TYPE_TAG.to_string(),
            version: 10,
            record_length,
            timestamp_ms,
            gnss_latitude: String::new(),
            gnss_longitude: String::new(),
            speed: 0.0,
            course: 0.0,
            pitch: None,
            roll: None,
            heading: None,
            num_beams,
            samples_per_beam: 0,
            sector_size: 120,
            start_angle: -60.0,
            angle_increment: 0.5,
            max_range: 50,
            frequency_khz: 260,
            sound_velocity: None,
            range_resolution_mm: 10,
            pulse_length_us: 100,
            profile_tilt_angle: 0.0,
            pulse_repetition_ms: 100,
            ping_number: 0,
            sonar_offset: [0.0; 3],
            has_intensity,
            ping_latency: 0,
            data_latency: 0,
            sample_rate_high: false,
            options: OptionFlags::empty(),
            pings_averaged: 0,
            altitude: 0.0,
        }
    }

    /// `256 + beams * 2`, or `* 4` with intensity
    pub fn expected_record_length(num_beams: u16, has_intensity: bool) -> u32 {
        let per_beam = if has_intensity { 4 } else { 2 };
        Self::SIZE as u32 + num_beams as u32 * per_beam
    }

    /// Bytes following the header
    pub fn payload_len(&self) -> usize {
        (self.record_length as usize).saturating_sub(Self::SIZE)
    }

    pub fn pitch_degrees(&self) -> f64 {
        self.pitch.unwrap_or(0.0)
    }

    pub fn roll_degrees(&self) -> f64 {
        self.roll.unwrap_or(0.0)
    }

    pub fn heading_degrees(&self) -> f64 {
        self.heading.unwrap_or(0.0)
    }

    /// Sound velocity, 1500 m/s when the sonar did not report one
    pub fn sound_velocity_mps(&self) -> f64 {
        self.sound_velocity.unwrap_or(Self::REFERENCE_SOUND_VELOCITY)
    }

    /// Serialize into the on-disk 256-byte layout
    pub fn encode(&self) -> Result<[u8; PingHeader::SIZE]> {
        use layout::*;

        let mut buf = [0u8; Self::SIZE];

        write_ascii(&mut buf[FILE_TYPE..FILE_TYPE + 3], &self.file_type);
        buf[VERSION] = self.version;
        BigEndian::write_u16(&mut buf[RECORD_LENGTH..], self.record_length);

        let (date_time, millis) = encode_timestamp(self.timestamp_ms).ok_or_else(|| {
            DeltaTError::Encode(format!("timestamp {} cannot be written as DD-MON-YYYY", self.timestamp_ms))
        })?;
        buf[DATE_TIME..DATE_TIME + date_time.len()].copy_from_slice(&date_time);
        buf[MILLIS..MILLIS + millis.len()].copy_from_slice(&millis);

        write_ascii(&mut buf[GNSS_LATITUDE..GNSS_LATITUDE + GNSS_FIELD_LEN], &self.gnss_latitude);
        write_ascii(&mut buf[GNSS_LONGITUDE..GNSS_LONGITUDE + GNSS_FIELD_LEN], &self.gnss_longitude);

        buf[SPEED] = (self.speed / KNOTS_TO_MPS * 10.0).round().clamp(0.0, u8::MAX as f64) as u8;
        BigEndian::write_u16(&mut buf[COURSE..], scaled_u16(self.course, 10.0, 0.0));

        buf[PITCH..PITCH + 2].copy_from_slice(&encode_optional_packed(self.pitch, ATTITUDE_BIAS));
        buf[ROLL..ROLL + 2].copy_from_slice(&encode_optional_packed(self.roll, ATTITUDE_BIAS));
        buf[HEADING..HEADING + 2].copy_from_slice(&encode_optional_packed(self.heading, NO_BIAS));

        BigEndian::write_u16(&mut buf[NUM_BEAMS..], self.num_beams);
        BigEndian::write_u16(&mut buf[SAMPLES_PER_BEAM..], self.samples_per_beam);
        BigEndian::write_u16(&mut buf[SECTOR_SIZE..], self.sector_size);
        BigEndian::write_u16(&mut buf[START_ANGLE..], scaled_u16(self.start_angle, 100.0, 180.0));
        buf[ANGLE_INCREMENT] = (self.angle_increment * 100.0).round().clamp(0.0, u8::MAX as f64) as u8;
        BigEndian::write_u16(&mut buf[MAX_RANGE..], self.max_range);
        BigEndian::write_u16(&mut buf[FREQUENCY..], self.frequency_khz);
        buf[SOUND_VELOCITY..SOUND_VELOCITY + 2].copy_from_slice(&encode_optional_packed(self.sound_velocity, NO_BIAS));
        BigEndian::write_u16(&mut buf[RANGE_RESOLUTION..], self.range_resolution_mm);
        BigEndian::write_u16(&mut buf[PULSE_LENGTH..], self.pulse_length_us);
        BigEndian::write_u16(&mut buf[PROFILE_TILT..], scaled_u16(self.profile_tilt_angle, 1.0, 180.0));
        BigEndian::write_u16(&mut buf[REPETITION_PERIOD..], self.pulse_repetition_ms);
        BigEndian::write_u32(&mut buf[PING_NUMBER..], self.ping_number);

        BigEndian::write_f32(&mut buf[SONAR_X_OFFSET..], self.sonar_offset[0]);
        BigEndian::write_f32(&mut buf[SONAR_Y_OFFSET..], self.sonar_offset[1]);
        BigEndian::write_f32(&mut buf[SONAR_Z_OFFSET..], self.sonar_offset[2]);

        buf[HAS_INTENSITY] = self.has_intensity as u8;
        BigEndian::write_u16(&mut buf[PING_LATENCY..], self.ping_latency);
        BigEndian::write_u16(&mut buf[DATA_LATENCY..], self.data_latency);
        buf[SAMPLE_RATE] = self.sample_rate_high as u8;
        buf[OPTION_FLAGS] = self.options.raw();
        buf[PINGS_AVERAGED] = self.pings_averaged;
        LittleEndian::write_f32(&mut buf[ALTITUDE..], self.altitude);

        Ok(buf)
    }
}

fn write_ascii(dst: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    let n = bytes.len().min(dst.len());
    dst[..n].copy_from_slice(&bytes[..n]);
}

fn scaled_u16(value: f64, scale: f64, offset: f64) -> u16 {
    ((value + offset) * scale).round().clamp(0.0, u16::MAX as f64) as u16
}
