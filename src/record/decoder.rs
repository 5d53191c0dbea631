// src/record/decoder.rs
use crate::error::{DecodeError, Result};
use crate::record::header::{layout, PingHeader, KNOTS_TO_MPS};
use crate::record::packed::{decode_optional_packed, ATTITUDE_BIAS, NO_BIAS};
use crate::record::timestamp::{TimestampMatcher, DATE_TIME_LEN, MILLIS_LEN};
use crate::types::OptionFlags;
use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Turns raw 256-byte headers into [`PingHeader`]s.
///
/// Holds the compiled timestamp pattern; build one and reuse it.
#[derive(Debug, Clone)]
pub struct HeaderDecoder {
    timestamps: TimestampMatcher,
}

impl HeaderDecoder {
    pub fn new() -> Result<Self> {
        Ok(HeaderDecoder {
            timestamps: TimestampMatcher::new()?,
        })
    }

    /// Declared record length, readable even when the rest of the header is not
    pub fn peek_record_length(buf: &[u8; PingHeader::SIZE]) -> u16 {
        BigEndian::read_u16(&buf[layout::RECORD_LENGTH..])
    }

    pub fn decode(&self, buf: &[u8; PingHeader::SIZE]) -> std::result::Result<PingHeader, DecodeError> {
        use layout::*;

        let record_length = Self::peek_record_length(buf);
        let num_beams = BigEndian::read_u16(&buf[NUM_BEAMS..]);
        let has_intensity = buf[HAS_INTENSITY] != 0;

        let expected = PingHeader::expected_record_length(num_beams, has_intensity);
        if record_length as u32 != expected {
            return Err(DecodeError::RecordLengthMismatch { declared: record_length, expected });
        }

        let timestamp_ms = self
            .timestamps
            .parse(&buf[DATE_TIME..DATE_TIME + DATE_TIME_LEN], &buf[MILLIS..MILLIS + MILLIS_LEN])
            .map_err(|reason| DecodeError::InvalidTimestamp { record_length, reason })?;

        Ok(PingHeader {
            file_type: read_ascii(&buf[FILE_TYPE..FILE_TYPE + 3]),
            version: buf[VERSION],
            record_length,
            timestamp_ms,
            gnss_latitude: read_ascii(&buf[GNSS_LATITUDE..GNSS_LATITUDE + GNSS_FIELD_LEN]),
            gnss_longitude: read_ascii(&buf[GNSS_LONGITUDE..GNSS_LONGITUDE + GNSS_FIELD_LEN]),
            speed: buf[SPEED] as f64 / 10.0 * KNOTS_TO_MPS,
            course: BigEndian::read_u16(&buf[COURSE..]) as f64 / 10.0,
            pitch: decode_optional_packed(buf[PITCH], buf[PITCH + 1], ATTITUDE_BIAS),
            roll: decode_optional_packed(buf[ROLL], buf[ROLL + 1], ATTITUDE_BIAS),
            heading: decode_optional_packed(buf[HEADING], buf[HEADING + 1], NO_BIAS),
            num_beams,
            samples_per_beam: BigEndian::read_u16(&buf[SAMPLES_PER_BEAM..]),
            sector_size: BigEndian::read_u16(&buf[SECTOR_SIZE..]),
            start_angle: BigEndian::read_u16(&buf[START_ANGLE..]) as f64 / 100.0 - 180.0,
            angle_increment: buf[ANGLE_INCREMENT] as f64 / 100.0,
            max_range: BigEndian::read_u16(&buf[MAX_RANGE..]),
            frequency_khz: BigEndian::read_u16(&buf[FREQUENCY..]),
            sound_velocity: decode_optional_packed(buf[SOUND_VELOCITY], buf[SOUND_VELOCITY + 1], NO_BIAS),
            range_resolution_mm: BigEndian::read_u16(&buf[RANGE_RESOLUTION..]),
            pulse_length_us: BigEndian::read_u16(&buf[PULSE_LENGTH..]),
            profile_tilt_angle: BigEndian::read_u16(&buf[PROFILE_TILT..]) as f64 - 180.0,
            pulse_repetition_ms: BigEndian::read_u16(&buf[REPETITION_PERIOD..]),
            ping_number: BigEndian::read_u32(&buf[PING_NUMBER..]),
            sonar_offset: [
                BigEndian::read_f32(&buf[SONAR_X_OFFSET..]),
                BigEndian::read_f32(&buf[SONAR_Y_OFFSET..]),
                BigEndian::read_f32(&buf[SONAR_Z_OFFSET..]),
            ],
            has_intensity,
            ping_latency: BigEndian::read_u16(&buf[PING_LATENCY..]),
            data_latency: BigEndian::read_u16(&buf[DATA_LATENCY..]),
            sample_rate_high: buf[SAMPLE_RATE] != 0,
            options: OptionFlags::new(buf[OPTION_FLAGS] & 0b111),
            pings_averaged: buf[PINGS_AVERAGED],
            altitude: LittleEndian::read_f32(&buf[ALTITUDE..]),
        })
    }
}

fn read_ascii(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\0').to_string()
}
